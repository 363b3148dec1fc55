use std::{sync::Arc, time::Duration};

use anyhow::{Context, Result};
use storage::KeyValueStore;
use tokio::sync::broadcast;
use tracing::info;
use validator::Validate;

pub mod api;
pub mod categories;
pub mod error;
pub mod session;
pub mod validation;
pub mod view;

pub use api::{ApiClient, CategoryService};
pub use categories::{
    Affordance, CategoryListController, FetchOutcome, FetchPhase, ListSnapshot,
    DEFAULT_FETCH_TIMEOUT,
};
pub use error::{ApiClientError, AuthError, ErrorCategory, FetchError, MutationError, SessionError};
pub use session::{SessionSnapshot, SessionStore};
pub use validation::{field_messages, CategoryDraft, CategoryPatch, LoginForm, RegisterForm};
pub use validator::ValidationErrors;
pub use view::{CategoryColumn, SortDirection, TablePage, TableView, ViewError};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationLevel {
    Success,
    Error,
}

/// Everything a front end may want to react to: fetch lifecycle, transient
/// notifications and session changes.
#[derive(Debug, Clone)]
pub enum ClientEvent {
    FetchStarted {
        request: u64,
    },
    CategoriesLoaded {
        rows: usize,
    },
    FetchFailed {
        message: String,
    },
    Notification {
        level: NotificationLevel,
        message: String,
    },
    SessionChanged {
        authenticated: bool,
    },
}

/// Where a front end should send the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    Login,
    Categories,
}

#[derive(Debug, Clone)]
pub struct ClientOptions {
    pub api_url: String,
    pub fetch_timeout: Duration,
}

impl ClientOptions {
    pub fn new(api_url: impl Into<String>) -> Self {
        Self {
            api_url: api_url.into(),
            fetch_timeout: DEFAULT_FETCH_TIMEOUT,
        }
    }
}

/// Application root: owns the session and the HTTP client and hands them to
/// the pages that need them.
pub struct BudgetClient {
    session: Arc<SessionStore>,
    api: Arc<ApiClient>,
    fetch_timeout: Duration,
    events: broadcast::Sender<ClientEvent>,
}

impl BudgetClient {
    pub async fn connect(options: ClientOptions, storage: Arc<dyn KeyValueStore>) -> Result<Self> {
        let session = Arc::new(
            SessionStore::rehydrate(storage)
                .await
                .context("failed to restore session")?,
        );
        let api = ApiClient::new(&options.api_url, Arc::clone(&session))
            .with_context(|| format!("invalid api url '{}'", options.api_url))?;
        let (events, _) = broadcast::channel(256);

        Ok(Self {
            session,
            api: Arc::new(api),
            fetch_timeout: options.fetch_timeout,
            events,
        })
    }

    pub fn session(&self) -> &Arc<SessionStore> {
        &self.session
    }

    pub fn api(&self) -> &Arc<ApiClient> {
        &self.api
    }

    pub fn subscribe_events(&self) -> broadcast::Receiver<ClientEvent> {
        self.events.subscribe()
    }

    pub async fn landing_route(&self) -> Route {
        if self.session.is_authenticated().await {
            Route::Categories
        } else {
            Route::Login
        }
    }

    pub async fn sign_in(&self, form: &LoginForm) -> Result<SessionSnapshot, AuthError> {
        form.validate()?;
        let response = self.api.login(&form.email, &form.password).await?;
        let token = response
            .access_token
            .ok_or(ApiClientError::MissingAccessToken)?;
        self.session.login(token, response.user).await?;

        let _ = self
            .events
            .send(ClientEvent::SessionChanged { authenticated: true });
        Ok(self.session.snapshot().await)
    }

    /// Creates an account. No session is opened; the caller routes to login.
    pub async fn sign_up(&self, form: &RegisterForm) -> Result<(), AuthError> {
        form.validate()?;
        self.api.register(&form.to_request()).await?;
        info!("auth: registered username={}", form.username);
        Ok(())
    }

    pub async fn sign_out(&self) {
        self.session.logout().await;
        let _ = self.events.send(ClientEvent::SessionChanged {
            authenticated: false,
        });
    }

    /// Mounts the category page: refuses unauthenticated sessions, otherwise
    /// builds a controller and runs the initial fetch.
    pub async fn open_categories(&self) -> Result<CategoryListController, AuthError> {
        if !self.session.is_authenticated().await {
            return Err(AuthError::Unauthenticated);
        }
        let controller = CategoryListController::new(
            Arc::clone(&self.api) as Arc<dyn CategoryService>,
            self.fetch_timeout,
            self.events.clone(),
        );
        controller.refresh().await;
        Ok(controller)
    }
}

#[cfg(test)]
#[path = "tests/fixtures.rs"]
mod fixtures;

#[cfg(test)]
#[path = "tests/mock_backend.rs"]
mod mock_backend;

#[cfg(test)]
#[path = "tests/lib_tests.rs"]
mod tests;
