//! Authentication token and user profile cache, mirrored to durable storage.

use std::sync::Arc;

use shared::domain::UserProfile;
use storage::KeyValueStore;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

use crate::error::SessionError;

pub const TOKEN_KEY: &str = "token";
pub const USER_KEY: &str = "user";

#[derive(Debug, Clone, Default, PartialEq)]
pub struct SessionSnapshot {
    pub token: Option<String>,
    pub user: Option<UserProfile>,
}

impl SessionSnapshot {
    pub fn is_authenticated(&self) -> bool {
        self.token.is_some()
    }
}

/// Built once at the application root and shared by reference with every
/// component that needs the session.
pub struct SessionStore {
    storage: Arc<dyn KeyValueStore>,
    state: RwLock<SessionSnapshot>,
}

impl SessionStore {
    /// Loads the session persisted by a previous run. The stored user is only
    /// considered when a token exists; a user entry that no longer parses is
    /// removed while the token is kept.
    pub async fn rehydrate(storage: Arc<dyn KeyValueStore>) -> Result<Self, SessionError> {
        let token = storage.get(TOKEN_KEY).await?;
        let mut user = None;

        if token.is_some() {
            if let Some(raw_user) = storage.get(USER_KEY).await? {
                match serde_json::from_str::<UserProfile>(&raw_user) {
                    Ok(parsed) => user = Some(parsed),
                    Err(err) => {
                        warn!("session: dropping unreadable stored user error={err}");
                        storage.remove(USER_KEY).await?;
                    }
                }
            }
        }

        debug!(
            "session: rehydrated authenticated={} user_present={}",
            token.is_some(),
            user.is_some()
        );

        Ok(Self {
            storage,
            state: RwLock::new(SessionSnapshot { token, user }),
        })
    }

    pub async fn login(
        &self,
        token: impl Into<String>,
        user: Option<UserProfile>,
    ) -> Result<(), SessionError> {
        let token = token.into();
        let serialized_user = user.as_ref().map(serde_json::to_string).transpose()?;

        self.storage.set(TOKEN_KEY, &token).await?;
        match &serialized_user {
            Some(raw) => self.storage.set(USER_KEY, raw).await?,
            None => self.storage.remove(USER_KEY).await?,
        }

        let mut state = self.state.write().await;
        info!(
            "session: signed in user={}",
            user.as_ref()
                .map(|profile| profile.username.as_str())
                .unwrap_or("<unknown>")
        );
        *state = SessionSnapshot {
            token: Some(token),
            user,
        };
        Ok(())
    }

    pub async fn logout(&self) {
        for key in [TOKEN_KEY, USER_KEY] {
            if let Err(err) = self.storage.remove(key).await {
                warn!("session: failed to clear storage key={key} error={err:#}");
            }
        }
        *self.state.write().await = SessionSnapshot::default();
        info!("session: signed out");
    }

    pub async fn is_authenticated(&self) -> bool {
        self.state.read().await.is_authenticated()
    }

    pub async fn token(&self) -> Option<String> {
        self.state.read().await.token.clone()
    }

    pub async fn user(&self) -> Option<UserProfile> {
        self.state.read().await.user.clone()
    }

    pub async fn snapshot(&self) -> SessionSnapshot {
        self.state.read().await.clone()
    }
}

#[cfg(test)]
#[path = "tests/session_tests.rs"]
mod tests;
