//! Category list controller: fetch cycle, mutations and table view state.
//!
//! Row order changes made through [`CategoryListController::move_row`] are
//! view-only. They are never sent to the backend and the next successful
//! fetch replaces them with the server order.

use std::{
    collections::HashSet,
    fmt,
    sync::{Arc, Mutex as StdMutex, PoisonError},
    time::Duration,
};

use shared::{
    domain::{Category, CategoryId},
    protocol::MutationAck,
};
use tokio::sync::{broadcast, Mutex};
use tracing::{debug, info, warn};
use validator::Validate;

use crate::{
    api::{into_categories, CategoryService},
    error::{ApiClientError, FetchError, MutationError},
    validation::{CategoryDraft, CategoryPatch},
    view::{self, TablePage, TableView},
    ClientEvent, NotificationLevel,
};

pub const DEFAULT_FETCH_TIMEOUT: Duration = Duration::from_secs(15);

/// The UI control that triggered a mutation. A control stays disabled while
/// its own request is in flight.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Affordance {
    Create,
    Edit(CategoryId),
    Delete(CategoryId),
}

impl fmt::Display for Affordance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Create => f.write_str("category creation"),
            Self::Edit(id) => write!(f, "edit of category {id}"),
            Self::Delete(id) => write!(f, "deletion of category {id}"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchPhase {
    Idle,
    Loading,
    Success,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchOutcome {
    Applied { rows: usize },
    Failed { message: String },
    /// A newer fetch was issued before this one resolved; its result was
    /// dropped.
    Superseded,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ListSnapshot {
    pub phase: FetchPhase,
    pub rows: Vec<Category>,
    pub error: Option<String>,
}

impl ListSnapshot {
    pub fn is_loading(&self) -> bool {
        self.phase == FetchPhase::Loading
    }
}

struct ListState {
    rows: Vec<Category>,
    view: TableView,
    phase: FetchPhase,
    error: Option<String>,
    latest_request: u64,
}

pub struct CategoryListController {
    service: Arc<dyn CategoryService>,
    fetch_timeout: Duration,
    state: Mutex<ListState>,
    in_flight: StdMutex<HashSet<Affordance>>,
    events: broadcast::Sender<ClientEvent>,
}

struct InFlightGuard<'a> {
    in_flight: &'a StdMutex<HashSet<Affordance>>,
    affordance: Affordance,
}

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        self.in_flight
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&self.affordance);
    }
}

impl CategoryListController {
    pub fn new(
        service: Arc<dyn CategoryService>,
        fetch_timeout: Duration,
        events: broadcast::Sender<ClientEvent>,
    ) -> Self {
        Self {
            service,
            fetch_timeout,
            state: Mutex::new(ListState {
                rows: Vec::new(),
                view: TableView::default(),
                phase: FetchPhase::Idle,
                error: None,
                latest_request: 0,
            }),
            in_flight: StdMutex::new(HashSet::new()),
            events,
        }
    }

    pub fn fetch_timeout(&self) -> Duration {
        self.fetch_timeout
    }

    /// Runs one fetch cycle. Only the most recently issued fetch may replace
    /// the rows; a failed fetch keeps the previous rows visible.
    pub async fn refresh(&self) -> FetchOutcome {
        let request = {
            let mut state = self.state.lock().await;
            state.latest_request += 1;
            state.phase = FetchPhase::Loading;
            state.error = None;
            state.latest_request
        };
        let _ = self.events.send(ClientEvent::FetchStarted { request });
        debug!("categories: fetch started request={request}");

        // Dropping the timed-out future cancels the in-flight HTTP request.
        let result =
            match tokio::time::timeout(self.fetch_timeout, self.service.list_categories()).await {
                Ok(Ok(envelope)) => into_categories(envelope).map_err(FetchError::from),
                Ok(Err(err)) => Err(FetchError::Api(err)),
                Err(_) => Err(FetchError::Timeout(self.fetch_timeout)),
            };

        let mut guard = self.state.lock().await;
        let state = &mut *guard;
        if state.latest_request != request {
            debug!(
                "categories: discarding stale fetch request={request} latest={}",
                state.latest_request
            );
            return FetchOutcome::Superseded;
        }

        match result {
            Ok(rows) => {
                let count = rows.len();
                state.rows = rows;
                state.view.reset_for_new_rows(&state.rows);
                state.phase = FetchPhase::Success;
                drop(guard);
                info!("categories: loaded rows={count} request={request}");
                let _ = self.events.send(ClientEvent::CategoriesLoaded { rows: count });
                FetchOutcome::Applied { rows: count }
            }
            Err(err) => {
                let message = format!("failed to load categories: {err}");
                state.phase = FetchPhase::Error;
                state.error = Some(message.clone());
                drop(guard);
                warn!("categories: fetch failed request={request} error={err}");
                let _ = self.events.send(ClientEvent::FetchFailed {
                    message: message.clone(),
                });
                FetchOutcome::Failed { message }
            }
        }
    }

    /// Retry affordance shown next to the error banner.
    pub async fn retry(&self) -> FetchOutcome {
        self.refresh().await
    }

    pub async fn create(&self, draft: CategoryDraft) -> Result<FetchOutcome, MutationError> {
        draft.validate()?;
        let result = {
            let _guard = self.begin(Affordance::Create)?;
            self.service.create_category(&draft.to_request()).await
        };
        self.complete(
            Affordance::Create,
            result,
            "category created",
            "failed to create category",
        )
        .await
    }

    pub async fn update(
        &self,
        id: CategoryId,
        patch: CategoryPatch,
    ) -> Result<FetchOutcome, MutationError> {
        patch.validate()?;
        let affordance = Affordance::Edit(id);
        let result = {
            let _guard = self.begin(affordance)?;
            self.service.update_category(id, &patch.to_request()).await
        };
        self.complete(
            affordance,
            result,
            "category updated",
            "failed to update category",
        )
        .await
    }

    pub async fn delete(&self, id: CategoryId) -> Result<FetchOutcome, MutationError> {
        let affordance = Affordance::Delete(id);
        let result = {
            let _guard = self.begin(affordance)?;
            self.service.delete_category(id).await
        };
        self.complete(
            affordance,
            result,
            "category deleted",
            "failed to delete category",
        )
        .await
    }

    pub fn is_in_flight(&self, affordance: Affordance) -> bool {
        self.in_flight
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .contains(&affordance)
    }

    fn begin(&self, affordance: Affordance) -> Result<InFlightGuard<'_>, MutationError> {
        let mut in_flight = self
            .in_flight
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        if !in_flight.insert(affordance) {
            return Err(MutationError::InFlight(affordance));
        }
        Ok(InFlightGuard {
            in_flight: &self.in_flight,
            affordance,
        })
    }

    async fn complete(
        &self,
        affordance: Affordance,
        result: Result<MutationAck, ApiClientError>,
        success_message: &str,
        fallback_message: &str,
    ) -> Result<FetchOutcome, MutationError> {
        let (message, source) = match result {
            Ok(ack) if ack.success => {
                info!("categories: {affordance} acknowledged");
                self.notify(NotificationLevel::Success, success_message);
                return Ok(self.refresh().await);
            }
            Ok(ack) => (non_empty(ack.message), None),
            Err(err) => (err.server_message().map(str::to_string), Some(err)),
        };

        let message = message.unwrap_or_else(|| fallback_message.to_string());
        warn!("categories: {affordance} rejected message={message}");
        self.notify(NotificationLevel::Error, &message);
        Err(MutationError::Rejected { message, source })
    }

    fn notify(&self, level: NotificationLevel, message: &str) {
        let _ = self.events.send(ClientEvent::Notification {
            level,
            message: message.to_string(),
        });
    }

    pub async fn snapshot(&self) -> ListSnapshot {
        let state = self.state.lock().await;
        ListSnapshot {
            phase: state.phase,
            rows: state.rows.clone(),
            error: state.error.clone(),
        }
    }

    pub async fn page(&self) -> TablePage {
        let state = self.state.lock().await;
        state.view.page(&state.rows)
    }

    /// Applies a view-state change (sorting, filters, visibility, paging,
    /// selection) against the current rows.
    pub async fn update_view<R>(&self, change: impl FnOnce(&mut TableView, &[Category]) -> R) -> R {
        let mut guard = self.state.lock().await;
        let state = &mut *guard;
        change(&mut state.view, &state.rows)
    }

    pub async fn move_row(&self, from: usize, to: usize) -> bool {
        view::move_row(&mut self.state.lock().await.rows, from, to)
    }

    pub async fn move_row_by_id(&self, active: CategoryId, over: CategoryId) -> bool {
        view::move_row_by_id(&mut self.state.lock().await.rows, active, over)
    }
}

fn non_empty(message: Option<String>) -> Option<String> {
    message.filter(|message| !message.trim().is_empty())
}

#[cfg(test)]
#[path = "tests/categories_tests.rs"]
mod tests;
