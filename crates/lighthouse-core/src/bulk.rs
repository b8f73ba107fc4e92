// ── Bulk "check & update all" orchestration ──
//
// At most one run is in flight. A run calls the bulk endpoint, fans its
// rows out to the entity registry and refreshes the container list exactly
// once, whether the call succeeded or not.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use tokio::sync::watch;
use tracing::{debug, info, warn};

use lighthouse_api::ApiClient;

use crate::entity::EntityRegistry;
use crate::error::CoreError;
use crate::model::{BulkResult, Container};
use crate::store::Poller;

/// Observable state of the bulk trigger.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum BulkState {
    #[default]
    Idle,
    Running,
    Completed(Arc<BulkResult>),
    /// The bulk call itself failed; no per-container rows were applied.
    Failed(String),
}

/// Result of asking for a bulk run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BulkRun {
    Completed(Arc<BulkResult>),
    /// Another run was already in flight; nothing was sent.
    AlreadyRunning,
}

pub struct BulkOrchestrator {
    running: AtomicBool,
    state: watch::Sender<BulkState>,
}

/// Clears the in-flight flag when the run ends, however it ends.
struct RunGuard<'a>(&'a AtomicBool);

impl Drop for RunGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

impl BulkOrchestrator {
    pub(crate) fn new() -> Self {
        let (state, _) = watch::channel(BulkState::Idle);
        Self {
            running: AtomicBool::new(false),
            state,
        }
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }

    pub fn state(&self) -> BulkState {
        self.state.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<BulkState> {
        self.state.subscribe()
    }

    fn try_acquire(&self) -> Option<RunGuard<'_>> {
        self.running
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| RunGuard(&self.running))
    }

    pub(crate) async fn run(
        &self,
        client: &ApiClient,
        entities: &EntityRegistry,
        containers: &Poller<Vec<Container>>,
    ) -> Result<BulkRun, CoreError> {
        let Some(_guard) = self.try_acquire() else {
            debug!("bulk update already running, ignoring trigger");
            return Ok(BulkRun::AlreadyRunning);
        };

        self.state.send_replace(BulkState::Running);
        info!("bulk update started");

        let outcome = match client.update_all().await {
            Ok(raw) => {
                let result = Arc::new(BulkResult::from(raw));
                let applied = entities.apply_bulk(&result.rows);
                info!(
                    updated = result.summary.updated,
                    up_to_date = result.summary.up_to_date,
                    skipped = result.summary.skipped,
                    errors = result.summary.errors,
                    applied,
                    "bulk update finished"
                );
                self.state
                    .send_replace(BulkState::Completed(Arc::clone(&result)));
                Ok(BulkRun::Completed(result))
            }
            Err(e) => {
                let err = CoreError::from(e);
                warn!(error = %err, "bulk update failed");
                self.state.send_replace(BulkState::Failed(err.to_string()));
                Err(err)
            }
        };

        if let Err(e) = containers.refresh().await {
            warn!(error = %e, "container refresh after bulk update failed");
        }
        outcome
    }
}
