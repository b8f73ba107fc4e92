// ── Dashboard facade ──
//
// Owns the API client, the three pollers, the settings synchronizer, the
// entity registry and the bulk orchestrator. Per-container operations go
// through the registry's state machines; anything that changes the
// container list does so only by refreshing the containers poller.

use std::sync::Arc;
use std::time::Duration;

use futures_util::FutureExt;
use serde::Serialize;
use tokio::sync::watch;
use tracing::{debug, info, warn};

use lighthouse_api::{ApiClient, TlsMode, TransportConfig};

use crate::bulk::{BulkOrchestrator, BulkRun};
use crate::config::{DashboardConfig, TlsVerification};
use crate::entity::{ConfirmationToken, EntityMachine, EntityRegistry, EntityStatus};
use crate::error::{ConflictReason, CoreError};
use crate::history::HistoryCursor;
use crate::model::{Container, Schedule, UpdateCheck, UpdateOutcome};
use crate::settings::SettingsSync;
use crate::store::{Completion, Poller, ResourceState};

// ── ConnectionState ──────────────────────────────────────────────

/// Lifecycle of the background pollers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Disconnected,
    Connecting,
    Connected,
}

/// One container as shown in the list: snapshot plus local operation state.
#[derive(Debug, Clone, Serialize)]
pub struct ContainerCard {
    pub container: Container,
    pub entity: Option<EntityMachine>,
}

// ── Dashboard ────────────────────────────────────────────────────

/// Entry point for consumers.
///
/// Cheaply cloneable. [`connect()`](Self::connect) performs the initial
/// loads and starts the poll timers; [`oneshot()`](Self::oneshot) runs a
/// single closure with every timer disabled.
#[derive(Clone)]
pub struct Dashboard {
    inner: Arc<DashboardInner>,
}

struct DashboardInner {
    config: DashboardConfig,
    client: ApiClient,
    connection_state: watch::Sender<ConnectionState>,
    containers: Poller<Vec<Container>>,
    schedule: Poller<Schedule>,
    history: HistoryCursor,
    settings: SettingsSync,
    entities: Arc<EntityRegistry>,
    bulk: BulkOrchestrator,
}

impl Dashboard {
    /// Build the HTTP client and every resource. Does not touch the network.
    pub fn new(config: DashboardConfig) -> Result<Self, CoreError> {
        let transport = TransportConfig {
            tls: match &config.tls {
                TlsVerification::SystemDefaults => TlsMode::System,
                TlsVerification::CustomCa(path) => TlsMode::CustomCa(path.clone()),
                TlsVerification::DangerAcceptInvalid => TlsMode::DangerAcceptInvalid,
            },
            timeout: config.timeout,
        };
        let client = ApiClient::new(config.url.clone(), &transport)?;

        let entities = Arc::new(EntityRegistry::new());
        let containers = Poller::with_hook(
            "containers",
            {
                let client = client.clone();
                move || {
                    let client = client.clone();
                    async move {
                        client
                            .list_containers()
                            .await
                            .map(|raw| raw.into_iter().map(Container::from).collect::<Vec<_>>())
                            .map_err(CoreError::from)
                    }
                    .boxed()
                }
            },
            {
                let entities = Arc::clone(&entities);
                move |state: &ResourceState<Vec<Container>>| {
                    if let Some(list) = &state.data {
                        entities.reconcile(state.version, list);
                    }
                }
            },
        );
        let schedule = Poller::new("schedule", {
            let client = client.clone();
            move || {
                let client = client.clone();
                async move {
                    client
                        .get_schedule()
                        .await
                        .map(Schedule::from)
                        .map_err(CoreError::from)
                }
                .boxed()
            }
        });
        let (connection_state, _) = watch::channel(ConnectionState::Disconnected);

        Ok(Self {
            inner: Arc::new(DashboardInner {
                history: HistoryCursor::new(client.clone()),
                settings: SettingsSync::new(client.clone()),
                config,
                client,
                connection_state,
                containers,
                schedule,
                entities,
                bulk: BulkOrchestrator::new(),
            }),
        })
    }

    pub fn config(&self) -> &DashboardConfig {
        &self.inner.config
    }

    // ── Lifecycle ────────────────────────────────────────────────

    /// Start the poll timers, then load every timed resource once.
    ///
    /// Load failures are recorded in each resource's state and do not
    /// prevent the others from starting.
    pub async fn connect(&self) {
        self.inner
            .connection_state
            .send_replace(ConnectionState::Connecting);
        let poll = self.inner.config.poll;

        // Timers first: starting reopens each cell after a prior disconnect.
        self.inner.containers.start(poll.containers).await;
        self.inner.schedule.start(poll.schedule).await;
        self.inner.history.poller().start(poll.history).await;

        tokio::join!(
            initial_load(&self.inner.containers, poll.containers),
            initial_load(&self.inner.schedule, poll.schedule),
            initial_load(self.inner.history.poller(), poll.history),
            async {
                if !poll.is_manual() {
                    if let Err(e) = self.inner.settings.load().await {
                        warn!(error = %e, "initial settings load failed");
                    }
                }
            },
        );

        self.inner
            .connection_state
            .send_replace(ConnectionState::Connected);
        info!(url = %self.inner.config.url, "dashboard connected");
    }

    /// Stop every timer and discard results still in flight.
    pub async fn disconnect(&self) {
        self.inner.containers.shutdown().await;
        self.inner.schedule.shutdown().await;
        self.inner.history.poller().shutdown().await;
        self.inner
            .connection_state
            .send_replace(ConnectionState::Disconnected);
        debug!("dashboard disconnected");
    }

    /// Connect with all timers off, run `f`, disconnect.
    pub async fn oneshot<F, Fut, T>(config: DashboardConfig, f: F) -> Result<T, CoreError>
    where
        F: FnOnce(Dashboard) -> Fut,
        Fut: std::future::Future<Output = Result<T, CoreError>>,
    {
        let mut cfg = config;
        cfg.poll = crate::config::PollIntervals::MANUAL;

        let dashboard = Dashboard::new(cfg)?;
        dashboard.connect().await;
        let result = f(dashboard.clone()).await;
        dashboard.disconnect().await;
        result
    }

    pub fn connection_state(&self) -> watch::Receiver<ConnectionState> {
        self.inner.connection_state.subscribe()
    }

    // ── Read side ────────────────────────────────────────────────

    pub fn containers(&self) -> &Poller<Vec<Container>> {
        &self.inner.containers
    }

    pub fn schedule(&self) -> &Poller<Schedule> {
        &self.inner.schedule
    }

    pub fn history(&self) -> &HistoryCursor {
        &self.inner.history
    }

    pub fn settings(&self) -> &SettingsSync {
        &self.inner.settings
    }

    pub fn entities(&self) -> &EntityRegistry {
        &self.inner.entities
    }

    pub fn bulk(&self) -> &BulkOrchestrator {
        &self.inner.bulk
    }

    pub async fn refresh_containers(&self) -> Result<Completion, CoreError> {
        self.inner.containers.refresh().await
    }

    pub fn entity(&self, id: &str) -> Option<EntityMachine> {
        self.inner.entities.get(id)
    }

    /// Containers in snapshot order, each joined with its entity state.
    pub fn cards(&self) -> Vec<ContainerCard> {
        let state = self.inner.containers.snapshot();
        state
            .data
            .as_deref()
            .map(|list| {
                list.iter()
                    .map(|c| ContainerCard {
                        entity: self.inner.entities.get(&c.id),
                        container: c.clone(),
                    })
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Find a container in the current snapshot by id, name, or unique
    /// id prefix.
    pub fn resolve_container(&self, identifier: &str) -> Result<Container, CoreError> {
        let state = self.inner.containers.snapshot();
        let list = state.data.as_deref().map_or(&[][..], Vec::as_slice);
        let not_found = || CoreError::ContainerNotFound {
            identifier: identifier.to_owned(),
        };
        if identifier.is_empty() {
            return Err(not_found());
        }

        if let Some(c) = list
            .iter()
            .find(|c| c.id == identifier || c.name == identifier)
        {
            return Ok(c.clone());
        }
        let mut prefixed = list.iter().filter(|c| c.id.starts_with(identifier));
        match (prefixed.next(), prefixed.next()) {
            (Some(c), None) => Ok(c.clone()),
            _ => Err(not_found()),
        }
    }

    // ── Per-container operations ─────────────────────────────────

    fn begin(
        &self,
        id: &str,
        op: impl FnOnce(&mut EntityMachine) -> Result<(), ConflictReason>,
    ) -> Result<(), CoreError> {
        match self.inner.entities.update(id, op) {
            None => Err(CoreError::ContainerNotFound {
                identifier: id.to_owned(),
            }),
            Some(Err(reason)) => {
                debug!(id, %reason, "operation rejected");
                Err(CoreError::conflict(id, reason))
            }
            Some(Ok(())) => Ok(()),
        }
    }

    async fn refresh_after(&self, op: &'static str) {
        if let Err(e) = self.inner.containers.refresh().await {
            warn!(op, error = %e, "container refresh failed");
        }
    }

    /// Ask the backend whether a newer image exists for one container.
    ///
    /// Excluded or busy containers are rejected before any request is
    /// made. A failed probe leaves the entity in `Error` and is returned.
    pub async fn check_update(&self, id: &str) -> Result<EntityStatus, CoreError> {
        self.begin(id, EntityMachine::begin_check)?;
        debug!(id, "checking for update");

        let (status, result) = match self.inner.client.check_update(id).await {
            Ok(raw) => {
                let status = EntityStatus::from(UpdateCheck::from(raw));
                (status.clone(), Ok(status))
            }
            Err(e) => {
                let err = CoreError::from(e);
                let status = EntityStatus::Error {
                    message: err.to_string(),
                };
                (status, Err(err))
            }
        };
        debug!(id, status = status.label(), "check finished");
        self.inner.entities.update(id, |m| m.finish_check(status));
        result
    }

    /// First phase of an update: verify eligibility and hand out the token
    /// that [`confirm_update`](Self::confirm_update) requires.
    pub fn request_update(&self, id: &str) -> Result<ConfirmationToken, CoreError> {
        let machine = self
            .inner
            .entities
            .get(id)
            .ok_or_else(|| CoreError::ContainerNotFound {
                identifier: id.to_owned(),
            })?;
        machine
            .eligible()
            .map_err(|reason| CoreError::conflict(id, reason))?;
        Ok(ConfirmationToken::new(
            id.to_owned(),
            machine.name().to_owned(),
        ))
    }

    /// Second phase: recreate the container.
    ///
    /// Eligibility is checked again. A transport failure is returned as an
    /// error; a server-reported failure comes back as
    /// [`UpdateOutcome::Failure`]. The container list is refreshed either way.
    pub async fn confirm_update(&self, token: ConfirmationToken) -> Result<UpdateOutcome, CoreError> {
        let id = token.id().to_owned();
        self.begin(&id, EntityMachine::begin_update)?;
        info!(id, name = token.name(), "updating container");

        let (outcome, error) = match self.inner.client.update_container(&id).await {
            Ok(raw) => (UpdateOutcome::from(raw), None),
            Err(e) => {
                let err = CoreError::from(e);
                let outcome = UpdateOutcome::Failure {
                    message: err.to_string(),
                };
                (outcome, Some(err))
            }
        };

        match &outcome {
            UpdateOutcome::Success { message, .. } => info!(id, detail = %message, "update succeeded"),
            UpdateOutcome::Failure { message } => warn!(id, detail = %message, "update failed"),
        }
        let new_id = match &outcome {
            UpdateOutcome::Success { new_id, .. } => new_id.clone(),
            UpdateOutcome::Failure { .. } => None,
        };
        let recorded = outcome.clone();
        self.inner.entities.update(&id, |m| m.finish_update(recorded));
        if let Some(new_id) = new_id {
            self.inner.entities.rekey(&id, &new_id);
        }

        self.refresh_after("update").await;
        match error {
            Some(err) => Err(err),
            None => Ok(outcome),
        }
    }

    /// Both update phases, with `gate` deciding in between. `Ok(None)` when
    /// the gate declined and nothing was sent.
    pub async fn update_with<G>(&self, id: &str, gate: G) -> Result<Option<UpdateOutcome>, CoreError>
    where
        G: FnOnce(&ConfirmationToken) -> bool,
    {
        let token = self.request_update(id)?;
        if !gate(&token) {
            debug!(id, "update declined");
            return Ok(None);
        }
        self.confirm_update(token).await.map(Some)
    }

    /// Include or exclude a container from updates.
    ///
    /// The container list is always refreshed afterwards; the displayed
    /// exclusion flag only ever comes from that snapshot. A failure is kept
    /// as the entity's notice and returned.
    pub async fn set_exclusion(&self, id: &str, excluded: bool) -> Result<(), CoreError> {
        self.begin(id, EntityMachine::begin_toggle)?;
        debug!(id, excluded, "setting exclusion");

        let result = self
            .inner
            .client
            .set_exclusion(id, excluded)
            .await
            .map(|_| ())
            .map_err(CoreError::from);
        let notice = result.as_ref().err().map(ToString::to_string);
        if let Some(message) = &notice {
            warn!(id, detail = %message, "exclusion change failed");
        }
        self.inner.entities.update(id, |m| m.finish_toggle(notice));

        self.refresh_after("exclusion").await;
        result
    }

    /// Run "check & update all". See [`BulkOrchestrator`].
    pub async fn update_all(&self) -> Result<BulkRun, CoreError> {
        self.inner
            .bulk
            .run(
                &self.inner.client,
                &self.inner.entities,
                &self.inner.containers,
            )
            .await
    }
}

async fn initial_load<T: Send + Sync + 'static>(poller: &Poller<T>, period: Duration) {
    if period.is_zero() {
        return;
    }
    if let Err(e) = poller.refresh().await {
        warn!(resource = poller.name(), error = %e, "initial load failed");
    }
}
