// ── Per-container state machine ──
//
// One `EntityMachine` per known container id. Transitions are plain
// synchronous methods; the dashboard performs the network round trip
// between a `begin_*` and the matching `finish_*`.

use serde::Serialize;

use crate::convert::{DEFAULT_UPDATE_FAILURE, DEFAULT_UPDATE_SUCCESS};
use crate::error::ConflictReason;
use crate::model::{BulkRow, BulkRowStatus, Container, ImageDelta, UpdateCheck, UpdateOutcome};

/// Where a container stands in the check/update cycle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, strum::IntoStaticStr)]
#[strum(serialize_all = "snake_case")]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum EntityStatus {
    Idle,
    Checking,
    UpToDate,
    UpdateAvailable(ImageDelta),
    /// Update in flight; `resume` is restored if it fails.
    Updating { resume: Box<EntityStatus> },
    Skipped { reason: String },
    Error { message: String },
}

impl EntityStatus {
    pub fn label(&self) -> &'static str {
        self.into()
    }

    pub fn is_in_flight(&self) -> bool {
        matches!(self, Self::Checking | Self::Updating { .. })
    }
}

impl From<UpdateCheck> for EntityStatus {
    fn from(check: UpdateCheck) -> Self {
        match check {
            UpdateCheck::UpToDate => Self::UpToDate,
            UpdateCheck::Available(delta) => Self::UpdateAvailable(delta),
            UpdateCheck::Skipped { reason } => Self::Skipped { reason },
            UpdateCheck::Failed { message } => Self::Error { message },
        }
    }
}

/// State of one container's client-side operations.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EntityMachine {
    id: String,
    name: String,
    status: EntityStatus,
    /// Authoritative, from the latest applied container snapshot.
    excluded: bool,
    /// An exclusion change is in flight.
    toggling: bool,
    outcome: Option<UpdateOutcome>,
    /// Last exclusion failure, shown until the next toggle.
    notice: Option<String>,
}

impl EntityMachine {
    pub(crate) fn new(container: &Container) -> Self {
        Self {
            id: container.id.clone(),
            name: container.name.clone(),
            status: EntityStatus::Idle,
            excluded: container.excluded,
            toggling: false,
            outcome: None,
            notice: None,
        }
    }

    // ── Accessors ────────────────────────────────────────────────────

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn status(&self) -> &EntityStatus {
        &self.status
    }

    pub fn excluded(&self) -> bool {
        self.excluded
    }

    pub fn toggling(&self) -> bool {
        self.toggling
    }

    pub fn outcome(&self) -> Option<&UpdateOutcome> {
        self.outcome.as_ref()
    }

    pub fn notice(&self) -> Option<&str> {
        self.notice.as_deref()
    }

    /// Any check, update or exclusion request outstanding.
    pub fn is_busy(&self) -> bool {
        self.status.is_in_flight() || self.toggling
    }

    // ── Guards ───────────────────────────────────────────────────────

    fn guard(&self) -> Result<(), ConflictReason> {
        if self.excluded {
            return Err(ConflictReason::Excluded);
        }
        self.idle_guard()
    }

    /// At most one request per entity, whatever its kind.
    fn idle_guard(&self) -> Result<(), ConflictReason> {
        match self.status {
            EntityStatus::Checking => return Err(ConflictReason::CheckInFlight),
            EntityStatus::Updating { .. } => return Err(ConflictReason::UpdateInFlight),
            _ => {}
        }
        if self.toggling {
            return Err(ConflictReason::ToggleInFlight);
        }
        Ok(())
    }

    /// Whether a check or update may start right now.
    pub fn eligible(&self) -> Result<(), ConflictReason> {
        self.guard()
    }

    // ── Check ────────────────────────────────────────────────────────

    pub(crate) fn begin_check(&mut self) -> Result<(), ConflictReason> {
        self.guard()?;
        self.status = EntityStatus::Checking;
        self.outcome = None;
        Ok(())
    }

    pub(crate) fn finish_check(&mut self, status: EntityStatus) {
        if matches!(self.status, EntityStatus::Checking) {
            self.status = status;
        }
    }

    // ── Update ───────────────────────────────────────────────────────

    pub(crate) fn begin_update(&mut self) -> Result<(), ConflictReason> {
        self.guard()?;
        let resume = std::mem::replace(&mut self.status, EntityStatus::Idle);
        self.status = EntityStatus::Updating {
            resume: Box::new(resume),
        };
        self.outcome = None;
        Ok(())
    }

    pub(crate) fn finish_update(&mut self, outcome: UpdateOutcome) {
        let previous = std::mem::replace(&mut self.status, EntityStatus::Idle);
        self.status = match (previous, outcome.is_success()) {
            (EntityStatus::Updating { .. }, true) => EntityStatus::Idle,
            (EntityStatus::Updating { resume }, false) => *resume,
            (other, _) => other,
        };
        self.outcome = Some(outcome);
    }

    // ── Exclusion ────────────────────────────────────────────────────

    pub(crate) fn begin_toggle(&mut self) -> Result<(), ConflictReason> {
        self.idle_guard()?;
        self.toggling = true;
        self.notice = None;
        Ok(())
    }

    pub(crate) fn finish_toggle(&mut self, notice: Option<String>) {
        self.toggling = false;
        self.notice = notice;
    }

    // ── Bulk fan-out ─────────────────────────────────────────────────

    /// Fold one bulk row into this machine. Returns `false` when the row
    /// was ignored (excluded, busy, or an unknown status).
    pub(crate) fn apply_bulk_row(&mut self, row: &BulkRow) -> bool {
        if self.excluded || self.is_busy() {
            return false;
        }
        match row.status {
            BulkRowStatus::Updated => {
                self.outcome = Some(UpdateOutcome::Success {
                    message: row
                        .message
                        .clone()
                        .unwrap_or_else(|| DEFAULT_UPDATE_SUCCESS.into()),
                    new_id: None,
                });
                self.status = EntityStatus::Idle;
            }
            BulkRowStatus::Error => {
                self.outcome = Some(UpdateOutcome::Failure {
                    message: row
                        .message
                        .clone()
                        .or_else(|| row.reason.clone())
                        .unwrap_or_else(|| DEFAULT_UPDATE_FAILURE.into()),
                });
            }
            BulkRowStatus::UpToDate => self.status = EntityStatus::UpToDate,
            BulkRowStatus::Skipped => {
                self.status = EntityStatus::Skipped {
                    reason: row
                        .reason
                        .clone()
                        .or_else(|| row.message.clone())
                        .unwrap_or_else(|| "Skipped".into()),
                };
            }
            BulkRowStatus::Unknown => return false,
        }
        true
    }

    // ── Reconciliation ───────────────────────────────────────────────

    /// Align with the latest snapshot of this container.
    pub(crate) fn sync(&mut self, container: &Container) {
        self.name.clone_from(&container.name);
        self.excluded = container.excluded;

        let server_says_current = container
            .server_check
            .as_ref()
            .is_some_and(|check| !check.is_available());
        if server_says_current && matches!(self.status, EntityStatus::UpdateAvailable(_)) {
            self.status = EntityStatus::Idle;
        }
    }

    /// Take over the settled state of the container this one replaced.
    pub(crate) fn inherit(&mut self, predecessor: &EntityMachine) {
        if !predecessor.status.is_in_flight() {
            self.status = predecessor.status.clone();
        }
        self.outcome.clone_from(&predecessor.outcome);
    }

    /// Fold in the result of an update that recreated this container. A
    /// machine with its own request in flight keeps its status.
    pub(crate) fn absorb(&mut self, predecessor: &EntityMachine) {
        if self.is_busy() {
            self.outcome.clone_from(&predecessor.outcome);
        } else {
            self.inherit(predecessor);
        }
    }

    pub(crate) fn rekey(&mut self, id: String) {
        self.id = id;
    }
}
