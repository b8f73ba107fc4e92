//! Client-side sync and reconciliation layer for the Lighthouse dashboard.
//!
//! Sits between `lighthouse-api` and UI consumers (the CLI, or anything
//! that renders the container list):
//!
//! - **[`Dashboard`]** — Central facade. [`connect()`](Dashboard::connect)
//!   loads every polled resource and starts its timer;
//!   [`Dashboard::oneshot()`](Dashboard::oneshot) runs a single closure with
//!   all timers off, for one-off CLI invocations.
//!
//! - **[`Poller<T>`]** — Generic periodic fetcher over a single-writer cell.
//!   Every refresh is sequenced, so a slow response can never overwrite a
//!   fresher one. Readers get `Arc` snapshots or a [`ResourceStream`].
//!
//! - **[`EntityRegistry`]** — One [`EntityMachine`] per container, tracking
//!   check, update and exclusion requests. Reconciled against every applied
//!   container snapshot.
//!
//! - **[`BulkOrchestrator`]**, **[`SettingsSync`]**, **[`HistoryCursor`]** —
//!   the "update all" run, the versioned settings document, and the
//!   filterable update log.
//!
//! - **Domain model** ([`model`]) — Canonical types built from the wire
//!   format in `convert`.

pub mod bulk;
pub mod config;
pub mod convert;
pub mod dashboard;
pub mod entity;
pub mod error;
pub mod history;
pub mod model;
pub mod settings;
pub mod store;
pub mod stream;

// ── Primary re-exports ──────────────────────────────────────────────
pub use bulk::{BulkOrchestrator, BulkRun, BulkState};
pub use config::{DashboardConfig, PollIntervals, TlsVerification};
pub use dashboard::{ConnectionState, ContainerCard, Dashboard};
pub use entity::{ConfirmationToken, EntityMachine, EntityRegistry, EntityStatus};
pub use error::{ConflictReason, CoreError, ValidationScope};
pub use history::HistoryCursor;
pub use settings::{RegistryProvider, SettingsSync, smtp_probe};
pub use store::{Completion, Poller, ResourceState};
pub use stream::{ResourceStream, ResourceWatchStream};

pub use lighthouse_api::Download;

// Re-export model types at the crate root for ergonomics.
pub use model::{
    BackupFormat, BulkResult, BulkRow, BulkRowStatus, BulkSummary, Container, ContainerState,
    HistoryEntry, HistoryFilter, ImageDelta, ImageId, Schedule, Settings, SmtpProbe, UpdateCheck,
    UpdateOutcome,
};
