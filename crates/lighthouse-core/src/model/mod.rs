// ── Domain model ──
//
// Canonical types the rest of the crate and its consumers work with.
// Built from `lighthouse_api::models` in `crate::convert`.

pub mod bulk;
pub mod container;
pub mod history;
pub mod schedule;
pub mod update;

pub use bulk::{BulkResult, BulkRow, BulkRowStatus, BulkSummary};
pub use container::{Container, ContainerState};
pub use history::{HistoryEntry, HistoryFilter};
pub use schedule::Schedule;
pub use update::{ImageDelta, ImageId, UpdateCheck, UpdateOutcome};

// The settings document is flat and already canonical on the wire.
pub use lighthouse_api::models::{BackupFormat, Settings, SmtpProbe};
