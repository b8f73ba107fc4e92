use chrono::{DateTime, Utc};
use serde::Serialize;

/// The backend scheduler's view of automatic checks. Read-only.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Schedule {
    pub last_check: Option<DateTime<Utc>>,
    pub next_check: Option<DateTime<Utc>>,
    pub interval_minutes: Option<u32>,
}
