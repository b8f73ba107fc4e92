use chrono::{DateTime, Utc};
use serde::Serialize;

use lighthouse_api::models::HistoryQuery;

/// One record of the backend's update log.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HistoryEntry {
    pub id: String,
    pub timestamp: Option<DateTime<Utc>>,
    pub timestamp_raw: String,
    pub container: Option<String>,
    pub action: String,
    pub trigger: Option<String>,
    pub status: String,
    pub message: Option<String>,
    /// Free-form extras (`image`, `latest_id`, `new_id`, ...).
    pub details: Option<serde_json::Value>,
}

/// Server-side filter for the history view. Unset fields are not sent.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HistoryFilter {
    pub action: Option<String>,
    pub status: Option<String>,
    pub limit: Option<u32>,
}

impl HistoryFilter {
    pub(crate) fn to_query(&self) -> HistoryQuery {
        HistoryQuery {
            action: self.action.clone(),
            status: self.status.clone(),
            limit: self.limit,
        }
    }
}
