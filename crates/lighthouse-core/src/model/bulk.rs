use serde::Serialize;

/// Per-container result of a bulk run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, strum::Display, strum::IntoStaticStr)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum BulkRowStatus {
    Updated,
    UpToDate,
    Skipped,
    Error,
    /// A status this client does not understand; ignored on fan-out.
    Unknown,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BulkRow {
    pub id: String,
    pub name: String,
    pub status: BulkRowStatus,
    pub message: Option<String>,
    pub reason: Option<String>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct BulkSummary {
    pub updated: u32,
    pub up_to_date: u32,
    pub skipped: u32,
    pub errors: u32,
    pub total: u32,
}

/// Aggregate of one "check & update all" run.
///
/// Some rows failing is normal data, not an error: see [`failures`](Self::failures).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct BulkResult {
    pub summary: BulkSummary,
    pub rows: Vec<BulkRow>,
}

impl BulkResult {
    pub fn failures(&self) -> impl Iterator<Item = &BulkRow> {
        self.rows
            .iter()
            .filter(|row| row.status == BulkRowStatus::Error)
    }

    pub fn has_failures(&self) -> bool {
        self.failures().next().is_some()
    }
}
