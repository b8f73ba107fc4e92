// ── API-to-domain type conversions ──
//
// Bridges raw `lighthouse_api` response types into canonical
// `lighthouse_core::model` domain types. Each `From` impl parses strings
// into strong types and fills sensible defaults for missing optional data.

use chrono::{DateTime, NaiveDateTime, Utc};

use lighthouse_api::models::{
    BulkResponse, BulkRowStatus as WireRowStatus, CheckUpdateResponse, ContainerSummary,
    HistoryEntry as WireHistoryEntry, Schedule as WireSchedule, UpdateResponse,
};

use crate::model::{
    BulkResult, BulkRow, BulkRowStatus, BulkSummary, Container, ContainerState, HistoryEntry,
    ImageDelta, ImageId, Schedule, UpdateCheck, UpdateOutcome,
};

pub(crate) const DEFAULT_UPDATE_SUCCESS: &str = "Container updated successfully";
pub(crate) const DEFAULT_UPDATE_FAILURE: &str = "Update failed";

// ── Helpers ────────────────────────────────────────────────────────

/// Parse RFC 3339, or a naive ISO-8601 timestamp taken as UTC (the
/// scheduler emits `datetime.utcnow().isoformat()` style values).
pub(crate) fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc))
        .ok()
        .or_else(|| {
            NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f")
                .ok()
                .map(|naive| naive.and_utc())
        })
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|s| !s.trim().is_empty())
}

// ── Containers ─────────────────────────────────────────────────────

impl From<CheckUpdateResponse> for UpdateCheck {
    fn from(raw: CheckUpdateResponse) -> Self {
        if let Some(message) = non_empty(raw.error) {
            return UpdateCheck::Failed { message };
        }
        if raw.skipped {
            return UpdateCheck::Skipped {
                reason: non_empty(raw.reason).unwrap_or_else(|| "Skipped".into()),
            };
        }
        if raw.update_available {
            return UpdateCheck::Available(ImageDelta {
                current: raw.current_id.map(ImageId::new),
                latest: raw.latest_id.map(ImageId::new),
                image: raw.image,
            });
        }
        UpdateCheck::UpToDate
    }
}

impl From<ContainerSummary> for Container {
    fn from(raw: ContainerSummary) -> Self {
        let short_id = non_empty(raw.short_id)
            .unwrap_or_else(|| raw.id.chars().take(12).collect());
        let created_raw = non_empty(raw.created);
        let created = created_raw.as_deref().and_then(parse_timestamp);
        let state = raw
            .state
            .parse()
            .unwrap_or_else(|_| ContainerState::Other(raw.state.clone()));

        Container {
            id: raw.id,
            short_id,
            name: raw.name,
            image: raw.image,
            state,
            status: raw.status,
            created,
            created_raw,
            excluded: raw.excluded,
            server_check: raw.update_status.map(UpdateCheck::from),
        }
    }
}

impl From<UpdateResponse> for UpdateOutcome {
    fn from(raw: UpdateResponse) -> Self {
        if raw.success {
            UpdateOutcome::Success {
                message: non_empty(raw.message).unwrap_or_else(|| DEFAULT_UPDATE_SUCCESS.into()),
                new_id: non_empty(raw.new_id),
            }
        } else {
            UpdateOutcome::Failure {
                message: non_empty(raw.error)
                    .or_else(|| non_empty(raw.message))
                    .unwrap_or_else(|| DEFAULT_UPDATE_FAILURE.into()),
            }
        }
    }
}

// ── Bulk ───────────────────────────────────────────────────────────

impl From<WireRowStatus> for BulkRowStatus {
    fn from(raw: WireRowStatus) -> Self {
        match raw {
            WireRowStatus::Updated => Self::Updated,
            WireRowStatus::UpToDate => Self::UpToDate,
            WireRowStatus::Skipped => Self::Skipped,
            WireRowStatus::Error => Self::Error,
            WireRowStatus::Unknown => Self::Unknown,
        }
    }
}

impl From<BulkResponse> for BulkResult {
    fn from(raw: BulkResponse) -> Self {
        let summary = BulkSummary {
            updated: raw.summary.updated,
            up_to_date: raw.summary.up_to_date,
            skipped: raw.summary.skipped,
            errors: raw.summary.errors,
            total: raw.summary.total,
        };
        let rows = raw
            .results
            .into_iter()
            .map(|row| BulkRow {
                id: row.id,
                name: row.name,
                status: row.status.into(),
                message: non_empty(row.message),
                reason: non_empty(row.reason),
            })
            .collect();
        BulkResult { summary, rows }
    }
}

// ── History / schedule ─────────────────────────────────────────────

impl From<WireHistoryEntry> for HistoryEntry {
    fn from(raw: WireHistoryEntry) -> Self {
        HistoryEntry {
            id: raw.id,
            timestamp: parse_timestamp(&raw.timestamp),
            timestamp_raw: raw.timestamp,
            container: non_empty(raw.container),
            action: raw.action,
            trigger: non_empty(raw.trigger),
            status: raw.status,
            message: non_empty(raw.message),
            details: raw.details.filter(|d| !d.is_null()),
        }
    }
}

impl From<WireSchedule> for Schedule {
    fn from(raw: WireSchedule) -> Self {
        Schedule {
            last_check: raw.last_check_time.as_deref().and_then(parse_timestamp),
            next_check: raw.next_check_time.as_deref().and_then(parse_timestamp),
            interval_minutes: raw.interval_minutes,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    fn summary(id: &str) -> ContainerSummary {
        ContainerSummary {
            id: id.into(),
            short_id: None,
            name: "web".into(),
            image: "nginx:latest".into(),
            status: "Up 2 hours".into(),
            state: "running".into(),
            created: Some("2024-05-01T10:00:00Z".into()),
            excluded: false,
            update_status: None,
        }
    }

    #[test]
    fn container_fills_short_id_and_parses_state() {
        let c = Container::from(summary("0123456789abcdef"));
        assert_eq!(c.short_id, "0123456789ab");
        assert_eq!(c.state, ContainerState::Running);
        assert!(c.created.is_some());
    }

    #[test]
    fn unknown_state_is_preserved() {
        let mut raw = summary("c1");
        raw.state = "hibernating".into();
        let c = Container::from(raw);
        assert_eq!(c.state, ContainerState::Other("hibernating".into()));
        assert_eq!(c.state.to_string(), "hibernating");
    }

    #[test]
    fn unparseable_created_keeps_raw() {
        let mut raw = summary("c1");
        raw.created = Some("last tuesday".into());
        let c = Container::from(raw);
        assert!(c.created.is_none());
        assert_eq!(c.created_display(), "last tuesday");
    }

    #[test]
    fn check_error_in_body_is_failure() {
        let check = UpdateCheck::from(CheckUpdateResponse {
            error: Some("Failed to pull image: denied".into()),
            ..CheckUpdateResponse::default()
        });
        assert_eq!(
            check,
            UpdateCheck::Failed {
                message: "Failed to pull image: denied".into()
            }
        );
    }

    #[test]
    fn check_available_keeps_full_ids() {
        let check = UpdateCheck::from(CheckUpdateResponse {
            update_available: true,
            current_id: Some("sha256:aaaaaaaaaaaaaaaa".into()),
            latest_id: Some("sha256:bbbbbbbbbbbbbbbb".into()),
            image: Some("nginx:latest".into()),
            ..CheckUpdateResponse::default()
        });
        let UpdateCheck::Available(delta) = check else {
            panic!("expected Available");
        };
        assert_eq!(delta.latest.as_ref().unwrap().short(), "bbbbbbbbbbbb");
        assert_eq!(delta.latest.unwrap().as_str(), "sha256:bbbbbbbbbbbbbbbb");
    }

    #[test]
    fn update_success_defaults_message() {
        let outcome = UpdateOutcome::from(UpdateResponse {
            success: true,
            ..UpdateResponse::default()
        });
        assert_eq!(outcome.message(), DEFAULT_UPDATE_SUCCESS);
    }

    #[test]
    fn naive_scheduler_timestamps_parse_as_utc() {
        let ts = parse_timestamp("2024-05-01T10:00:00.123456").unwrap();
        assert_eq!(ts.to_rfc3339(), "2024-05-01T10:00:00.123456+00:00");
    }
}
