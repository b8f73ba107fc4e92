// Control API wire types
//
// Request and response bodies exactly as the server speaks them. Fields use
// `#[serde(default)]` liberally because older servers omit optional keys.
// Domain-level types built from these live in `lighthouse-core`.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

// ── Containers ───────────────────────────────────────────────────────

/// One row of `GET /containers`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContainerSummary {
    pub id: String,
    #[serde(default)]
    pub short_id: Option<String>,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub image: String,
    /// Human status line, e.g. "Up 3 hours".
    #[serde(default)]
    pub status: String,
    /// Engine lifecycle state, e.g. "running", "exited".
    #[serde(default)]
    pub state: String,
    #[serde(default)]
    pub created: Option<String>,
    #[serde(default)]
    pub excluded: bool,
    /// Last check result cached by the server (manual check or scheduler).
    #[serde(default)]
    pub update_status: Option<CheckUpdateResponse>,
}

/// Body of `POST /containers/{id}/check-update`.
///
/// The server reports probe failures in-band through `error` with HTTP 200,
/// and excluded containers through `skipped` + `reason`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CheckUpdateResponse {
    #[serde(default)]
    pub update_available: bool,
    #[serde(default)]
    pub current_id: Option<String>,
    #[serde(default)]
    pub latest_id: Option<String>,
    #[serde(default)]
    pub image: Option<String>,
    #[serde(default)]
    pub skipped: bool,
    #[serde(default)]
    pub reason: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
}

/// Body of `POST /containers/{id}/update`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UpdateResponse {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub new_id: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ExclusionRequest {
    pub excluded: bool,
}

/// Body of `POST /containers/{id}/exclusion`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ExclusionAck {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub excluded: bool,
    #[serde(default)]
    pub excluded_containers: Vec<String>,
}

// ── Bulk update ──────────────────────────────────────────────────────

/// Body of `POST /containers/update-all`.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct BulkResponse {
    #[serde(default)]
    pub results: Vec<BulkRow>,
    #[serde(default)]
    pub summary: BulkSummary,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct BulkRow {
    pub id: String,
    #[serde(default)]
    pub name: String,
    pub status: BulkRowStatus,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub reason: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BulkRowStatus {
    Updated,
    UpToDate,
    Skipped,
    Error,
    #[serde(other)]
    Unknown,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
pub struct BulkSummary {
    #[serde(default)]
    pub updated: u32,
    #[serde(default)]
    pub up_to_date: u32,
    #[serde(default)]
    pub skipped: u32,
    #[serde(default)]
    pub errors: u32,
    #[serde(default)]
    pub total: u32,
}

// ── Settings ─────────────────────────────────────────────────────────

/// The flat settings document.
///
/// Keys the client does not model are kept in `extra` and written back
/// untouched on save.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub check_interval_minutes: u32,
    pub auto_update_enabled: bool,
    pub cleanup_enabled: bool,
    pub notifications_enabled: bool,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub smtp_host: Option<String>,
    #[serde(
        deserialize_with = "lenient_port",
        skip_serializing_if = "Option::is_none"
    )]
    pub smtp_port: Option<u16>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub smtp_username: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub smtp_password: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub smtp_from: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub smtp_to: Option<String>,
    pub smtp_use_tls: bool,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub dockerhub_username: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dockerhub_token: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ghcr_username: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ghcr_token: Option<String>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            check_interval_minutes: 60,
            auto_update_enabled: false,
            cleanup_enabled: false,
            notifications_enabled: false,
            smtp_host: None,
            smtp_port: None,
            smtp_username: None,
            smtp_password: None,
            smtp_from: None,
            smtp_to: None,
            smtp_use_tls: true,
            dockerhub_username: None,
            dockerhub_token: None,
            ghcr_username: None,
            ghcr_token: None,
            extra: Map::new(),
        }
    }
}

/// Accept `587`, `"587"`, `""` and `null` for the SMTP port.
fn lenient_port<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<u16>, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Port {
        Number(u16),
        Text(String),
    }

    match Option::<Port>::deserialize(deserializer)? {
        None => Ok(None),
        Some(Port::Number(n)) => Ok(Some(n)),
        Some(Port::Text(s)) if s.trim().is_empty() => Ok(None),
        Some(Port::Text(s)) => s
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| serde::de::Error::custom(format!("invalid SMTP port: {s:?}"))),
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct RegistryCredentials<'a> {
    pub provider: &'a str,
    pub username: &'a str,
    pub token: &'a str,
}

/// Body of `POST /notifications/validate`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SmtpProbe {
    pub host: String,
    pub port: u16,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
    pub use_tls: bool,
}

/// Reply of both validation endpoints.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct ValidationResponse {
    #[serde(default)]
    pub valid: bool,
    #[serde(default)]
    pub message: Option<String>,
}

// ── Backup ───────────────────────────────────────────────────────────

#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum BackupFormat {
    #[default]
    Json,
    #[strum(to_string = "yaml", serialize = "yml")]
    Yaml,
}

impl BackupFormat {
    pub fn extension(self) -> &'static str {
        match self {
            Self::Json => "json",
            Self::Yaml => "yaml",
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ExportRequest<'a> {
    pub password: &'a str,
    pub format: BackupFormat,
}

#[derive(Debug, Clone, Serialize)]
pub struct ImportRequest<'a> {
    pub password: &'a str,
    pub content: &'a str,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ImportResponse {
    #[serde(default)]
    pub settings: Option<Settings>,
}

// ── History ──────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub id: String,
    pub timestamp: String,
    pub action: String,
    pub status: String,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub container: Option<String>,
    #[serde(default)]
    pub trigger: Option<String>,
    #[serde(default)]
    pub details: Option<Value>,
}

/// Query string of `GET /history`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HistoryQuery {
    pub action: Option<String>,
    pub status: Option<String>,
    pub limit: Option<u32>,
}

// ── Schedule ─────────────────────────────────────────────────────────

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Schedule {
    #[serde(default)]
    pub last_check_time: Option<String>,
    #[serde(default)]
    pub next_check_time: Option<String>,
    #[serde(default)]
    pub interval_minutes: Option<u32>,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use pretty_assertions::assert_eq;
    use serde_json::json;

    use super::*;

    #[test]
    fn settings_port_accepts_strings_and_numbers() {
        let a: Settings = serde_json::from_value(json!({"smtp_port": "587"})).unwrap();
        let b: Settings = serde_json::from_value(json!({"smtp_port": 465})).unwrap();
        let c: Settings = serde_json::from_value(json!({"smtp_port": ""})).unwrap();
        assert_eq!(a.smtp_port, Some(587));
        assert_eq!(b.smtp_port, Some(465));
        assert_eq!(c.smtp_port, None);
    }

    #[test]
    fn settings_preserve_unknown_keys() {
        let raw = json!({
            "check_interval_minutes": 15,
            "excluded_containers": ["db"],
        });
        let settings: Settings = serde_json::from_value(raw).unwrap();
        assert_eq!(settings.check_interval_minutes, 15);
        assert_eq!(settings.extra.get("excluded_containers"), Some(&json!(["db"])));

        let back = serde_json::to_value(&settings).unwrap();
        assert_eq!(back["excluded_containers"], json!(["db"]));
    }

    #[test]
    fn settings_defaults_when_empty() {
        let settings: Settings = serde_json::from_value(json!({})).unwrap();
        assert_eq!(settings, Settings::default());
        assert_eq!(settings.check_interval_minutes, 60);
    }

    #[test]
    fn bulk_status_unknown_values_do_not_fail() {
        let row: BulkRow =
            serde_json::from_value(json!({"id": "c9", "status": "rebooting"})).unwrap();
        assert_eq!(row.status, BulkRowStatus::Unknown);
    }

    #[test]
    fn backup_format_parses_yml_alias() {
        assert_eq!("yml".parse::<BackupFormat>().unwrap(), BackupFormat::Yaml);
        assert_eq!("JSON".parse::<BackupFormat>().unwrap(), BackupFormat::Json);
        assert_eq!(BackupFormat::Yaml.to_string(), "yaml");
    }
}
