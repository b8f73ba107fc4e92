use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Serialize, Serializer};

use super::update::UpdateCheck;

/// Engine lifecycle state. Unrecognized values are kept verbatim.
#[derive(Debug, Clone, PartialEq, Eq, strum::EnumString)]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum ContainerState {
    Running,
    Created,
    Restarting,
    Paused,
    Exited,
    Dead,
    Removing,
    #[strum(default)]
    Other(String),
}

impl ContainerState {
    pub fn as_str(&self) -> &str {
        match self {
            Self::Running => "running",
            Self::Created => "created",
            Self::Restarting => "restarting",
            Self::Paused => "paused",
            Self::Exited => "exited",
            Self::Dead => "dead",
            Self::Removing => "removing",
            Self::Other(s) => s,
        }
    }

    pub fn is_running(&self) -> bool {
        matches!(self, Self::Running)
    }
}

impl Serialize for ContainerState {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl fmt::Display for ContainerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One managed container as of the latest snapshot.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Container {
    pub id: String,
    pub short_id: String,
    pub name: String,
    pub image: String,
    pub state: ContainerState,
    /// Human status line from the engine, e.g. "Up 2 hours".
    pub status: String,
    /// Parsed creation time, when the server sent something parseable.
    pub created: Option<DateTime<Utc>>,
    /// Creation time exactly as sent.
    pub created_raw: Option<String>,
    pub excluded: bool,
    /// Last check result cached by the server.
    pub server_check: Option<UpdateCheck>,
}

impl Container {
    /// Creation time for display: UTC when parsed, the raw text otherwise.
    pub fn created_display(&self) -> String {
        match (&self.created, &self.created_raw) {
            (Some(ts), _) => ts.format("%Y-%m-%d %H:%M:%S UTC").to_string(),
            (None, Some(raw)) => raw.clone(),
            (None, None) => "Unknown".into(),
        }
    }
}
