// ── Core error types ──
//
// User-facing errors from lighthouse-core. The `From<lighthouse_api::Error>`
// impl folds every transport failure into `Transport`, keeping the server's
// message and status. Local rejections (`Conflict`, `Validation`) are raised
// before any request goes out.

use thiserror::Error;

/// Which settings section a validation failure belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display)]
pub enum ValidationScope {
    #[strum(to_string = "settings")]
    Settings,
    #[strum(to_string = "registry")]
    Registry,
    #[strum(to_string = "SMTP")]
    Smtp,
    #[strum(to_string = "backup")]
    Backup,
}

/// Why a per-container operation was refused locally.
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display)]
pub enum ConflictReason {
    #[strum(to_string = "container is excluded from updates")]
    Excluded,
    #[strum(to_string = "a check is already in progress")]
    CheckInFlight,
    #[strum(to_string = "an update is already in progress")]
    UpdateInFlight,
    #[strum(to_string = "an exclusion change is already in progress")]
    ToggleInFlight,
}

/// Unified error type for the core crate.
#[derive(Debug, Error)]
pub enum CoreError {
    // ── Transport errors ─────────────────────────────────────────────
    /// Network failure or non-2xx response. Never retried automatically.
    #[error("{message}")]
    Transport {
        message: String,
        status: Option<u16>,
    },

    // ── Local rejections ─────────────────────────────────────────────
    #[error("Invalid {scope} settings: {message}")]
    Validation {
        scope: ValidationScope,
        message: String,
    },

    #[error("Cannot act on {id}: {reason}")]
    Conflict { id: String, reason: ConflictReason },

    #[error("Container not found: {identifier}")]
    ContainerNotFound { identifier: String },

    // ── Configuration errors ─────────────────────────────────────────
    #[error("Configuration error: {message}")]
    Config { message: String },

    // ── Internal errors ──────────────────────────────────────────────
    #[error("Internal error: {0}")]
    Internal(String),
}

impl CoreError {
    pub(crate) fn validation(scope: ValidationScope, message: impl Into<String>) -> Self {
        Self::Validation {
            scope,
            message: message.into(),
        }
    }

    pub(crate) fn conflict(id: &str, reason: ConflictReason) -> Self {
        Self::Conflict {
            id: id.to_owned(),
            reason,
        }
    }

    /// HTTP status of a transport failure, if the server answered.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Transport { status, .. } => *status,
            _ => None,
        }
    }

    /// Re-scope a server rejection as a validation failure. Network
    /// errors (no status) stay transport errors.
    pub(crate) fn into_validation(self, scope: ValidationScope) -> Self {
        match self {
            Self::Transport {
                message,
                status: Some(_),
            } => Self::Validation { scope, message },
            other => other,
        }
    }
}

// ── Conversion from transport-layer errors ───────────────────────────

impl From<lighthouse_api::Error> for CoreError {
    fn from(err: lighthouse_api::Error) -> Self {
        match err {
            lighthouse_api::Error::InvalidUrl(e) => CoreError::Config {
                message: format!("Invalid URL: {e}"),
            },
            lighthouse_api::Error::Tls(message) => CoreError::Config {
                message: format!("TLS error: {message}"),
            },
            other => CoreError::Transport {
                message: other.message(),
                status: other.status(),
            },
        }
    }
}
