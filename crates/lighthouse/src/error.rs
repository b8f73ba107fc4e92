//! CLI error types with miette diagnostics.
//!
//! Maps `CoreError` and `ConfigError` variants into user-facing errors with
//! actionable help text.

use miette::Diagnostic;
use thiserror::Error;

use lighthouse_config::ConfigError;
use lighthouse_core::{ConflictReason, CoreError};

/// Process exit codes.
pub mod exit_code {
    pub const GENERAL: i32 = 1;
    pub const USAGE: i32 = 2;
    pub const NOT_FOUND: i32 = 4;
    pub const CONFLICT: i32 = 6;
    pub const CONNECTION: i32 = 7;
}

#[derive(Debug, Error, Diagnostic)]
#[allow(unused_assignments)]
pub enum CliError {
    // ── Connection ───────────────────────────────────────────────────

    #[error("Could not reach the Lighthouse server: {message}")]
    #[diagnostic(
        code(lighthouse::connection_failed),
        help(
            "Check that the server is running and reachable.\n\
             Self-signed certificate? Try --insecure (-k) or set ca_cert in your profile."
        )
    )]
    ConnectionFailed { message: String },

    // ── Resources ────────────────────────────────────────────────────

    #[error("{resource_type} '{identifier}' not found")]
    #[diagnostic(
        code(lighthouse::not_found),
        help("Run: lighthouse {list_command} to see available {resource_type}s")
    )]
    NotFound {
        resource_type: String,
        identifier: String,
        list_command: String,
    },

    #[error("Cannot act on {identifier}: {reason}")]
    #[diagnostic(code(lighthouse::conflict), help("{hint}"))]
    Conflict {
        identifier: String,
        reason: String,
        hint: String,
    },

    // ── API ──────────────────────────────────────────────────────────

    #[error("Server error ({status}): {message}")]
    #[diagnostic(code(lighthouse::api_error))]
    ApiError { status: u16, message: String },

    #[error("{message}")]
    #[diagnostic(code(lighthouse::operation_failed))]
    OperationFailed { message: String },

    // ── Validation ───────────────────────────────────────────────────

    #[error("Invalid value for {field}: {reason}")]
    #[diagnostic(code(lighthouse::validation))]
    Validation { field: String, reason: String },

    // ── Configuration ────────────────────────────────────────────────

    #[error("Profile '{name}' not found in configuration")]
    #[diagnostic(
        code(lighthouse::profile_not_found),
        help(
            "Available profiles: {available}\n\
             Create one with: lighthouse config init"
        )
    )]
    ProfileNotFound { name: String, available: String },

    #[error("No Lighthouse server configured")]
    #[diagnostic(
        code(lighthouse::no_config),
        help(
            "Create a profile with: lighthouse config init\n\
             Or pass --server / set LIGHTHOUSE_SERVER.\n\
             Expected config at: {path}"
        )
    )]
    NoConfig { path: String },

    #[error(transparent)]
    #[diagnostic(code(lighthouse::config))]
    Config(Box<ConfigError>),

    // ── Interactive ──────────────────────────────────────────────────

    #[error("Operation '{action}' requires confirmation")]
    #[diagnostic(
        code(lighthouse::confirmation_required),
        help("Use --yes (-y) to skip confirmation in non-interactive contexts.")
    )]
    NonInteractiveRequiresYes { action: String },

    // ── IO / Serialization ────────────────────────────────────────────

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("Invalid JSON payload: {0}")]
    #[diagnostic(code(lighthouse::json), help("Check the JSON file contents and try again."))]
    Json(#[from] serde_json::Error),

    #[error("Internal error: {0}")]
    #[diagnostic(code(lighthouse::internal))]
    Internal(String),
}

impl CliError {
    /// Map this error to an exit code for process termination.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::ConnectionFailed { .. } => exit_code::CONNECTION,
            Self::NotFound { .. } | Self::ProfileNotFound { .. } => exit_code::NOT_FOUND,
            Self::Conflict { .. } => exit_code::CONFLICT,
            Self::Validation { .. } | Self::NonInteractiveRequiresYes { .. } => exit_code::USAGE,
            _ => exit_code::GENERAL,
        }
    }
}

fn conflict_hint(reason: ConflictReason) -> &'static str {
    match reason {
        ConflictReason::Excluded => "Include it again with: lighthouse containers include <container>",
        ConflictReason::CheckInFlight
        | ConflictReason::UpdateInFlight
        | ConflictReason::ToggleInFlight => "Wait for the running operation to finish and retry.",
    }
}

// ── CoreError → CliError mapping ─────────────────────────────────────

impl From<CoreError> for CliError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::Transport {
                message,
                status: Some(status),
            } => CliError::ApiError { status, message },

            CoreError::Transport {
                message,
                status: None,
            } => CliError::ConnectionFailed { message },

            CoreError::Validation { scope, message } => CliError::Validation {
                field: scope.to_string(),
                reason: message,
            },

            CoreError::Conflict { id, reason } => CliError::Conflict {
                identifier: id,
                reason: reason.to_string(),
                hint: conflict_hint(reason).into(),
            },

            CoreError::ContainerNotFound { identifier } => CliError::NotFound {
                resource_type: "container".into(),
                identifier,
                list_command: "containers list".into(),
            },

            CoreError::Config { message } => CliError::Validation {
                field: "config".into(),
                reason: message,
            },

            CoreError::Internal(message) => CliError::Internal(message),
        }
    }
}

/// `ProfileNotFound` listing the profiles that do exist in `cfg`.
pub fn profile_not_found(name: &str, cfg: &lighthouse_config::Config) -> CliError {
    let mut available: Vec<_> = cfg.profiles.keys().cloned().collect();
    available.sort();
    CliError::ProfileNotFound {
        name: name.into(),
        available: if available.is_empty() {
            "(none)".into()
        } else {
            available.join(", ")
        },
    }
}

// ── ConfigError → CliError mapping ───────────────────────────────────

impl From<ConfigError> for CliError {
    fn from(err: ConfigError) -> Self {
        match err {
            ConfigError::Validation { field, reason } => CliError::Validation { field, reason },
            ConfigError::ProfileNotFound { name } => CliError::ProfileNotFound {
                name,
                available: "see lighthouse config profiles".into(),
            },
            ConfigError::Io(e) => CliError::Io(e),
            other => CliError::Config(Box::new(other)),
        }
    }
}

#[cfg(test)]
mod tests {
    use lighthouse_core::ValidationScope;

    use super::*;

    #[test]
    fn status_decides_between_api_and_connection() {
        let api: CliError = CoreError::Transport {
            message: "Service Unavailable".into(),
            status: Some(503),
        }
        .into();
        assert_eq!(api.exit_code(), exit_code::GENERAL);

        let offline: CliError = CoreError::Transport {
            message: "connection refused".into(),
            status: None,
        }
        .into();
        assert_eq!(offline.exit_code(), exit_code::CONNECTION);
    }

    #[test]
    fn validation_keeps_scope_as_field() {
        let err: CliError = CoreError::Validation {
            scope: ValidationScope::Smtp,
            message: "SMTP host and port are required.".into(),
        }
        .into();
        assert_eq!(
            err.to_string(),
            "Invalid value for SMTP: SMTP host and port are required."
        );
        assert_eq!(err.exit_code(), exit_code::USAGE);
    }

    #[test]
    fn excluded_conflict_suggests_include() {
        let err: CliError = CoreError::Conflict {
            id: "c1".into(),
            reason: ConflictReason::Excluded,
        }
        .into();
        assert_eq!(err.exit_code(), exit_code::CONFLICT);
        let CliError::Conflict { hint, .. } = err else {
            panic!("expected Conflict");
        };
        assert!(hint.contains("containers include"));
    }
}
