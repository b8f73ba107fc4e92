use std::fmt;

use serde::Serialize;

/// A full image identifier (usually `sha256:<64 hex>`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct ImageId(String);

impl ImageId {
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// First 12 characters of the digest, without the `sha256:` prefix.
    pub fn short(&self) -> &str {
        let digest = self.0.strip_prefix("sha256:").unwrap_or(&self.0);
        digest.get(..12).unwrap_or(digest)
    }
}

impl fmt::Display for ImageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// What a check found when a newer image exists.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ImageDelta {
    pub current: Option<ImageId>,
    pub latest: Option<ImageId>,
    pub image: Option<String>,
}

/// Result of probing one container for a newer image.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "result", rename_all = "snake_case")]
pub enum UpdateCheck {
    UpToDate,
    Available(ImageDelta),
    /// The server declined to check (container excluded server-side).
    Skipped { reason: String },
    /// The server could not complete the probe.
    Failed { message: String },
}

impl UpdateCheck {
    pub fn is_available(&self) -> bool {
        matches!(self, Self::Available(_))
    }
}

/// Result of the last update attempt on one container.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "result", rename_all = "snake_case")]
pub enum UpdateOutcome {
    Success {
        message: String,
        new_id: Option<String>,
    },
    Failure {
        message: String,
    },
}

impl UpdateOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success { .. })
    }

    pub fn message(&self) -> &str {
        match self {
            Self::Success { message, .. } | Self::Failure { message } => message,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_strips_prefix_and_truncates() {
        let id = ImageId::new("sha256:0123456789abcdef0123");
        assert_eq!(id.short(), "0123456789ab");
        assert_eq!(id.as_str(), "sha256:0123456789abcdef0123");
    }

    #[test]
    fn short_keeps_short_ids() {
        assert_eq!(ImageId::new("abc").short(), "abc");
    }
}
