// ── Runtime dashboard configuration ──
//
// These types describe *how* to reach a Lighthouse backend and how often to
// poll it. They never touch disk: the CLI constructs a `DashboardConfig`
// and hands it in.

use std::time::Duration;

use url::Url;

/// TLS verification strategy.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum TlsVerification {
    /// System CA store (strict).
    #[default]
    SystemDefaults,
    /// Custom CA certificate file.
    CustomCa(std::path::PathBuf),
    /// Skip verification (self-signed certs).
    DangerAcceptInvalid,
}

/// Poll cadence per resource. `Duration::ZERO` disables the timer; the
/// resource is then only refreshed on demand.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollIntervals {
    pub containers: Duration,
    pub schedule: Duration,
    pub history: Duration,
}

impl Default for PollIntervals {
    fn default() -> Self {
        Self {
            containers: Duration::from_secs(30),
            schedule: Duration::from_secs(30),
            history: Duration::from_secs(60),
        }
    }
}

impl PollIntervals {
    /// All timers off (one-shot CLI mode).
    pub const MANUAL: Self = Self {
        containers: Duration::ZERO,
        schedule: Duration::ZERO,
        history: Duration::ZERO,
    };

    pub fn is_manual(&self) -> bool {
        self.containers.is_zero() && self.schedule.is_zero() && self.history.is_zero()
    }
}

/// Configuration for one dashboard backend.
///
/// Built by the CLI, passed to `Dashboard`. Core never reads config files.
#[derive(Debug, Clone)]
pub struct DashboardConfig {
    /// API base URL including the prefix (e.g. `http://localhost:8000/api`).
    pub url: Url,
    pub tls: TlsVerification,
    /// Per-request timeout.
    pub timeout: Duration,
    pub poll: PollIntervals,
}

impl DashboardConfig {
    pub fn new(url: Url) -> Self {
        Self {
            url,
            tls: TlsVerification::default(),
            timeout: Duration::from_secs(30),
            poll: PollIntervals::default(),
        }
    }
}
