//! Resolve the `DashboardConfig` for one invocation: profile from the
//! config file, then CLI flag overrides.

use std::time::Duration;

use lighthouse_config::{self as config, Config, Profile};
use lighthouse_core::{DashboardConfig, TlsVerification};

use crate::cli::GlobalOpts;
use crate::error::{self, CliError};

/// Name of the profile this invocation targets.
pub fn active_profile_name(global: &GlobalOpts, cfg: &Config) -> String {
    global
        .profile
        .clone()
        .or_else(|| cfg.default_profile.clone())
        .unwrap_or_else(|| "default".into())
}

/// Build a `DashboardConfig` from the config file, profile, and CLI overrides.
pub fn build_dashboard_config(global: &GlobalOpts) -> Result<DashboardConfig, CliError> {
    let cfg = config::load_config()?;
    let profile_name = active_profile_name(global, &cfg);

    let profile = match (cfg.profiles.get(&profile_name), &global.server) {
        (Some(profile), _) => profile.clone(),
        // An explicitly requested profile must exist.
        (None, _) if global.profile.is_some() => {
            return Err(error::profile_not_found(&profile_name, &cfg));
        }
        (None, Some(_)) => Profile::default(),
        (None, None) => {
            return Err(CliError::NoConfig {
                path: config::config_path().display().to_string(),
            });
        }
    };

    resolve_profile(&profile, &cfg, global)
}

/// Apply `--server`, `--insecure` and `--timeout` on top of `profile`.
pub fn resolve_profile(
    profile: &Profile,
    cfg: &Config,
    global: &GlobalOpts,
) -> Result<DashboardConfig, CliError> {
    let mut profile = profile.clone();
    if let Some(server) = &global.server {
        profile.server.clone_from(server);
    }

    let mut dashboard = config::profile_to_dashboard_config(&profile, &cfg.defaults)?;
    if global.insecure {
        dashboard.tls = TlsVerification::DangerAcceptInvalid;
    }
    if let Some(secs) = global.timeout {
        dashboard.timeout = Duration::from_secs(secs);
    }
    tracing::debug!(url = %dashboard.url, "resolved server");
    Ok(dashboard)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use clap::Parser;

    use crate::cli::Cli;

    use super::*;

    fn global(args: &[&str]) -> GlobalOpts {
        let mut argv = vec!["lighthouse"];
        argv.extend_from_slice(args);
        argv.push("schedule");
        Cli::try_parse_from(argv).unwrap().global
    }

    #[test]
    fn flags_override_profile() {
        let profile = Profile {
            server: "http://nas.local:8000".into(),
            timeout: Some(10),
            ..Profile::default()
        };
        let opts = global(&["--server", "http://other:9000", "--timeout", "5", "-k"]);
        let resolved = resolve_profile(&profile, &Config::default(), &opts).unwrap();
        assert_eq!(resolved.url.as_str(), "http://other:9000/api");
        assert_eq!(resolved.timeout, Duration::from_secs(5));
        assert_eq!(resolved.tls, TlsVerification::DangerAcceptInvalid);
    }

    #[test]
    fn profile_values_survive_without_flags() {
        let profile = Profile {
            server: "https://nas.local".into(),
            timeout: Some(10),
            ..Profile::default()
        };
        let resolved = resolve_profile(&profile, &Config::default(), &global(&[])).unwrap();
        assert_eq!(resolved.url.as_str(), "https://nas.local/api");
        assert_eq!(resolved.timeout, Duration::from_secs(10));
        assert_eq!(resolved.tls, TlsVerification::SystemDefaults);
    }

    #[test]
    fn explicit_profile_name_wins() {
        let cfg = Config::default();
        assert_eq!(active_profile_name(&global(&["-p", "lab"]), &cfg), "lab");
        assert_eq!(active_profile_name(&global(&[]), &cfg), "default");
    }
}
