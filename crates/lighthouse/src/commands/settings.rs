//! Settings command handlers.

use std::path::{Path, PathBuf};

use secrecy::SecretString;

use lighthouse_core::{Dashboard, RegistryProvider, Settings, smtp_probe};

use crate::cli::{GlobalOpts, SettingsArgs, SettingsCommand, SettingsSetArgs, SmtpArgs};
use crate::error::CliError;
use crate::output;

use super::util;

const MASK: &str = "********";

/// Settings with every secret replaced by a mask, for display.
fn redacted(settings: &Settings) -> Settings {
    let mask = |v: &Option<String>| v.as_ref().map(|_| MASK.to_owned());
    Settings {
        smtp_password: mask(&settings.smtp_password),
        dockerhub_token: mask(&settings.dockerhub_token),
        ghcr_token: mask(&settings.ghcr_token),
        ..settings.clone()
    }
}

fn detail(s: &Settings) -> String {
    let opt = |v: &Option<String>| v.clone().unwrap_or_else(|| "-".into());
    [
        format!("Check interval:    {} min", s.check_interval_minutes),
        format!("Auto update:       {}", s.auto_update_enabled),
        format!("Image cleanup:     {}", s.cleanup_enabled),
        format!("Notifications:     {}", s.notifications_enabled),
        format!(
            "SMTP server:       {}:{}",
            opt(&s.smtp_host),
            s.smtp_port.map_or_else(|| "-".into(), |p| p.to_string())
        ),
        format!("SMTP user:         {}", opt(&s.smtp_username)),
        format!("SMTP from / to:    {} / {}", opt(&s.smtp_from), opt(&s.smtp_to)),
        format!("SMTP TLS:          {}", s.smtp_use_tls),
        format!("Docker Hub user:   {}", opt(&s.dockerhub_username)),
        format!("GHCR user:         {}", opt(&s.ghcr_username)),
    ]
    .join("\n")
}

fn print_settings(settings: &Settings, global: &GlobalOpts) {
    let shown = redacted(settings);
    let out = output::render_single(&global.output, &shown, detail, |s| {
        s.check_interval_minutes.to_string()
    });
    output::print_output(&out, global.quiet);
}

fn apply_set_args(mut settings: Settings, args: &SettingsSetArgs) -> Result<Settings, CliError> {
    if let Some(path) = &args.from_file {
        let value = util::read_json_file(path)?;
        settings = serde_json::from_value(value)?;
    }
    if let Some(minutes) = args.check_interval {
        if minutes == 0 {
            return Err(CliError::Validation {
                field: "check-interval".into(),
                reason: "must be at least 1 minute".into(),
            });
        }
        settings.check_interval_minutes = minutes;
    }
    if let Some(v) = args.auto_update {
        settings.auto_update_enabled = v;
    }
    if let Some(v) = args.cleanup {
        settings.cleanup_enabled = v;
    }
    if let Some(v) = args.notifications {
        settings.notifications_enabled = v;
    }
    Ok(settings)
}

fn apply_smtp_args(mut settings: Settings, args: SmtpArgs) -> Settings {
    if args.host.is_some() {
        settings.smtp_host = args.host;
    }
    if args.port.is_some() {
        settings.smtp_port = args.port;
    }
    if args.username.is_some() {
        settings.smtp_username = args.username;
    }
    if args.password.is_some() {
        settings.smtp_password = args.password;
    }
    if let Some(tls) = args.use_tls {
        settings.smtp_use_tls = tls;
    }
    settings
}

fn set_registry_credentials(
    settings: &mut Settings,
    provider: RegistryProvider,
    username: String,
    token: String,
) {
    match provider {
        RegistryProvider::DockerHub => {
            settings.dockerhub_username = Some(username);
            settings.dockerhub_token = Some(token);
        }
        RegistryProvider::Ghcr => {
            settings.ghcr_username = Some(username);
            settings.ghcr_token = Some(token);
        }
    }
}

pub async fn handle(
    dashboard: &Dashboard,
    args: SettingsArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    let sync = dashboard.settings();

    match args.command {
        SettingsCommand::Show => {
            let settings = sync.load().await?;
            print_settings(&settings, global);
            Ok(())
        }

        SettingsCommand::Set(set) => {
            let current = sync.load().await?;
            let payload = apply_set_args(current, &set)?;
            let saved = sync.save(&payload).await?;
            if !global.quiet {
                eprintln!("✓ Settings saved");
            }
            print_settings(&saved, global);
            Ok(())
        }

        SettingsCommand::ValidateRegistry {
            provider,
            username,
            token,
            save,
        } => {
            let mut settings = sync.load().await?;
            let (stored_user, stored_token) = provider.credentials(&settings);
            let username = username
                .or_else(|| stored_user.map(str::to_owned))
                .unwrap_or_default();
            let token = match (token, stored_token) {
                (Some(t), _) => t,
                (None, Some(t)) if !t.is_empty() => t.to_owned(),
                (None, _) => rpassword::prompt_password(format!("{} token: ", provider.label()))
                    .map_err(util::prompt_err)?,
            };

            if save {
                set_registry_credentials(&mut settings, provider, username, token);
                sync.save_registry_credentials(provider, &settings).await?;
                if !global.quiet {
                    eprintln!("✓ {} credentials validated and saved", provider.label());
                }
            } else {
                let message = sync
                    .validate_registry(provider, &username, &SecretString::from(token))
                    .await?;
                if !global.quiet {
                    eprintln!("✓ {message}");
                }
            }
            Ok(())
        }

        SettingsCommand::ValidateSmtp(smtp) => {
            let settings = apply_smtp_args(sync.load().await?, smtp);
            let probe = smtp_probe(&settings)?;
            let message = sync.validate_smtp(&probe).await?;
            if !global.quiet {
                eprintln!("✓ {message}");
            }
            Ok(())
        }

        SettingsCommand::Export {
            format,
            output_file,
            password,
        } => {
            let password = util::secret_or_prompt(password, "Backup password: ")?;
            let download = sync.export_backup(&password, format).await?;
            let path = output_file
                .or_else(|| {
                    // Only the final component of the advertised name.
                    download
                        .filename
                        .as_deref()
                        .and_then(|name| Path::new(name).file_name())
                        .map(PathBuf::from)
                })
                .unwrap_or_else(|| {
                    PathBuf::from(format!("lighthouse-settings-backup.{}", format.extension()))
                });
            std::fs::write(&path, &download.bytes)?;
            if !global.quiet {
                eprintln!("✓ Backup written to {}", path.display());
            }
            Ok(())
        }

        SettingsCommand::Import {
            file,
            password,
            save,
        } => {
            let content = std::fs::read_to_string(&file)?;
            let password = util::secret_or_prompt(password, "Backup password: ")?;
            let restored = sync.import_backup(&password, &content).await?;
            if save {
                let saved = sync.save(&restored).await?;
                if !global.quiet {
                    eprintln!("✓ Settings restored from {}", file.display());
                }
                print_settings(&saved, global);
            } else {
                print_settings(&restored, global);
                if !global.quiet {
                    eprintln!("Review the settings above, then re-run with --save to apply them.");
                }
            }
            Ok(())
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn secrets_are_masked() {
        let settings = Settings {
            smtp_password: Some("hunter2".into()),
            ghcr_username: Some("octo".into()),
            ghcr_token: Some("ghp_secret".into()),
            ..Settings::default()
        };
        let shown = redacted(&settings);
        assert_eq!(shown.smtp_password.as_deref(), Some(MASK));
        assert_eq!(shown.ghcr_token.as_deref(), Some(MASK));
        assert_eq!(shown.ghcr_username.as_deref(), Some("octo"));
        assert!(shown.dockerhub_token.is_none());
    }

    #[test]
    fn set_flags_patch_the_document() {
        let args = SettingsSetArgs {
            from_file: None,
            check_interval: Some(15),
            auto_update: Some(true),
            cleanup: None,
            notifications: None,
        };
        let patched = apply_set_args(Settings::default(), &args).unwrap();
        assert_eq!(patched.check_interval_minutes, 15);
        assert!(patched.auto_update_enabled);
        assert!(!patched.cleanup_enabled);
    }

    #[test]
    fn zero_interval_is_rejected() {
        let args = SettingsSetArgs {
            from_file: None,
            check_interval: Some(0),
            auto_update: None,
            cleanup: None,
            notifications: None,
        };
        assert!(matches!(
            apply_set_args(Settings::default(), &args),
            Err(CliError::Validation { .. })
        ));
    }
}
