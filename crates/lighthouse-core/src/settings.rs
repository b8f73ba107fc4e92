// ── Settings synchronizer ──
//
// Caches the server's settings document in a `ResourceCell`. Every applied
// load or save bumps the cell version; a failed save leaves it untouched.
// A load or save overtaken by a newer one returns the cached document.
// Credential probes and backups are independent round trips that never
// write to the cache.

use std::sync::Arc;

use secrecy::{ExposeSecret, SecretString};
use tokio::sync::watch;
use tracing::{debug, info, warn};

use lighthouse_api::{ApiClient, Download};

use crate::error::{CoreError, ValidationScope};
use crate::model::{BackupFormat, Settings, SmtpProbe};
use crate::store::{Completion, ResourceCell, ResourceState};
use crate::stream::ResourceStream;

const VALIDATION_FAILED: &str = "Validation failed";

/// Container registry with stored pull credentials.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, strum::Display, strum::EnumString, strum::IntoStaticStr,
)]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum RegistryProvider {
    DockerHub,
    Ghcr,
}

impl RegistryProvider {
    pub fn as_str(self) -> &'static str {
        self.into()
    }

    /// Human-readable name.
    pub fn label(self) -> &'static str {
        match self {
            Self::DockerHub => "Docker Hub",
            Self::Ghcr => "GHCR",
        }
    }

    /// Username and token for this provider as held in `settings`.
    pub fn credentials(self, settings: &Settings) -> (Option<&str>, Option<&str>) {
        let (user, token) = match self {
            Self::DockerHub => (&settings.dockerhub_username, &settings.dockerhub_token),
            Self::Ghcr => (&settings.ghcr_username, &settings.ghcr_token),
        };
        (user.as_deref(), token.as_deref())
    }
}

/// Build an SMTP probe from the notification fields of `settings`.
pub fn smtp_probe(settings: &Settings) -> Result<SmtpProbe, CoreError> {
    let host = settings
        .smtp_host
        .as_deref()
        .map(str::trim)
        .filter(|h| !h.is_empty());
    let port = settings.smtp_port.filter(|p| *p != 0);
    let (Some(host), Some(port)) = (host, port) else {
        return Err(smtp_required());
    };
    Ok(SmtpProbe {
        host: host.to_owned(),
        port,
        username: settings.smtp_username.clone(),
        password: settings.smtp_password.clone(),
        use_tls: settings.smtp_use_tls,
    })
}

fn smtp_required() -> CoreError {
    CoreError::validation(ValidationScope::Smtp, "SMTP host and port are required.")
}

pub struct SettingsSync {
    client: ApiClient,
    cell: ResourceCell<Settings>,
}

impl SettingsSync {
    pub(crate) fn new(client: ApiClient) -> Self {
        Self {
            client,
            cell: ResourceCell::new("settings"),
        }
    }

    // ── Reads ────────────────────────────────────────────────────────

    pub fn snapshot(&self) -> Arc<ResourceState<Settings>> {
        self.cell.snapshot()
    }

    pub fn subscribe(&self) -> watch::Receiver<Arc<ResourceState<Settings>>> {
        self.cell.subscribe()
    }

    pub fn stream(&self) -> ResourceStream<Settings> {
        ResourceStream::new(self.subscribe())
    }

    /// Strictly increases with every applied load or save.
    pub fn version(&self) -> u64 {
        self.cell.snapshot().version
    }

    // ── Load / save ──────────────────────────────────────────────────

    /// Fetch the document. A null body loads the defaults.
    pub async fn load(&self) -> Result<Settings, CoreError> {
        let ticket = self.cell.begin();
        match self.client.get_settings().await {
            Ok(doc) => {
                let doc = doc.unwrap_or_default();
                let completion = self.cell.complete(ticket, Ok(doc.clone()));
                debug!(version = self.version(), "settings loaded");
                Ok(self.settled(completion, doc))
            }
            Err(e) => {
                let err = CoreError::from(e);
                self.cell.complete(ticket, Err(err.to_string()));
                Err(err)
            }
        }
    }

    /// Save `payload` and cache the server's canonical echo.
    ///
    /// A failed save leaves the cached document and version as they were
    /// and is only reported to the caller.
    pub async fn save(&self, payload: &Settings) -> Result<Settings, CoreError> {
        let ticket = self.cell.begin();
        match self.client.save_settings(payload).await {
            Ok(Some(echo)) => {
                let completion = self.cell.complete(ticket, Ok(echo.clone()));
                info!(version = self.version(), "settings saved");
                Ok(self.settled(completion, echo))
            }
            Ok(None) => {
                self.cell.abandon(ticket);
                debug!("save returned no document, reloading");
                self.load().await
            }
            Err(e) => {
                self.cell.abandon(ticket);
                let err = CoreError::from(e);
                warn!(error = %err, "settings save failed");
                Err(err)
            }
        }
    }

    fn settled(&self, completion: Completion, doc: Settings) -> Settings {
        match completion {
            Completion::Applied => doc,
            Completion::Stale => {
                debug!("settings result overtaken, returning cached document");
                self.cell
                    .snapshot()
                    .data
                    .as_deref()
                    .cloned()
                    .unwrap_or(doc)
            }
        }
    }

    // ── Credential probes ────────────────────────────────────────────

    /// Ask the backend to log in to `provider`. Returns the server's
    /// confirmation message.
    pub async fn validate_registry(
        &self,
        provider: RegistryProvider,
        username: &str,
        token: &SecretString,
    ) -> Result<String, CoreError> {
        if username.trim().is_empty() || token.expose_secret().trim().is_empty() {
            return Err(CoreError::validation(
                ValidationScope::Registry,
                format!("{} username and token are required.", provider.label()),
            ));
        }

        let resp = self
            .client
            .validate_registry(provider.as_str(), username, token)
            .await
            .map_err(|e| CoreError::from(e).into_validation(ValidationScope::Registry))?;
        if !resp.valid {
            return Err(CoreError::validation(
                ValidationScope::Registry,
                resp.message.unwrap_or_else(|| VALIDATION_FAILED.into()),
            ));
        }
        debug!(%provider, "registry credentials valid");
        Ok(resp
            .message
            .unwrap_or_else(|| "Credentials validated.".into()))
    }

    pub async fn validate_smtp(&self, probe: &SmtpProbe) -> Result<String, CoreError> {
        if probe.host.trim().is_empty() || probe.port == 0 {
            return Err(smtp_required());
        }

        let resp = self
            .client
            .validate_smtp(probe)
            .await
            .map_err(|e| CoreError::from(e).into_validation(ValidationScope::Smtp))?;
        if !resp.valid {
            return Err(CoreError::validation(
                ValidationScope::Smtp,
                resp.message.unwrap_or_else(|| VALIDATION_FAILED.into()),
            ));
        }
        Ok(resp.message.unwrap_or_else(|| "SMTP validated.".into()))
    }

    /// Validate the `provider` credentials held in `payload`, then save the
    /// whole document. Nothing is saved when validation fails.
    pub async fn save_registry_credentials(
        &self,
        provider: RegistryProvider,
        payload: &Settings,
    ) -> Result<Settings, CoreError> {
        let (username, token) = provider.credentials(payload);
        let token = SecretString::from(token.unwrap_or_default().to_owned());
        self.validate_registry(provider, username.unwrap_or_default(), &token)
            .await?;
        self.save(payload).await
    }

    // ── Backup ───────────────────────────────────────────────────────

    /// Download an encrypted backup of the server's settings.
    pub async fn export_backup(
        &self,
        password: &SecretString,
        format: BackupFormat,
    ) -> Result<Download, CoreError> {
        if password.expose_secret().is_empty() {
            return Err(CoreError::validation(
                ValidationScope::Backup,
                "Enter a password to encrypt the backup.",
            ));
        }
        let download = self.client.export_settings(password, format).await?;
        info!(bytes = download.bytes.len(), %format, "settings backup exported");
        Ok(download)
    }

    /// Decrypt a backup and return its settings merged over the defaults.
    ///
    /// The result is for review: it is neither saved nor cached.
    pub async fn import_backup(
        &self,
        password: &SecretString,
        content: &str,
    ) -> Result<Settings, CoreError> {
        if content.trim().is_empty() {
            return Err(CoreError::validation(
                ValidationScope::Backup,
                "Choose a backup file to import.",
            ));
        }
        if password.expose_secret().is_empty() {
            return Err(CoreError::validation(
                ValidationScope::Backup,
                "Enter the password used to encrypt the backup.",
            ));
        }
        let restored = self
            .client
            .import_settings(password, content)
            .await
            .map_err(|e| CoreError::from(e).into_validation(ValidationScope::Backup))?;
        info!("settings backup decrypted");
        Ok(restored.unwrap_or_default())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn provider_parses_wire_names() {
        assert_eq!(
            "dockerhub".parse::<RegistryProvider>().unwrap(),
            RegistryProvider::DockerHub
        );
        assert_eq!("GHCR".parse::<RegistryProvider>().unwrap(), RegistryProvider::Ghcr);
        assert!("quay".parse::<RegistryProvider>().is_err());
        assert_eq!(RegistryProvider::DockerHub.to_string(), "dockerhub");
    }

    #[test]
    fn provider_reads_its_own_fields() {
        let settings = Settings {
            ghcr_username: Some("octo".into()),
            ghcr_token: Some("t".into()),
            ..Settings::default()
        };
        assert_eq!(
            RegistryProvider::Ghcr.credentials(&settings),
            (Some("octo"), Some("t"))
        );
        assert_eq!(RegistryProvider::DockerHub.credentials(&settings), (None, None));
    }

    #[test]
    fn smtp_probe_requires_host_and_port() {
        let mut settings = Settings {
            smtp_host: Some("mail.example.com".into()),
            ..Settings::default()
        };
        let err = smtp_probe(&settings).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Invalid SMTP settings: SMTP host and port are required."
        );

        settings.smtp_port = Some(587);
        let probe = smtp_probe(&settings).unwrap();
        assert_eq!(probe.port, 587);
        assert!(probe.use_tls);
    }
}
