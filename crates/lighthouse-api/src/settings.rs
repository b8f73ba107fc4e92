// Settings, credential validation and backup endpoints

use chrono::Utc;
use secrecy::{ExposeSecret, SecretString};
use tracing::debug;

use crate::client::{ApiClient, Download};
use crate::error::Error;
use crate::models::{
    BackupFormat, ExportRequest, ImportRequest, ImportResponse, RegistryCredentials, Settings,
    SmtpProbe, ValidationResponse,
};

impl ApiClient {
    /// `GET /settings`. A null body yields `None` so callers can decide
    /// between defaults and a retry.
    pub async fn get_settings(&self) -> Result<Option<Settings>, Error> {
        let url = self.api_url("settings")?;
        debug!("fetching settings");
        self.get(url).await
    }

    /// `POST /settings`, returning the server's canonical document.
    pub async fn save_settings(&self, settings: &Settings) -> Result<Option<Settings>, Error> {
        let url = self.api_url("settings")?;
        debug!("saving settings");
        self.post(url, settings).await
    }

    /// `POST /registries/validate`
    pub async fn validate_registry(
        &self,
        provider: &str,
        username: &str,
        token: &SecretString,
    ) -> Result<ValidationResponse, Error> {
        let url = self.api_url("registries/validate")?;
        debug!(provider, username, "validating registry credentials");
        let body = RegistryCredentials {
            provider,
            username,
            token: token.expose_secret(),
        };
        Ok(self.post(url, &body).await?.unwrap_or(ValidationResponse {
            valid: true,
            message: None,
        }))
    }

    /// `POST /notifications/validate`
    pub async fn validate_smtp(&self, probe: &SmtpProbe) -> Result<ValidationResponse, Error> {
        let url = self.api_url("notifications/validate")?;
        debug!(host = %probe.host, port = probe.port, "validating SMTP settings");
        Ok(self.post(url, probe).await?.unwrap_or(ValidationResponse {
            valid: true,
            message: None,
        }))
    }

    /// Download an encrypted settings backup.
    ///
    /// `POST /settings/export`. When the server does not name the file, a
    /// timestamped `lighthouse-settings-backup-*` name is generated.
    pub async fn export_settings(
        &self,
        password: &SecretString,
        format: BackupFormat,
    ) -> Result<Download, Error> {
        let url = self.api_url("settings/export")?;
        debug!(%format, "exporting settings backup");
        let body = ExportRequest {
            password: password.expose_secret(),
            format,
        };
        let mut download = self.download(url, &body).await?;
        if download.filename.is_none() {
            download.filename = Some(default_backup_filename(format));
        }
        Ok(download)
    }

    /// Decrypt a backup on the server and return the settings it holds.
    ///
    /// `POST /settings/import`. Nothing is persisted server-side.
    pub async fn import_settings(
        &self,
        password: &SecretString,
        content: &str,
    ) -> Result<Option<Settings>, Error> {
        let url = self.api_url("settings/import")?;
        debug!(bytes = content.len(), "importing settings backup");
        let body = ImportRequest {
            password: password.expose_secret(),
            content,
        };
        let resp: Option<ImportResponse> = self.post(url, &body).await?;
        Ok(resp.and_then(|r| r.settings))
    }
}

/// `lighthouse-settings-backup-<UTC yyyymmddHHMMSS>.<ext>`
pub fn default_backup_filename(format: BackupFormat) -> String {
    format!(
        "lighthouse-settings-backup-{}.{}",
        Utc::now().format("%Y%m%d%H%M%S"),
        format.extension()
    )
}
