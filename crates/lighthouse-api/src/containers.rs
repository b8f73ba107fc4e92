// Container endpoints
//
// Listing, per-container check/update/exclusion, and the bulk update-all
// action. A null body on any of these maps to the endpoint's empty value.

use tracing::debug;

use crate::client::ApiClient;
use crate::error::Error;
use crate::models::{
    BulkResponse, CheckUpdateResponse, ContainerSummary, ExclusionAck, ExclusionRequest,
    UpdateResponse,
};

impl ApiClient {
    /// List every container the backend knows about.
    ///
    /// `GET /containers`
    pub async fn list_containers(&self) -> Result<Vec<ContainerSummary>, Error> {
        let url = self.api_url("containers")?;
        debug!("listing containers");
        Ok(self.get(url).await?.unwrap_or_default())
    }

    /// Probe one container's image for a newer version.
    ///
    /// `POST /containers/{id}/check-update`
    pub async fn check_update(&self, id: &str) -> Result<CheckUpdateResponse, Error> {
        let url = self.api_url(&format!("containers/{}/check-update", encode(id)))?;
        debug!(id, "checking for update");
        Ok(self.post_empty(url).await?.unwrap_or_default())
    }

    /// Recreate one container on its newest image.
    ///
    /// `POST /containers/{id}/update`
    pub async fn update_container(&self, id: &str) -> Result<UpdateResponse, Error> {
        let url = self.api_url(&format!("containers/{}/update", encode(id)))?;
        debug!(id, "updating container");
        Ok(self.post_empty(url).await?.unwrap_or_default())
    }

    /// Check and update every eligible container in one request.
    ///
    /// `POST /containers/update-all`
    pub async fn update_all(&self) -> Result<BulkResponse, Error> {
        let url = self.api_url("containers/update-all")?;
        debug!("updating all containers");
        Ok(self.post_empty(url).await?.unwrap_or_default())
    }

    /// Opt a container in or out of updates.
    ///
    /// `POST /containers/{id}/exclusion`. Returns `None` when the server
    /// acknowledged without a body.
    pub async fn set_exclusion(
        &self,
        id: &str,
        excluded: bool,
    ) -> Result<Option<ExclusionAck>, Error> {
        let url = self.api_url(&format!("containers/{}/exclusion", encode(id)))?;
        debug!(id, excluded, "setting exclusion");
        self.post(url, &ExclusionRequest { excluded }).await
    }
}

fn encode(segment: &str) -> std::borrow::Cow<'_, str> {
    urlencoding::encode(segment)
}
