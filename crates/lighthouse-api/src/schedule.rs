// Scheduler snapshot endpoint

use tracing::debug;

use crate::client::ApiClient;
use crate::error::Error;
use crate::models::Schedule;

impl ApiClient {
    /// Last and next automatic check times.
    ///
    /// `GET /schedule`
    pub async fn get_schedule(&self) -> Result<Schedule, Error> {
        let url = self.api_url("schedule")?;
        debug!("fetching schedule");
        Ok(self.get(url).await?.unwrap_or_default())
    }
}
