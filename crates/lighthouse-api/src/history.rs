// Update history endpoints

use serde_json::Value;
use tracing::debug;

use crate::client::ApiClient;
use crate::error::Error;
use crate::models::{HistoryEntry, HistoryQuery};

impl ApiClient {
    /// Fetch history entries, newest first, filtered server-side.
    ///
    /// `GET /history?action=&status=&limit=`; unset filters are omitted.
    pub async fn list_history(&self, query: &HistoryQuery) -> Result<Vec<HistoryEntry>, Error> {
        let mut url = self.api_url("history")?;
        {
            let mut pairs = url.query_pairs_mut();
            if let Some(action) = query.action.as_deref().filter(|s| !s.is_empty()) {
                pairs.append_pair("action", action);
            }
            if let Some(status) = query.status.as_deref().filter(|s| !s.is_empty()) {
                pairs.append_pair("status", status);
            }
            if let Some(limit) = query.limit.filter(|l| *l > 0) {
                pairs.append_pair("limit", &limit.to_string());
            }
        }
        if url.query() == Some("") {
            url.set_query(None);
        }
        debug!(?query, "listing history");
        Ok(self.get(url).await?.unwrap_or_default())
    }

    /// Purge the whole history log.
    ///
    /// `DELETE /history`
    pub async fn clear_history(&self) -> Result<(), Error> {
        let url = self.api_url("history")?;
        debug!("clearing history");
        self.delete::<Value>(url).await?;
        Ok(())
    }
}
