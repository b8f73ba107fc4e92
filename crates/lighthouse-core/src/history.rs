// ── History cursor ──
//
// Polled update log with a server-side filter. Clearing is destructive:
// the local list is only emptied once the server confirms the purge.

use std::sync::Arc;

use futures_util::FutureExt;
use tokio::sync::watch;
use tracing::{info, warn};

use lighthouse_api::ApiClient;

use crate::error::CoreError;
use crate::model::{HistoryEntry, HistoryFilter};
use crate::store::{Completion, Poller};

pub struct HistoryCursor {
    client: ApiClient,
    filter: Arc<watch::Sender<HistoryFilter>>,
    poller: Poller<Vec<HistoryEntry>>,
}

impl HistoryCursor {
    pub(crate) fn new(client: ApiClient) -> Self {
        let (filter, _) = watch::channel(HistoryFilter::default());
        let filter = Arc::new(filter);

        let poller = Poller::new("history", {
            let client = client.clone();
            let filter = Arc::clone(&filter);
            move || {
                let client = client.clone();
                let query = filter.borrow().to_query();
                async move {
                    client
                        .list_history(&query)
                        .await
                        .map(|entries| entries.into_iter().map(HistoryEntry::from).collect::<Vec<_>>())
                        .map_err(CoreError::from)
                }
                .boxed()
            }
        });

        Self {
            client,
            filter,
            poller,
        }
    }

    pub fn poller(&self) -> &Poller<Vec<HistoryEntry>> {
        &self.poller
    }

    /// The filter the next refresh will send.
    pub fn filter(&self) -> HistoryFilter {
        self.filter.borrow().clone()
    }

    /// Refresh the log, first switching to `filter` when one is given.
    pub async fn refresh(&self, filter: Option<HistoryFilter>) -> Result<Completion, CoreError> {
        if let Some(filter) = filter {
            self.filter.send_replace(filter);
        }
        self.poller.refresh().await
    }

    /// Purge the server-side log.
    ///
    /// On success the cached list becomes empty and any refresh still in
    /// flight is discarded. On failure the entries stay and the error is
    /// recorded on the resource as well as returned.
    pub async fn clear(&self) -> Result<(), CoreError> {
        match self.client.clear_history().await {
            Ok(()) => {
                self.poller.replace(Vec::new());
                info!("history cleared");
                Ok(())
            }
            Err(e) => {
                let err = CoreError::from(e);
                warn!(error = %err, "history clear failed");
                self.poller.fail(err.to_string());
                Err(err)
            }
        }
    }
}
