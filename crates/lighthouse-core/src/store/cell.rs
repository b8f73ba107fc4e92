// ── Single-writer resource cell ──
//
// Holds the latest snapshot of one polled resource behind a `watch`
// channel. Every refresh takes a `Ticket` with a monotonically increasing
// sequence number; a completion whose sequence is not newer than the last
// settled one is discarded, so an out-of-order response can never overwrite
// fresher data. A closed cell issues only stale tickets until reopened.
// All bookkeeping happens inside `send_if_modified`, which serializes
// writers.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tokio::sync::watch;
use tracing::trace;

/// Point-in-time view of one resource. Cheap to clone and share.
#[derive(Debug)]
pub struct ResourceState<T> {
    /// Last successfully fetched value. Kept across failed refreshes.
    pub data: Option<Arc<T>>,
    /// A refresh issued after the last settled one is still outstanding.
    pub loading: bool,
    /// Message of the most recent failed refresh; cleared by a success.
    pub error: Option<String>,
    /// Number of successful applications so far.
    pub version: u64,
    pub updated_at: Option<DateTime<Utc>>,
    issued: u64,
    settled: u64,
    closed: bool,
}

impl<T> ResourceState<T> {
    fn empty() -> Self {
        Self {
            data: None,
            loading: false,
            error: None,
            version: 0,
            updated_at: None,
            issued: 0,
            settled: 0,
            closed: false,
        }
    }

    /// Sequence number of the last settled refresh.
    pub fn generation(&self) -> u64 {
        self.settled
    }

    pub fn is_loaded(&self) -> bool {
        self.data.is_some()
    }

    fn next(&self) -> Self {
        Self {
            data: self.data.clone(),
            loading: self.loading,
            error: self.error.clone(),
            version: self.version,
            updated_at: self.updated_at,
            issued: self.issued,
            settled: self.settled,
            closed: self.closed,
        }
    }
}

/// Proof that a refresh was issued. Consumed by completion.
#[derive(Debug)]
#[must_use = "a ticket must be completed or abandoned"]
pub(crate) struct Ticket {
    seq: u64,
}

impl Ticket {
    pub(crate) fn seq(&self) -> u64 {
        self.seq
    }
}

/// What happened to a completed ticket.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Completion {
    /// The result became the current state.
    Applied,
    /// A newer refresh had already settled; the result was dropped.
    Stale,
}

pub(crate) struct ResourceCell<T: Send + Sync + 'static> {
    name: &'static str,
    state: watch::Sender<Arc<ResourceState<T>>>,
}

impl<T: Send + Sync + 'static> ResourceCell<T> {
    pub(crate) fn new(name: &'static str) -> Self {
        let (state, _) = watch::channel(Arc::new(ResourceState::empty()));
        Self { name, state }
    }

    pub(crate) fn name(&self) -> &'static str {
        self.name
    }

    pub(crate) fn snapshot(&self) -> Arc<ResourceState<T>> {
        self.state.borrow().clone()
    }

    pub(crate) fn subscribe(&self) -> watch::Receiver<Arc<ResourceState<T>>> {
        self.state.subscribe()
    }

    /// Issue a new refresh and mark the resource as loading. On a closed
    /// cell the ticket is already settled and its completion will be stale.
    pub(crate) fn begin(&self) -> Ticket {
        let mut seq = 0;
        self.state.send_if_modified(|current| {
            if current.closed {
                seq = current.settled;
                return false;
            }
            let mut next = current.next();
            next.issued += 1;
            next.loading = true;
            seq = next.issued;
            *current = Arc::new(next);
            true
        });
        trace!(resource = self.name, seq, "refresh issued");
        Ticket { seq }
    }

    /// Settle a ticket with its fetch result.
    pub(crate) fn complete(&self, ticket: Ticket, result: Result<T, String>) -> Completion {
        let mut completion = Completion::Stale;
        let mut result = Some(result);
        self.state.send_if_modified(|current| {
            if ticket.seq <= current.settled {
                return false;
            }
            let mut next = current.next();
            next.settled = ticket.seq;
            next.loading = next.issued > next.settled;
            match result.take() {
                Some(Ok(value)) => {
                    next.data = Some(Arc::new(value));
                    next.error = None;
                    next.version += 1;
                    next.updated_at = Some(Utc::now());
                }
                Some(Err(message)) => next.error = Some(message),
                None => {}
            }
            *current = Arc::new(next);
            completion = Completion::Applied;
            true
        });
        if completion == Completion::Stale {
            trace!(resource = self.name, seq = ticket.seq, "stale completion discarded");
        }
        completion
    }

    /// Settle a ticket without touching data or error.
    pub(crate) fn abandon(&self, ticket: Ticket) {
        self.state.send_if_modified(|current| {
            if ticket.seq <= current.settled {
                return false;
            }
            let mut next = current.next();
            next.settled = ticket.seq;
            next.loading = next.issued > next.settled;
            *current = Arc::new(next);
            true
        });
    }

    /// Install an authoritative local value as a new generation. Every
    /// outstanding refresh becomes stale. Ignored once closed.
    pub(crate) fn replace(&self, value: T) -> Completion {
        let mut completion = Completion::Stale;
        let mut value = Some(value);
        self.state.send_if_modified(|current| {
            let Some(value) = value.take() else {
                return false;
            };
            if current.closed {
                return false;
            }
            let mut next = current.next();
            next.issued += 1;
            next.settled = next.issued;
            next.loading = false;
            next.data = Some(Arc::new(value));
            next.error = None;
            next.version += 1;
            next.updated_at = Some(Utc::now());
            *current = Arc::new(next);
            completion = Completion::Applied;
            true
        });
        completion
    }

    /// Record an error that did not come from a refresh.
    pub(crate) fn fail(&self, message: String) {
        self.state.send_modify(|current| {
            let mut next = current.next();
            next.error = Some(message);
            *current = Arc::new(next);
        });
    }

    /// Settle everything outstanding and refuse new results until
    /// [`reopen`](Self::reopen).
    pub(crate) fn close(&self) {
        self.state.send_if_modified(|current| {
            if current.closed {
                return false;
            }
            let notify = current.loading;
            let mut next = current.next();
            next.settled = next.issued;
            next.loading = false;
            next.closed = true;
            *current = Arc::new(next);
            notify
        });
    }

    pub(crate) fn reopen(&self) {
        self.state.send_if_modified(|current| {
            if current.closed {
                let mut next = current.next();
                next.closed = false;
                *current = Arc::new(next);
            }
            false
        });
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn data(cell: &ResourceCell<Vec<&'static str>>) -> Vec<&'static str> {
        cell.snapshot()
            .data
            .as_deref()
            .cloned()
            .unwrap_or_default()
    }

    #[test]
    fn success_replaces_data_and_bumps_version() {
        let cell = ResourceCell::new("test");
        let ticket = cell.begin();
        assert!(cell.snapshot().loading);

        assert_eq!(cell.complete(ticket, Ok(vec!["a"])), Completion::Applied);
        let state = cell.snapshot();
        assert_eq!(data(&cell), vec!["a"]);
        assert!(!state.loading);
        assert_eq!(state.version, 1);
        assert!(state.updated_at.is_some());
    }

    #[test]
    fn failure_keeps_previous_data() {
        let cell = ResourceCell::new("test");
        let t1 = cell.begin();
        cell.complete(t1, Ok(vec!["a", "b"]));

        let t2 = cell.begin();
        cell.complete(t2, Err("boom".into()));

        let state = cell.snapshot();
        assert_eq!(data(&cell), vec!["a", "b"]);
        assert_eq!(state.error.as_deref(), Some("boom"));
        assert!(!state.loading);
        assert_eq!(state.version, 1);
    }

    #[test]
    fn out_of_order_completion_is_discarded() {
        let cell = ResourceCell::new("test");
        let older = cell.begin();
        let newer = cell.begin();

        assert_eq!(cell.complete(newer, Ok(vec!["new"])), Completion::Applied);
        assert_eq!(cell.complete(older, Ok(vec!["old"])), Completion::Stale);

        assert_eq!(data(&cell), vec!["new"]);
        assert_eq!(cell.snapshot().version, 1);
    }

    #[test]
    fn older_completion_applies_but_keeps_loading() {
        let cell = ResourceCell::new("test");
        let older = cell.begin();
        let newer = cell.begin();

        cell.complete(older, Ok(vec!["old"]));
        assert!(cell.snapshot().loading);

        cell.complete(newer, Ok(vec!["new"]));
        assert!(!cell.snapshot().loading);
        assert_eq!(data(&cell), vec!["new"]);
    }

    #[test]
    fn stale_failure_does_not_set_error() {
        let cell = ResourceCell::new("test");
        let older = cell.begin();
        let newer = cell.begin();
        cell.complete(newer, Ok(vec!["new"]));
        cell.complete(older, Err("late".into()));
        assert!(cell.snapshot().error.is_none());
    }

    #[test]
    fn replace_invalidates_in_flight_refreshes() {
        let cell = ResourceCell::new("test");
        let pending = cell.begin();
        cell.replace(vec![]);
        assert!(!cell.snapshot().loading);

        assert_eq!(cell.complete(pending, Ok(vec!["old"])), Completion::Stale);
        assert!(data(&cell).is_empty());
    }

    #[test]
    fn abandon_settles_without_change() {
        let cell = ResourceCell::new("test");
        let t1 = cell.begin();
        cell.complete(t1, Ok(vec!["a"]));
        let t2 = cell.begin();
        cell.abandon(t2);
        let state = cell.snapshot();
        assert!(!state.loading);
        assert_eq!(state.version, 1);
        assert!(state.error.is_none());
    }

    #[test]
    fn close_discards_late_completions() {
        let cell = ResourceCell::new("test");
        let pending = cell.begin();
        cell.close();
        assert!(!cell.snapshot().loading);
        assert_eq!(cell.complete(pending, Ok(vec!["late"])), Completion::Stale);
        assert!(cell.snapshot().data.is_none());
    }

    #[test]
    fn closed_cell_issues_stale_tickets_until_reopened() {
        let cell = ResourceCell::new("test");
        cell.close();

        let late = cell.begin();
        assert!(!cell.snapshot().loading);
        assert_eq!(cell.complete(late, Ok(vec!["late"])), Completion::Stale);
        assert_eq!(cell.replace(vec!["local"]), Completion::Stale);
        assert!(cell.snapshot().data.is_none());
        assert_eq!(cell.snapshot().version, 0);

        cell.reopen();
        let fresh = cell.begin();
        assert_eq!(cell.complete(fresh, Ok(vec!["fresh"])), Completion::Applied);
        assert_eq!(data(&cell), vec!["fresh"]);
    }

    #[tokio::test]
    async fn subscribers_see_each_application() {
        let cell = ResourceCell::new("test");
        let mut rx = cell.subscribe();
        let ticket = cell.begin();
        cell.complete(ticket, Ok(vec!["a"]));

        rx.changed().await.unwrap();
        let state = rx.borrow_and_update().clone();
        assert_eq!(state.data.as_deref().cloned().unwrap(), vec!["a"]);
    }
}
