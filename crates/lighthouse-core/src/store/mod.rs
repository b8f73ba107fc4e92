// ── Reactive resource storage ──
//
// `ResourceCell` is the single writer for one polled resource; `Poller`
// drives it from a fetch function and an optional timer.

mod cell;
mod poller;

pub(crate) use cell::ResourceCell;
pub use cell::{Completion, ResourceState};
pub use poller::Poller;
