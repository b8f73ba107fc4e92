// lighthouse-api: Async Rust client for the Lighthouse control API

pub mod client;
pub mod containers;
pub mod error;
pub mod history;
pub mod models;
pub mod schedule;
pub mod settings;
pub mod transport;

pub use client::{ApiClient, Download};
pub use error::Error;
pub use transport::{TlsMode, TransportConfig};
