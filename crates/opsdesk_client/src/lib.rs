//! Remote binding of the OpsDesk record stores.
//!
//! [`RemoteIncidentStore`] and [`RemoteRunbookStore`] implement the same
//! store traits as the embedded services, so callers can swap one for the
//! other without changing their code.

pub mod config;
pub mod remote;
mod transport;

pub use config::{ClientConfig, BASE_URL_ENV, DEFAULT_BASE_URL, DEFAULT_TIMEOUT};
pub use remote::{connect, RemoteIncidentStore, RemoteRunbookStore};
pub use transport::API_PREFIX;
