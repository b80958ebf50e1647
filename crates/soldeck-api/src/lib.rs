// soldeck-api: Thin async client for the Home Assistant REST API.
//
// Covers exactly the surfaces soldeck-core needs: entity state reads,
// service registry listing, and service invocation. No domain logic --
// the core crate decides what to read and when to push.

pub mod client;
pub mod error;
pub mod models;
pub mod transport;

pub use client::HaClient;
pub use error::Error;
pub use models::{EntityState, ServiceDomain};
pub use transport::{TlsMode, TransportConfig};
