// cmlkit-api: Async Rust client for the lab-orchestration controller REST API

pub mod auth;
pub mod client;
pub mod error;
pub mod executor;
pub mod interfaces;
pub mod labs;
pub mod links;
pub mod models;
pub mod nodes;
pub mod session;
pub mod system;
pub mod transport;
pub mod users;
pub mod version;

pub use auth::{AuthResponse, Credentials};
pub use client::{ApiClient, CallPhase};
pub use error::Error;
pub use executor::{ApiRequest, Outcome, RequestExecutor};
pub use session::SessionState;
pub use transport::{TlsMode, TransportConfig};
pub use version::ControllerVersion;
