//! Lab object graph layer between `cmlkit-api` and consumers.
//!
//! This crate owns the domain model and the lab-level logic of the
//! cmlkit workspace:
//!
//! - **[`Controller`]**: Central facade. Wraps one [`cmlkit_api::ApiClient`]
//!   (and with it the authenticated session) and exposes lab, node,
//!   interface, link, and user operations.
//!
//! - **Deep fetch** ([`Controller::lab_get`] with `deep = true`): Owner,
//!   topology, layer-3 addresses, and links are fetched concurrently; the
//!   layer-3 and link tasks wait on the topology before merging. A lab is
//!   returned complete or not at all.
//!
//! - **[`LabCache`]**: Optional lab id → [`LabHandle`] map. Shallow reads
//!   are served from it; fetches and writes refresh the cached lab in
//!   place so existing handles stay current.
//!
//! - **Domain model** ([`model`]): Canonical types (`Lab`, `Node`,
//!   `Interface`, `Link`, `User`) converted from the wire types in
//!   `cmlkit_api::models`.

mod assemble;
pub mod config;
pub mod controller;
pub mod convert;
pub mod error;
pub mod model;
pub mod store;

// ── Primary re-exports ──────────────────────────────────────────────
pub use config::{AuthCredentials, ControllerConfig, TlsVerification};
pub use controller::Controller;
pub use error::CoreError;
pub use store::LabCache;

// Re-export model types at the crate root for ergonomics.
pub use model::{
    ElementState, Interface, InterfaceRef, Lab, LabGroup, LabHandle, Link, NamedConfig, Node,
    NodeConfiguration, NodeMap, SerialDevice, User,
};
