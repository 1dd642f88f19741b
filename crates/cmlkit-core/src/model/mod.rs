// ── Unified domain model ──
//
// Canonical representation of the controller's lab object graph. The
// wire types in `cmlkit_api::models` are converted into these (see
// `crate::convert`); consumers only ever see the types below.

pub mod common;

pub mod interface;
pub mod lab;
pub mod link;
pub mod node;
pub mod user;

// ── Re-exports ──────────────────────────────────────────────────────

pub use common::ElementState;
pub use interface::Interface;
pub use lab::{Lab, LabGroup, LabHandle};
pub use link::{InterfaceRef, Link};
pub use node::{NamedConfig, Node, NodeConfiguration, NodeMap, SerialDevice};
pub use user::User;
