// ── Core error types ──
//
// User-facing errors from cmlkit-core. Raw transport details stay in
// `cmlkit_api::Error`; the `From` impl below translates them into
// domain-level variants while keeping the controller's wording.

use thiserror::Error;

/// Unified error type for the core crate.
#[derive(Debug, Clone, Error)]
pub enum CoreError {
    // ── Connection errors ────────────────────────────────────────────
    /// Controller unreachable, still booting, or of an unsupported version.
    #[error("{reason}")]
    SystemNotReady { reason: String },

    #[error("{message}")]
    AuthenticationFailed { message: String },

    // ── Data errors ──────────────────────────────────────────────────
    /// A lookup by id or label found nothing.
    #[error("element not found: {kind} {identifier}")]
    ElementNotFound { kind: String, identifier: String },

    #[error("Decode error: {message}")]
    Decode { message: String },

    // ── Operation errors ─────────────────────────────────────────────
    #[error("backend does not support named configs")]
    NoNamedConfigSupport,

    /// A deep-fetch task gave up because a sibling failed first.
    #[error("{task} task cancelled")]
    Cancelled { task: &'static str },

    // ── API errors (wrapped, not exposed raw) ────────────────────────
    #[error("status: {status}, {message}")]
    Api { status: u16, message: String },

    // ── Configuration errors ─────────────────────────────────────────
    #[error("Configuration error: {message}")]
    Config { message: String },

    // ── Internal errors ──────────────────────────────────────────────
    #[error("Internal error: {0}")]
    Internal(String),
}

impl CoreError {
    pub fn not_found(kind: &str, identifier: impl Into<String>) -> Self {
        Self::ElementNotFound {
            kind: kind.to_owned(),
            identifier: identifier.into(),
        }
    }

    /// `true` for lookups that found nothing, locally or on the controller.
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            Self::ElementNotFound { .. } | Self::Api { status: 404, .. }
        )
    }

    /// `true` if this error only reports that a sibling task failed.
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled { .. })
    }
}

// ── Conversion from transport-layer errors ───────────────────────────

impl From<cmlkit_api::Error> for CoreError {
    fn from(err: cmlkit_api::Error) -> Self {
        match err {
            e @ (cmlkit_api::Error::SystemNotReady | cmlkit_api::Error::Incompatible { .. }) => {
                CoreError::SystemNotReady {
                    reason: e.to_string(),
                }
            }
            cmlkit_api::Error::Authentication { message } => {
                CoreError::AuthenticationFailed { message }
            }
            cmlkit_api::Error::Http { status, body } => CoreError::Api {
                status,
                message: body,
            },
            cmlkit_api::Error::Deserialization { message, body: _ } => {
                CoreError::Decode { message }
            }
            cmlkit_api::Error::Serialization(message) => CoreError::Internal(message),
            cmlkit_api::Error::InvalidUrl(e) => CoreError::Config {
                message: format!("Invalid URL: {e}"),
            },
            cmlkit_api::Error::Tls(msg) => CoreError::Config {
                message: format!("TLS error: {msg}"),
            },
            cmlkit_api::Error::Transport(e) => match e.status() {
                Some(status) => CoreError::Api {
                    status: status.as_u16(),
                    message: e.to_string(),
                },
                None => CoreError::Internal(format!("HTTP transport error: {e}")),
            },
        }
    }
}
