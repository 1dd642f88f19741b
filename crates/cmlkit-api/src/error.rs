use std::sync::Arc;

use thiserror::Error;

/// Top-level error type for the `cmlkit-api` crate.
///
/// Covers every failure mode of the request pipeline: readiness and
/// version gating, authentication, transport, HTTP status, and decoding.
/// `cmlkit-core` maps these into user-facing diagnostics.
///
/// The type is `Clone` so a compatibility failure recorded during the
/// first version check can be replayed verbatim on every later call.
#[derive(Debug, Clone, Error)]
pub enum Error {
    // ── Readiness ───────────────────────────────────────────────────
    /// Controller unreachable, booting, or behind a failing proxy
    /// (connect/timeout errors, HTTP 502/503/504, `ready: false`).
    #[error("system not ready")]
    SystemNotReady,

    /// Controller reports a version outside the supported range.
    #[error("server not compatible, want {wanted}, got {got}")]
    Incompatible { wanted: String, got: String },

    // ── Authentication ──────────────────────────────────────────────
    /// Missing credentials, rejected login, or a token the controller
    /// keeps refusing after re-authentication.
    #[error("{message}")]
    Authentication { message: String },

    // ── HTTP ────────────────────────────────────────────────────────
    /// Any other non-2xx response. `body` is the trimmed response text.
    #[error("status: {status}, {body}")]
    Http { status: u16, body: String },

    // ── Transport ───────────────────────────────────────────────────
    /// HTTP transport error that is not a connect/timeout failure.
    #[error("HTTP transport error: {0}")]
    Transport(Arc<reqwest::Error>),

    /// URL parsing error.
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// TLS setup or certificate error.
    #[error("TLS error: {0}")]
    Tls(String),

    // ── Data ────────────────────────────────────────────────────────
    /// JSON (de)serialization failed, with the raw body for debugging.
    #[error("Deserialization error: {message}")]
    Deserialization { message: String, body: String },

    /// A request body could not be encoded.
    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl From<reqwest::Error> for Error {
    fn from(err: reqwest::Error) -> Self {
        Self::Transport(Arc::new(err))
    }
}

impl Error {
    /// Returns `true` if the controller is temporarily unavailable and
    /// the caller may retry after a backoff.
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::SystemNotReady | Self::Incompatible { .. })
    }

    /// Returns `true` if this error came out of the login protocol.
    pub fn is_auth_failure(&self) -> bool {
        matches!(self, Self::Authentication { .. })
    }

    /// Returns `true` if the controller answered 404.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::Http { status: 404, .. })
    }

    /// The HTTP status code carried by this error, if any.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Http { status, .. } => Some(*status),
            Self::Transport(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn http_error_renders_status_and_body() {
        let err = Error::Http {
            status: 403,
            body: "\"authentication failed\"".into(),
        };
        assert_eq!(err.to_string(), r#"status: 403, "authentication failed""#);
        assert_eq!(err.status(), Some(403));
    }

    #[test]
    fn incompatible_is_transient() {
        let err = Error::Incompatible {
            wanted: ">=2.4.0,<3.0.0".into(),
            got: "2.1.0".into(),
        };
        assert!(err.is_transient());
        assert!(Error::SystemNotReady.is_transient());
        assert!(!err.is_auth_failure());
    }

    #[test]
    fn not_found_only_for_404() {
        let err = Error::Http {
            status: 404,
            body: String::new(),
        };
        assert!(err.is_not_found());
        assert!(!Error::SystemNotReady.is_not_found());
    }
}
