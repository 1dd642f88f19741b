// ── Runtime connection configuration ──
//
// These types describe *how* to connect to a controller. They carry
// credential data and connection tuning, but never touch disk.
// `cmlkit-config` (or the embedding application) builds a
// `ControllerConfig` and hands it in.

use std::time::Duration;

use secrecy::SecretString;
use url::Url;

/// How to authenticate with a controller.
#[derive(Debug, Clone)]
pub enum AuthCredentials {
    /// Pre-issued bearer token. Expiry is fatal: there is nothing to
    /// log in with.
    Token(SecretString),
    /// Username/password; a token is obtained on the first 401.
    Credentials {
        username: String,
        password: SecretString,
    },
    /// Start with a token, fall back to a login once it is rejected.
    Hybrid {
        token: SecretString,
        username: String,
        password: SecretString,
    },
}

/// TLS verification strategy.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum TlsVerification {
    /// System CA store (strict).
    #[default]
    SystemDefaults,
    /// Custom CA certificate file.
    CustomCa(std::path::PathBuf),
    /// Skip verification (self-signed lab controllers).
    DangerAcceptInvalid,
}

/// Configuration for connecting to a single controller.
#[derive(Debug, Clone)]
pub struct ControllerConfig {
    /// Controller URL (e.g., `https://cml.example.com`).
    pub url: Url,
    /// Authentication method and credentials.
    pub auth: AuthCredentials,
    /// TLS verification strategy.
    pub tls: TlsVerification,
    /// Per-request timeout.
    pub timeout: Duration,
    /// Keep fetched labs in the client-side cache.
    pub use_cache: bool,
}

impl ControllerConfig {
    pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(15);

    /// Config with default TLS, timeout, and caching disabled.
    pub fn new(url: Url, auth: AuthCredentials) -> Self {
        Self {
            url,
            auth,
            tls: TlsVerification::default(),
            timeout: Self::DEFAULT_TIMEOUT,
            use_cache: false,
        }
    }
}
