// ── Controller abstraction ──
//
// Entry point for consumers. Owns the API client (and with it the
// session) plus the optional lab cache. Operations are split by
// resource across the submodules, each adding inherent methods.

mod interfaces;
mod labs;
mod links;
mod nodes;
mod users;

use std::sync::Arc;

use secrecy::SecretString;
use tracing::{debug, info};

use cmlkit_api::transport::{TlsMode, TransportConfig};
use cmlkit_api::{ApiClient, Credentials};

use crate::assemble::assemble;
use crate::config::{AuthCredentials, ControllerConfig, TlsVerification};
use crate::error::CoreError;
use crate::model::Lab;
use crate::store::LabCache;

// ── Controller ───────────────────────────────────────────────────

/// Handle to one controller.
///
/// Cheaply cloneable via `Arc<ControllerInner>`; clones share the
/// session and the cache.
#[derive(Clone)]
pub struct Controller {
    inner: Arc<ControllerInner>,
}

struct ControllerInner {
    config: ControllerConfig,
    api: Arc<ApiClient>,
    cache: LabCache,
}

impl Controller {
    /// Build the HTTP client and prime the session with the configured
    /// credentials. Nothing is sent until the first call.
    pub fn new(config: ControllerConfig) -> Result<Self, CoreError> {
        let transport = build_transport(&config);
        let api = ApiClient::new(config.url.as_str(), &transport)?;
        apply_auth(&api, &config.auth);
        debug!(url = %config.url, cache = config.use_cache, "controller configured");

        Ok(Self {
            inner: Arc::new(ControllerInner {
                cache: LabCache::new(config.use_cache),
                api: Arc::new(api),
                config,
            }),
        })
    }

    /// Access the controller configuration.
    pub fn config(&self) -> &ControllerConfig {
        &self.inner.config
    }

    /// The underlying API client, for endpoints without a typed wrapper.
    pub fn api(&self) -> &Arc<ApiClient> {
        &self.inner.api
    }

    pub fn cache(&self) -> &LabCache {
        &self.inner.cache
    }

    // ── Session ──────────────────────────────────────────────────

    /// Check the controller version, clearing any earlier
    /// incompatibility. Returns the reported version.
    pub async fn ready(&self) -> Result<String, CoreError> {
        let version = self.inner.api.ready().await?;
        info!(version = %version, "controller ready");
        Ok(version.as_str().to_owned())
    }

    /// Version string of the controller, once checked.
    pub fn version(&self) -> Option<String> {
        self.inner.api.version()
    }

    /// Fill a shallow lab with owner, nodes, interfaces, layer-3 data,
    /// and links. Never consults the cache.
    pub async fn assemble_lab(&self, lab: Lab) -> Result<Lab, CoreError> {
        assemble(Arc::clone(&self.inner.api), lab).await
    }
}

// ── Helpers ──────────────────────────────────────────────────────

/// Build a [`TransportConfig`] from the controller configuration.
fn build_transport(config: &ControllerConfig) -> TransportConfig {
    TransportConfig {
        tls: tls_to_transport(&config.tls),
        timeout: config.timeout,
    }
}

fn tls_to_transport(tls: &TlsVerification) -> TlsMode {
    match tls {
        TlsVerification::SystemDefaults => TlsMode::System,
        TlsVerification::CustomCa(path) => TlsMode::CustomCa(path.clone()),
        TlsVerification::DangerAcceptInvalid => TlsMode::DangerAcceptInvalid,
    }
}

fn apply_auth(api: &ApiClient, auth: &AuthCredentials) {
    match auth {
        AuthCredentials::Token(token) => api.set_token(token.clone()),
        AuthCredentials::Credentials { username, password } => {
            api.set_credentials(credentials(username, password));
        }
        AuthCredentials::Hybrid {
            token,
            username,
            password,
        } => {
            api.set_token(token.clone());
            api.set_credentials(credentials(username, password));
        }
    }
}

fn credentials(username: &str, password: &SecretString) -> Credentials {
    Credentials::new(username, password.clone())
}
