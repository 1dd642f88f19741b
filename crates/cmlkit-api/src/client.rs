// Session-aware API client
//
// Every controller call flows through `ApiClient::call`. On the way it
// runs the one-time version check, bootstraps authentication when the
// target needs it, and re-authenticates once on a 401 before giving up.
// Endpoint groups (labs, nodes, ...) are inherent methods in their own
// files to keep this module focused on the session protocol.

use std::future::Future;
use std::pin::Pin;

use parking_lot::RwLock;
use secrecy::SecretString;
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::{debug, info};
use url::Url;

use crate::auth::{AUTHOK_PATH, Credentials, auth_required, is_login};
use crate::error::Error;
use crate::executor::{ApiRequest, Outcome, RequestExecutor};
use crate::session::{Session, SessionState};
use crate::transport::TransportConfig;
use crate::version::ControllerVersion;

/// How many times a request is replayed after a successful re-login.
const MAX_AUTH_RETRIES: u8 = 1;

/// Whether a call originates from user code or from inside the session
/// bootstrap (version check, auth probe, login).
///
/// Only `Normal` calls serialize on the bootstrap lock; nested calls must
/// not, or they would wait on themselves.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CallPhase {
    #[default]
    Normal,
    Bootstrapping,
}

type CallFuture<'a> = Pin<Box<dyn Future<Output = Result<String, Error>> + Send + 'a>>;

/// HTTP client for one controller, owning the session.
pub struct ApiClient {
    executor: RequestExecutor,
    session: RwLock<Session>,
    /// Held for the whole call by `Normal` callers until the session is
    /// authenticated, so concurrent first calls don't stampede the login.
    bootstrap: tokio::sync::Mutex<()>,
}

impl ApiClient {
    /// Create a client for `host` (e.g. `https://cml.example.com`).
    pub fn new(host: &str, transport: &TransportConfig) -> Result<Self, Error> {
        Self::from_reqwest(host, transport.build_client()?)
    }

    /// Create a client with a pre-built `reqwest::Client`.
    pub fn from_reqwest(host: &str, http: reqwest::Client) -> Result<Self, Error> {
        let host = Url::parse(host)?;
        Ok(Self {
            executor: RequestExecutor::new(http, &host),
            session: RwLock::new(Session::new()),
            bootstrap: tokio::sync::Mutex::new(()),
        })
    }

    // ── Session accessors ────────────────────────────────────────────

    /// The controller root this client talks to.
    pub fn host(&self) -> &str {
        self.executor.host()
    }

    pub fn state(&self) -> SessionState {
        self.session.read().state
    }

    /// Use a pre-issued bearer token.
    pub fn set_token(&self, token: SecretString) {
        self.session.write().token = Some(token);
    }

    /// Credentials used to (re-)obtain a token after a 401.
    pub fn set_credentials(&self, credentials: Credentials) {
        self.session.write().credentials = Some(credentials);
    }

    /// Version string reported by the controller, once checked.
    pub fn version(&self) -> Option<String> {
        self.session
            .read()
            .version
            .as_ref()
            .map(|v| v.as_str().to_owned())
    }

    /// Whether node fetches should request named configurations.
    pub fn named_configs_supported(&self) -> bool {
        self.session.read().named_configs
    }

    /// Re-run the version check, replacing whatever was recorded before.
    ///
    /// This is the only way to clear a sticky compatibility error.
    pub async fn ready(&self) -> Result<ControllerVersion, Error> {
        let _guard = self.bootstrap.lock().await;
        {
            let mut session = self.session.write();
            session.compat_error = None;
            if session.state == SessionState::Initial {
                session.transition(SessionState::CheckVersion);
            }
        }
        let result = self.check_version().await;

        let mut session = self.session.write();
        session.record_version(result.clone());
        if session.state < SessionState::AuthRequired {
            session.transition(SessionState::AuthRequired);
        }
        result
    }

    // ── Call pipeline ────────────────────────────────────────────────

    /// Run one request through the session protocol, returning the raw
    /// response body.
    pub async fn call(&self, request: ApiRequest, phase: CallPhase) -> Result<String, Error> {
        self.run(request, phase).await
    }

    fn run(&self, request: ApiRequest, phase: CallPhase) -> CallFuture<'_> {
        Box::pin(async move {
            let _guard = if phase == CallPhase::Normal && self.state() != SessionState::Authenticated
            {
                Some(self.bootstrap.lock().await)
            } else {
                None
            };

            self.version_check_once().await?;

            if self.state() != SessionState::Authenticated && auth_required(&request.path) {
                info!("session needs authentication");
                self.session.write().transition(SessionState::Authenticating);
                self.run(ApiRequest::get(AUTHOK_PATH), CallPhase::Bootstrapping)
                    .await?;
            }

            self.exchange(&request).await
        })
    }

    /// Make sure the one-time version check has run, so that capability
    /// flags such as [`Self::named_configs_supported`] are settled before a
    /// request path is built from them.
    pub(crate) async fn ensure_version_checked(&self) -> Result<(), Error> {
        if self.state() < SessionState::AuthRequired {
            let _guard = self.bootstrap.lock().await;
            return self.version_check_once().await;
        }
        self.sticky_error()
    }

    /// Run the version check if nobody ran it yet, then replay the
    /// recorded compatibility error, if any. Callers hold the bootstrap
    /// lock unless they are already inside the bootstrap.
    async fn version_check_once(&self) -> Result<(), Error> {
        if self.begin_version_check() {
            let result = self.check_version().await;
            let mut session = self.session.write();
            session.record_version(result);
            session.transition(SessionState::AuthRequired);
        }
        self.sticky_error()
    }

    fn sticky_error(&self) -> Result<(), Error> {
        match self.session.read().compat_error.clone() {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    /// Claim the version check if nobody ran it yet.
    fn begin_version_check(&self) -> bool {
        let mut session = self.session.write();
        if session.state == SessionState::Initial {
            session.transition(SessionState::CheckVersion);
            true
        } else {
            false
        }
    }

    /// Send the request, re-authenticating and replaying it at most once
    /// on a 401.
    async fn exchange(&self, request: &ApiRequest) -> Result<String, Error> {
        let mut retries = 0;
        loop {
            let token = self.session.read().token.clone();
            match self.executor.execute(request, token.as_ref()).await? {
                Outcome::Success(body) => {
                    let mut session = self.session.write();
                    if session.state == SessionState::Authenticating {
                        session.transition(SessionState::Authenticated);
                    }
                    return Ok(body);
                }
                Outcome::Unavailable => return Err(Error::SystemNotReady),
                Outcome::Failed { status, body } if status == 403 && is_login(&request.path) => {
                    return Err(Error::Authentication {
                        message: format!("status: {status}, {body}"),
                    });
                }
                Outcome::Failed { status, body } => return Err(Error::Http { status, body }),
                Outcome::Unauthorized(body) => {
                    let had_token = self.session.write().drop_token();
                    debug!(path = %request.path, "unauthorized, token discarded");

                    if is_login(&request.path) {
                        return Err(Error::Authentication {
                            message: format!("status: 401, {}", body.trim()),
                        });
                    }
                    if retries >= MAX_AUTH_RETRIES {
                        return Err(Error::Authentication {
                            message: "token rejected after re-authentication".into(),
                        });
                    }

                    let credentials = self
                        .session
                        .read()
                        .credentials
                        .clone()
                        .filter(Credentials::valid);
                    let Some(credentials) = credentials else {
                        let message = if had_token {
                            "invalid token but no credentials provided"
                        } else {
                            "no credentials provided"
                        };
                        return Err(Error::Authentication {
                            message: message.into(),
                        });
                    };

                    let token = self.login(&credentials).await?;
                    let mut session = self.session.write();
                    session.token = Some(token);
                    session.transition(SessionState::Authenticated);
                    retries += 1;
                }
            }
        }
    }

    // ── Typed helpers ────────────────────────────────────────────────

    /// Run a request and decode the JSON response.
    pub async fn fetch<T: DeserializeOwned>(
        &self,
        request: ApiRequest,
        phase: CallPhase,
    ) -> Result<T, Error> {
        let body = self.call(request, phase).await?;
        decode(&body)
    }

    /// Run a request whose response body is irrelevant.
    pub async fn send(&self, request: ApiRequest, phase: CallPhase) -> Result<(), Error> {
        self.call(request, phase).await.map(drop)
    }

    pub async fn get<T: DeserializeOwned>(&self, path: &str, phase: CallPhase) -> Result<T, Error> {
        self.fetch(ApiRequest::get(path), phase).await
    }

    pub async fn post<T: DeserializeOwned>(
        &self,
        path: &str,
        body: &(impl Serialize + Sync),
        phase: CallPhase,
    ) -> Result<T, Error> {
        self.fetch(ApiRequest::post(path).json(body)?, phase).await
    }

    pub async fn patch<T: DeserializeOwned>(
        &self,
        path: &str,
        body: &(impl Serialize + Sync),
        phase: CallPhase,
    ) -> Result<T, Error> {
        self.fetch(ApiRequest::patch(path).json(body)?, phase).await
    }

    pub async fn put(&self, path: &str, phase: CallPhase) -> Result<(), Error> {
        self.send(ApiRequest::put(path), phase).await
    }

    pub async fn delete(&self, path: &str, phase: CallPhase) -> Result<(), Error> {
        self.send(ApiRequest::delete(path), phase).await
    }
}

fn decode<T: DeserializeOwned>(body: &str) -> Result<T, Error> {
    serde_json::from_str(body).map_err(|e| {
        let preview = body.chars().take(200).collect::<String>();
        Error::Deserialization {
            message: format!("{e} (body preview: {preview:?})"),
            body: body.to_owned(),
        }
    })
}
