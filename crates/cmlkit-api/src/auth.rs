// Authentication
//
// Username/password credentials, the token login exchange against
// `auth_extended`, and the list of endpoints that can be called without
// a valid session.

use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::client::{ApiClient, CallPhase};
use crate::error::Error;
use crate::executor::ApiRequest;

/// Login endpoint. Never carries a bearer token.
pub const AUTH_PATH: &str = "auth_extended";
/// Token validation probe.
pub const AUTHOK_PATH: &str = "authok";
/// Readiness and version endpoint.
pub const SYSTEM_INFO_PATH: &str = "system_information";

/// Username/password pair used to obtain a bearer token.
#[derive(Debug, Clone)]
pub struct Credentials {
    pub username: String,
    pub password: SecretString,
}

impl Credentials {
    pub fn new(username: impl Into<String>, password: impl Into<SecretString>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }

    /// Both parts must be non-empty for a login attempt.
    pub fn valid(&self) -> bool {
        !self.username.is_empty() && !self.password.expose_secret().is_empty()
    }
}

#[derive(Serialize)]
struct LoginRequest<'a> {
    username: &'a str,
    password: &'a str,
}

/// Response of a successful `POST auth_extended`.
#[derive(Debug, Clone, Deserialize)]
pub struct AuthResponse {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub username: String,
    pub token: String,
    #[serde(default)]
    pub admin: bool,
}

/// Whether a call to `path` needs an authenticated session.
///
/// `authok` technically requires a token, but it is the probe used to
/// validate one, so it takes the unauthenticated path.
pub(crate) fn auth_required(path: &str) -> bool {
    let endpoint = path.split('?').next().unwrap_or(path).trim_end_matches('/');
    ![AUTH_PATH, AUTHOK_PATH, SYSTEM_INFO_PATH]
        .iter()
        .any(|open| endpoint.ends_with(open))
}

/// Whether `path` targets the login endpoint.
pub(crate) fn is_login(path: &str) -> bool {
    path.split('?').next().unwrap_or(path).ends_with(AUTH_PATH)
}

impl ApiClient {
    /// Exchange username/password for a bearer token.
    ///
    /// `POST auth_extended` with `{username, password}`. Runs as a nested
    /// bootstrap call; the caller decides what to do with the session state.
    pub(crate) async fn login(&self, credentials: &Credentials) -> Result<SecretString, Error> {
        let body = LoginRequest {
            username: &credentials.username,
            password: credentials.password.expose_secret(),
        };
        let request = ApiRequest::post(AUTH_PATH).json(&body)?;
        let auth: AuthResponse = self.fetch(request, CallPhase::Bootstrapping).await?;
        info!(user_id = %auth.id, admin = auth.admin, "authenticated");
        Ok(SecretString::from(auth.token))
    }
}
