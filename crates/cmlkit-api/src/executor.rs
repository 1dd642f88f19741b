// Request executor
//
// Issues exactly one HTTP request against `{host}/api/v0/{path}` and
// classifies what came back. No session logic lives here; the client
// decides what an outcome means for the state machine.

use reqwest::header::{ACCEPT, AUTHORIZATION, CACHE_CONTROL, CONTENT_TYPE, EXPIRES, PRAGMA};
use reqwest::{Method, StatusCode};
use secrecy::{ExposeSecret, SecretString};
use tracing::{debug, trace};
use url::Url;

use crate::auth::is_login;
use crate::error::Error;

/// Path prefix of every controller endpoint.
pub const API_BASE: &str = "/api/v0/";

const JSON: &str = "application/json";

/// A single controller call: method, path relative to [`API_BASE`], and
/// an optional pre-encoded body.
#[derive(Debug, Clone)]
pub struct ApiRequest {
    pub method: Method,
    pub path: String,
    pub body: Option<String>,
}

impl ApiRequest {
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            body: None,
        }
    }

    pub fn get(path: impl Into<String>) -> Self {
        Self::new(Method::GET, path)
    }

    pub fn post(path: impl Into<String>) -> Self {
        Self::new(Method::POST, path)
    }

    pub fn patch(path: impl Into<String>) -> Self {
        Self::new(Method::PATCH, path)
    }

    pub fn put(path: impl Into<String>) -> Self {
        Self::new(Method::PUT, path)
    }

    pub fn delete(path: impl Into<String>) -> Self {
        Self::new(Method::DELETE, path)
    }

    /// Attach a JSON-encoded body.
    pub fn json(mut self, body: &impl serde::Serialize) -> Result<Self, Error> {
        let encoded =
            serde_json::to_string(body).map_err(|e| Error::Serialization(e.to_string()))?;
        self.body = Some(encoded);
        Ok(self)
    }

    /// Attach a body verbatim (e.g. a topology document for `import`).
    pub fn raw(mut self, body: impl Into<String>) -> Self {
        self.body = Some(body.into());
        self
    }
}

/// Classified result of one HTTP exchange.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// 200, 201 or 204 with the raw body.
    Success(String),
    /// Connect/timeout failure or 502/503/504.
    Unavailable,
    /// 401. The client routes this into re-authentication.
    Unauthorized(String),
    /// Any other status, body trimmed.
    Failed { status: u16, body: String },
}

/// Thin wrapper around `reqwest::Client` bound to one controller.
#[derive(Debug, Clone)]
pub struct RequestExecutor {
    http: reqwest::Client,
    host: String,
}

impl RequestExecutor {
    /// `host` is the controller root including scheme, e.g.
    /// `https://cml.example.com`.
    pub fn new(http: reqwest::Client, host: &Url) -> Self {
        Self {
            http,
            host: host.as_str().trim_end_matches('/').to_owned(),
        }
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    /// Full URL for an endpoint path (which may carry a query string).
    pub fn url_for(&self, path: &str) -> Result<Url, Error> {
        Ok(Url::parse(&format!("{}{API_BASE}{path}", self.host))?)
    }

    /// Perform the request and classify the response.
    ///
    /// The bearer token is attached whenever one is present, except on the
    /// login endpoint.
    pub async fn execute(
        &self,
        request: &ApiRequest,
        token: Option<&SecretString>,
    ) -> Result<Outcome, Error> {
        let url = self.url_for(&request.path)?;
        debug!(method = %request.method, %url, "api request");

        let mut builder = self
            .http
            .request(request.method.clone(), url)
            .header(ACCEPT, JSON)
            .header(CACHE_CONTROL, "no-cache, no-store, must-revalidate")
            .header(PRAGMA, "no-cache")
            .header(EXPIRES, "0");

        if let Some(token) = token.filter(|_| !is_login(&request.path)) {
            builder = builder.header(AUTHORIZATION, format!("Bearer {}", token.expose_secret()));
        }
        if let Some(body) = &request.body {
            builder = builder.header(CONTENT_TYPE, JSON).body(body.clone());
        }

        let resp = match builder.send().await {
            Ok(resp) => resp,
            Err(e) if e.is_connect() || e.is_timeout() => {
                debug!(error = %e, "controller unreachable");
                return Ok(Outcome::Unavailable);
            }
            Err(e) => return Err(e.into()),
        };

        let status = resp.status();
        let body = match resp.text().await {
            Ok(body) => body,
            Err(e) if e.is_timeout() => return Ok(Outcome::Unavailable),
            Err(e) => return Err(e.into()),
        };
        trace!(%status, len = body.len(), "api response");

        Ok(classify(status, body))
    }
}

fn classify(status: StatusCode, body: String) -> Outcome {
    match status {
        StatusCode::OK | StatusCode::CREATED | StatusCode::NO_CONTENT => Outcome::Success(body),
        StatusCode::UNAUTHORIZED => Outcome::Unauthorized(body),
        StatusCode::BAD_GATEWAY | StatusCode::SERVICE_UNAVAILABLE | StatusCode::GATEWAY_TIMEOUT => {
            Outcome::Unavailable
        }
        other => Outcome::Failed {
            status: other.as_u16(),
            body: body.trim().to_owned(),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classifies_statuses() {
        assert_eq!(
            classify(StatusCode::OK, "{}".into()),
            Outcome::Success("{}".into())
        );
        assert_eq!(
            classify(StatusCode::NO_CONTENT, String::new()),
            Outcome::Success(String::new())
        );
        assert_eq!(
            classify(StatusCode::UNAUTHORIZED, "nope".into()),
            Outcome::Unauthorized("nope".into())
        );
        for status in [
            StatusCode::BAD_GATEWAY,
            StatusCode::SERVICE_UNAVAILABLE,
            StatusCode::GATEWAY_TIMEOUT,
        ] {
            assert_eq!(classify(status, String::new()), Outcome::Unavailable);
        }
    }

    #[test]
    fn other_statuses_carry_trimmed_body() {
        assert_eq!(
            classify(StatusCode::NOT_FOUND, "  \"lab not found\"\n".into()),
            Outcome::Failed {
                status: 404,
                body: "\"lab not found\"".into()
            }
        );
    }

    #[test]
    fn url_keeps_query() {
        let host = Url::parse("https://cml.example.com/").unwrap_or_else(|e| panic!("{e}"));
        let exec = RequestExecutor::new(reqwest::Client::new(), &host);
        let url = exec
            .url_for("labs/l1/nodes/n1?operational=true")
            .unwrap_or_else(|e| panic!("{e}"));
        assert_eq!(
            url.as_str(),
            "https://cml.example.com/api/v0/labs/l1/nodes/n1?operational=true"
        );
    }
}
