// Session state
//
// Everything the request pipeline needs to remember between calls: where
// in the bootstrap sequence the client is, the bearer token, the login
// credentials, and the outcome of the one-time version check.

use std::fmt;

use secrecy::SecretString;

use crate::auth::Credentials;
use crate::error::Error;
use crate::version::ControllerVersion;

/// Position of the client in the connect/authenticate sequence.
///
/// Along the happy path the state only moves forward. The single way back
/// is a 401 from the controller, which drops the session to
/// [`SessionState::AuthRequired`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum SessionState {
    Initial,
    CheckVersion,
    AuthRequired,
    Authenticating,
    Authenticated,
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Initial => "INITIAL",
            Self::CheckVersion => "CHECKVERSION",
            Self::AuthRequired => "AUTHREQUIRED",
            Self::Authenticating => "AUTHENTICATING",
            Self::Authenticated => "AUTHENTICATED",
        };
        f.write_str(s)
    }
}

/// Mutable per-client session data. Lives behind the client's state lock.
#[derive(Debug)]
pub(crate) struct Session {
    pub state: SessionState,
    pub token: Option<SecretString>,
    pub credentials: Option<Credentials>,
    /// Replayed on every call once set; only [`crate::ApiClient::ready`]
    /// clears it.
    pub compat_error: Option<Error>,
    pub version: Option<ControllerVersion>,
    pub named_configs: bool,
}

impl Session {
    pub fn new() -> Self {
        Self {
            state: SessionState::Initial,
            token: None,
            credentials: None,
            compat_error: None,
            version: None,
            named_configs: false,
        }
    }

    /// Move to `next`, logging the transition.
    pub fn transition(&mut self, next: SessionState) {
        if self.state != next {
            tracing::debug!(from = %self.state, to = %next, "session transition");
            self.state = next;
        }
    }

    /// Forget the bearer token and fall back to `AuthRequired`.
    ///
    /// Returns `true` if a token had been set.
    pub fn drop_token(&mut self) -> bool {
        let had_token = self.token.take().is_some();
        self.transition(SessionState::AuthRequired);
        had_token
    }

    /// Record the outcome of a version check.
    pub fn record_version(&mut self, result: Result<ControllerVersion, Error>) {
        match result {
            Ok(version) => {
                self.named_configs = version.supports_named_configs();
                self.version = Some(version);
                self.compat_error = None;
            }
            Err(err) => {
                self.compat_error = Some(err);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn states_render_in_wire_style() {
        assert_eq!(SessionState::Initial.to_string(), "INITIAL");
        assert_eq!(SessionState::CheckVersion.to_string(), "CHECKVERSION");
        assert_eq!(SessionState::AuthRequired.to_string(), "AUTHREQUIRED");
        assert_eq!(SessionState::Authenticating.to_string(), "AUTHENTICATING");
        assert_eq!(SessionState::Authenticated.to_string(), "AUTHENTICATED");
    }

    #[test]
    fn happy_path_is_ordered() {
        assert!(SessionState::Initial < SessionState::CheckVersion);
        assert!(SessionState::CheckVersion < SessionState::AuthRequired);
        assert!(SessionState::AuthRequired < SessionState::Authenticating);
        assert!(SessionState::Authenticating < SessionState::Authenticated);
    }

    #[test]
    fn drop_token_reports_prior_token() {
        let mut session = Session::new();
        session.token = Some(SecretString::from("abc"));
        session.state = SessionState::Authenticated;

        assert!(session.drop_token());
        assert_eq!(session.state, SessionState::AuthRequired);
        assert!(session.token.is_none());
        assert!(!session.drop_token());
    }

    #[test]
    fn failed_check_keeps_previous_version() {
        let mut session = Session::new();
        let version = crate::version::check_compatibility("2.7.0+build.8", true);
        session.record_version(version);
        assert!(session.named_configs);

        session.record_version(Err(Error::SystemNotReady));
        assert!(matches!(session.compat_error, Some(Error::SystemNotReady)));
        assert_eq!(session.version.as_ref().map(|v| v.as_str()), Some("2.7.0+build.8"));
    }
}
