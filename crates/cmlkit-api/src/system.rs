// System endpoints
//
// Readiness/version information. Both calls here are part of the session
// bootstrap and never require a token.

use tracing::{info, warn};

use crate::auth::SYSTEM_INFO_PATH;
use crate::client::{ApiClient, CallPhase};
use crate::error::Error;
use crate::models::SystemInformation;
use crate::version::{ControllerVersion, check_compatibility};

impl ApiClient {
    /// Raw readiness/version report.
    ///
    /// `GET system_information`
    pub async fn system_information(&self) -> Result<SystemInformation, Error> {
        self.get(SYSTEM_INFO_PATH, CallPhase::Bootstrapping).await
    }

    /// Fetch the controller version and validate it against the supported
    /// range.
    pub(crate) async fn check_version(&self) -> Result<ControllerVersion, Error> {
        let info = self.system_information().await?;
        let version = check_compatibility(&info.version, info.ready)?;
        info!(version = %version, "controller version");
        if version.dev {
            warn!(version = %version, "controller runs a development build");
        }
        Ok(version)
    }
}
