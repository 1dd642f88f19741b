// Controller version gating
//
// The controller reports versions like `2.4.0`, `2.4.0+build.1` or
// `2.5.0-dev0+build.3.2f7875762`. Only the numeric stem takes part in
// the compatibility check; the build suffix is informational.

use std::fmt;
use std::sync::LazyLock;

use regex::Regex;

use crate::error::Error;

/// Human-readable form of the supported range, used in error messages.
pub const VERSION_CONSTRAINT: &str = ">=2.4.0,<3.0.0";

const MIN_SUPPORTED: (u8, u8, u8) = (2, 4, 0);
const MAX_MAJOR_EXCLUSIVE: u8 = 3;
const NAMED_CONFIGS_SINCE: (u8, u8, u8) = (2, 7, 0);

static VERSION_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(\d)\.(\d)\.(\d)((-dev0)?\+build.*)?$").expect("version regex is valid")
});

/// A parsed controller version.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ControllerVersion {
    pub major: u8,
    pub minor: u8,
    pub patch: u8,
    /// `true` for `-dev0` builds.
    pub dev: bool,
    raw: String,
}

impl ControllerVersion {
    /// Parse a version string. Returns `None` if it does not follow the
    /// controller's grammar.
    pub fn parse(raw: &str) -> Option<Self> {
        let caps = VERSION_RE.captures(raw)?;
        let digit = |i: usize| caps.get(i)?.as_str().parse::<u8>().ok();
        Some(Self {
            major: digit(1)?,
            minor: digit(2)?,
            patch: digit(3)?,
            dev: caps.get(5).is_some(),
            raw: raw.to_owned(),
        })
    }

    fn triple(&self) -> (u8, u8, u8) {
        (self.major, self.minor, self.patch)
    }

    /// Inclusive lower bound, exclusive major upper bound.
    pub fn is_compatible(&self) -> bool {
        self.triple() >= MIN_SUPPORTED && self.major < MAX_MAJOR_EXCLUSIVE
    }

    /// Named (multi-file) node configurations arrived with 2.7.0.
    pub fn supports_named_configs(&self) -> bool {
        self.triple() >= NAMED_CONFIGS_SINCE
    }

    /// The version string exactly as the controller reported it.
    pub fn as_str(&self) -> &str {
        &self.raw
    }
}

impl fmt::Display for ControllerVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

/// Turn a `system_information` response into a compatible version or
/// the error that must be recorded for the session.
pub fn check_compatibility(raw: &str, ready: bool) -> Result<ControllerVersion, Error> {
    if !ready {
        return Err(Error::SystemNotReady);
    }
    let incompatible = || Error::Incompatible {
        wanted: VERSION_CONSTRAINT.into(),
        got: raw.to_owned(),
    };
    let version = ControllerVersion::parse(raw).ok_or_else(incompatible)?;
    if !version.is_compatible() {
        return Err(incompatible());
    }
    Ok(version)
}
