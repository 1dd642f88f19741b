// ── Common types shared across the domain model ──

use std::fmt;

use serde::{Deserialize, Serialize};

/// Lifecycle state reported for labs, nodes, interfaces, and links.
///
/// Unknown strings are kept verbatim so newer controllers never break
/// decoding.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ElementState {
    #[default]
    DefinedOnCore,
    Stopped,
    Started,
    Booted,
    Unknown(String),
}

impl ElementState {
    pub fn as_str(&self) -> &str {
        match self {
            Self::DefinedOnCore => "DEFINED_ON_CORE",
            Self::Stopped => "STOPPED",
            Self::Started => "STARTED",
            Self::Booted => "BOOTED",
            Self::Unknown(raw) => raw,
        }
    }
}

impl From<&str> for ElementState {
    fn from(raw: &str) -> Self {
        match raw {
            "DEFINED_ON_CORE" => Self::DefinedOnCore,
            "STOPPED" => Self::Stopped,
            "STARTED" => Self::Started,
            "BOOTED" => Self::Booted,
            other => Self::Unknown(other.to_owned()),
        }
    }
}

impl From<String> for ElementState {
    fn from(raw: String) -> Self {
        Self::from(raw.as_str())
    }
}

impl From<ElementState> for String {
    fn from(state: ElementState) -> Self {
        match state {
            ElementState::Unknown(raw) => raw,
            known => known.as_str().to_owned(),
        }
    }
}

impl fmt::Display for ElementState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
