//! Verification depth tiers.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// How thorough a pattern-derived verification is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Depth {
    Quick,
    #[default]
    Standard,
    Deep,
}

impl Depth {
    pub fn as_str(&self) -> &'static str {
        match self {
            Depth::Quick => "QUICK",
            Depth::Standard => "STANDARD",
            Depth::Deep => "DEEP",
        }
    }
}

impl fmt::Display for Depth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Depth {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "QUICK" => Ok(Depth::Quick),
            "STANDARD" => Ok(Depth::Standard),
            "DEEP" => Ok(Depth::Deep),
            _ => Err(format!("Unknown verification depth '{}'", s)),
        }
    }
}
