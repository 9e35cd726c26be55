//! Client types.

use std::fmt;
use std::str::FromStr;

use serde::Serialize;

/// Logical remote operation. All three share one request flow and differ
/// only in the path they target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Endpoint {
    /// Details for known OSM objects.
    Lookup,
    /// Free-form or structured forward geocoding.
    Search,
    /// Coordinates → address.
    Reverse,
}

impl Endpoint {
    pub fn all() -> &'static [Endpoint] {
        &[Self::Lookup, Self::Search, Self::Reverse]
    }

    pub fn path(&self) -> &'static str {
        match self {
            Self::Lookup => "/lookup",
            Self::Search => "/search",
            Self::Reverse => "/reverse",
        }
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Lookup => write!(f, "lookup"),
            Self::Search => write!(f, "search"),
            Self::Reverse => write!(f, "reverse"),
        }
    }
}

impl FromStr for Endpoint {
    type Err = geolane_core::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "lookup" => Ok(Self::Lookup),
            "search" => Ok(Self::Search),
            "reverse" => Ok(Self::Reverse),
            other => Err(geolane_core::Error::Config(format!(
                "Unknown operation: {}",
                other
            ))),
        }
    }
}
