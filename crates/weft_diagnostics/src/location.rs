//! Where in the fabric (or its configuration) a diagnostic applies.

use serde::{Deserialize, Serialize};
use std::fmt;

/// The primary location of a diagnostic.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Location {
    /// No specific location.
    Unknown,
    /// A grid tile at `(x, y)`.
    Tile {
        /// Column.
        x: u32,
        /// Row.
        y: u32,
    },
    /// A dotted key path inside the fabric configuration file.
    Config(String),
}

impl Location {
    /// Shorthand for a tile location.
    pub fn tile(x: u32, y: u32) -> Self {
        Location::Tile { x, y }
    }

    /// Shorthand for a configuration key location.
    pub fn config(key: impl Into<String>) -> Self {
        Location::Config(key.into())
    }

    /// Returns `true` for [`Location::Unknown`].
    pub fn is_unknown(&self) -> bool {
        matches!(self, Location::Unknown)
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Location::Unknown => write!(f, "<unknown>"),
            Location::Tile { x, y } => write!(f, "tile ({x}, {y})"),
            Location::Config(key) => write!(f, "config `{key}`"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display() {
        assert_eq!(Location::tile(3, 4).to_string(), "tile (3, 4)");
        assert_eq!(
            Location::config("clock_network.trees").to_string(),
            "config `clock_network.trees`"
        );
        assert!(Location::Unknown.is_unknown());
    }
}
