//! Error types for configuration loading and validation.

/// Errors that can occur when loading or validating a `weft.toml` configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// An I/O error occurred while reading the configuration file.
    #[error("failed to read configuration: {0}")]
    IoError(#[from] std::io::Error),

    /// The TOML content could not be parsed.
    #[error("failed to parse configuration: {0}")]
    ParseError(String),

    /// A name referenced from one section is not defined in another.
    #[error("unknown {kind} '{name}'")]
    UnknownReference {
        /// What kind of entity was referenced (segment, switch, block, ...).
        kind: &'static str,
        /// The name that could not be resolved.
        name: String,
    },

    /// A required field is missing from the configuration.
    #[error("missing required field: {0}")]
    MissingField(String),

    /// A configuration value failed validation.
    #[error("validation error: {0}")]
    ValidationError(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_unknown_reference() {
        let err = ConfigError::UnknownReference {
            kind: "segment",
            name: "L9".to_string(),
        };
        assert_eq!(err.to_string(), "unknown segment 'L9'");
    }

    #[test]
    fn display_missing_field() {
        let err = ConfigError::MissingField("device.name".to_string());
        assert_eq!(err.to_string(), "missing required field: device.name");
    }

    #[test]
    fn display_parse_error() {
        let err = ConfigError::ParseError("expected '=' at line 3".to_string());
        assert_eq!(
            err.to_string(),
            "failed to parse configuration: expected '=' at line 3"
        );
    }

    #[test]
    fn display_io_error() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err = ConfigError::IoError(io_err);
        assert!(err.to_string().starts_with("failed to read configuration:"));
    }
}
