//! Error types and handling for the CLI
//!
//! Every variant maps to a stable process exit code.

use std::io;
use std::path::PathBuf;

/// Result type alias for CLI operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for CLI operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// IO error (file operations, etc.)
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// Error from cartbridge-core
    #[error("{0}")]
    Core(#[from] cartbridge_core::Error),

    /// File not found
    #[error("File not found: {}", path.display())]
    FileNotFound { path: PathBuf },

    /// Invalid file format
    #[error("Invalid file format for {}: expected {}", path.display(), expected)]
    InvalidFormat { path: PathBuf, expected: String },

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Invalid argument combination
    #[error("Invalid arguments: {0}")]
    InvalidArgs(String),

    /// A rule set check found problems
    #[error("Rule set has {count} invalid rule(s)")]
    InvalidRules { count: usize },

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// YAML serialization/deserialization error
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// TOML deserialization error
    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),

    /// Generic error with context
    #[error("{message}")]
    Other { message: String },
}

impl Error {
    /// Create a configuration error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Create an invalid arguments error
    pub fn invalid_args(message: impl Into<String>) -> Self {
        Self::InvalidArgs(message.into())
    }

    /// Create a generic error with message
    pub fn other(message: impl Into<String>) -> Self {
        Self::Other {
            message: message.into(),
        }
    }

    /// Get the exit code for this error
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::Io(_) => 1,
            Self::Core(cartbridge_core::Error::Mapping(_)) => 3,
            Self::Core(cartbridge_core::Error::Lifecycle(_)) => 4,
            Self::Core(_) => 2,
            Self::FileNotFound { .. } => 5,
            Self::InvalidFormat { .. } => 6,
            Self::Config(_) => 7,
            Self::InvalidArgs(_) => 8,
            Self::InvalidRules { .. } => 9,
            Self::Json(_) => 12,
            Self::Yaml(_) => 13,
            Self::Toml(_) => 14,
            Self::Other { .. } => 99,
        }
    }

    /// Check if this error should display usage help
    pub fn should_show_help(&self) -> bool {
        matches!(self, Self::InvalidArgs(_))
    }
}

/// Format an error for display to the user
pub fn format_error(error: &Error, use_color: bool) -> String {
    if use_color {
        use colored::Colorize;
        format!("{} {}", "Error:".red().bold(), error)
    } else {
        format!("Error: {}", error)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cartbridge_core::mapping::{MappingError, RuleFailure};

    #[test]
    fn test_exit_codes_are_distinct_per_kind() {
        let failure = RuleFailure {
            rule_index: 1,
            source_field: "price".to_string(),
            dest_field: "variants[0].price".to_string(),
            error: MappingError::RequiredFieldMissing {
                field: "price".to_string(),
            },
        };
        let mapping: Error = cartbridge_core::Error::from(failure).into();
        assert_eq!(mapping.exit_code(), 3);

        let validation: Error = cartbridge_core::Error::validation("name", "empty").into();
        assert_eq!(validation.exit_code(), 2);

        assert_eq!(Error::InvalidRules { count: 2 }.exit_code(), 9);
        assert!(Error::invalid_args("x").should_show_help());
    }

    #[test]
    fn test_format_error_without_color() {
        let err = Error::FileNotFound {
            path: PathBuf::from("missing.json"),
        };
        assert_eq!(format_error(&err, false), "Error: File not found: missing.json");
    }
}
