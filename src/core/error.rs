//! Error types for the pymetrics library.

use std::path::PathBuf;

use thiserror::Error;

/// Result type alias using pymetrics' Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur during code analysis.
#[derive(Error, Debug)]
pub enum Error {
    /// I/O error reading or writing files.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// File not found.
    #[error("File not found: {path}")]
    FileNotFound { path: PathBuf },

    /// Parse error from tree-sitter.
    #[error("Parse error in {path}: {message}")]
    Parse { path: PathBuf, message: String },

    /// File content is not valid UTF-8.
    #[error("Could not decode {path} as UTF-8")]
    Decode { path: PathBuf },

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Serialization error.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// TOML parsing error.
    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),

    /// Analysis-specific error.
    #[error("Analysis error: {message}")]
    Analysis { message: String },

    /// An external tool (coverage runner, package checker) failed.
    #[error("{name} failed: {message}")]
    Collaborator { name: String, message: String },

    /// Invalid argument.
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// Threshold violation (for CI/CD integration).
    #[error("Threshold violation: {message}")]
    ThresholdViolation { message: String, score: f64 },
}

impl Error {
    /// Create a new analysis error.
    pub fn analysis(message: impl Into<String>) -> Self {
        Self::Analysis {
            message: message.into(),
        }
    }

    /// Create a new config error.
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Create an error for a failed external tool.
    pub fn collaborator(name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Collaborator {
            name: name.into(),
            message: message.into(),
        }
    }

    /// Create a threshold violation error.
    pub fn threshold_violation(message: impl Into<String>, score: f64) -> Self {
        Self::ThresholdViolation {
            message: message.into(),
            score,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = Error::analysis("test error");
        assert_eq!(err.to_string(), "Analysis error: test error");

        let err = Error::FileNotFound {
            path: PathBuf::from("app.py"),
        };
        assert_eq!(err.to_string(), "File not found: app.py");

        let err = Error::Decode {
            path: PathBuf::from("latin1.py"),
        };
        assert_eq!(err.to_string(), "Could not decode latin1.py as UTF-8");
    }

    #[test]
    fn test_collaborator_error_display() {
        let err = Error::collaborator("safety", "command not found");
        assert_eq!(err.to_string(), "safety failed: command not found");
    }

    #[test]
    fn test_threshold_violation() {
        let err = Error::threshold_violation("Score below minimum", 45.0);
        match err {
            Error::ThresholdViolation { message, score } => {
                assert_eq!(message, "Score below minimum");
                assert!((score - 45.0).abs() < f64::EPSILON);
            }
            _ => panic!("Expected ThresholdViolation"),
        }
    }
}
