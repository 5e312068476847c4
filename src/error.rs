//! Error types for the analysis engine
//!
//! Errors fall in two groups. Per-file and per-reference problems are recorded
//! in diagnostics and never abort a run; the variants below that reach a caller
//! are the ones that make a whole run meaningless (or a single export fail).

use std::path::PathBuf;
use std::process::ExitCode;

use thiserror::Error;

/// Main error type for depsight
#[derive(Error, Debug)]
pub enum EngineError {
    /// Project root is missing or not a directory
    #[error("Invalid project root: {path}")]
    InvalidProjectRoot { path: String },

    /// No entities were found for a full analysis command
    #[error("No analyzable entities found in project: {path}")]
    EmptyProject { path: String },

    /// File extension not handled by any front-end
    #[error("Unsupported language for extension: {extension}")]
    UnsupportedLanguage { extension: String },

    /// A single source file could not be parsed
    #[error("Failed to parse {path}: {message}")]
    ParseFailure { path: String, message: String },

    /// Writing one export target failed
    #[error("Failed to export {target}: {source}")]
    Export {
        target: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Invalid configuration file or value
    #[error("Configuration error: {message}")]
    Config { message: String },

    /// IO error wrapper
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON (de)serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl From<toml::de::Error> for EngineError {
    fn from(err: toml::de::Error) -> Self {
        Self::Config {
            message: err.to_string(),
        }
    }
}

impl EngineError {
    /// Process exit code for this error
    ///
    /// Every analysis failure maps to 1; configuration mistakes map to 2 so
    /// scripts can tell a bad invocation from a failed run.
    pub fn exit_code(&self) -> ExitCode {
        ExitCode::from(self.exit_status())
    }

    /// Numeric form of [`EngineError::exit_code`]
    pub fn exit_status(&self) -> u8 {
        match self {
            Self::Config { .. } => 2,
            _ => 1,
        }
    }

    /// Whether this error only affects a single file or export target
    pub fn is_recoverable(&self) -> bool {
        matches!(self, Self::ParseFailure { .. } | Self::Export { .. })
    }
}

/// Result type alias for depsight operations
pub type Result<T> = std::result::Result<T, EngineError>;
