/// Centralized error types for the market core
use thiserror::Error;

#[derive(Error, Debug)]
pub enum FeiraError {
    // Configuration Errors
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    #[error("Invalid timezone: {0}")]
    InvalidTimezone(String),

    #[error("Config parse failed: {0}")]
    TomlError(#[from] toml::de::Error),

    #[error("Config source failed: {0}")]
    ConfigSourceError(#[from] ::config::ConfigError),

    // Form Errors
    #[error("Validator failed: {0}")]
    ValidatorFailed(String),

    #[error("Submit failed: {0}")]
    SubmitFailed(String),

    // Data Errors
    #[error("Deserialization failed: {0}")]
    DeserializationError(#[from] serde_json::Error),

    // File I/O Errors
    #[error("File I/O error: {0}")]
    FileError(#[from] std::io::Error),

    // Ticker Errors
    #[error("Ticker stopped: {0}")]
    TickerStopped(String),
}

pub type Result<T> = std::result::Result<T, FeiraError>;

impl FeiraError {
    /// Check if retrying the same operation may succeed
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            FeiraError::SubmitFailed(_) | FeiraError::FileError(_)
        )
    }

    /// Get error code for logging
    pub fn error_code(&self) -> &str {
        match self {
            FeiraError::ConfigError(_) => "CFG_001",
            FeiraError::InvalidParameter(_) => "CFG_002",
            FeiraError::InvalidTimezone(_) => "CFG_003",
            FeiraError::TomlError(_) => "CFG_004",
            FeiraError::ConfigSourceError(_) => "CFG_005",
            FeiraError::ValidatorFailed(_) => "FORM_001",
            FeiraError::SubmitFailed(_) => "FORM_002",
            FeiraError::DeserializationError(_) => "DATA_001",
            FeiraError::FileError(_) => "FILE_001",
            FeiraError::TickerStopped(_) => "TICK_001",
        }
    }
}
