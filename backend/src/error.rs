//! Error types for the fallible outer surfaces of the chart pipeline.
//!
//! The pipeline itself never fails on bad data: unparseable timestamps are
//! fallback-dated, thin histories skip outlier filtering and an empty log just
//! yields empty sections. Errors only come from loading configuration,
//! decoding entry logs and background rebuild tasks.

use std::path::PathBuf;

/// Result type for chart operations.
pub type ChartResult<T> = Result<T, ChartError>;

/// Error type for chart configuration, decoding and background processing.
#[derive(Debug, thiserror::Error)]
pub enum ChartError {
    /// Configuration file could not be read.
    #[error("Failed to read config file {path}: {source}")]
    ConfigRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Configuration text is not valid TOML for [`crate::config::ChartConfig`].
    #[error("Failed to parse config: {0}")]
    ConfigParse(#[from] toml::de::Error),

    /// Configuration parsed but holds values the pipeline cannot work with.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Entry log could not be decoded.
    #[error("Failed to decode entry log: {0}")]
    Decode(#[from] serde_json::Error),

    /// Background rebuild task panicked or was cancelled.
    #[error("Background rebuild failed: {0}")]
    Background(#[from] tokio::task::JoinError),
}

impl ChartError {
    /// Create an invalid configuration error.
    pub fn invalid_config(message: impl Into<String>) -> Self {
        Self::InvalidConfig(message.into())
    }

    /// Check if this error came from configuration handling.
    pub fn is_config_error(&self) -> bool {
        matches!(
            self,
            Self::ConfigRead { .. } | Self::ConfigParse(_) | Self::InvalidConfig(_)
        )
    }
}
