//! DV-prefixed error types with structured error codes.

#![allow(missing_docs)]

use std::path::{Path, PathBuf};

use thiserror::Error;

/// Shared `Result` alias for the project.
pub type Result<T> = std::result::Result<T, DashError>;

/// Top-level error type for the dashboard orchestrator.
///
/// The state machines themselves are total; these variants cover the
/// configuration, card-set, journal and serialization surfaces around them.
#[derive(Debug, Error)]
pub enum DashError {
    #[error("[DV-1001] invalid configuration: {details}")]
    InvalidConfig { details: String },

    #[error("[DV-1002] missing configuration file: {path}")]
    MissingConfig { path: PathBuf },

    #[error("[DV-1003] configuration parse failure in {context}: {details}")]
    ConfigParse {
        context: &'static str,
        details: String,
    },

    #[error("[DV-2001] invalid card set: {details}")]
    InvalidCardSet { details: String },

    #[error("[DV-2002] card {index} is not part of this dashboard ({count} cards)")]
    UnknownCard { index: usize, count: usize },

    #[error("[DV-2101] serialization failure in {context}: {details}")]
    Serialization {
        context: &'static str,
        details: String,
    },

    #[error("[DV-3002] IO failure at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("[DV-3003] channel closed in component {component}")]
    ChannelClosed { component: &'static str },

    #[error("[DV-3900] runtime failure: {details}")]
    Runtime { details: String },
}

impl DashError {
    /// Stable machine-parseable error code.
    #[must_use]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::InvalidConfig { .. } => "DV-1001",
            Self::MissingConfig { .. } => "DV-1002",
            Self::ConfigParse { .. } => "DV-1003",
            Self::InvalidCardSet { .. } => "DV-2001",
            Self::UnknownCard { .. } => "DV-2002",
            Self::Serialization { .. } => "DV-2101",
            Self::Io { .. } => "DV-3002",
            Self::ChannelClosed { .. } => "DV-3003",
            Self::Runtime { .. } => "DV-3900",
        }
    }

    /// Whether retrying might resolve the failure.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::Io { .. } | Self::ChannelClosed { .. } | Self::Runtime { .. }
        )
    }

    /// Convenience constructor for IO errors with a known path.
    #[must_use]
    pub fn io(path: impl AsRef<Path>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.as_ref().to_path_buf(),
            source,
        }
    }
}

impl From<serde_json::Error> for DashError {
    fn from(value: serde_json::Error) -> Self {
        Self::Serialization {
            context: "serde_json",
            details: value.to_string(),
        }
    }
}

impl From<toml::de::Error> for DashError {
    fn from(value: toml::de::Error) -> Self {
        Self::ConfigParse {
            context: "toml",
            details: value.to_string(),
        }
    }
}
