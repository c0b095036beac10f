use std::path::PathBuf;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, TraceError>;

/// Setup errors. Anything that goes wrong once the traversal has started is
/// recorded in the edge log instead of being returned here.
#[derive(Error, Debug)]
pub enum TraceError {
    #[error("Invalid seed file {path}: {reason}")]
    InvalidSeed { path: PathBuf, reason: String },

    #[error("Invalid project root {path}: {reason}")]
    InvalidRoot { path: PathBuf, reason: String },

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Failed to parse config {path}: {source}")]
    ConfigParse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl TraceError {
    pub fn invalid_seed(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        Self::InvalidSeed {
            path: path.into(),
            reason: reason.into(),
        }
    }

    pub fn invalid_root(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        Self::InvalidRoot {
            path: path.into(),
            reason: reason.into(),
        }
    }

    pub fn invalid_config(msg: impl Into<String>) -> Self {
        Self::InvalidConfig(msg.into())
    }
}
