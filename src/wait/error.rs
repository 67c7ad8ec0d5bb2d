//! Error types for the wait hook

use std::time::Duration;

use thiserror::Error;

use crate::selector::SelectionError;

/// Error variants are named after the stage that failed, so call sites read
/// as "client not initialized", "config not loaded" and so on.
#[derive(Error, Debug)]
pub enum Error {
    #[error("Cannot execute hook '{hook}': kube client is not initialized")]
    ClientNotInitialized { hook: String },

    #[error("Cannot execute hook '{hook}': config is not loaded")]
    ConfigNotLoaded { hook: String },

    #[error("Cannot execute hook '{hook}': no wait condition defined")]
    MissingWaitCondition { hook: String },

    #[error("Image resolution error: {0}")]
    ImageResolution(String),

    #[error("Hook '{hook}' failed: {source}")]
    Wait {
        hook: String,
        #[source]
        source: WaitError,
    },

    #[error("Failed to read {path}: {source}")]
    ConfigIo {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid configuration: {0}")]
    ConfigParse(#[from] serde_yaml::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl Error {
    /// Check if the wait ran out of time
    pub fn is_timeout(&self) -> bool {
        matches!(
            self,
            Error::Wait {
                source: WaitError::Timeout(_),
                ..
            }
        )
    }

    /// Check if the wait was cancelled by the caller
    pub fn is_cancelled(&self) -> bool {
        matches!(
            self,
            Error::Wait {
                source: WaitError::Cancelled,
                ..
            }
        )
    }
}

/// Terminal failure of the poll loop
#[derive(Error, Debug)]
pub enum WaitError {
    #[error("container selection failed: {0}")]
    Selection(#[from] SelectionError),

    #[error("condition was not met within {0:?}")]
    Timeout(Duration),

    #[error("wait was cancelled")]
    Cancelled,
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
