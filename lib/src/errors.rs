use std::process::ExitStatus;

use thiserror::Error;

/// Result type returned from functions that can have our `Error`s.
pub type Result<T, E = BacklitError> = std::result::Result<T, E>;

#[derive(Error, Debug)]
#[non_exhaustive]
pub enum BacklitError {
    #[error("{0}")]
    Io(#[from] std::io::Error),

    #[error("{0}")]
    InvalidRegex(#[from] regex::Error),

    #[error("{0}")]
    DBus(#[from] zbus::Error),

    #[error("No backlight devices found")]
    NoDevices,

    #[error("Invalid device name {0:?}")]
    InvalidDeviceName(String),

    #[error("Authorization was denied by {program}")]
    ElevationDenied { program: String },

    #[error("Command '{program}' not found")]
    CommandNotFound { program: String },

    #[error("Failed to run the write command ({status}): {stderr}")]
    WriteRejected { status: ExitStatus, stderr: String },

    #[error("{0}")]
    Other(String),
}

/// Attach a message to a foreign error while converting it into ours.
pub(crate) trait ErrorContext<T> {
    fn error(self, message: &str) -> Result<T>;
}

impl<T, E: std::fmt::Display> ErrorContext<T> for std::result::Result<T, E> {
    fn error(self, message: &str) -> Result<T> {
        self.map_err(|e| BacklitError::Other(format!("{message}: {e}")))
    }
}
