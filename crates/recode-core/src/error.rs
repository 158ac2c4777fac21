//! Error types module
//!
//! All client-side errors are unified under the `ConvertError` enum: missing
//! inputs rejected before a request is built, upload transport/server
//! failures, and live-channel faults.

use std::io;

#[derive(Debug, thiserror::Error)]
pub enum ConvertError {
    #[error("No input file: {0}")]
    MissingFile(String),

    #[error("No output format selected")]
    MissingFormat,

    #[error("Unsupported output format: {0}")]
    UnsupportedFormat(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Upload failed with status {status}: {message}")]
    UploadFailed { status: u16, message: String },

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Progress channel error: {0}")]
    Channel(String),
}

impl ConvertError {
    /// Whether the error was raised before any request left the client.
    /// Missing-input errors block submission entirely; the rest surface after
    /// a request or connection was attempted.
    pub fn is_precondition(&self) -> bool {
        matches!(
            self,
            ConvertError::MissingFile(_)
                | ConvertError::MissingFormat
                | ConvertError::UnsupportedFormat(_)
                | ConvertError::InvalidInput(_)
        )
    }
}

impl From<io::Error> for ConvertError {
    fn from(err: io::Error) -> Self {
        ConvertError::InvalidInput(format!("IO error: {}", err))
    }
}

impl From<serde_json::Error> for ConvertError {
    fn from(err: serde_json::Error) -> Self {
        ConvertError::Channel(format!("JSON parsing error: {}", err))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_inputs_are_preconditions() {
        assert!(ConvertError::MissingFile("a.mp4".into()).is_precondition());
        assert!(ConvertError::MissingFormat.is_precondition());
        assert!(ConvertError::UnsupportedFormat("xvid".into()).is_precondition());
    }

    #[test]
    fn upload_and_channel_errors_are_not_preconditions() {
        let err = ConvertError::UploadFailed {
            status: 500,
            message: "boom".into(),
        };
        assert!(!err.is_precondition());
        assert!(!ConvertError::Transport("refused".into()).is_precondition());
        assert!(!ConvertError::Channel("closed".into()).is_precondition());
    }

    #[test]
    fn upload_failed_message_includes_status() {
        let err = ConvertError::UploadFailed {
            status: 413,
            message: "too large".into(),
        };
        assert_eq!(err.to_string(), "Upload failed with status 413: too large");
    }
}
