//! Recode Core Library
//!
//! This crate provides the domain models, error types, configuration, and
//! input validation shared by the Recode client crates.

pub mod config;
pub mod error;
pub mod models;
pub mod validation;

// Re-export commonly used types
pub use config::ClientConfig;
pub use error::ConvertError;
pub use models::{
    ConversionState, JobId, MediaKind, OutputFormat, ProgressSink, ProgressUpdate, SubmitResponse,
};
pub use validation::{validate_upload, ValidatedUpload};
