//! Validation modules

pub mod upload;

pub use upload::{validate_upload, ValidatedUpload, DEFAULT_FILE_NAME};
