//! Submission preconditions.
//!
//! Both a readable input file and an output format are required before a
//! request is constructed; a missing input is rejected here with no network
//! activity.

use std::path::{Component, Path, PathBuf};

use crate::error::ConvertError;
use crate::models::OutputFormat;

/// Multipart file name used when the path has no printable file name.
pub const DEFAULT_FILE_NAME: &str = "upload.bin";

/// A submission that passed all preconditions.
#[derive(Debug, Clone)]
pub struct ValidatedUpload {
    pub path: PathBuf,
    pub file_name: String,
    pub format: OutputFormat,
}

/// Check submission preconditions: a format must be chosen and the path must
/// name an existing regular file. Paths with parent-directory components are
/// rejected outright.
pub fn validate_upload(
    path: &Path,
    format: Option<OutputFormat>,
) -> Result<ValidatedUpload, ConvertError> {
    let format = format.ok_or(ConvertError::MissingFormat)?;

    if path.components().any(|c| c == Component::ParentDir) {
        return Err(ConvertError::InvalidInput(format!(
            "Invalid input path: {}",
            path.display()
        )));
    }

    if !path.is_file() {
        return Err(ConvertError::MissingFile(path.display().to_string()));
    }

    let file_name = path
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or(DEFAULT_FILE_NAME)
        .to_string();

    Ok(ValidatedUpload {
        path: path.to_path_buf(),
        file_name,
        format,
    })
}
