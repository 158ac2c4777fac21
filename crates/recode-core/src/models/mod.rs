//! Data models for the conversion client
//!
//! Organized by domain: output formats, job identity, and progress tracking.

mod format;
mod job;
mod progress;

pub use format::*;
pub use job::*;
pub use progress::*;
