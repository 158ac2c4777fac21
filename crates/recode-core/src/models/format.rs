use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter, Result as FmtResult};
use std::str::FromStr;

use crate::error::ConvertError;

/// Target output format accepted by the conversion service. The tag is
/// embedded verbatim in the upload path and doubles as the file extension.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    Mp4,
    Avi,
    Mkv,
    Webm,
    Gif,
    Mp3,
    Wav,
    Aac,
    Flac,
    Ogg,
}

/// Broad media category of an output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaKind {
    Video,
    Audio,
}

impl Display for MediaKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            MediaKind::Video => write!(f, "video"),
            MediaKind::Audio => write!(f, "audio"),
        }
    }
}

impl OutputFormat {
    /// Every supported format, video containers first.
    pub const ALL: [OutputFormat; 10] = [
        OutputFormat::Mp4,
        OutputFormat::Avi,
        OutputFormat::Mkv,
        OutputFormat::Webm,
        OutputFormat::Gif,
        OutputFormat::Mp3,
        OutputFormat::Wav,
        OutputFormat::Aac,
        OutputFormat::Flac,
        OutputFormat::Ogg,
    ];

    pub fn kind(&self) -> MediaKind {
        match self {
            OutputFormat::Mp4
            | OutputFormat::Avi
            | OutputFormat::Mkv
            | OutputFormat::Webm
            | OutputFormat::Gif => MediaKind::Video,
            OutputFormat::Mp3
            | OutputFormat::Wav
            | OutputFormat::Aac
            | OutputFormat::Flac
            | OutputFormat::Ogg => MediaKind::Audio,
        }
    }

    /// File extension for artifacts in this format (same as the wire tag).
    pub fn extension(&self) -> &'static str {
        self.as_str()
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            OutputFormat::Mp4 => "mp4",
            OutputFormat::Avi => "avi",
            OutputFormat::Mkv => "mkv",
            OutputFormat::Webm => "webm",
            OutputFormat::Gif => "gif",
            OutputFormat::Mp3 => "mp3",
            OutputFormat::Wav => "wav",
            OutputFormat::Aac => "aac",
            OutputFormat::Flac => "flac",
            OutputFormat::Ogg => "ogg",
        }
    }
}

impl Display for OutputFormat {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for OutputFormat {
    type Err = ConvertError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "mp4" => Ok(OutputFormat::Mp4),
            "avi" => Ok(OutputFormat::Avi),
            "mkv" => Ok(OutputFormat::Mkv),
            "webm" => Ok(OutputFormat::Webm),
            "gif" => Ok(OutputFormat::Gif),
            "mp3" => Ok(OutputFormat::Mp3),
            "wav" => Ok(OutputFormat::Wav),
            "aac" => Ok(OutputFormat::Aac),
            "flac" => Ok(OutputFormat::Flac),
            "ogg" => Ok(OutputFormat::Ogg),
            other => Err(ConvertError::UnsupportedFormat(other.to_string())),
        }
    }
}
