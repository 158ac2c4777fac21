use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter, Result as FmtResult};

/// Status tag the service uses for a finished conversion.
pub const STATUS_DONE: &str = "done";

/// Inbound live-channel record. Every field is optional; a message may carry
/// a progress figure, a status flag, a download path, or any mix of them.
///
/// The service is loose about the progress type and has been observed sending
/// both JSON numbers and numeric strings, so both must parse.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProgressUpdate {
    #[serde(default, deserialize_with = "deserialize_loose_percent")]
    pub progress: Option<f64>,
    #[serde(default)]
    pub status: Option<String>,
    /// Server-relative download path, e.g. `/download/{job}/{format}`.
    #[serde(default)]
    pub download: Option<String>,
}

impl ProgressUpdate {
    pub fn is_done(&self) -> bool {
        self.status.as_deref() == Some(STATUS_DONE)
    }
}

fn deserialize_loose_percent<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Percent {
        Number(f64),
        Text(String),
    }

    match Option::<Percent>::deserialize(deserializer)? {
        None => Ok(None),
        Some(Percent::Number(n)) => Ok(Some(n)),
        Some(Percent::Text(s)) => s
            .trim()
            .parse::<f64>()
            .map(Some)
            .map_err(|e| serde::de::Error::custom(format!("invalid progress value: {}", e))),
    }
}

/// Unified conversion state, covering both the client-local upload estimate
/// and the server-driven conversion progress. One job moves through
/// `Idle -> Uploading -> Converting -> Done`, with `Failed` as the only error
/// arm. `Uploading` percentages come from bytes transferred during the
/// request body transmission; `Converting` percentages come from the live
/// channel. The two signals are never mixed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum ConversionState {
    Idle,
    Uploading { percent: f64 },
    Converting { percent: f64 },
    Done { download_url: String },
    Failed { reason: String },
}

impl ConversionState {
    /// Fold an inbound live-channel record into the state machine.
    ///
    /// A `done` status with a download path is terminal and wins over any
    /// progress figure in the same message; the download URL is the HTTP base
    /// concatenated with the server-relative path, exactly. Progress figures
    /// are clamped to 0..=100 and to non-decreasing while converting (the
    /// service does not guarantee monotonic values). Terminal states absorb
    /// all further updates.
    pub fn apply(&self, update: &ProgressUpdate, api_base_url: &str) -> ConversionState {
        if self.is_terminal() {
            return self.clone();
        }

        if update.is_done() {
            if let Some(path) = &update.download {
                return ConversionState::Done {
                    download_url: format!("{}{}", api_base_url, path),
                };
            }
        }

        if let Some(raw) = update.progress {
            let mut percent = raw.clamp(0.0, 100.0);
            if let ConversionState::Converting { percent: prior } = self {
                percent = percent.max(*prior);
            }
            return ConversionState::Converting { percent };
        }

        self.clone()
    }

    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            ConversionState::Done { .. } | ConversionState::Failed { .. }
        )
    }

    /// Displayed percentage, when the state carries one.
    pub fn percent(&self) -> Option<f64> {
        match self {
            ConversionState::Uploading { percent } | ConversionState::Converting { percent } => {
                Some(*percent)
            }
            ConversionState::Done { .. } => Some(100.0),
            _ => None,
        }
    }
}

impl Display for ConversionState {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            ConversionState::Idle => write!(f, "idle"),
            ConversionState::Uploading { percent } => write!(f, "uploading {:.0}%", percent),
            ConversionState::Converting { percent } => write!(f, "converting {:.0}%", percent),
            ConversionState::Done { download_url } => write!(f, "done: {}", download_url),
            ConversionState::Failed { reason } => write!(f, "failed: {}", reason),
        }
    }
}

/// Receiver for state transitions emitted while a job runs (upload byte
/// counting, live-channel updates).
pub trait ProgressSink: Send + Sync {
    fn on_state(&self, state: &ConversionState);
}

#[cfg(test)]
mod tests {
    use super::*;

    const BASE: &str = "http://localhost:5000";

    fn update(json: &str) -> ProgressUpdate {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn progress_figure_moves_to_converting() {
        let state = ConversionState::Idle.apply(&update(r#"{"progress":42}"#), BASE);
        assert_eq!(state, ConversionState::Converting { percent: 42.0 });
    }

    #[test]
    fn progress_accepts_numeric_strings() {
        let parsed = update(r#"{"progress":"37.5"}"#);
        assert_eq!(parsed.progress, Some(37.5));
    }

    #[test]
    fn malformed_progress_string_is_a_parse_error() {
        assert!(serde_json::from_str::<ProgressUpdate>(r#"{"progress":"lots"}"#).is_err());
    }

    #[test]
    fn done_with_download_builds_exact_url() {
        let state = ConversionState::Converting { percent: 90.0 }
            .apply(&update(r#"{"status":"done","download":"/x"}"#), BASE);
        assert_eq!(
            state,
            ConversionState::Done {
                download_url: "http://localhost:5000/x".to_string()
            }
        );
    }

    #[test]
    fn done_wins_over_progress_in_same_message() {
        let state = ConversionState::Converting { percent: 10.0 }.apply(
            &update(r#"{"progress":95,"status":"done","download":"/out.mp4"}"#),
            BASE,
        );
        assert!(matches!(state, ConversionState::Done { .. }));
    }

    #[test]
    fn done_without_download_leaves_state_unchanged() {
        let prior = ConversionState::Converting { percent: 80.0 };
        let state = prior.apply(&update(r#"{"status":"done"}"#), BASE);
        assert_eq!(state, prior);
    }

    #[test]
    fn converting_percent_never_decreases() {
        let state = ConversionState::Converting { percent: 60.0 }
            .apply(&update(r#"{"progress":45}"#), BASE);
        assert_eq!(state, ConversionState::Converting { percent: 60.0 });
    }

    #[test]
    fn percent_is_clamped_to_valid_range() {
        let state = ConversionState::Idle.apply(&update(r#"{"progress":250}"#), BASE);
        assert_eq!(state, ConversionState::Converting { percent: 100.0 });
        let state = ConversionState::Idle.apply(&update(r#"{"progress":-3}"#), BASE);
        assert_eq!(state, ConversionState::Converting { percent: 0.0 });
    }

    #[test]
    fn terminal_states_absorb_further_updates() {
        let done = ConversionState::Done {
            download_url: "http://localhost:5000/x".to_string(),
        };
        assert_eq!(done.apply(&update(r#"{"progress":10}"#), BASE), done);

        let failed = ConversionState::Failed {
            reason: "connection reset".to_string(),
        };
        assert_eq!(
            failed.apply(&update(r#"{"status":"done","download":"/x"}"#), BASE),
            failed
        );
    }

    #[test]
    fn empty_update_is_a_no_op() {
        let prior = ConversionState::Converting { percent: 12.0 };
        assert_eq!(prior.apply(&ProgressUpdate::default(), BASE), prior);
    }

    #[test]
    fn unknown_status_values_are_ignored() {
        let prior = ConversionState::Converting { percent: 50.0 };
        let state = prior.apply(&update(r#"{"status":"transcoding"}"#), BASE);
        assert_eq!(state, prior);
    }

    #[test]
    fn percent_accessor() {
        assert_eq!(ConversionState::Idle.percent(), None);
        assert_eq!(
            ConversionState::Uploading { percent: 30.0 }.percent(),
            Some(30.0)
        );
        assert_eq!(
            ConversionState::Done {
                download_url: "u".into()
            }
            .percent(),
            Some(100.0)
        );
    }
}
