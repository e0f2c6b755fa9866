//! Error types for the downloader module.

use thiserror::Error;

/// Why a single attempt did not produce an artifact. Always recoverable.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AttemptFailure {
    /// The tool could not be started or exited unsuccessfully.
    #[error("command failed: {reason}")]
    ProcessFailed {
        exit_code: Option<i32>,
        reason: String,
    },

    /// The tool exited cleanly without printing anything.
    #[error("output buffer is empty")]
    EmptyOutput,

    /// No matcher recognized a produced file in the output.
    #[error("failed to parse output file name from yt-dlp output")]
    Unparsable,

    /// The attempt hit its deadline and the process was killed.
    #[error("download timed out after {timeout_ms} ms")]
    TimedOut { timeout_ms: u64 },
}

impl AttemptFailure {
    pub fn process_failed(exit_code: Option<i32>, reason: impl Into<String>) -> Self {
        Self::ProcessFailed {
            exit_code,
            reason: reason.into(),
        }
    }

    /// Stable label used in logs and metrics.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ProcessFailed { .. } => "process_failed",
            Self::EmptyOutput => "empty_output",
            Self::Unparsable => "unparsable",
            Self::TimedOut { .. } => "timed_out",
        }
    }
}

/// Terminal failure of a download job.
#[derive(Debug, Error)]
pub enum DownloadError {
    /// Every attempt in the retry budget failed.
    #[error("all {attempts} attempts failed: {last}")]
    Exhausted { attempts: u32, last: AttemptFailure },

    /// The output matchers could not be compiled for the configured root.
    #[error("invalid output pattern: {0}")]
    InvalidPattern(#[from] regex_lite::Error),

    /// The service shut down before the download finished.
    #[error("download interrupted by shutdown")]
    Interrupted,
}

impl DownloadError {
    /// The failure of the final attempt, if the budget was exhausted.
    pub fn last_failure(&self) -> Option<&AttemptFailure> {
        match self {
            Self::Exhausted { last, .. } => Some(last),
            Self::InvalidPattern(_) | Self::Interrupted => None,
        }
    }
}
