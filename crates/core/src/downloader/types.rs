//! Per-attempt records.

use chrono::{DateTime, Utc};
use std::time::Duration;

use super::error::AttemptFailure;
use crate::resolver::ArtifactReference;

/// Classification of one tool invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttemptOutcome {
    Succeeded(ArtifactReference),
    Failed(AttemptFailure),
}

impl AttemptOutcome {
    /// Stable label used in logs and metrics.
    pub fn as_str(&self) -> &'static str {
        match self {
            AttemptOutcome::Succeeded(_) => "succeeded",
            AttemptOutcome::Failed(failure) => failure.as_str(),
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, AttemptOutcome::Succeeded(_))
    }
}

/// Everything observed during one attempt. Lives for one retry iteration.
#[derive(Debug, Clone)]
pub struct AttemptRecord {
    /// 1-based attempt number.
    pub attempt: u32,
    pub started_at: DateTime<Utc>,
    pub elapsed: Duration,
    /// Exit code, when the process exited on its own.
    pub exit_code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
    pub outcome: AttemptOutcome,
}
