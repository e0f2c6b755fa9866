//! Error types for the reporter module.

use thiserror::Error;

/// Reasons a report was not delivered. Only ever logged.
#[derive(Debug, Error)]
pub enum ReportError {
    /// Neither the job nor the configuration names an endpoint.
    #[error("no report destination configured")]
    NoDestination,

    /// The HTTP client could not be built.
    #[error("failed to create HTTP client: {0}")]
    Client(String),

    #[error("report request timed out")]
    Timeout,

    #[error("failed to send report request: {0}")]
    Transport(String),

    /// The receiver answered with a non-2xx status.
    #[error("report request failed with status: {0}")]
    Status(u16),
}

impl ReportError {
    /// Stable label used in metrics.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::NoDestination => "skipped",
            Self::Client(_) | Self::Transport(_) => "transport_error",
            Self::Timeout => "timeout",
            Self::Status(_) => "bad_status",
        }
    }
}
