//! Mock reporter for testing.

use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::downloader::DownloadError;
use crate::job::DownloadJob;
use crate::reporter::Reporter;
use crate::resolver::ArtifactReference;

/// A recorded report for test assertions.
#[derive(Debug, Clone, PartialEq)]
pub enum RecordedReport {
    Success { job_id: String, path: String },
    Failure { job_id: String, error: String },
}

impl RecordedReport {
    pub fn job_id(&self) -> &str {
        match self {
            Self::Success { job_id, .. } | Self::Failure { job_id, .. } => job_id,
        }
    }
}

/// Mock implementation of the Reporter trait that records instead of sending.
#[derive(Debug, Default)]
pub struct MockReporter {
    reports: Arc<RwLock<Vec<RecordedReport>>>,
}

impl MockReporter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Get all recorded reports, in delivery order.
    pub async fn recorded_reports(&self) -> Vec<RecordedReport> {
        self.reports.read().await.clone()
    }

    /// Get the number of reports for `job_id`.
    pub async fn report_count(&self, job_id: &str) -> usize {
        self.reports
            .read()
            .await
            .iter()
            .filter(|report| report.job_id() == job_id)
            .count()
    }
}

#[async_trait]
impl Reporter for MockReporter {
    async fn report_success(&self, job: &DownloadJob, artifact: &ArtifactReference) {
        self.reports.write().await.push(RecordedReport::Success {
            job_id: job.id().to_string(),
            path: artifact.path().to_string(),
        });
    }

    async fn report_failure(&self, job: &DownloadJob, error: &DownloadError) {
        self.reports.write().await.push(RecordedReport::Failure {
            job_id: job.id().to_string(),
            error: error.to_string(),
        });
    }
}
