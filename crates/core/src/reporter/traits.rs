//! Trait definitions for the reporter module.

use async_trait::async_trait;

use crate::downloader::DownloadError;
use crate::job::DownloadJob;
use crate::resolver::ArtifactReference;

/// Delivers the outcome of a job. Fire-and-forget: implementations swallow
/// their own failures.
#[async_trait]
pub trait Reporter: Send + Sync {
    /// Reports a produced artifact.
    async fn report_success(&self, job: &DownloadJob, artifact: &ArtifactReference);

    /// Reports a job that exhausted its retry budget.
    async fn report_failure(&self, job: &DownloadJob, error: &DownloadError);
}
