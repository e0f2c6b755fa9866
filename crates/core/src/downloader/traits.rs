//! Trait definitions for the downloader module.

use async_trait::async_trait;

use super::error::DownloadError;
use crate::job::DownloadJob;
use crate::resolver::ArtifactReference;

/// Fetches the media behind a job's URL into the output root.
#[async_trait]
pub trait Downloader: Send + Sync {
    /// Returns the name of this downloader implementation.
    fn name(&self) -> &str;

    /// Runs the job to completion, retrying internally.
    ///
    /// Returns the produced artifact, or the terminal error once the retry
    /// budget is spent.
    async fn download(&self, job: &DownloadJob) -> Result<ArtifactReference, DownloadError>;
}
