//! Mock downloader for testing.

use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;

use crate::downloader::{AttemptFailure, DownloadError, Downloader};
use crate::job::DownloadJob;
use crate::resolver::{ArtifactReference, MatchRule};

/// What the next downloads should produce.
#[derive(Debug, Clone)]
enum Behavior {
    Succeed(ArtifactReference),
    Fail(AttemptFailure),
}

/// Mock implementation of the Downloader trait.
///
/// Records every job it is asked to download. By default each download
/// fails with [`AttemptFailure::EmptyOutput`]; configure a result with
/// [`set_artifact`](Self::set_artifact) or [`set_failure`](Self::set_failure).
#[derive(Debug)]
pub struct MockDownloader {
    jobs: Arc<RwLock<Vec<DownloadJob>>>,
    behavior: Arc<RwLock<Behavior>>,
    /// Simulated download duration.
    delay: Arc<RwLock<Duration>>,
    attempts: u32,
}

impl Default for MockDownloader {
    fn default() -> Self {
        Self::new()
    }
}

impl MockDownloader {
    pub fn new() -> Self {
        Self {
            jobs: Arc::new(RwLock::new(Vec::new())),
            behavior: Arc::new(RwLock::new(Behavior::Fail(AttemptFailure::EmptyOutput))),
            delay: Arc::new(RwLock::new(Duration::ZERO)),
            attempts: 5,
        }
    }

    /// Make downloads succeed with the file at `path` (`<root>/<name>`).
    ///
    /// Panics if `path` has no root directory component.
    pub async fn set_artifact(&self, path: &str) {
        let (root, _) = path
            .rsplit_once('/')
            .expect("artifact path must include the output root");
        let artifact = ArtifactReference::new(root, path, MatchRule::Strict)
            .expect("artifact path must stay inside the output root");
        *self.behavior.write().await = Behavior::Succeed(artifact);
    }

    /// Make downloads exhaust their attempts, ending with `failure`.
    pub async fn set_failure(&self, failure: AttemptFailure) {
        *self.behavior.write().await = Behavior::Fail(failure);
    }

    /// Delay every download by `delay`.
    pub async fn set_delay(&self, delay: Duration) {
        *self.delay.write().await = delay;
    }

    /// Get all jobs passed to `download`.
    pub async fn recorded_jobs(&self) -> Vec<DownloadJob> {
        self.jobs.read().await.clone()
    }

    /// Get the number of downloads performed.
    pub async fn download_count(&self) -> usize {
        self.jobs.read().await.len()
    }
}

#[async_trait]
impl Downloader for MockDownloader {
    fn name(&self) -> &str {
        "mock"
    }

    async fn download(&self, job: &DownloadJob) -> Result<ArtifactReference, DownloadError> {
        self.jobs.write().await.push(job.clone());

        let delay = *self.delay.read().await;
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }

        match self.behavior.read().await.clone() {
            Behavior::Succeed(artifact) => Ok(artifact),
            Behavior::Fail(last) => Err(DownloadError::Exhausted {
                attempts: self.attempts,
                last,
            }),
        }
    }
}
