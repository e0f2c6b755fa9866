//! Detached job execution: download, then report exactly once.
//!
//! Jobs run on tracked tasks. [`DownloadService::shutdown`] lets them finish
//! within a grace period and interrupts the rest, which are then reported as
//! failed.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::task::JoinHandle;
use tokio::time::timeout;
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;
use tracing::{error, info, info_span, warn, Instrument};

use crate::downloader::{DownloadError, Downloader};
use crate::job::DownloadJob;
use crate::metrics::{JOBS_IN_FLIGHT, JOBS_TOTAL, JOB_DURATION};
use crate::reporter::Reporter;
use crate::resolver::ArtifactReference;

/// Runs jobs in the background and reports their outcome.
#[derive(Clone)]
pub struct DownloadService {
    downloader: Arc<dyn Downloader>,
    reporter: Arc<dyn Reporter>,
    active: Arc<AtomicUsize>,
    tasks: TaskTracker,
    shutdown: CancellationToken,
}

/// Decrements the active-job counters when a run ends, even by panic.
struct ActiveGuard(Arc<AtomicUsize>);

impl ActiveGuard {
    fn enter(counter: &Arc<AtomicUsize>) -> Self {
        counter.fetch_add(1, Ordering::SeqCst);
        JOBS_IN_FLIGHT.inc();
        Self(Arc::clone(counter))
    }
}

impl Drop for ActiveGuard {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
        JOBS_IN_FLIGHT.dec();
    }
}

impl DownloadService {
    pub fn new(downloader: Arc<dyn Downloader>, reporter: Arc<dyn Reporter>) -> Self {
        Self {
            downloader,
            reporter,
            active: Arc::new(AtomicUsize::new(0)),
            tasks: TaskTracker::new(),
            shutdown: CancellationToken::new(),
        }
    }

    /// Name of the underlying downloader.
    pub fn downloader_name(&self) -> &str {
        self.downloader.name()
    }

    /// Jobs currently downloading or reporting.
    pub fn active_jobs(&self) -> usize {
        self.active.load(Ordering::SeqCst)
    }

    /// Starts `job` on its own task and returns immediately.
    pub fn submit(&self, job: DownloadJob) -> JoinHandle<()> {
        let service = self.clone();
        let span = info_span!("job", id = %job.id());

        self.tasks.spawn(
            async move {
                let _ = service.run(&job).await;
            }
            .instrument(span),
        )
    }

    /// Waits up to `grace` for submitted jobs to finish, then interrupts the
    /// ones still downloading and waits for their failure reports.
    ///
    /// Returns the number of jobs that had to be interrupted.
    pub async fn shutdown(&self, grace: Duration) -> usize {
        self.tasks.close();
        if timeout(grace, self.tasks.wait()).await.is_ok() {
            info!("All jobs finished");
            return 0;
        }

        let interrupted = self.tasks.len();
        warn!(
            "{} job(s) still running after {:?}, interrupting",
            interrupted, grace
        );
        self.shutdown.cancel();
        self.tasks.wait().await;
        interrupted
    }

    /// Downloads `job` and delivers exactly one report for it.
    ///
    /// The result is returned for callers that want it; the report has
    /// already been sent either way.
    pub async fn run(&self, job: &DownloadJob) -> Result<ArtifactReference, DownloadError> {
        let _guard = ActiveGuard::enter(&self.active);
        let start = Instant::now();

        let result = tokio::select! {
            result = self.downloader.download(job) => result,
            _ = self.shutdown.cancelled() => Err(DownloadError::Interrupted),
        };

        match &result {
            Ok(artifact) => {
                info!("Downloaded video for ID: {}, file: {}", job.id(), artifact.path());
                JOBS_TOTAL.with_label_values(&["succeeded"]).inc();
                JOB_DURATION
                    .with_label_values(&["succeeded"])
                    .observe(start.elapsed().as_secs_f64());
                self.reporter.report_success(job, artifact).await;
            }
            Err(e) => {
                error!("Failed to download video for ID {}: {}", job.id(), e);
                let label = match e {
                    DownloadError::Interrupted => "interrupted",
                    _ => "failed",
                };
                JOBS_TOTAL.with_label_values(&[label]).inc();
                JOB_DURATION
                    .with_label_values(&[label])
                    .observe(start.elapsed().as_secs_f64());
                self.reporter.report_failure(job, e).await;
            }
        }

        result
    }
}
