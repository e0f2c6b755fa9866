//! yt-dlp backed downloader.

use async_trait::async_trait;
use chrono::Utc;
use reqwest::Url;
use std::collections::BTreeSet;
use std::path::Path;
use std::time::Instant;
use tokio::process::Command;
use tracing::{debug, info, warn};

use super::error::{AttemptFailure, DownloadError};
use super::process::{run_with_timeout, ProcessRun};
use super::traits::Downloader;
use super::types::{AttemptOutcome, AttemptRecord};
use crate::config::DownloaderConfig;
use crate::job::DownloadJob;
use crate::metrics::{ARTIFACTS_RESOLVED, DOWNLOAD_ATTEMPTS, PARTIAL_FILES_REMOVED};
use crate::resolver::{ArtifactReference, ArtifactResolver};

/// Runs yt-dlp with bounded retries and a per-attempt deadline.
pub struct YtDlpDownloader {
    config: DownloaderConfig,
    resolver: ArtifactResolver,
}

impl YtDlpDownloader {
    /// Creates a downloader writing into `config.output_dir`.
    pub fn new(config: DownloaderConfig) -> Result<Self, DownloadError> {
        let resolver = ArtifactResolver::new(&config.output_dir)?;
        Ok(Self { config, resolver })
    }

    pub fn config(&self) -> &DownloaderConfig {
        &self.config
    }

    /// Filename prefix for a job's files. Keeps the id from leaving the
    /// output root.
    fn file_prefix(job_id: &str) -> String {
        job_id
            .chars()
            .map(|c| if matches!(c, '/' | '\\') { '_' } else { c })
            .collect()
    }

    /// yt-dlp output template, namespaced by the job id.
    fn output_template(&self, job_id: &str) -> String {
        format!(
            "{}/{}_%(id)s_%(width)sx%(height)s_%(duration>%H-%M-%S)s.%(ext)s",
            self.resolver.root(),
            Self::file_prefix(job_id).replace('%', "%%")
        )
    }

    /// Whether the URL's host needs the alternate extractor instead of cookies.
    fn uses_alternate_extraction(&self, url: &str) -> bool {
        let Some(host) = Url::parse(url)
            .ok()
            .and_then(|url| url.host_str().map(|h| h.to_ascii_lowercase()))
        else {
            return false;
        };

        self.config.alternate_extraction_hosts.iter().any(|candidate| {
            let candidate = candidate.to_ascii_lowercase();
            host == candidate || host.ends_with(&format!(".{}", candidate))
        })
    }

    /// Builds the yt-dlp arguments for one attempt.
    fn build_args(&self, job: &DownloadJob) -> Vec<String> {
        let mut args: Vec<String> = self
            .config
            .extra_params
            .split_whitespace()
            .map(str::to_string)
            .collect();

        if self.uses_alternate_extraction(job.url()) {
            args.extend([
                "--extractor-args".to_string(),
                self.config.alternate_extractor_args.clone(),
            ]);
        } else if let Some(cookies) = self.config.cookies_file() {
            args.extend([
                "--cookies".to_string(),
                cookies.to_string_lossy().to_string(),
            ]);
        }

        args.extend([
            "--user-agent".to_string(),
            self.config.user_agent.clone(),
            "-o".to_string(),
            self.output_template(job.id()),
            job.url().to_string(),
            "--max-filesize".to_string(),
            self.config.max_filesize.clone(),
        ]);

        args
    }

    /// Runs and classifies a single attempt.
    pub async fn run_attempt(&self, job: &DownloadJob, attempt: u32) -> AttemptRecord {
        let started_at = Utc::now();
        let start = Instant::now();

        let mut command = Command::new(&self.config.tool_path);
        command.args(self.build_args(job));

        let run = run_with_timeout(command, self.config.attempt_timeout()).await;

        let (exit_code, stdout, stderr, outcome) = match run {
            ProcessRun::Failed(e) => {
                let failure = if e.kind() == std::io::ErrorKind::NotFound {
                    AttemptFailure::process_failed(
                        None,
                        format!("yt-dlp not found at path: {}", self.config.tool_path.display()),
                    )
                } else {
                    AttemptFailure::process_failed(None, e.to_string())
                };
                (None, String::new(), String::new(), AttemptOutcome::Failed(failure))
            }
            ProcessRun::TimedOut {
                killed,
                stdout,
                stderr,
            } => {
                if !killed {
                    warn!("Attempt {} for job {} may have left a running process", attempt, job.id());
                }
                let failure = AttemptFailure::TimedOut {
                    timeout_ms: self.config.attempt_timeout_ms,
                };
                (None, stdout, stderr, AttemptOutcome::Failed(failure))
            }
            ProcessRun::Exited(exit) => {
                let outcome = self.classify_exit(exit.success, exit.exit_code, &exit.stdout);
                (exit.exit_code, exit.stdout, exit.stderr, outcome)
            }
        };

        AttemptRecord {
            attempt,
            started_at,
            elapsed: start.elapsed(),
            exit_code,
            stdout,
            stderr,
            outcome,
        }
    }

    fn classify_exit(&self, success: bool, exit_code: Option<i32>, stdout: &str) -> AttemptOutcome {
        if !success {
            let reason = match exit_code {
                Some(code) => format!("exit status: {}", code),
                None => "terminated by signal".to_string(),
            };
            return AttemptOutcome::Failed(AttemptFailure::process_failed(exit_code, reason));
        }

        if stdout.is_empty() {
            return AttemptOutcome::Failed(AttemptFailure::EmptyOutput);
        }

        match self.resolver.resolve(stdout) {
            Some(artifact) => AttemptOutcome::Succeeded(artifact),
            None => AttemptOutcome::Failed(AttemptFailure::Unparsable),
        }
    }

    /// Removes the partial files left behind by `destinations`, the file
    /// names this job's attempts reported writing. Best effort.
    async fn remove_partials(&self, destinations: &BTreeSet<String>) -> usize {
        if destinations.is_empty() {
            return 0;
        }
        let mut entries = match tokio::fs::read_dir(&self.config.output_dir).await {
            Ok(entries) => entries,
            Err(e) => {
                debug!("Cannot scan {:?} for partial files: {}", self.config.output_dir, e);
                return 0;
            }
        };

        let mut removed = 0;
        while let Ok(Some(entry)) = entries.next_entry().await {
            let name = entry.file_name().to_string_lossy().to_string();
            if !destinations.iter().any(|dest| is_partial_of(&name, dest)) {
                continue;
            }
            let path = entry.path();
            match tokio::fs::remove_file(&path).await {
                Ok(()) => {
                    debug!("Removed partial file {:?}", path);
                    removed += 1;
                }
                Err(e) => warn!("Failed to remove partial file {:?}: {}", path, e),
            }
        }
        removed
    }
}

/// File names of every `Destination:` line in yt-dlp output.
fn destination_names(stdout: &str) -> impl Iterator<Item = String> + '_ {
    stdout.lines().filter_map(|line| {
        let (_, dest) = line.trim().split_once("] Destination: ")?;
        Path::new(dest.trim())
            .file_name()
            .map(|name| name.to_string_lossy().to_string())
    })
}

/// Whether `name` is a partial file yt-dlp keeps while writing `dest`.
fn is_partial_of(name: &str, dest: &str) -> bool {
    let Some(suffix) = name.strip_prefix(dest) else {
        return false;
    };
    suffix == ".part" || suffix == ".ytdl" || suffix.starts_with(".part-Frag")
}

#[async_trait]
impl Downloader for YtDlpDownloader {
    fn name(&self) -> &str {
        "yt-dlp"
    }

    async fn download(&self, job: &DownloadJob) -> Result<ArtifactReference, DownloadError> {
        let max_attempts = self.config.max_attempts.max(1);
        let mut attempt = 1;
        let mut destinations = BTreeSet::new();

        loop {
            info!("Attempt {} to download video: {}", attempt, job.url());
            let record = self.run_attempt(job, attempt).await;
            DOWNLOAD_ATTEMPTS
                .with_label_values(&[record.outcome.as_str()])
                .inc();

            match record.outcome {
                AttemptOutcome::Succeeded(artifact) => {
                    ARTIFACTS_RESOLVED
                        .with_label_values(&[artifact.rule().as_str()])
                        .inc();
                    info!(
                        "Attempt {} produced {} (rule: {}, {:?})",
                        attempt,
                        artifact.path(),
                        artifact.rule().as_str(),
                        record.elapsed
                    );
                    return Ok(artifact);
                }
                AttemptOutcome::Failed(failure) => {
                    destinations.extend(destination_names(&record.stdout));
                    warn!(
                        "Attempt {}/{} failed after {:?}: {}",
                        attempt, max_attempts, record.elapsed, failure
                    );
                    if !record.stderr.is_empty() {
                        warn!("yt-dlp stderr: {}", record.stderr.trim_end());
                    }
                    if !record.stdout.is_empty() {
                        debug!("yt-dlp stdout: {}", record.stdout.trim_end());
                    }

                    if attempt >= max_attempts {
                        if self.config.cleanup_partials_on_failure {
                            let removed = self.remove_partials(&destinations).await;
                            if removed > 0 {
                                PARTIAL_FILES_REMOVED.inc_by(removed as u64);
                                info!("Removed {} partial file(s) for job {}", removed, job.id());
                            }
                        }
                        return Err(DownloadError::Exhausted {
                            attempts: attempt,
                            last: failure,
                        });
                    }

                    tokio::time::sleep(self.config.retry_delay()).await;
                    attempt += 1;
                }
            }
        }
    }
}
