pub mod config;
pub mod downloader;
pub mod job;
pub mod metrics;
pub mod reporter;
pub mod resolver;
pub mod service;
pub mod testing;

pub use config::{
    load_config, load_config_from_str, validate_config, Config, ConfigError, DownloaderConfig,
    ReporterConfig, SanitizedConfig, ServerConfig,
};
pub use downloader::{AttemptFailure, DownloadError, Downloader, YtDlpDownloader};
pub use job::{DownloadJob, JobError, WebhookParams};
pub use reporter::{ReportError, ReportPayload, Reporter, WebhookReporter};
pub use resolver::{ArtifactKind, ArtifactReference, ArtifactResolver, MatchRule};
pub use service::DownloadService;
