use serde::{Deserialize, Serialize};
use std::net::IpAddr;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Root configuration
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub downloader: DownloaderConfig,
    #[serde(default)]
    pub reporter: ReporterConfig,
}

/// Server configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: IpAddr,
    #[serde(default = "default_port")]
    pub port: u16,
    /// How long running jobs may finish after a shutdown signal (default: 30)
    #[serde(default = "default_shutdown_grace")]
    pub shutdown_grace_secs: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            shutdown_grace_secs: default_shutdown_grace(),
        }
    }
}

impl ServerConfig {
    pub fn shutdown_grace(&self) -> Duration {
        Duration::from_secs(self.shutdown_grace_secs)
    }
}

fn default_host() -> IpAddr {
    IpAddr::from([0, 0, 0, 0])
}

fn default_port() -> u16 {
    4412
}

fn default_shutdown_grace() -> u64 {
    30
}

/// External downloader (yt-dlp) configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DownloaderConfig {
    /// Path to the yt-dlp executable.
    #[serde(default = "default_tool_path")]
    pub tool_path: PathBuf,

    /// Output root shared by all jobs. Filenames inside it are namespaced by job id.
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,

    /// Raw, whitespace separated arguments prepended to every invocation.
    #[serde(default)]
    pub extra_params: String,

    /// Netscape cookie file passed with `--cookies`.
    #[serde(default)]
    pub cookies_file: Option<PathBuf>,

    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    /// Value for `--max-filesize` (e.g. "90M").
    #[serde(default = "default_max_filesize")]
    pub max_filesize: String,

    /// Total attempts per job, including the first one.
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    /// Wall-clock limit for a single tool invocation (milliseconds).
    #[serde(default = "default_attempt_timeout")]
    pub attempt_timeout_ms: u64,

    /// Fixed pause between failed attempts (milliseconds).
    #[serde(default = "default_retry_delay")]
    pub retry_delay_ms: u64,

    /// Hosts that need the alternate extractor instead of cookies.
    #[serde(default = "default_alternate_hosts")]
    pub alternate_extraction_hosts: Vec<String>,

    /// Value for `--extractor-args` on alternate hosts.
    #[serde(default = "default_alternate_extractor_args")]
    pub alternate_extractor_args: String,

    /// Remove the job's leftover partial files once every attempt has failed.
    #[serde(default = "default_true")]
    pub cleanup_partials_on_failure: bool,
}

fn default_tool_path() -> PathBuf {
    PathBuf::from("/usr/bin/yt-dlp")
}

fn default_output_dir() -> PathBuf {
    PathBuf::from("downloads")
}

fn default_user_agent() -> String {
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/134.0.0.0 Safari/537.36".to_string()
}

fn default_max_filesize() -> String {
    "90M".to_string()
}

fn default_max_attempts() -> u32 {
    5
}

fn default_attempt_timeout() -> u64 {
    10 * 60 * 1000 // 10 minutes
}

fn default_retry_delay() -> u64 {
    1000
}

fn default_alternate_hosts() -> Vec<String> {
    vec!["x.com".to_string()]
}

fn default_alternate_extractor_args() -> String {
    "twitter:api=legacy".to_string()
}

fn default_true() -> bool {
    true
}

impl Default for DownloaderConfig {
    fn default() -> Self {
        Self {
            tool_path: default_tool_path(),
            output_dir: default_output_dir(),
            extra_params: String::new(),
            cookies_file: None,
            user_agent: default_user_agent(),
            max_filesize: default_max_filesize(),
            max_attempts: default_max_attempts(),
            attempt_timeout_ms: default_attempt_timeout(),
            retry_delay_ms: default_retry_delay(),
            alternate_extraction_hosts: default_alternate_hosts(),
            alternate_extractor_args: default_alternate_extractor_args(),
            cleanup_partials_on_failure: true,
        }
    }
}

impl DownloaderConfig {
    pub fn attempt_timeout(&self) -> Duration {
        Duration::from_millis(self.attempt_timeout_ms)
    }

    pub fn retry_delay(&self) -> Duration {
        Duration::from_millis(self.retry_delay_ms)
    }

    /// The cookie file, treating an empty path as unset.
    pub fn cookies_file(&self) -> Option<&Path> {
        self.cookies_file
            .as_deref()
            .filter(|path| !path.as_os_str().is_empty())
    }

    /// Sets the tool path.
    pub fn with_tool_path(mut self, tool_path: impl Into<PathBuf>) -> Self {
        self.tool_path = tool_path.into();
        self
    }

    /// Sets the output root.
    pub fn with_output_dir(mut self, output_dir: impl Into<PathBuf>) -> Self {
        self.output_dir = output_dir.into();
        self
    }

    /// Sets the per-attempt timeout.
    pub fn with_attempt_timeout(mut self, timeout: Duration) -> Self {
        self.attempt_timeout_ms = timeout.as_millis() as u64;
        self
    }

    /// Sets the delay between failed attempts.
    pub fn with_retry_delay(mut self, delay: Duration) -> Self {
        self.retry_delay_ms = delay.as_millis() as u64;
        self
    }
}

/// Completion webhook configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ReporterConfig {
    /// Endpoint used when a job does not carry its own callback URL.
    #[serde(default)]
    pub default_url: Option<String>,

    /// Public base URL artifacts are served under (`<base>/download/<file>`).
    #[serde(default)]
    pub public_base_url: String,

    /// Request timeout in seconds (default: 10)
    #[serde(default = "default_report_timeout")]
    pub timeout_secs: u64,
}

fn default_report_timeout() -> u64 {
    10
}

impl Default for ReporterConfig {
    fn default() -> Self {
        Self {
            default_url: None,
            public_base_url: String::new(),
            timeout_secs: default_report_timeout(),
        }
    }
}

/// Sanitized config for API responses (secrets redacted)
#[derive(Debug, Clone, Serialize)]
pub struct SanitizedConfig {
    pub server: ServerConfig,
    pub downloader: SanitizedDownloaderConfig,
    pub reporter: SanitizedReporterConfig,
}

/// Downloader config without the cookie file location
#[derive(Debug, Clone, Serialize)]
pub struct SanitizedDownloaderConfig {
    pub tool_path: PathBuf,
    pub output_dir: PathBuf,
    pub cookies_configured: bool,
    pub max_filesize: String,
    pub max_attempts: u32,
    pub attempt_timeout_ms: u64,
    pub retry_delay_ms: u64,
    pub alternate_extraction_hosts: Vec<String>,
}

/// Reporter config without the default webhook URL (it may embed tokens)
#[derive(Debug, Clone, Serialize)]
pub struct SanitizedReporterConfig {
    pub default_url_configured: bool,
    pub public_base_url: String,
    pub timeout_secs: u64,
}

impl From<&Config> for SanitizedConfig {
    fn from(config: &Config) -> Self {
        let downloader = &config.downloader;
        Self {
            server: config.server.clone(),
            downloader: SanitizedDownloaderConfig {
                tool_path: downloader.tool_path.clone(),
                output_dir: downloader.output_dir.clone(),
                cookies_configured: downloader.cookies_file().is_some(),
                max_filesize: downloader.max_filesize.clone(),
                max_attempts: downloader.max_attempts,
                attempt_timeout_ms: downloader.attempt_timeout_ms,
                retry_delay_ms: downloader.retry_delay_ms,
                alternate_extraction_hosts: downloader.alternate_extraction_hosts.clone(),
            },
            reporter: SanitizedReporterConfig {
                default_url_configured: config
                    .reporter
                    .default_url
                    .as_deref()
                    .is_some_and(|url| !url.is_empty()),
                public_base_url: config.reporter.public_base_url.clone(),
                timeout_secs: config.reporter.timeout_secs,
            },
        }
    }
}
