//! Download orchestration around the external yt-dlp executable.
//!
//! Each job gets a fixed budget of attempts. Every attempt runs yt-dlp in its
//! own task under a deadline and is classified as one of:
//!
//! - `succeeded`: the output named a file inside the output root
//! - `process_failed`: spawn failure or unsuccessful exit
//! - `empty_output`: clean exit without any output
//! - `unparsable`: output without a recognizable file
//! - `timed_out`: the deadline fired and the process was killed
//!
//! Failed attempts are followed by a fixed pause. Attempts of one job never
//! overlap; separate jobs run fully in parallel since every output file is
//! prefixed with its job id.
//!
//! # Example
//!
//! ```ignore
//! use assetor_core::{DownloadJob, Downloader, DownloaderConfig, WebhookParams, YtDlpDownloader};
//!
//! let downloader = YtDlpDownloader::new(DownloaderConfig::default())?;
//! let job = DownloadJob::new("https://example.com/v/abc", "job-42", WebhookParams::default())?;
//!
//! let artifact = downloader.download(&job).await?;
//! println!("Saved to {}", artifact.path());
//! ```

mod error;
mod process;
mod traits;
mod types;
mod ytdlp;

pub use error::{AttemptFailure, DownloadError};
pub use traits::Downloader;
pub use types::{AttemptOutcome, AttemptRecord};
pub use ytdlp::YtDlpDownloader;
