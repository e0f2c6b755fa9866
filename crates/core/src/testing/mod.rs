//! Testing utilities and mock implementations.
//!
//! These mocks stand in for the external tool and the webhook endpoint so
//! the service and the HTTP layer can be exercised without either.
//!
//! # Example
//!
//! ```rust,ignore
//! use assetor_core::testing::{MockDownloader, MockReporter};
//!
//! let downloader = MockDownloader::new();
//! downloader.set_artifact("downloads/job-1_abc_NA.mp4").await;
//! let reporter = MockReporter::new();
//!
//! // Build a DownloadService from both, then inspect what was reported
//! let reports = reporter.recorded_reports().await;
//! ```

mod mock_downloader;
mod mock_reporter;

pub use mock_downloader::MockDownloader;
pub use mock_reporter::{MockReporter, RecordedReport};
