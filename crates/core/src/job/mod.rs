//! Download jobs as accepted from callers.

mod types;

pub use types::{DownloadJob, JobError, WebhookParams};
