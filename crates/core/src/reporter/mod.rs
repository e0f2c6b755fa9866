//! Completion reports delivered to the caller's webhook.
//!
//! Reports are best effort: a delivery failure (no destination, transport
//! error, timeout, non-2xx answer) is logged and dropped. Nothing is retried
//! and nothing propagates back to the job.

mod error;
mod traits;
mod types;
mod webhook;

pub use error::ReportError;
pub use traits::Reporter;
pub use types::ReportPayload;
pub use webhook::WebhookReporter;
