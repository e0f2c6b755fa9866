use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

/// Reasons a submitted job is rejected before any work starts.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum JobError {
    #[error("Missing 'url' in payload")]
    MissingUrl,

    #[error("Missing 'id' in payload")]
    MissingId,
}

/// Caller-supplied parameters echoed back in the completion report.
///
/// Only `url` is interpreted (it overrides the default report endpoint); every
/// other field, including unknown ones, is carried through untouched.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WebhookParams {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub channel_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub trim: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl WebhookParams {
    /// The callback URL override, if one was supplied and is non-empty.
    pub fn callback_url(&self) -> Option<&str> {
        self.url.as_deref().filter(|url| !url.trim().is_empty())
    }
}

/// A single download request. Immutable once built.
#[derive(Debug, Clone, PartialEq)]
pub struct DownloadJob {
    url: String,
    id: String,
    webhook_params: WebhookParams,
}

impl DownloadJob {
    /// Builds a job, rejecting empty `url` or `id`.
    pub fn new(
        url: impl Into<String>,
        id: impl Into<String>,
        webhook_params: WebhookParams,
    ) -> Result<Self, JobError> {
        let url = url.into();
        let id = id.into();

        if url.trim().is_empty() {
            return Err(JobError::MissingUrl);
        }
        if id.trim().is_empty() {
            return Err(JobError::MissingId);
        }

        Ok(Self {
            url,
            id,
            webhook_params,
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn webhook_params(&self) -> &WebhookParams {
        &self.webhook_params
    }
}
