use serde::{Deserialize, Serialize};

use crate::job::WebhookParams;

/// Body POSTed to the report endpoint.
///
/// `url` is non-empty only on success, `error` is present only on failure.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportPayload {
    pub id: String,
    pub url: String,
    #[serde(rename = "webHookParams", default)]
    pub webhook_params: WebhookParams,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ReportPayload {
    pub fn success(id: impl Into<String>, url: impl Into<String>, params: WebhookParams) -> Self {
        Self {
            id: id.into(),
            url: url.into(),
            webhook_params: params,
            error: None,
        }
    }

    pub fn failure(id: impl Into<String>, params: WebhookParams, error: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            url: String::new(),
            webhook_params: params,
            error: Some(error.into()),
        }
    }
}
