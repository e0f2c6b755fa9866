//! HTTP webhook reporter.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use tracing::{info, warn};

use super::error::ReportError;
use super::traits::Reporter;
use super::types::ReportPayload;
use crate::config::ReporterConfig;
use crate::downloader::DownloadError;
use crate::job::{DownloadJob, WebhookParams};
use crate::metrics::REPORTS_TOTAL;
use crate::resolver::ArtifactReference;

/// Posts JSON reports to the job's callback URL or the configured default.
pub struct WebhookReporter {
    client: Client,
    config: ReporterConfig,
}

impl WebhookReporter {
    /// Create a new reporter.
    pub fn new(config: ReporterConfig) -> Result<Self, ReportError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| ReportError::Client(e.to_string()))?;

        Ok(Self { client, config })
    }

    /// Endpoint for a job: its own override first, then the configured default.
    pub fn destination<'a>(&'a self, params: &'a WebhookParams) -> Option<&'a str> {
        params.callback_url().or_else(|| {
            self.config
                .default_url
                .as_deref()
                .filter(|url| !url.trim().is_empty())
        })
    }

    /// Public URL an artifact is served under.
    pub fn public_url(&self, artifact: &ArtifactReference) -> String {
        artifact.public_url(&self.config.public_base_url)
    }

    /// Sends one payload. The caller decides what to do with the error.
    pub async fn deliver(
        &self,
        payload: &ReportPayload,
        params: &WebhookParams,
    ) -> Result<(), ReportError> {
        let url = self.destination(params).ok_or(ReportError::NoDestination)?;
        info!("Report URL: {}", url);

        let response = self
            .client
            .post(url)
            .json(payload)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    ReportError::Timeout
                } else {
                    ReportError::Transport(e.to_string())
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(ReportError::Status(status.as_u16()));
        }

        Ok(())
    }

    async fn send(&self, kind: &str, payload: ReportPayload, params: &WebhookParams) {
        match self.deliver(&payload, params).await {
            Ok(()) => {
                REPORTS_TOTAL.with_label_values(&[kind, "delivered"]).inc();
                info!("Delivered {} report for ID: {}", kind, payload.id);
            }
            Err(e) => {
                REPORTS_TOTAL.with_label_values(&[kind, e.as_str()]).inc();
                warn!("Failed to deliver {} report for ID {}: {}", kind, payload.id, e);
            }
        }
    }
}

#[async_trait]
impl Reporter for WebhookReporter {
    async fn report_success(&self, job: &DownloadJob, artifact: &ArtifactReference) {
        let url = self.public_url(artifact);
        info!("Reporting download success for ID: {}, url: {}", job.id(), url);

        let payload = ReportPayload::success(job.id(), url, job.webhook_params().clone());
        self.send("success", payload, job.webhook_params()).await;
    }

    async fn report_failure(&self, job: &DownloadJob, error: &DownloadError) {
        info!("Reporting download failure for ID: {}, error: {}", job.id(), error);

        let payload =
            ReportPayload::failure(job.id(), job.webhook_params().clone(), error.to_string());
        self.send("failure", payload, job.webhook_params()).await;
    }
}
