//! Common test utilities for router tests with mocks.
//!
//! This module provides a test fixture that builds the in-process router
//! with a mock downloader and reporter injected, so requests can be driven
//! without yt-dlp or a webhook endpoint.

#![allow(dead_code)]

use std::path::PathBuf;
use std::sync::Arc;

use axum::body::Body;
use axum::http::{HeaderMap, Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use serde_json::Value;
use tempfile::TempDir;
use tower::ServiceExt;

use assetor_core::{
    testing::{MockDownloader, MockReporter},
    Config, DownloadService, DownloaderConfig, ReporterConfig, ServerConfig,
};
use assetor_server::{api::create_router, state::AppState};

/// Test fixture for router tests with mock dependencies.
///
/// # Example
///
/// ```rust,ignore
/// #[tokio::test]
/// async fn test_pull() {
///     let fixture = TestFixture::new().await;
///
///     let response = fixture.post("/pull", json!({
///         "url": "https://example.com/v/abc",
///         "id": "job-1"
///     })).await;
///
///     assert_eq!(response.status, 202);
/// }
/// ```
pub struct TestFixture {
    /// The Axum router for testing
    pub router: Router,
    /// Mock downloader - configure job outcomes
    pub downloader: Arc<MockDownloader>,
    /// Mock reporter - inspect delivered reports
    pub reporter: Arc<MockReporter>,
    /// Temporary directory holding the output root
    pub temp_dir: TempDir,
    /// Output root served under /download/
    pub output_dir: PathBuf,
}

/// Response from a test request
#[derive(Debug)]
pub struct TestResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Value,
    pub raw: Vec<u8>,
}

impl TestFixture {
    /// Create a new test fixture with default mocks.
    pub async fn new() -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let output_dir = temp_dir.path().join("downloads");
        std::fs::create_dir_all(&output_dir).expect("Failed to create output dir");

        let downloader = Arc::new(MockDownloader::new());
        let reporter = Arc::new(MockReporter::new());

        let config = Config {
            server: ServerConfig {
                host: std::net::IpAddr::V4(std::net::Ipv4Addr::LOCALHOST),
                port: 0, // Not used for in-process testing
                ..Default::default()
            },
            downloader: DownloaderConfig::default().with_output_dir(&output_dir),
            reporter: ReporterConfig {
                default_url: Some("https://hooks.example.com/secret-token".to_string()),
                public_base_url: "https://cdn.example.com".to_string(),
                ..Default::default()
            },
        };

        let service = DownloadService::new(downloader.clone(), reporter.clone());
        let state = Arc::new(AppState::new(config, service));
        let router = create_router(state);

        Self {
            router,
            downloader,
            reporter,
            temp_dir,
            output_dir,
        }
    }

    /// Write a file into the output root.
    pub fn write_artifact(&self, name: &str, content: &[u8]) {
        std::fs::write(self.output_dir.join(name), content).expect("Failed to write artifact");
    }

    /// Send a GET request to the test server.
    pub async fn get(&self, path: &str) -> TestResponse {
        self.send(Request::builder().method("GET").uri(path), Body::empty())
            .await
    }

    /// Send a GET request with extra headers.
    pub async fn get_with_headers(&self, path: &str, headers: &[(&str, &str)]) -> TestResponse {
        let mut builder = Request::builder().method("GET").uri(path);
        for (name, value) in headers {
            builder = builder.header(*name, *value);
        }
        self.send(builder, Body::empty()).await
    }

    /// Send a POST request with JSON body.
    pub async fn post(&self, path: &str, body: Value) -> TestResponse {
        self.post_with_content_type(
            path,
            &serde_json::to_string(&body).unwrap(),
            "application/json",
        )
        .await
    }

    /// Send a POST request with raw string body (for testing malformed JSON).
    pub async fn post_raw(&self, path: &str, body: &str) -> TestResponse {
        self.post_with_content_type(path, body, "application/json")
            .await
    }

    /// Send a POST request with custom content type (for testing wrong content types).
    pub async fn post_with_content_type(
        &self,
        path: &str,
        body: &str,
        content_type: &str,
    ) -> TestResponse {
        let builder = Request::builder()
            .method("POST")
            .uri(path)
            .header("Content-Type", content_type);
        self.send(builder, Body::from(body.to_string())).await
    }

    /// Send a request with an arbitrary method and no body.
    pub async fn request(&self, method: &str, path: &str) -> TestResponse {
        self.send(Request::builder().method(method).uri(path), Body::empty())
            .await
    }

    async fn send(&self, builder: axum::http::request::Builder, body: Body) -> TestResponse {
        let request = builder.body(body).unwrap();

        let response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("Failed to send request");

        let status = response.status();
        let headers = response.headers().clone();
        let body_bytes = response
            .into_body()
            .collect()
            .await
            .expect("Failed to collect body")
            .to_bytes();

        let body: Value = if body_bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&body_bytes).unwrap_or(Value::Null)
        };

        TestResponse {
            status,
            headers,
            body,
            raw: body_bytes.to_vec(),
        }
    }
}

impl TestResponse {
    /// Header value as a string, if present.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|value| value.to_str().ok())
    }

    /// Body as UTF-8 text.
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.raw).into_owned()
    }
}

/// Wait until `check` holds, polling briefly.
pub async fn eventually<F, Fut>(mut check: F) -> bool
where
    F: FnMut() -> Fut,
    Fut: std::future::Future<Output = bool>,
{
    for _ in 0..100 {
        if check().await {
            return true;
        }
        tokio::time::sleep(std::time::Duration::from_millis(20)).await;
    }
    false
}

/// Helper to assert a response has expected status.
macro_rules! assert_status {
    ($response:expr, $status:expr) => {
        assert_eq!(
            $response.status, $status,
            "Expected status {:?}, got {:?}. Body: {}",
            $status,
            $response.status,
            $response.text()
        );
    };
}
