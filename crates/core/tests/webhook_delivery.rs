//! Webhook delivery integration tests against an in-process receiver.

use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::{extract::State, http::StatusCode, routing::post, Json, Router};
use serde_json::{json, Value};
use tokio::sync::Mutex;

use assetor_core::{
    testing::MockDownloader, AttemptFailure, DownloadError, DownloadJob, DownloadService,
    ReportError, ReportPayload, Reporter, ReporterConfig, WebhookParams, WebhookReporter,
};

#[derive(Clone)]
struct Receiver {
    bodies: Arc<Mutex<Vec<Value>>>,
    status: StatusCode,
    delay: Duration,
}

async fn receive(State(receiver): State<Receiver>, Json(body): Json<Value>) -> StatusCode {
    receiver.bodies.lock().await.push(body);
    if !receiver.delay.is_zero() {
        tokio::time::sleep(receiver.delay).await;
    }
    receiver.status
}

/// Starts a receiver and returns its hook URL plus the bodies it records.
async fn spawn_receiver(status: StatusCode, delay: Duration) -> (String, Arc<Mutex<Vec<Value>>>) {
    let bodies = Arc::new(Mutex::new(Vec::new()));
    let receiver = Receiver {
        bodies: bodies.clone(),
        status,
        delay,
    };
    let app = Router::new()
        .route("/hook", post(receive))
        .with_state(receiver);

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    (format!("http://{}/hook", addr), bodies)
}

fn reporter(default_url: Option<String>, timeout_secs: u64) -> WebhookReporter {
    WebhookReporter::new(ReporterConfig {
        default_url,
        public_base_url: "https://cdn.example.com".to_string(),
        timeout_secs,
    })
    .unwrap()
}

fn params(url: Option<String>) -> WebhookParams {
    let mut params: WebhookParams = serde_json::from_value(json!({
        "channelId": "C1",
        "trim": "0-10",
        "custom": { "nested": true }
    }))
    .unwrap();
    params.url = url;
    params
}

#[tokio::test]
async fn test_success_report_payload() {
    let (hook, bodies) = spawn_receiver(StatusCode::OK, Duration::ZERO).await;
    let reporter = Arc::new(reporter(Some(hook), 10));
    let downloader = Arc::new(MockDownloader::new());
    downloader
        .set_artifact("downloads/job-42_abc_00-01-30.mp4")
        .await;
    let service = DownloadService::new(downloader, reporter);

    let job = DownloadJob::new("https://example.com/v/abc", "job-42", params(None)).unwrap();
    service.run(&job).await.unwrap();

    let bodies = bodies.lock().await;
    assert_eq!(bodies.len(), 1);
    assert_eq!(
        bodies[0],
        json!({
            "id": "job-42",
            "url": "https://cdn.example.com/download/job-42_abc_00-01-30.mp4",
            "webHookParams": {
                "channelId": "C1",
                "trim": "0-10",
                "custom": { "nested": true }
            }
        })
    );
}

#[tokio::test]
async fn test_failure_report_payload() {
    let (hook, bodies) = spawn_receiver(StatusCode::OK, Duration::ZERO).await;
    let reporter = reporter(Some(hook), 10);
    let job = DownloadJob::new("https://example.com/v/abc", "job-9", params(None)).unwrap();
    let error = DownloadError::Exhausted {
        attempts: 5,
        last: AttemptFailure::EmptyOutput,
    };

    reporter.report_failure(&job, &error).await;

    let bodies = bodies.lock().await;
    assert_eq!(bodies.len(), 1);
    assert_eq!(bodies[0]["id"], "job-9");
    assert_eq!(bodies[0]["url"], "");
    assert_eq!(bodies[0]["webHookParams"]["channelId"], "C1");
    assert!(bodies[0]["error"]
        .as_str()
        .unwrap()
        .contains("output buffer is empty"));
}

#[tokio::test]
async fn test_override_url_wins_over_default() {
    let (default_hook, default_bodies) = spawn_receiver(StatusCode::OK, Duration::ZERO).await;
    let (override_hook, override_bodies) = spawn_receiver(StatusCode::OK, Duration::ZERO).await;
    let reporter = reporter(Some(default_hook), 10);
    let job = DownloadJob::new(
        "https://example.com/v/abc",
        "job-1",
        params(Some(override_hook.clone())),
    )
    .unwrap();

    let error = DownloadError::Exhausted {
        attempts: 5,
        last: AttemptFailure::Unparsable,
    };
    reporter.report_failure(&job, &error).await;

    assert!(default_bodies.lock().await.is_empty());
    let bodies = override_bodies.lock().await;
    assert_eq!(bodies.len(), 1);
    // Echoed back untouched, override included
    assert_eq!(bodies[0]["webHookParams"]["url"], override_hook.as_str());
}

#[tokio::test]
async fn test_bad_status_is_reported_as_error() {
    let (hook, bodies) = spawn_receiver(StatusCode::INTERNAL_SERVER_ERROR, Duration::ZERO).await;
    let reporter = reporter(Some(hook), 10);
    let payload = ReportPayload::failure("job-1", WebhookParams::default(), "boom");

    let err = reporter
        .deliver(&payload, &WebhookParams::default())
        .await
        .unwrap_err();

    assert!(matches!(err, ReportError::Status(500)));
    assert_eq!(bodies.lock().await.len(), 1);
}

#[tokio::test]
async fn test_bad_status_does_not_fail_the_job() {
    let (hook, bodies) = spawn_receiver(StatusCode::SERVICE_UNAVAILABLE, Duration::ZERO).await;
    let reporter = Arc::new(reporter(Some(hook), 10));
    let downloader = Arc::new(MockDownloader::new());
    downloader.set_artifact("downloads/j_a_NA.mp4").await;
    let service = DownloadService::new(downloader, reporter);

    let job = DownloadJob::new("https://example.com/v", "j", WebhookParams::default()).unwrap();
    assert!(service.run(&job).await.is_ok());
    // Delivered once, never retried
    assert_eq!(bodies.lock().await.len(), 1);
}

#[tokio::test]
async fn test_slow_endpoint_times_out() {
    let (hook, _bodies) = spawn_receiver(StatusCode::OK, Duration::from_secs(30)).await;
    let reporter = reporter(Some(hook), 1);
    let payload = ReportPayload::failure("job-1", WebhookParams::default(), "boom");

    let start = Instant::now();
    let err = reporter
        .deliver(&payload, &WebhookParams::default())
        .await
        .unwrap_err();

    assert!(matches!(err, ReportError::Timeout));
    assert!(start.elapsed() < Duration::from_secs(10));
}

#[tokio::test]
async fn test_unreachable_endpoint_is_transport_error() {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let reporter = reporter(Some(format!("http://{}/hook", addr)), 2);
    let payload = ReportPayload::failure("job-1", WebhookParams::default(), "boom");

    let err = reporter
        .deliver(&payload, &WebhookParams::default())
        .await
        .unwrap_err();
    assert!(matches!(err, ReportError::Transport(_)));
}
