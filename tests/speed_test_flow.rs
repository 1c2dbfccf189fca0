//! End-to-end speed test runs against a mock payload server
//!
//! These tests drive the orchestrator over the real reqwest client, with
//! wiremock standing in for the speed test server.

use network_speed_tester::{
    clock::SystemClock,
    client::NetworkClient,
    error::AppError,
    models::{config::mb_to_bytes, Config},
    orchestrator::SpeedTestOrchestrator,
    payload::{generate_payload, NO_CACHE_RESPONSE_HEADERS, OCTET_STREAM},
    types::{PhaseStatus, TestPhase},
};
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;
use wiremock::{
    matchers::{method, path},
    Mock, MockServer, ResponseTemplate,
};

const DOWNLOAD_MB: f64 = 0.25;
const UPLOAD_MB: f64 = 0.125;

/// Mock speed test server with the three default endpoints
struct SpeedTestServer {
    server: MockServer,
}

impl SpeedTestServer {
    async fn start() -> Self {
        Self {
            server: MockServer::start().await,
        }
    }

    async fn mount_ping(&self, delay: Duration) {
        Mock::given(method("GET"))
            .and(path("/api/ping-test"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({ "success": true }))
                    .set_delay(delay),
            )
            .mount(&self.server)
            .await;
    }

    async fn mount_download(&self, size: usize) {
        let mut template = ResponseTemplate::new(200)
            .set_body_raw(generate_payload(size).to_vec(), OCTET_STREAM);
        for (name, value) in NO_CACHE_RESPONSE_HEADERS {
            template = template.insert_header(*name, *value);
        }

        Mock::given(method("GET"))
            .and(path("/api/speed-test/download"))
            .respond_with(template)
            .mount(&self.server)
            .await;
    }

    async fn mount_upload(&self, delay: Duration) {
        Mock::given(method("POST"))
            .and(path("/api/speed-test/upload"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({ "success": true }))
                    .set_delay(delay),
            )
            .mount(&self.server)
            .await;
    }

    async fn mount_status(&self, request_path: &str, status: u16) {
        Mock::given(path(request_path))
            .respond_with(ResponseTemplate::new(status))
            .mount(&self.server)
            .await;
    }

    async fn mount_healthy(&self) {
        self.mount_ping(Duration::ZERO).await;
        self.mount_download(mb_to_bytes(DOWNLOAD_MB)).await;
        self.mount_upload(Duration::ZERO).await;
    }

    fn config(&self, phase_timeout_seconds: u64) -> Config {
        let mut config = Config {
            base_url: format!("{}/api", self.server.uri()),
            phase_timeout_seconds,
            enable_color: false,
            ..Config::default()
        };
        config.speed_test.download_file_size_mb = DOWNLOAD_MB;
        config.speed_test.upload_file_size_mb = UPLOAD_MB;
        config
    }
}

fn orchestrator(config: &Config) -> SpeedTestOrchestrator {
    let client = NetworkClient::from_config(config).unwrap();
    SpeedTestOrchestrator::from_config(config, Arc::new(client), Arc::new(SystemClock)).unwrap()
}

#[tokio::test]
async fn test_full_run_against_healthy_server() {
    let server = SpeedTestServer::start().await;
    server.mount_healthy().await;
    let config = server.config(10);

    let run = orchestrator(&config).start().await.unwrap();

    assert_eq!(run.phase, TestPhase::Complete);
    assert_eq!(run.progress, 100);
    assert_eq!(run.successful_phases(), 3);
    assert!(run.completed_at.is_some());

    let settings = &config.speed_test;
    let ping = run.ping.calibrated_value.unwrap();
    let download = run.download.calibrated_value.unwrap();
    let upload = run.upload.calibrated_value.unwrap();
    assert!(ping >= settings.min_ping_ms);
    assert!(download > 0.0 && download <= settings.max_download_speed_mbps);
    assert!(upload > 0.0 && upload <= settings.max_upload_speed_mbps);
}

#[tokio::test]
async fn test_requests_follow_phase_order_and_sizes() {
    let server = SpeedTestServer::start().await;
    server.mount_healthy().await;

    orchestrator(&server.config(10)).start().await.unwrap();

    let requests = server.server.received_requests().await.unwrap();
    let paths: Vec<&str> = requests.iter().map(|r| r.url.path()).collect();
    assert_eq!(
        paths,
        ["/api/ping-test", "/api/speed-test/download", "/api/speed-test/upload"]
    );

    // Downloads must bypass caches
    let cache_control = requests[1].headers.get("cache-control").unwrap();
    assert!(cache_control.to_str().unwrap().contains("no-cache"));

    assert_eq!(requests[2].body.len(), mb_to_bytes(UPLOAD_MB));
    assert_eq!(
        requests[2].headers.get("content-type").unwrap().to_str().unwrap(),
        OCTET_STREAM
    );
}

#[tokio::test]
async fn test_failed_download_does_not_stop_upload() {
    let server = SpeedTestServer::start().await;
    server.mount_ping(Duration::ZERO).await;
    server.mount_status("/api/speed-test/download", 404).await;
    server.mount_upload(Duration::ZERO).await;

    let run = orchestrator(&server.config(10)).start().await.unwrap();

    assert_eq!(run.download.status, PhaseStatus::Failed);
    assert_eq!(run.download.calibrated_value, None);
    assert_eq!(
        run.download.error_message.as_deref(),
        Some("Unexpected HTTP status: 404")
    );
    assert!(run.ping.is_successful());
    assert!(run.upload.is_successful());
    assert_eq!(run.progress, 100);
}

#[tokio::test]
async fn test_short_download_is_a_failure() {
    let server = SpeedTestServer::start().await;
    server.mount_ping(Duration::ZERO).await;
    server.mount_download(1024).await;
    server.mount_upload(Duration::ZERO).await;

    let run = orchestrator(&server.config(10)).start().await.unwrap();

    assert_eq!(run.download.status, PhaseStatus::Failed);
    assert!(run
        .download
        .error_message
        .as_deref()
        .unwrap()
        .contains("Partial payload"));
}

#[tokio::test]
async fn test_slow_upload_times_out() {
    let server = SpeedTestServer::start().await;
    server.mount_ping(Duration::ZERO).await;
    server.mount_download(mb_to_bytes(DOWNLOAD_MB)).await;
    server.mount_upload(Duration::from_millis(2500)).await;

    let run = orchestrator(&server.config(1)).start().await.unwrap();

    assert_eq!(run.upload.status, PhaseStatus::Timeout);
    assert_eq!(run.upload.calibrated_value, None);
    assert_eq!(run.successful_phases(), 2);
    assert!(run.is_complete());
}

#[tokio::test]
async fn test_unreachable_server_fails_every_phase() {
    // Nothing listens on the discard port
    let config = Config {
        base_url: "http://127.0.0.1:9/api".to_string(),
        phase_timeout_seconds: 2,
        ..Config::default()
    };

    let run = orchestrator(&config).start().await.unwrap();

    assert_eq!(run.successful_phases(), 0);
    assert!(run.is_complete());
    for result in [&run.ping, &run.download, &run.upload] {
        assert!(result.status.is_finished());
        assert!(result.error_message.is_some());
    }
}

#[tokio::test]
async fn test_second_start_while_running_is_busy() {
    let server = SpeedTestServer::start().await;
    server.mount_ping(Duration::from_millis(300)).await;
    server.mount_download(mb_to_bytes(DOWNLOAD_MB)).await;
    server.mount_upload(Duration::ZERO).await;

    let orchestrator = Arc::new(orchestrator(&server.config(10)));
    let first = {
        let orchestrator = orchestrator.clone();
        tokio::spawn(async move { orchestrator.start().await })
    };

    tokio::time::sleep(Duration::from_millis(50)).await;
    assert!(orchestrator.is_running());
    let second = orchestrator.start().await;
    assert!(matches!(second, Err(AppError::Busy(_))));

    let run = first.await.unwrap().unwrap();
    assert_eq!(run.successful_phases(), 3);
    assert!(!orchestrator.is_running());
}

#[tokio::test]
async fn test_subscribers_see_final_snapshot() {
    let server = SpeedTestServer::start().await;
    server.mount_healthy().await;

    let orchestrator = orchestrator(&server.config(10));
    let updates = orchestrator.subscribe();
    let run = orchestrator.start().await.unwrap();

    let snapshot = updates.borrow().clone();
    assert_eq!(snapshot.run_id, run.run_id);
    assert_eq!(snapshot.phase, TestPhase::Complete);
    assert_eq!(snapshot.progress, 100);
    assert!(snapshot.download_speed.is_some());
}
