//! Behavioural tests for the operation poller against a mock API server

use std::time::Duration;

use serde_json::json;
use tokio_util::sync::CancellationToken;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use bulkvm_core::compute::types::{ErrorCode, Scope};
use bulkvm_core::compute::ComputeClient;
use bulkvm_core::error::CoreError;
use bulkvm_core::poller::{poll_operation, PollSettings};

fn client(server: &MockServer) -> ComputeClient {
    ComputeClient::builder()
        .base_url(server.uri())
        .token("test-token")
        .build()
        .expect("client builds")
}

fn fast_settings() -> PollSettings {
    PollSettings {
        timeout: Duration::from_secs(10),
        interval: Duration::from_millis(10),
        max_transport_retries: 5,
        initial_backoff: Duration::from_millis(10),
        max_backoff: Duration::from_millis(50),
    }
}

fn operation_body(status: &str) -> serde_json::Value {
    json!({
        "id": "9876",
        "name": "operation-1",
        "status": status,
        "zone": "us-west1-a",
        "targetLink": "https://example/compute/v1/projects/p/zones/us-west1-a/instances/vm-1",
        "metadata": {"instancesCreated": 2, "startingIndex": 0}
    })
}

const WAIT_PATH: &str = "/projects/p/zones/us-west1-a/operations/operation-1/wait";

async fn wait_request_count(server: &MockServer) -> usize {
    server
        .received_requests()
        .await
        .unwrap_or_default()
        .iter()
        .filter(|r| r.url.path() == WAIT_PATH)
        .count()
}

#[tokio::test]
async fn pending_pending_done_issues_exactly_three_queries() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(WAIT_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(operation_body("PENDING")))
        .up_to_n_times(2)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path(WAIT_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(operation_body("DONE")))
        .mount(&server)
        .await;

    let client = client(&server);
    let scope = Scope::zonal("p", "us-west1-a");
    let operation = poll_operation(
        &client,
        &scope,
        "operation-1",
        &fast_settings(),
        &CancellationToken::new(),
        None,
    )
    .await
    .expect("poll resolves");

    assert!(operation.is_done());
    assert_eq!(wait_request_count(&server).await, 3);
}

#[tokio::test]
async fn success_keeps_result_metadata_intact() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(WAIT_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(operation_body("DONE")))
        .mount(&server)
        .await;

    let client = client(&server);
    let scope = Scope::zonal("p", "us-west1-a");
    let operation = poll_operation(
        &client,
        &scope,
        "operation-1",
        &fast_settings(),
        &CancellationToken::new(),
        None,
    )
    .await
    .expect("poll resolves");

    assert!(!operation.has_errors());
    let metadata = operation.metadata.expect("metadata survives");
    assert_eq!(metadata.instances_created, Some(2));
    assert_eq!(metadata.starting_index, Some(0));
    assert!(operation.target_link.is_some());
}

#[tokio::test]
async fn done_with_errors_is_ok_with_full_ordered_list() {
    let server = MockServer::start().await;

    let body = json!({
        "name": "operation-1",
        "status": "DONE",
        "error": {
            "errors": [
                {"code": "RESOURCE_ALREADY_EXISTS", "message": "instance-1 exists"},
                {"code": "RESOURCE_EXHAUSTED", "message": "stockout in us-west1-a"},
                {"code": "WEIRD_NEW_CODE", "message": "unmapped"}
            ]
        }
    });
    Mock::given(method("POST"))
        .and(path(WAIT_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(body))
        .mount(&server)
        .await;

    let client = client(&server);
    let scope = Scope::zonal("p", "us-west1-a");
    let operation = poll_operation(
        &client,
        &scope,
        "operation-1",
        &fast_settings(),
        &CancellationToken::new(),
        None,
    )
    .await
    .expect("operation-level failure is not a poller failure");

    let entries = operation.error_entries();
    assert_eq!(entries.len(), 3);
    assert_eq!(entries[0].code, ErrorCode::ResourceAlreadyExists);
    assert_eq!(entries[1].code, ErrorCode::ResourceExhausted);
    assert_eq!(entries[2].code, ErrorCode::Other("WEIRD_NEW_CODE".to_string()));
    assert_eq!(entries[1].message, "stockout in us-west1-a");
}

#[tokio::test]
async fn transient_rate_limit_is_retried_to_success() {
    let server = MockServer::start().await;

    let rate_limit_body = json!({
        "error": {
            "code": 429,
            "message": "Rate limit exceeded",
            "errors": [{"reason": "rateLimitExceeded", "message": "slow down"}]
        }
    });
    Mock::given(method("POST"))
        .and(path(WAIT_PATH))
        .respond_with(ResponseTemplate::new(429).set_body_json(rate_limit_body))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path(WAIT_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(operation_body("DONE")))
        .mount(&server)
        .await;

    let client = client(&server);
    let scope = Scope::zonal("p", "us-west1-a");
    let operation = poll_operation(
        &client,
        &scope,
        "operation-1",
        &fast_settings(),
        &CancellationToken::new(),
        None,
    )
    .await
    .expect("retried past the rate limit");

    assert!(operation.is_done());
    assert_eq!(wait_request_count(&server).await, 2);
}

#[tokio::test]
async fn permanent_bad_request_aborts_without_retry() {
    let server = MockServer::start().await;

    let bad_request = json!({
        "error": {
            "code": 400,
            "message": "Invalid value for field 'operation'",
            "errors": [{"reason": "invalid", "message": "check your JSON"}]
        }
    });
    Mock::given(method("POST"))
        .and(path(WAIT_PATH))
        .respond_with(ResponseTemplate::new(400).set_body_json(bad_request))
        .mount(&server)
        .await;

    let client = client(&server);
    let scope = Scope::zonal("p", "us-west1-a");
    let err = poll_operation(
        &client,
        &scope,
        "operation-1",
        &fast_settings(),
        &CancellationToken::new(),
        None,
    )
    .await
    .expect_err("malformed request is not retryable");

    assert!(err.is_bad_request());
    assert_eq!(wait_request_count(&server).await, 1);
}

#[tokio::test]
async fn cancellation_is_distinct_from_timeout_and_failure() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(WAIT_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(operation_body("PENDING")))
        .mount(&server)
        .await;

    let cancel = CancellationToken::new();
    let trigger = cancel.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(50)).await;
        trigger.cancel();
    });

    let client = client(&server);
    let scope = Scope::zonal("p", "us-west1-a");
    let err = poll_operation(
        &client,
        &scope,
        "operation-1",
        &fast_settings(),
        &cancel,
        None,
    )
    .await
    .expect_err("cancelled before DONE");

    assert!(matches!(err, CoreError::Cancelled));
    assert!(err.is_cancelled());
    assert!(!err.is_timeout());
}

#[tokio::test]
async fn deadline_produces_timeout_outcome() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(WAIT_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(operation_body("RUNNING")))
        .mount(&server)
        .await;

    let settings = fast_settings().with_timeout(Duration::from_millis(80));
    let client = client(&server);
    let scope = Scope::zonal("p", "us-west1-a");
    let err = poll_operation(
        &client,
        &scope,
        "operation-1",
        &settings,
        &CancellationToken::new(),
        None,
    )
    .await
    .expect_err("stuck operation hits the deadline");

    assert!(matches!(err, CoreError::OperationTimeout(_)));
    assert!(err.is_timeout());
    assert!(!err.is_cancelled());
}

#[tokio::test]
async fn transport_retry_budget_is_finite() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(WAIT_PATH))
        .respond_with(ResponseTemplate::new(503).set_body_string("backend unavailable"))
        .mount(&server)
        .await;

    let mut settings = fast_settings();
    settings.max_transport_retries = 2;

    let client = client(&server);
    let scope = Scope::zonal("p", "us-west1-a");
    let err = poll_operation(
        &client,
        &scope,
        "operation-1",
        &settings,
        &CancellationToken::new(),
        None,
    )
    .await
    .expect_err("budget exhausted");

    assert!(err.is_retryable());
    // Initial attempt plus two retries.
    assert_eq!(wait_request_count(&server).await, 3);
}
