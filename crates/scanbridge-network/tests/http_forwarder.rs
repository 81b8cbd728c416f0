//! Integration tests for HttpForwarder against a mock backend.

use httpmock::prelude::*;
use rstest::rstest;
use scanbridge_core::BridgeConfig;
use scanbridge_network::{EventForwarder, ForwardOutcome, HttpForwarder};
use scanbridge_protocol::{Event, classify};
use serde_json::json;
use std::time::Duration;

const NUMBER_PATH: &str = "/api/arduino/number";
const DATA_PATH: &str = "/api/arduino/data";

fn forwarder_for(server: &MockServer) -> HttpForwarder {
    let config = BridgeConfig {
        request_timeout: Duration::from_millis(300),
        ..BridgeConfig::default().with_backend_url(&server.base_url())
    };
    HttpForwarder::from_config(&config).expect("forwarder builds")
}

#[tokio::test]
async fn test_numeric_reading_is_posted() {
    let server = MockServer::start_async().await;
    let mock = server
        .mock_async(|when, then| {
            when.method(POST)
                .path(NUMBER_PATH)
                .header("content-type", "application/json")
                .json_body(json!({"number": "123"}));
            then.status(200);
        })
        .await;

    let outcome = forwarder_for(&server).forward(&classify("VOTER: 123")).await;

    assert_eq!(outcome, ForwardOutcome::Delivered { status: 200 });
    mock.assert_hits_async(1).await;
}

#[tokio::test]
async fn test_leading_zeros_survive() {
    let server = MockServer::start_async().await;
    let mock = server
        .mock_async(|when, then| {
            when.method(POST)
                .path(NUMBER_PATH)
                .json_body(json!({"number": "007"}));
            then.status(200);
        })
        .await;

    let outcome = forwarder_for(&server)
        .forward(&classify("VOTER: 007 finger2"))
        .await;

    assert!(outcome.is_delivered());
    mock.assert_async().await;
}

#[tokio::test]
async fn test_no_match_is_posted_to_diagnostics() {
    let server = MockServer::start_async().await;
    let data = server
        .mock_async(|when, then| {
            when.method(POST)
                .path(DATA_PATH)
                .json_body(json!({"data": "NO_MATCH 42"}));
            then.status(200);
        })
        .await;
    let number = server
        .mock_async(|when, then| {
            when.method(POST).path(NUMBER_PATH);
            then.status(200);
        })
        .await;

    let outcome = forwarder_for(&server).forward(&classify("NO_MATCH 42")).await;

    assert!(outcome.is_delivered());
    data.assert_hits_async(1).await;
    number.assert_hits_async(0).await;
}

#[tokio::test]
async fn test_ignored_makes_no_request() {
    let server = MockServer::start_async().await;
    let any = server
        .mock_async(|when, then| {
            when.method(POST);
            then.status(200);
        })
        .await;

    let outcome = forwarder_for(&server).forward(&Event::Ignored).await;

    assert_eq!(outcome, ForwardOutcome::Skipped);
    any.assert_hits_async(0).await;
}

#[rstest]
#[case(201)]
#[case(404)]
#[case(500)]
#[case(503)]
#[tokio::test]
async fn test_non_200_is_rejected(#[case] status: u16) {
    let server = MockServer::start_async().await;
    let mock = server
        .mock_async(|when, then| {
            when.method(POST).path(NUMBER_PATH);
            then.status(status);
        })
        .await;

    let outcome = forwarder_for(&server).forward(&classify("VOTER: 1")).await;

    assert_eq!(outcome, ForwardOutcome::Rejected { status });
    assert!(outcome.is_failure());
    // No retry after a rejection
    mock.assert_hits_async(1).await;
}

#[tokio::test]
async fn test_slow_backend_times_out() {
    let server = MockServer::start_async().await;
    let mock = server
        .mock_async(|when, then| {
            when.method(POST).path(NUMBER_PATH);
            then.status(200).delay(Duration::from_secs(2));
        })
        .await;

    let outcome = forwarder_for(&server).forward(&classify("VOTER: 1")).await;

    assert!(matches!(outcome, ForwardOutcome::TransportFailed { .. }));
    mock.assert_hits_async(1).await;
}

#[tokio::test]
async fn test_unreachable_backend_is_transport_failure() {
    // Nothing listens on the discard port
    let config = BridgeConfig::default().with_backend_url("http://127.0.0.1:9");
    let forwarder = HttpForwarder::from_config(&config).unwrap();

    let outcome = forwarder.forward(&classify("NO_MATCH")).await;

    assert!(matches!(outcome, ForwardOutcome::TransportFailed { .. }));
}

#[tokio::test]
async fn test_user_agent_header() {
    let server = MockServer::start_async().await;
    let mock = server
        .mock_async(|when, then| {
            when.method(POST)
                .path(NUMBER_PATH)
                .header(
                    "user-agent",
                    concat!("scanbridge/", env!("CARGO_PKG_VERSION")),
                );
            then.status(200);
        })
        .await;

    let outcome = forwarder_for(&server).forward(&classify("VOTER: 5")).await;

    assert!(outcome.is_delivered());
    mock.assert_async().await;
}
