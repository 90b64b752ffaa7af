//! Router-level tests against an in-process node

use auction_core::test_utils::{test_identity, MockNode, AUCTION_ARTIFACT_JSON};
use auction_core::{
    deploy, ContractArtifact, GasSettings, LifecycleConfig, LifecycleMetrics, TransactionLifecycle,
};
use auction_server::{build_router, AppState};
use axum::{
    body::{to_bytes, Body},
    http::{Request, StatusCode},
    Router,
};
use ethers::types::{Address, U256};
use std::sync::Arc;
use std::time::Duration;
use tower::ServiceExt;

const BENEFICIARY: &str = "0xb95A8c720bbDD408f97CccF07de6ceD493bDbc74";
const BIDDER: &str = "0x5aAeb6053F3E94C9b9A09f33669435E7Ef1BeAed";

async fn deployed_app() -> (Router, Arc<MockNode>, Address) {
    let node = Arc::new(MockNode::new());
    let lifecycle = Arc::new(TransactionLifecycle::new(
        node.clone(),
        Arc::new(test_identity()),
        LifecycleConfig {
            poll_interval: Duration::from_millis(5),
            confirmation_timeout: Duration::from_millis(150),
        },
        Arc::new(LifecycleMetrics::new().unwrap()),
    ));
    let artifact = ContractArtifact::from_json(AUCTION_ARTIFACT_JSON).unwrap();
    let binding = deploy(
        lifecycle,
        &artifact,
        &["3000".to_string(), BENEFICIARY.to_string()],
        GasSettings::from_gwei(1_728_712, 21),
    )
    .await
    .unwrap();
    let contract = binding.address();

    let state = AppState::new(Arc::new(binding), GasSettings::from_gwei(2_000_000, 40));
    (build_router(state), node, contract)
}

async fn send(app: &Router, request: Request<Body>) -> (StatusCode, String) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, String::from_utf8(body.to_vec()).unwrap())
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

fn post_empty(uri: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .body(Body::empty())
        .unwrap()
}

fn post_bid(address: &str, amount: &str) -> Request<Body> {
    let body = format!(
        "bidder_address={}&bid_amount={}",
        urlencode(address),
        urlencode(amount)
    );
    Request::builder()
        .method("POST")
        .uri("/bid")
        .header("content-type", "application/x-www-form-urlencoded")
        .body(Body::from(body))
        .unwrap()
}

fn urlencode(value: &str) -> String {
    value
        .bytes()
        .map(|b| match b {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' => (b as char).to_string(),
            _ => format!("%{:02X}", b),
        })
        .collect()
}

#[tokio::test]
async fn test_deploy_bid_and_query() {
    let (app, node, contract) = deployed_app().await;

    let (status, body) = send(&app, post_bid(BIDDER, "5")).await;
    assert_eq!(status, StatusCode::OK, "{}", body);
    assert!(body.contains("confirmed"));

    let five_ether = U256::from(5u64) * U256::exp10(18);
    let expected_bidder: Address = BIDDER.parse().unwrap();
    assert_eq!(node.auction_state(contract), Some((expected_bidder, five_ether)));

    let (status, body) = send(&app, post_empty("/highestbidder")).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.contains(BIDDER), "{}", body);

    let (status, body) = send(&app, post_empty("/highestbid")).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.contains("5000000000000000000 wei"), "{}", body);
}

#[tokio::test]
async fn test_negative_amount_never_reaches_node() {
    let (app, node, _) = deployed_app().await;
    let before = node.calls();

    let (status, body) = send(&app, post_bid(BIDDER, "-1")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body.contains("invalid amount"));
    assert_eq!(node.calls(), before);
}

#[tokio::test]
async fn test_non_numeric_amounts_rejected() {
    let (app, node, _) = deployed_app().await;
    let before = node.calls();

    for amount in ["five", "1.5", "", "0x10"] {
        let (status, body) = send(&app, post_bid(BIDDER, amount)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "amount {:?}", amount);
        assert!(body.contains("invalid amount"));
    }
    assert_eq!(node.calls(), before);
}

#[tokio::test]
async fn test_malformed_addresses_rejected() {
    let (app, node, _) = deployed_app().await;
    let before = node.calls();

    for address in [
        "",
        "0x123",
        "not an address",
        "0x5aAeb6053F3E94C9b9A09f33669435E7Ef1BeAeD",
        "0x5aAeb6053F3E94C9b9A09f33669435E7Ef1BeAed00",
    ] {
        let (status, body) = send(&app, post_bid(address, "5")).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "address {:?}", address);
        assert!(body.contains("invalid address"));
    }
    assert_eq!(node.calls(), before);
}

#[tokio::test]
async fn test_missing_form_fields_are_invalid_input() {
    let (app, _, _) = deployed_app().await;
    let request = Request::builder()
        .method("POST")
        .uri("/bid")
        .header("content-type", "application/x-www-form-urlencoded")
        .body(Body::from("bid_amount=5"))
        .unwrap();

    let (status, body) = send(&app, request).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body.contains("invalid address"));
}

#[tokio::test]
async fn test_confirmation_timeout_reported_as_unknown() {
    let (app, node, _) = deployed_app().await;
    node.set_never_confirm(true);

    let (status, body) = send(&app, post_bid(BIDDER, "5")).await;
    assert_eq!(status, StatusCode::GATEWAY_TIMEOUT);
    assert!(body.contains("outcome is unknown"));
    assert!(!body.contains("invalid"));
}

#[tokio::test]
async fn test_rejected_bid_is_contract_error() {
    let (app, node, _) = deployed_app().await;
    node.reject_next("insufficient funds for gas * price + value");

    let (status, body) = send(&app, post_bid(BIDDER, "5")).await;
    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert!(body.contains("insufficient funds"));
    assert!(!body.contains("outcome is unknown"));
}

#[tokio::test]
async fn test_lower_bid_reverts() {
    let (app, _, _) = deployed_app().await;

    let (status, _) = send(&app, post_bid(BIDDER, "5")).await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = send(&app, post_bid(BIDDER, "3")).await;
    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert!(body.contains("reverted"));
}

#[tokio::test]
async fn test_static_pages() {
    let (app, _, contract) = deployed_app().await;

    let (status, body) = send(&app, get("/")).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.contains(&ethers::utils::to_checksum(&contract, None)));

    let (status, body) = send(&app, get("/error")).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.contains("Something went wrong"));
}

#[tokio::test]
async fn test_health_reflects_node() {
    let (app, node, _) = deployed_app().await;

    let (status, body) = send(&app, get("/health")).await;
    assert_eq!(status, StatusCode::OK);
    let json: serde_json::Value = serde_json::from_str(&body).unwrap();
    assert_eq!(json["node_connected"], true);

    node.set_unavailable(true);
    let (status, body) = send(&app, get("/health")).await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    let json: serde_json::Value = serde_json::from_str(&body).unwrap();
    assert_eq!(json["status"], "degraded");
}

#[tokio::test]
async fn test_metrics_count_lifecycle_stages() {
    let (app, _, _) = deployed_app().await;
    send(&app, post_bid(BIDDER, "5")).await;

    let (status, body) = send(&app, get("/metrics")).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.contains("auction_tx_stage_total{stage=\"confirmed\"} 2"), "{}", body);
}
