//! HttpNode against a mock JSON-RPC server

use auction_core::{
    ChainError, GasSettings, HttpNode, LifecycleConfig, LifecycleMetrics, NodeRpc, RpcClientConfig,
    SigningIdentity, TransactionLifecycle, TransactionTemplate,
};
use ethers::types::{Address, Bytes, H256, U256};
use std::sync::Arc;
use std::time::Duration;

const TEST_KEY: &str = "0x4c0883a69102937d6231471b5dbb6204fe5129617082792ae468d01a3f362318";

/// Mock RPC server module
mod mock_rpc {
    use axum::{extract::State, routing::post, Json, Router};
    use serde_json::{json, Value};
    use std::net::SocketAddr;
    use std::sync::atomic::{AtomicU64, Ordering};
    use std::sync::Arc;

    /// Raw transaction the server refuses
    pub const REJECTED_RAW: &str = "0xdead";

    #[derive(Default)]
    pub struct MockRpcState {
        pub receipt_polls: AtomicU64,
        pub absent_polls: u64,
    }

    /// Start a mock JSON-RPC server on an ephemeral port
    pub async fn start_mock_rpc_server(
        absent_polls: u64,
    ) -> Result<(SocketAddr, Arc<MockRpcState>, tokio::task::JoinHandle<()>), std::io::Error> {
        let state = Arc::new(MockRpcState {
            receipt_polls: AtomicU64::new(0),
            absent_polls,
        });
        let app = Router::new()
            .route("/", post(handle_rpc_request))
            .with_state(state.clone());

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await?;
        let addr = listener.local_addr()?;

        let handle = tokio::spawn(async move {
            if let Err(e) = axum::serve(listener, app).await {
                eprintln!("Mock RPC server error: {}", e);
            }
        });

        Ok((addr, state, handle))
    }

    fn receipt_json(tx_hash: &Value) -> Value {
        json!({
            "transactionHash": tx_hash,
            "transactionIndex": "0x0",
            "blockHash": format!("0x{:064x}", 0x3e8),
            "blockNumber": "0x3e8",
            "from": format!("0x{:040x}", 1),
            "to": format!("0x{:040x}", 2),
            "cumulativeGasUsed": "0x5208",
            "gasUsed": "0x5208",
            "contractAddress": null,
            "logs": [],
            "logsBloom": format!("0x{}", "00".repeat(256)),
            "status": "0x1",
        })
    }

    async fn handle_rpc_request(
        State(state): State<Arc<MockRpcState>>,
        Json(payload): Json<Value>,
    ) -> Json<Value> {
        let method = payload["method"].as_str().unwrap_or("");
        let id = payload["id"].clone();
        let params = &payload["params"];

        let result = match method {
            "eth_blockNumber" => Ok(json!("0x3e8")),
            "eth_getTransactionCount" => Ok(json!("0x7")),
            "eth_sendRawTransaction" => {
                let raw = params[0].as_str().unwrap_or("");
                if raw == REJECTED_RAW {
                    Err(json!({ "code": -32000, "message": "nonce too low" }))
                } else {
                    let bytes = hex::decode(raw.trim_start_matches("0x")).unwrap_or_default();
                    let hash = ethers::utils::keccak256(bytes);
                    Ok(json!(format!("0x{}", hex::encode(hash))))
                }
            }
            "eth_getTransactionReceipt" => {
                let polls = state.receipt_polls.fetch_add(1, Ordering::SeqCst) + 1;
                if polls <= state.absent_polls {
                    Ok(Value::Null)
                } else {
                    Ok(receipt_json(&params[0]))
                }
            }
            "eth_call" => {
                let data = params[0]["data"]
                    .as_str()
                    .or_else(|| params[0]["input"].as_str())
                    .unwrap_or("");
                if data.is_empty() || data == "0x" {
                    Err(json!({ "code": 3, "message": "execution reverted" }))
                } else {
                    Ok(json!(format!("0x{:064x}", 42)))
                }
            }
            _ => Ok(Value::Null),
        };

        let body = match result {
            Ok(result) => json!({ "jsonrpc": "2.0", "id": id, "result": result }),
            Err(error) => json!({ "jsonrpc": "2.0", "id": id, "error": error }),
        };
        Json(body)
    }
}

fn node_at(addr: std::net::SocketAddr) -> HttpNode {
    HttpNode::new(RpcClientConfig {
        endpoint: format!("http://{}", addr),
        timeout_ms: 2_000,
    })
    .unwrap()
}

#[tokio::test]
async fn test_nonce_and_connectivity() {
    let (addr, _state, server) = mock_rpc::start_mock_rpc_server(0).await.unwrap();
    let node = node_at(addr);

    let nonce = node.get_transaction_count(Address::repeat_byte(0x01)).await.unwrap();
    assert_eq!(nonce, U256::from(7u64));
    assert!(node.is_connected().await);

    server.abort();
}

#[tokio::test]
async fn test_rpc_error_maps_to_rejected_with_reason() {
    let (addr, _state, server) = mock_rpc::start_mock_rpc_server(0).await.unwrap();
    let node = node_at(addr);

    let raw: Bytes = mock_rpc::REJECTED_RAW.parse().unwrap();
    match node.send_raw_transaction(raw).await {
        Err(ChainError::RejectedByNode(reason)) => assert_eq!(reason, "nonce too low"),
        other => panic!("expected RejectedByNode, got {:?}", other),
    }

    server.abort();
}

#[tokio::test]
async fn test_receipt_absent_then_present() {
    let (addr, _state, server) = mock_rpc::start_mock_rpc_server(1).await.unwrap();
    let node = node_at(addr);
    let tx_hash = H256::repeat_byte(0xab);

    assert_eq!(node.get_transaction_receipt(tx_hash).await.unwrap(), None);

    let receipt = node.get_transaction_receipt(tx_hash).await.unwrap().unwrap();
    assert_eq!(receipt.transaction_hash, tx_hash);
    assert!(receipt.status);
    assert_eq!(receipt.block_number, Some(1000));

    server.abort();
}

#[tokio::test]
async fn test_eth_call_output_and_revert() {
    let (addr, _state, server) = mock_rpc::start_mock_rpc_server(0).await.unwrap();
    let node = node_at(addr);
    let contract = Address::repeat_byte(0x22);

    let output = node
        .call(contract, Bytes::from(ethers::utils::id("highestBid()").to_vec()))
        .await
        .unwrap();
    assert_eq!(U256::from_big_endian(&output), U256::from(42u64));

    let reverted = node.call(contract, Bytes::default()).await;
    assert!(matches!(reverted, Err(ChainError::RejectedByNode(_))));

    server.abort();
}

#[tokio::test]
async fn test_lifecycle_over_http() {
    let (addr, state, server) = mock_rpc::start_mock_rpc_server(2).await.unwrap();
    let node: Arc<dyn NodeRpc> = Arc::new(node_at(addr));
    let identity = Arc::new(SigningIdentity::from_private_key(TEST_KEY, 1337).unwrap());
    let lifecycle = TransactionLifecycle::new(
        node,
        identity,
        LifecycleConfig {
            poll_interval: Duration::from_millis(10),
            confirmation_timeout: Duration::from_secs(5),
        },
        Arc::new(LifecycleMetrics::new().unwrap()),
    );

    let request = lifecycle
        .build(TransactionTemplate::contract_call(
            Address::repeat_byte(0x22),
            Bytes::default(),
            U256::zero(),
            GasSettings::from_gwei(2_000_000, 40),
        ))
        .await
        .unwrap();
    assert_eq!(request.nonce, U256::from(7u64));

    let signed = lifecycle.sign(request).unwrap();
    let tx_hash = lifecycle.broadcast(&signed).await.unwrap();
    assert_eq!(tx_hash, signed.hash);

    let receipt = lifecycle.confirm(tx_hash).await.unwrap();
    assert_eq!(receipt.transaction_hash, tx_hash);
    assert_eq!(
        state.receipt_polls.load(std::sync::atomic::Ordering::SeqCst),
        3
    );

    server.abort();
}
