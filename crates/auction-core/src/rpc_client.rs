//! Node RPC boundary and its JSON-RPC over HTTP implementation

use crate::error::{ChainError, ChainResult};
use crate::types::Receipt;
use async_trait::async_trait;
use ethers::{
    providers::{Http, Middleware, Provider, ProviderError, RpcError},
    types::{
        transaction::eip2718::TypedTransaction, Address, BlockNumber, Bytes, TransactionRequest,
        H256, U256,
    },
};
use reqwest::{Client, Url};
use std::time::{Duration, Instant};
use tracing::{debug, warn};

/// The node operations the rest of the crate depends on. Everything that
/// talks to the chain goes through this trait so tests can swap the node.
#[async_trait]
pub trait NodeRpc: Send + Sync {
    /// `eth_getTransactionCount` for the pending block
    async fn get_transaction_count(&self, address: Address) -> ChainResult<U256>;

    /// `eth_sendRawTransaction`; acceptance is not confirmation
    async fn send_raw_transaction(&self, raw: Bytes) -> ChainResult<H256>;

    /// `eth_getTransactionReceipt`; `None` until the transaction is mined
    async fn get_transaction_receipt(&self, tx_hash: H256) -> ChainResult<Option<Receipt>>;

    /// Read-only `eth_call` against the latest state
    async fn call(&self, to: Address, data: Bytes) -> ChainResult<Bytes>;

    async fn is_connected(&self) -> bool;
}

/// RPC client configuration
#[derive(Debug, Clone)]
pub struct RpcClientConfig {
    pub endpoint: String,
    pub timeout_ms: u64,
}

impl Default for RpcClientConfig {
    fn default() -> Self {
        Self {
            endpoint: "http://localhost:7545".to_string(),
            timeout_ms: 10_000,
        }
    }
}

/// JSON-RPC node client over HTTP
#[derive(Debug, Clone)]
pub struct HttpNode {
    provider: Provider<Http>,
    endpoint: String,
}

impl HttpNode {
    pub fn new(config: RpcClientConfig) -> ChainResult<Self> {
        let client = Client::builder()
            .timeout(Duration::from_millis(config.timeout_ms))
            .build()
            .map_err(|e| ChainError::NodeUnavailable(format!("failed to build HTTP client: {}", e)))?;

        let url = Url::parse(&config.endpoint).map_err(|e| {
            ChainError::NodeUnavailable(format!("invalid RPC endpoint {}: {}", config.endpoint, e))
        })?;

        Ok(Self {
            provider: Provider::new(Http::new_with_client(url, client)),
            endpoint: config.endpoint,
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

/// Transport failures mean the node could not be reached; JSON-RPC error
/// objects mean it answered and said no.
fn classify_submission_error(err: ProviderError) -> ChainError {
    match err.as_error_response() {
        Some(rpc_error) => ChainError::RejectedByNode(rpc_error.message.clone()),
        None => ChainError::NodeUnavailable(err.to_string()),
    }
}

fn unavailable(operation: &str, err: ProviderError) -> ChainError {
    ChainError::NodeUnavailable(format!("{} failed: {}", operation, err))
}

#[async_trait]
impl NodeRpc for HttpNode {
    async fn get_transaction_count(&self, address: Address) -> ChainResult<U256> {
        self.provider
            .get_transaction_count(address, Some(BlockNumber::Pending.into()))
            .await
            .map_err(|e| unavailable("eth_getTransactionCount", e))
    }

    async fn send_raw_transaction(&self, raw: Bytes) -> ChainResult<H256> {
        let start_time = Instant::now();
        let pending = self
            .provider
            .send_raw_transaction(raw)
            .await
            .map_err(classify_submission_error)?;

        debug!(
            tx_hash = ?pending.tx_hash(),
            response_time_ms = start_time.elapsed().as_secs_f64() * 1000.0,
            "Raw transaction accepted by node"
        );
        Ok(pending.tx_hash())
    }

    async fn get_transaction_receipt(&self, tx_hash: H256) -> ChainResult<Option<Receipt>> {
        self.provider
            .get_transaction_receipt(tx_hash)
            .await
            .map(|receipt| receipt.map(Receipt::from))
            .map_err(|e| unavailable("eth_getTransactionReceipt", e))
    }

    async fn call(&self, to: Address, data: Bytes) -> ChainResult<Bytes> {
        let tx: TypedTransaction = TransactionRequest::new().to(to).data(data).into();
        self.provider
            .call(&tx, None)
            .await
            .map_err(classify_submission_error)
    }

    async fn is_connected(&self) -> bool {
        match self.provider.get_block_number().await {
            Ok(_) => true,
            Err(e) => {
                warn!(endpoint = %self.endpoint, error = %e, "Node connectivity check failed");
                false
            }
        }
    }
}
