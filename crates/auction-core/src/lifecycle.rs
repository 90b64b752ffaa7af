//! Transaction lifecycle: build, sign, broadcast, confirm
//!
//! Every state-changing chain interaction goes through [`TransactionLifecycle`].
//! The stages consume their input, so a transaction can only move forward:
//! `Built -> Signed -> Broadcast -> {Confirmed | TimedOut}`. Nothing is retried
//! here. A timed-out transaction may still be mined, so retrying means building
//! a brand-new transaction with a fresh nonce.

use crate::error::{ChainError, ChainResult};
use crate::metrics::LifecycleMetrics;
use crate::rpc_client::NodeRpc;
use crate::signer::SigningIdentity;
use crate::types::{Receipt, SignedTransaction, TransactionTemplate, TxStage, UnsignedTransaction};
use ethers::types::{Address, H256};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::{sleep, Instant};
use tracing::{debug, error, info, warn};

/// Confirmation polling bounds
#[derive(Debug, Clone)]
pub struct LifecycleConfig {
    /// Delay between `eth_getTransactionReceipt` polls
    pub poll_interval: Duration,
    /// Give up waiting (outcome unknown) after this long
    pub confirmation_timeout: Duration,
}

impl Default for LifecycleConfig {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_millis(500),
            confirmation_timeout: Duration::from_secs(120),
        }
    }
}

pub struct TransactionLifecycle {
    node: Arc<dyn NodeRpc>,
    identity: Arc<SigningIdentity>,
    config: LifecycleConfig,
    metrics: Arc<LifecycleMetrics>,
}

impl TransactionLifecycle {
    pub fn new(
        node: Arc<dyn NodeRpc>,
        identity: Arc<SigningIdentity>,
        config: LifecycleConfig,
        metrics: Arc<LifecycleMetrics>,
    ) -> Self {
        Self {
            node,
            identity,
            config,
            metrics,
        }
    }

    pub fn sender(&self) -> Address {
        self.identity.address()
    }

    pub fn node(&self) -> &Arc<dyn NodeRpc> {
        &self.node
    }

    pub fn metrics(&self) -> &Arc<LifecycleMetrics> {
        &self.metrics
    }

    pub fn config(&self) -> &LifecycleConfig {
        &self.config
    }

    /// Stage 1: fetch the sender's nonce and assemble the request. The nonce is
    /// read from the node every time; concurrent submissions make any cached
    /// value stale.
    pub async fn build(&self, template: TransactionTemplate) -> ChainResult<UnsignedTransaction> {
        let from = self.identity.address();
        let nonce = self.node.get_transaction_count(from).await?;

        let request = UnsignedTransaction {
            from,
            to: template.to,
            value: template.value,
            gas_limit: template.gas_limit,
            gas_price: template.gas_price,
            data: template.data,
            nonce,
            chain_id: self.identity.chain_id(),
        };

        self.metrics.record_stage(TxStage::Built);
        debug!(
            from = ?request.from,
            to = ?request.to,
            nonce = %request.nonce,
            value = %request.value,
            "Transaction built"
        );
        Ok(request)
    }

    /// Stage 2: sign with the held identity.
    pub fn sign(&self, request: UnsignedTransaction) -> ChainResult<SignedTransaction> {
        let signed = self.identity.sign(request)?;
        self.metrics.record_stage(TxStage::Signed);
        debug!(tx_hash = ?signed.hash, "Transaction signed");
        Ok(signed)
    }

    /// Stage 3: hand the raw bytes to the node. The returned hash only means
    /// the node accepted the transaction into its pool.
    pub async fn broadcast(&self, signed: &SignedTransaction) -> ChainResult<H256> {
        let tx_hash = self
            .node
            .send_raw_transaction(signed.raw_transaction.clone())
            .await?;

        if tx_hash != signed.hash {
            warn!(
                local_hash = ?signed.hash,
                node_hash = ?tx_hash,
                "Node reported a different transaction hash than computed locally"
            );
        }

        self.metrics.record_stage(TxStage::Broadcast);
        info!(tx_hash = ?tx_hash, nonce = %signed.request.nonce, "Transaction broadcast");
        Ok(tx_hash)
    }

    /// Stage 4: poll for the receipt until it appears or the timeout elapses.
    /// There is no attempt limit, only the time bound. Errors while polling are
    /// logged and polling continues.
    pub async fn confirm(&self, tx_hash: H256) -> ChainResult<Receipt> {
        let started = Instant::now();
        let deadline = started + self.config.confirmation_timeout;
        let mut polls: u64 = 0;

        loop {
            polls += 1;
            match self.node.get_transaction_receipt(tx_hash).await {
                Ok(Some(receipt)) => {
                    let elapsed = started.elapsed();
                    self.metrics.observe_confirmation(elapsed);
                    self.metrics.record_stage(TxStage::Confirmed);
                    info!(
                        tx_hash = ?tx_hash,
                        block_number = ?receipt.block_number,
                        gas_used = ?receipt.gas_used,
                        status = receipt.status,
                        polls,
                        elapsed_ms = elapsed.as_millis() as u64,
                        "Transaction confirmed"
                    );
                    return Ok(receipt);
                }
                Ok(None) => {
                    debug!(tx_hash = ?tx_hash, polls, "Transaction not yet mined");
                }
                Err(e) => {
                    warn!(tx_hash = ?tx_hash, polls, error = %e, "Error fetching receipt, still polling");
                }
            }

            let now = Instant::now();
            if now >= deadline {
                let waited = started.elapsed();
                self.metrics.record_stage(TxStage::TimedOut);
                error!(
                    tx_hash = ?tx_hash,
                    polls,
                    waited_secs = waited.as_secs(),
                    "No receipt before timeout; outcome unknown"
                );
                return Err(ChainError::ConfirmationTimeout { tx_hash, waited });
            }

            sleep(self.config.poll_interval.min(deadline - now)).await;
        }
    }

    /// Run all four stages for one template.
    pub async fn execute(&self, template: TransactionTemplate) -> ChainResult<Receipt> {
        let result = self.run_stages(template).await;
        if let Err(e) = &result {
            self.metrics.record_failure(e.kind());
        }
        result
    }

    async fn run_stages(&self, template: TransactionTemplate) -> ChainResult<Receipt> {
        let request = self.build(template).await?;
        let signed = self.sign(request)?;
        let tx_hash = self.broadcast(&signed).await?;
        self.confirm(tx_hash).await
    }
}
