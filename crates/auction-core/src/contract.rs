//! Contract artifact loading and the deployed-contract binding

use crate::error::{ChainError, ChainResult};
use crate::lifecycle::TransactionLifecycle;
use crate::types::{GasSettings, Receipt, TransactionTemplate};
use ethers::abi::{Abi, Token};
use ethers::types::{Address, Bytes, U256};
use serde::Deserialize;
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Compiled contract: interface descriptor plus creation bytecode
#[derive(Debug, Clone)]
pub struct ContractArtifact {
    pub abi: Abi,
    pub bytecode: Bytes,
}

/// The subset of a Truffle build output we read
#[derive(Deserialize)]
struct TruffleArtifact {
    abi: Abi,
    bytecode: Bytes,
}

impl ContractArtifact {
    pub fn from_json(json: &str) -> ChainResult<Self> {
        let raw: TruffleArtifact = serde_json::from_str(json)
            .map_err(|e| ChainError::ArtifactLoad(format!("malformed artifact: {}", e)))?;

        if raw.bytecode.is_empty() {
            return Err(ChainError::ArtifactLoad(
                "artifact has no bytecode (abstract contract or interface?)".to_string(),
            ));
        }

        Ok(Self {
            abi: raw.abi,
            bytecode: raw.bytecode,
        })
    }

    pub fn load_from_file<P: AsRef<Path>>(path: P) -> ChainResult<Self> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path)
            .map_err(|e| ChainError::ArtifactLoad(format!("{}: {}", path.display(), e)))?;
        let artifact = Self::from_json(&json)?;
        info!(
            path = %path.display(),
            functions = artifact.abi.functions().count(),
            bytecode_len = artifact.bytecode.len(),
            "Contract artifact loaded"
        );
        Ok(artifact)
    }
}

/// A deployed contract: its ABI, its address, and the lifecycle used to send
/// transactions to it. Only the deployment flow creates one.
pub struct ContractBinding {
    abi: Abi,
    address: Address,
    lifecycle: Arc<TransactionLifecycle>,
}

impl ContractBinding {
    pub(crate) fn new(abi: Abi, address: Address, lifecycle: Arc<TransactionLifecycle>) -> Self {
        Self {
            abi,
            address,
            lifecycle,
        }
    }

    pub fn address(&self) -> Address {
        self.address
    }

    pub fn abi(&self) -> &Abi {
        &self.abi
    }

    pub fn lifecycle(&self) -> &Arc<TransactionLifecycle> {
        &self.lifecycle
    }

    /// Selector plus ABI-encoded arguments
    pub fn encode_call(&self, function: &str, args: &[Token]) -> ChainResult<Bytes> {
        let func = self
            .abi
            .function(function)
            .map_err(|e| ChainError::Encode(format!("{}: {}", function, e)))?;
        func.encode_input(args)
            .map(Bytes::from)
            .map_err(|e| ChainError::Encode(format!("{}: {}", function, e)))
    }

    pub fn decode_output(&self, function: &str, output: &[u8]) -> ChainResult<Vec<Token>> {
        let func = self
            .abi
            .function(function)
            .map_err(|e| ChainError::Encode(format!("{}: {}", function, e)))?;
        func.decode_output(output).map_err(|e| {
            ChainError::Decode(format!(
                "{} returned {} bytes that do not match its outputs: {}",
                function,
                output.len(),
                e
            ))
        })
    }

    /// Read-only call against the latest state
    pub async fn call(&self, function: &str, args: &[Token]) -> ChainResult<Vec<Token>> {
        let data = self.encode_call(function, args)?;
        self.lifecycle.metrics().record_call(function);
        let output = self.lifecycle.node().call(self.address, data).await?;
        debug!(function, output_len = output.len(), "Contract call returned");
        self.decode_output(function, &output)
    }

    /// State-changing call through the full lifecycle. A mined transaction
    /// with failed status is an error.
    pub async fn transact(
        &self,
        function: &str,
        args: &[Token],
        value: U256,
        gas: GasSettings,
    ) -> ChainResult<Receipt> {
        let data = self.encode_call(function, args)?;
        let template = TransactionTemplate::contract_call(self.address, data, value, gas);
        let receipt = self.lifecycle.execute(template).await?;

        if !receipt.status {
            warn!(
                function,
                tx_hash = ?receipt.transaction_hash,
                contract = ?self.address,
                "Contract transaction reverted"
            );
            self.lifecycle.metrics().record_failure("reverted");
            return Err(ChainError::Reverted {
                tx_hash: receipt.transaction_hash,
            });
        }
        Ok(receipt)
    }

    pub async fn highest_bidder(&self) -> ChainResult<Address> {
        let tokens = self.call("highestBidder", &[]).await?;
        match tokens.as_slice() {
            [Token::Address(bidder)] => Ok(*bidder),
            other => Err(ChainError::Decode(format!(
                "highestBidder: expected one address, got {:?}",
                other
            ))),
        }
    }

    /// Highest bid in wei
    pub async fn highest_bid(&self) -> ChainResult<U256> {
        let tokens = self.call("highestBid", &[]).await?;
        match tokens.as_slice() {
            [Token::Uint(amount)] => Ok(*amount),
            other => Err(ChainError::Decode(format!(
                "highestBid: expected one uint256, got {:?}",
                other
            ))),
        }
    }

    /// Place a bid on behalf of `bidder`; the amount is both the argument and
    /// the attached value.
    pub async fn bid(&self, bidder: Address, amount_wei: U256, gas: GasSettings) -> ChainResult<Receipt> {
        info!(bidder = ?bidder, amount_wei = %amount_wei, "Submitting bid");
        self.transact(
            "bid",
            &[Token::Address(bidder), Token::Uint(amount_wei)],
            amount_wei,
            gas,
        )
        .await
    }
}
