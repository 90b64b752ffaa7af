//! Error taxonomy for chain interactions

use ethers::types::H256;
use std::time::Duration;

/// Every failure the lifecycle, the contract binding and the deployment flow
/// can surface. Nothing here is retried internally.
#[derive(Debug, thiserror::Error)]
pub enum ChainError {
    #[error("node unavailable: {0}")]
    NodeUnavailable(String),

    #[error("invalid signing key: {0}")]
    InvalidKey(String),

    #[error("signing failed: {0}")]
    SigningFailed(String),

    #[error("transaction rejected by node: {0}")]
    RejectedByNode(String),

    #[error(
        "no receipt for transaction {tx_hash:?} after {}s; outcome unknown, it may still be mined",
        waited.as_secs()
    )]
    ConfirmationTimeout { tx_hash: H256, waited: Duration },

    #[error("transaction {tx_hash:?} was mined but reverted")]
    Reverted { tx_hash: H256 },

    #[error("deployment receipt for {tx_hash:?} carries no contract address")]
    MissingContractAddress { tx_hash: H256 },

    #[error("could not decode contract output: {0}")]
    Decode(String),

    #[error("could not encode contract call: {0}")]
    Encode(String),

    #[error("could not load contract artifact: {0}")]
    ArtifactLoad(String),
}

impl ChainError {
    /// Short label used for metrics and structured logs
    pub fn kind(&self) -> &'static str {
        match self {
            ChainError::NodeUnavailable(_) => "node_unavailable",
            ChainError::InvalidKey(_) => "invalid_key",
            ChainError::SigningFailed(_) => "signing_failed",
            ChainError::RejectedByNode(_) => "rejected_by_node",
            ChainError::ConfirmationTimeout { .. } => "confirmation_timeout",
            ChainError::Reverted { .. } => "reverted",
            ChainError::MissingContractAddress { .. } => "missing_contract_address",
            ChainError::Decode(_) => "decode",
            ChainError::Encode(_) => "encode",
            ChainError::ArtifactLoad(_) => "artifact_load",
        }
    }

    /// True when the transaction may still land on chain.
    pub fn is_outcome_unknown(&self) -> bool {
        matches!(self, ChainError::ConfirmationTimeout { .. })
    }
}

pub type ChainResult<T> = std::result::Result<T, ChainError>;
