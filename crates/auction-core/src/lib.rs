//! Auction Core - signing, node access and the transaction lifecycle for the auction contract

pub mod contract;
pub mod deployment;
pub mod error;
pub mod lifecycle;
pub mod metrics;
pub mod rpc_client;
pub mod signer;
pub mod types;
pub mod utils;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;

pub use contract::{ContractArtifact, ContractBinding};
pub use deployment::deploy;
pub use error::{ChainError, ChainResult};
pub use lifecycle::{LifecycleConfig, TransactionLifecycle};
pub use metrics::LifecycleMetrics;
pub use rpc_client::{HttpNode, NodeRpc, RpcClientConfig};
pub use signer::SigningIdentity;
pub use types::*;
pub use utils::*;

pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
