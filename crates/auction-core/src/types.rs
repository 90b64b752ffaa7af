//! Transaction and receipt type definitions

use ethers::types::{
    transaction::eip2718::TypedTransaction, Address, Bytes, Signature, TransactionRequest, H256,
    U256,
};
use serde::{Deserialize, Serialize};
use std::fmt;

/// What the caller wants on chain; the lifecycle fills in sender and nonce.
#[derive(Debug, Clone)]
pub struct TransactionTemplate {
    /// To address (None for contract creation)
    pub to: Option<Address>,

    /// Transaction value in wei
    pub value: U256,

    /// Gas limit
    pub gas_limit: U256,

    /// Legacy gas price in wei
    pub gas_price: U256,

    /// Call data (selector + args, or bytecode + constructor args)
    pub data: Bytes,
}

impl TransactionTemplate {
    /// Create a contract call template
    pub fn contract_call(to: Address, data: Bytes, value: U256, gas: GasSettings) -> Self {
        Self {
            to: Some(to),
            value,
            gas_limit: gas.gas_limit,
            gas_price: gas.gas_price,
            data,
        }
    }

    /// Create a contract deployment template
    pub fn contract_deployment(init_code: Bytes, gas: GasSettings) -> Self {
        Self {
            to: None,
            value: U256::zero(),
            gas_limit: gas.gas_limit,
            gas_price: gas.gas_price,
            data: init_code,
        }
    }

    pub fn is_creation(&self) -> bool {
        self.to.is_none()
    }
}

/// Gas limit and legacy gas price for one kind of transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GasSettings {
    pub gas_limit: U256,
    pub gas_price: U256,
}

impl GasSettings {
    pub fn from_gwei(gas_limit: u64, gas_price_gwei: u64) -> Self {
        Self {
            gas_limit: U256::from(gas_limit),
            gas_price: U256::from(gas_price_gwei) * U256::exp10(9),
        }
    }
}

/// A fully populated, not yet signed transaction. Built fresh for every
/// submission; the nonce comes straight from the node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnsignedTransaction {
    pub from: Address,
    pub to: Option<Address>,
    pub value: U256,
    pub gas_limit: U256,
    pub gas_price: U256,
    pub data: Bytes,
    pub nonce: U256,
    pub chain_id: u64,
}

impl UnsignedTransaction {
    /// Legacy (EIP-155) encoding used for signing and hashing.
    pub fn to_typed(&self) -> TypedTransaction {
        let mut tx = TransactionRequest::new()
            .from(self.from)
            .value(self.value)
            .gas(self.gas_limit)
            .gas_price(self.gas_price)
            .nonce(self.nonce)
            .data(self.data.clone())
            .chain_id(self.chain_id);
        if let Some(to) = self.to {
            tx = tx.to(to);
        }
        TypedTransaction::Legacy(tx)
    }
}

/// A signed transaction ready for broadcast
#[derive(Debug, Clone)]
pub struct SignedTransaction {
    pub request: UnsignedTransaction,

    pub signature: Signature,

    /// Transaction hash
    pub hash: H256,

    /// Raw signed transaction bytes
    pub raw_transaction: Bytes,
}

/// Log entry from a transaction receipt
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReceiptLog {
    pub address: Address,
    pub topics: Vec<H256>,
    pub data: Bytes,
}

/// The node's record of an included transaction
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Receipt {
    pub transaction_hash: H256,
    /// true = success, false = reverted
    pub status: bool,
    /// Present only for contract creation
    pub contract_address: Option<Address>,
    pub block_number: Option<u64>,
    pub gas_used: Option<U256>,
    pub logs: Vec<ReceiptLog>,
}

impl From<ethers::types::TransactionReceipt> for Receipt {
    fn from(receipt: ethers::types::TransactionReceipt) -> Self {
        Self {
            transaction_hash: receipt.transaction_hash,
            status: receipt.status.map(|s| s.as_u64() == 1).unwrap_or(false),
            contract_address: receipt.contract_address,
            block_number: receipt.block_number.map(|b| b.as_u64()),
            gas_used: receipt.gas_used,
            logs: receipt
                .logs
                .into_iter()
                .map(|log| ReceiptLog {
                    address: log.address,
                    topics: log.topics,
                    data: log.data,
                })
                .collect(),
        }
    }
}

/// Lifecycle stage of a single transaction. Stages only move forward.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TxStage {
    Built,
    Signed,
    Broadcast,
    Confirmed,
    TimedOut,
}

impl TxStage {
    pub fn as_str(&self) -> &'static str {
        match self {
            TxStage::Built => "built",
            TxStage::Signed => "signed",
            TxStage::Broadcast => "broadcast",
            TxStage::Confirmed => "confirmed",
            TxStage::TimedOut => "timed_out",
        }
    }
}

impl fmt::Display for TxStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
