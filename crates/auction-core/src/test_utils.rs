//! In-process node for tests
//!
//! `MockNode` decodes the raw transactions it receives, tracks nonces per
//! sender, mines on demand and runs a tiny model of the auction contract so
//! the full deploy/bid/query path can be exercised without a chain.

use crate::error::{ChainError, ChainResult};
use crate::rpc_client::NodeRpc;
use crate::signer::SigningIdentity;
use crate::types::Receipt;
use async_trait::async_trait;
use ethers::abi::{self, ParamType, Token};
use ethers::types::{Address, Bytes, Transaction, H256, U256};
use ethers::utils::{get_contract_address, id, rlp};
use std::collections::{HashMap, HashSet};
use std::sync::{Mutex, MutexGuard};

/// Throwaway key shared by tests (DO NOT use in production)
pub const TEST_PRIVATE_KEY: &str =
    "0x4c0883a69102937d6231471b5dbb6204fe5129617082792ae468d01a3f362318";

pub const TEST_CHAIN_ID: u64 = 1337;

/// Truffle-style artifact for the auction contract. The bytecode is a stub;
/// only `MockNode` ever runs it.
pub const AUCTION_ARTIFACT_JSON: &str = include_str!("../tests/fixtures/SimpleAuction.json");

pub fn test_identity() -> SigningIdentity {
    match SigningIdentity::from_private_key(TEST_PRIVATE_KEY, TEST_CHAIN_ID) {
        Ok(identity) => identity,
        Err(e) => panic!("test key must load: {}", e),
    }
}

/// Number of each RPC the node has served
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CallCounts {
    pub get_transaction_count: u32,
    pub send_raw_transaction: u32,
    pub get_transaction_receipt: u32,
    pub call: u32,
}

impl CallCounts {
    pub fn total(&self) -> u32 {
        self.get_transaction_count + self.send_raw_transaction + self.get_transaction_receipt + self.call
    }
}

struct PendingReceipt {
    receipt: Receipt,
    absent_polls_left: u32,
    polls: u32,
}

#[derive(Default)]
struct AuctionModel {
    highest_bidder: Address,
    highest_bid: U256,
}

#[derive(Default)]
struct MockState {
    nonces: HashMap<Address, U256>,
    receipts: HashMap<H256, PendingReceipt>,
    contracts: HashSet<Address>,
    auctions: HashMap<Address, AuctionModel>,
    last_deployed: Option<Address>,
    block_number: u64,
    receipt_delay: u32,
    never_confirm: bool,
    unavailable: bool,
    reject_next: Option<String>,
    failing_receipt_polls: u32,
    omit_contract_address: bool,
    call_output_override: Option<Bytes>,
    calls: CallCounts,
}

pub struct MockNode {
    state: Mutex<MockState>,
}

impl Default for MockNode {
    fn default() -> Self {
        Self::new()
    }
}

impl MockNode {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(MockState::default()),
        }
    }

    /// Answer "not mined yet" this many times before each receipt appears.
    pub fn with_receipt_delay(self, absent_polls: u32) -> Self {
        self.state().receipt_delay = absent_polls;
        self
    }

    fn state(&self) -> MutexGuard<'_, MockState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn set_never_confirm(&self, never: bool) {
        self.state().never_confirm = never;
    }

    pub fn set_unavailable(&self, unavailable: bool) {
        self.state().unavailable = unavailable;
    }

    /// Reject the next raw transaction with this JSON-RPC error message.
    pub fn reject_next(&self, reason: &str) {
        self.state().reject_next = Some(reason.to_string());
    }

    /// The next `count` receipt polls fail with a transport error.
    pub fn fail_next_receipt_polls(&self, count: u32) {
        self.state().failing_receipt_polls = count;
    }

    /// Creation receipts leave out the contract address.
    pub fn set_omit_contract_address(&self, omit: bool) {
        self.state().omit_contract_address = omit;
    }

    /// Every `eth_call` returns these bytes instead of the model's answer.
    pub fn set_call_output(&self, output: Bytes) {
        self.state().call_output_override = Some(output);
    }

    pub fn set_nonce(&self, address: Address, nonce: U256) {
        self.state().nonces.insert(address, nonce);
    }

    pub fn nonce_of(&self, address: Address) -> U256 {
        self.state().nonces.get(&address).copied().unwrap_or_default()
    }

    pub fn calls(&self) -> CallCounts {
        self.state().calls
    }

    pub fn receipt_polls(&self, tx_hash: H256) -> u32 {
        self.state()
            .receipts
            .get(&tx_hash)
            .map(|pending| pending.polls)
            .unwrap_or(0)
    }

    pub fn last_deployed(&self) -> Option<Address> {
        self.state().last_deployed
    }

    /// Current (bidder, bid) of the auction at `contract`
    pub fn auction_state(&self, contract: Address) -> Option<(Address, U256)> {
        self.state()
            .auctions
            .get(&contract)
            .map(|auction| (auction.highest_bidder, auction.highest_bid))
    }
}

fn bid_selector() -> [u8; 4] {
    id("bid(address,uint256)")
}

/// Apply a mined transaction to the model; returns (status, created contract).
fn execute(state: &mut MockState, from: Address, tx: &Transaction) -> (bool, Option<Address>) {
    match tx.to {
        None => {
            let address = get_contract_address(from, tx.nonce);
            state.contracts.insert(address);
            state.auctions.insert(address, AuctionModel::default());
            state.last_deployed = Some(address);
            (true, Some(address))
        }
        Some(to) => {
            if !state.contracts.contains(&to) {
                // Plain value transfer.
                return (true, None);
            }
            let input = tx.input.as_ref();
            if input.len() < 4 || input[..4] != bid_selector() {
                return (false, None);
            }
            let decoded = abi::decode(&[ParamType::Address, ParamType::Uint(256)], &input[4..]);
            let (bidder, amount) = match decoded.as_deref() {
                Ok([Token::Address(bidder), Token::Uint(amount)]) => (*bidder, *amount),
                _ => return (false, None),
            };
            let Some(auction) = state.auctions.get_mut(&to) else {
                return (false, None);
            };
            if amount <= auction.highest_bid {
                return (false, None);
            }
            auction.highest_bidder = bidder;
            auction.highest_bid = amount;
            (true, None)
        }
    }
}

#[async_trait]
impl NodeRpc for MockNode {
    async fn get_transaction_count(&self, address: Address) -> ChainResult<U256> {
        let mut state = self.state();
        state.calls.get_transaction_count += 1;
        if state.unavailable {
            return Err(ChainError::NodeUnavailable("connection refused".to_string()));
        }
        Ok(state.nonces.get(&address).copied().unwrap_or_default())
    }

    async fn send_raw_transaction(&self, raw: Bytes) -> ChainResult<H256> {
        let mut state = self.state();
        state.calls.send_raw_transaction += 1;
        if state.unavailable {
            return Err(ChainError::NodeUnavailable("connection refused".to_string()));
        }
        if let Some(reason) = state.reject_next.take() {
            return Err(ChainError::RejectedByNode(reason));
        }

        let tx: Transaction = rlp::decode(raw.as_ref())
            .map_err(|e| ChainError::RejectedByNode(format!("invalid raw transaction: {}", e)))?;
        let from = tx
            .recover_from()
            .map_err(|e| ChainError::RejectedByNode(format!("invalid sender: {}", e)))?;

        let expected = state.nonces.get(&from).copied().unwrap_or_default();
        if tx.nonce < expected {
            return Err(ChainError::RejectedByNode("nonce too low".to_string()));
        }
        if tx.nonce > expected {
            return Err(ChainError::RejectedByNode("nonce too high".to_string()));
        }
        state.nonces.insert(from, expected + 1);

        let (status, created) = execute(&mut state, from, &tx);
        let contract_address = if state.omit_contract_address { None } else { created };
        state.block_number += 1;

        let receipt = Receipt {
            transaction_hash: tx.hash,
            status,
            contract_address,
            block_number: Some(state.block_number),
            gas_used: Some(U256::from(21_000u64)),
            logs: Vec::new(),
        };
        let absent_polls_left = state.receipt_delay;
        state.receipts.insert(
            tx.hash,
            PendingReceipt {
                receipt,
                absent_polls_left,
                polls: 0,
            },
        );
        Ok(tx.hash)
    }

    async fn get_transaction_receipt(&self, tx_hash: H256) -> ChainResult<Option<Receipt>> {
        let mut state = self.state();
        state.calls.get_transaction_receipt += 1;
        let never_confirm = state.never_confirm;
        let failing = state.failing_receipt_polls;
        if failing > 0 {
            state.failing_receipt_polls = failing - 1;
        }

        let Some(pending) = state.receipts.get_mut(&tx_hash) else {
            return Ok(None);
        };
        pending.polls += 1;
        if failing > 0 {
            return Err(ChainError::NodeUnavailable("receipt poll timed out".to_string()));
        }
        if never_confirm {
            return Ok(None);
        }
        if pending.absent_polls_left > 0 {
            pending.absent_polls_left -= 1;
            return Ok(None);
        }
        Ok(Some(pending.receipt.clone()))
    }

    async fn call(&self, to: Address, data: Bytes) -> ChainResult<Bytes> {
        let mut state = self.state();
        state.calls.call += 1;
        if state.unavailable {
            return Err(ChainError::NodeUnavailable("connection refused".to_string()));
        }
        if let Some(output) = &state.call_output_override {
            return Ok(output.clone());
        }
        // Calling an address without code returns empty output.
        let Some(auction) = state.auctions.get(&to) else {
            return Ok(Bytes::default());
        };

        let selector = data.get(..4).unwrap_or_default();
        if selector == id("highestBidder()") {
            Ok(abi::encode(&[Token::Address(auction.highest_bidder)]).into())
        } else if selector == id("highestBid()") {
            Ok(abi::encode(&[Token::Uint(auction.highest_bid)]).into())
        } else {
            Err(ChainError::RejectedByNode("execution reverted".to_string()))
        }
    }

    async fn is_connected(&self) -> bool {
        !self.state().unavailable
    }
}
