//! Signing identity: one configured key and the address derived from it

use crate::error::{ChainError, ChainResult};
use crate::types::{SignedTransaction, UnsignedTransaction};
use ethers::signers::{LocalWallet, Signer};
use ethers::types::Address;
use std::fmt;
use tracing::debug;

/// Holds the process signing key. The key never leaves this struct: it is not
/// serialized, logged, or exposed through `Debug`.
#[derive(Clone)]
pub struct SigningIdentity {
    wallet: LocalWallet,
}

impl SigningIdentity {
    /// Load a hex private key, with or without `0x`.
    pub fn from_private_key(private_key: &str, chain_id: u64) -> ChainResult<Self> {
        let trimmed = private_key.trim();
        let hex_part = trimmed
            .strip_prefix("0x")
            .or_else(|| trimmed.strip_prefix("0X"))
            .unwrap_or(trimmed);

        let bytes = hex::decode(hex_part)
            .map_err(|e| ChainError::InvalidKey(format!("key is not valid hex: {}", e)))?;
        if bytes.len() != 32 {
            return Err(ChainError::InvalidKey(format!(
                "expected 32 key bytes, got {}",
                bytes.len()
            )));
        }

        let wallet = LocalWallet::from_bytes(&bytes)
            .map_err(|e| ChainError::InvalidKey(e.to_string()))?
            .with_chain_id(chain_id);

        debug!(address = ?wallet.address(), chain_id, "Signing identity loaded");
        Ok(Self { wallet })
    }

    pub fn address(&self) -> Address {
        self.wallet.address()
    }

    pub fn chain_id(&self) -> u64 {
        self.wallet.chain_id()
    }

    /// Sign a request built for this identity. Deterministic: the same request
    /// always yields the same signature and raw bytes.
    pub fn sign(&self, request: UnsignedTransaction) -> ChainResult<SignedTransaction> {
        if request.from != self.address() {
            return Err(ChainError::SigningFailed(format!(
                "request sender {:?} does not match signing identity {:?}",
                request.from,
                self.address()
            )));
        }
        if request.chain_id != self.chain_id() {
            return Err(ChainError::SigningFailed(format!(
                "request chain id {} does not match signing identity chain id {}",
                request.chain_id,
                self.chain_id()
            )));
        }

        let typed_tx = request.to_typed();
        let signature = self
            .wallet
            .sign_transaction_sync(&typed_tx)
            .map_err(|e| ChainError::SigningFailed(e.to_string()))?;

        Ok(SignedTransaction {
            hash: typed_tx.hash(&signature),
            raw_transaction: typed_tx.rlp_signed(&signature),
            signature,
            request,
        })
    }
}

impl fmt::Debug for SigningIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SigningIdentity")
            .field("address", &self.address())
            .field("chain_id", &self.chain_id())
            .finish_non_exhaustive()
    }
}
