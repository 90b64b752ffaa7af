//! One-shot contract deployment at start-up

use crate::contract::{ContractArtifact, ContractBinding};
use crate::error::{ChainError, ChainResult};
use crate::lifecycle::TransactionLifecycle;
use crate::types::{GasSettings, TransactionTemplate};
use ethers::abi::token::{LenientTokenizer, Tokenizer};
use ethers::abi::{Abi, Token};
use ethers::types::Bytes;
use std::sync::Arc;
use tracing::{error, info};

/// Parse constructor arguments given as text against the ABI constructor's
/// parameter types.
pub fn tokenize_constructor_args(abi: &Abi, args: &[String]) -> ChainResult<Vec<Token>> {
    let params = abi
        .constructor()
        .map(|constructor| constructor.inputs.as_slice())
        .unwrap_or_default();

    if params.len() != args.len() {
        return Err(ChainError::Encode(format!(
            "constructor takes {} arguments, {} given",
            params.len(),
            args.len()
        )));
    }

    params
        .iter()
        .zip(args)
        .map(|(param, value)| {
            LenientTokenizer::tokenize(&param.kind, value.trim()).map_err(|e| {
                ChainError::Encode(format!(
                    "constructor argument {} ({}) = {:?}: {}",
                    param.name, param.kind, value, e
                ))
            })
        })
        .collect()
}

/// Creation bytecode followed by the encoded constructor arguments
pub fn build_init_code(artifact: &ContractArtifact, args: &[Token]) -> ChainResult<Bytes> {
    match artifact.abi.constructor() {
        Some(constructor) => constructor
            .encode_input(artifact.bytecode.to_vec(), args)
            .map(Bytes::from)
            .map_err(|e| ChainError::Encode(format!("constructor: {}", e))),
        None if args.is_empty() => Ok(artifact.bytecode.clone()),
        None => Err(ChainError::Encode(
            "contract has no constructor but arguments were given".to_string(),
        )),
    }
}

/// Deploy the artifact and bind to the created contract. Any failure here is
/// fatal to start-up.
pub async fn deploy(
    lifecycle: Arc<TransactionLifecycle>,
    artifact: &ContractArtifact,
    constructor_args: &[String],
    gas: GasSettings,
) -> ChainResult<ContractBinding> {
    let tokens = tokenize_constructor_args(&artifact.abi, constructor_args)?;
    let init_code = build_init_code(artifact, &tokens)?;

    info!(
        deployer = ?lifecycle.sender(),
        args = ?constructor_args,
        gas_limit = %gas.gas_limit,
        gas_price = %gas.gas_price,
        "Deploying contract"
    );

    let receipt = lifecycle
        .execute(TransactionTemplate::contract_deployment(init_code, gas))
        .await?;

    if !receipt.status {
        error!(tx_hash = ?receipt.transaction_hash, "Deployment reverted");
        lifecycle.metrics().record_failure("reverted");
        return Err(ChainError::Reverted {
            tx_hash: receipt.transaction_hash,
        });
    }

    let address = receipt
        .contract_address
        .ok_or(ChainError::MissingContractAddress {
            tx_hash: receipt.transaction_hash,
        })?;

    info!(
        contract = ?address,
        tx_hash = ?receipt.transaction_hash,
        block_number = ?receipt.block_number,
        "Contract deployed"
    );
    Ok(ContractBinding::new(artifact.abi.clone(), address, lifecycle))
}
