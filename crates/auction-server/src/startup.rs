//! Process start-up: identity, node client and contract deployment

use crate::AppState;
use anyhow::Context;
use auction_config::Config;
use auction_core::{
    deploy, ContractArtifact, GasSettings, HttpNode, LifecycleConfig, LifecycleMetrics, NodeRpc,
    RpcClientConfig, SigningIdentity, TransactionLifecycle,
};
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

pub fn lifecycle_config(config: &Config) -> LifecycleConfig {
    LifecycleConfig {
        poll_interval: Duration::from_millis(config.confirmation.poll_interval_ms),
        confirmation_timeout: Duration::from_secs(config.confirmation.timeout_secs),
    }
}

pub fn http_node(config: &Config) -> anyhow::Result<HttpNode> {
    let node = HttpNode::new(RpcClientConfig {
        endpoint: config.network.rpc_url.clone(),
        timeout_ms: config.network.rpc_timeout_secs.saturating_mul(1000),
    })?;
    Ok(node)
}

/// Load the artifact, deploy it through `node` and return the router state.
/// Nothing is served until this succeeds.
pub async fn deploy_contract(config: &Config, node: Arc<dyn NodeRpc>) -> anyhow::Result<AppState> {
    let identity = SigningIdentity::from_private_key(&config.network.private_key, config.network.chain_id)
        .context("Failed to load signing key")?;
    info!(address = ?identity.address(), chain_id = config.network.chain_id, "Signing identity ready");

    let artifact = ContractArtifact::load_from_file(&config.deployment.artifact_path)
        .with_context(|| format!("Failed to load artifact {}", config.deployment.artifact_path))?;

    let metrics = Arc::new(LifecycleMetrics::new().context("Failed to register metrics")?);
    let lifecycle = Arc::new(TransactionLifecycle::new(
        node,
        Arc::new(identity),
        lifecycle_config(config),
        metrics,
    ));

    let deploy_gas = GasSettings::from_gwei(
        config.deployment.gas_limit,
        config.deployment.gas_price_gwei,
    );
    let binding = deploy(
        lifecycle,
        &artifact,
        &config.deployment.constructor_args,
        deploy_gas,
    )
    .await
    .context("Contract deployment failed")?;

    let bid_gas = GasSettings::from_gwei(config.bid.gas_limit, config.bid.gas_price_gwei);
    Ok(AppState::new(Arc::new(binding), bid_gas))
}
