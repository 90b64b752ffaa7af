use anyhow::Context;
use auction_config::{Config, MonitoringConfig};
use auction_server::{build_router, startup};
use clap::{Arg, Command};
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

fn init_tracing(monitoring: &MonitoringConfig) {
    // RUST_LOG wins over the configured level.
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&monitoring.log_level));

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true);

    if monitoring.json_logs {
        builder
            .with_thread_ids(true)
            .with_file(true)
            .with_line_number(true)
            .json()
            .init();
    } else {
        builder.init();
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let matches = Command::new("auction-server")
        .version(auction_core::version())
        .about("Deploys the auction contract and serves its web front end")
        .arg(
            Arg::new("config")
                .short('c')
                .long("config")
                .value_name("FILE")
                .help("YAML config file (default: environment / .env)"),
        )
        .arg(
            Arg::new("listen")
                .short('l')
                .long("listen")
                .value_name("ADDR")
                .help("Override the listen address, e.g. 0.0.0.0:5000"),
        )
        .get_matches();

    let mut config = if let Some(config_file) = matches.get_one::<String>("config") {
        Config::load_from_file(config_file)?
    } else {
        Config::load_from_env()?
    };
    if let Some(listen) = matches.get_one::<String>("listen") {
        config.server.listen_addr = listen.clone();
    }

    init_tracing(&config.monitoring);

    info!(
        version = auction_core::version(),
        rpc_url = %config.network.rpc_url,
        chain_id = config.network.chain_id,
        artifact = %config.deployment.artifact_path,
        "Starting auction server"
    );

    let node = Arc::new(startup::http_node(&config)?);
    let state = match startup::deploy_contract(&config, node).await {
        Ok(state) => state,
        Err(e) => {
            error!(error = %format!("{:#}", e), "Start-up failed, not serving");
            return Err(e);
        }
    };

    let listener = TcpListener::bind(&config.server.listen_addr)
        .await
        .with_context(|| format!("Failed to bind {}", config.server.listen_addr))?;
    info!(
        listen_addr = %config.server.listen_addr,
        contract = %state.contract_display(),
        "Serving auction"
    );

    axum::serve(listener, build_router(state))
        .with_graceful_shutdown(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                error!("Failed to listen for shutdown signal: {}", e);
            }
            info!("Shutdown signal received");
        })
        .await?;

    Ok(())
}
