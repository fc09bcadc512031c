// src/main.rs
use anyhow::Context;
use std::path::Path;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;
use wallet_operator::Operator;
use wallet_operator::config::OperatorConfig;
use wallet_operator::gateway::{LedgerGateway, RpcGateway, SimulatedGateway};

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .compact()
        .init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    let config_path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "operator.json".to_string());
    let config = if Path::new(&config_path).exists() {
        OperatorConfig::load(Path::new(&config_path))
            .with_context(|| format!("loading {config_path}"))?
    } else {
        tracing::info!(path = %config_path, "no config file, using defaults");
        OperatorConfig::default()
    };

    let gateway: Arc<dyn LedgerGateway> = if config.dry_run {
        tracing::warn!("dry run: actions go to the simulated gateway");
        Arc::new(SimulatedGateway::new(config.rng_seed.unwrap_or(0)))
    } else {
        Arc::new(RpcGateway::new(config.rpc_url.clone()).context("building rpc gateway")?)
    };

    let operator = Operator::bootstrap(config, gateway).context("bootstrapping operator")?;
    for (i, wallet) in operator.pool().fund_wallets().iter().enumerate() {
        tracing::info!("fund wallet {}: {}", i + 1, wallet.public);
    }

    let (shutdown_tx, shutdown_rx) = tokio::sync::watch::channel(false);
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            let _ = shutdown_tx.send(true);
        }
    });

    operator.run(shutdown_rx).await?;
    Ok(())
}
