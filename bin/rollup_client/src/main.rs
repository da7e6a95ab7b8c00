//! Entry point for the three rollup-client roles (§6). Wires up logging,
//! the RPC facade, and the role-specific component, then runs it until
//! SIGINT/SIGTERM. Exit codes: `0` normal, `1` fatal init failure, `2`
//! runtime abort — matching the contract in spec.md §6.

mod cli;
mod metrics;

use std::sync::Arc;

use alloy_signer_local::PrivateKeySigner;
use clap::Parser;
use cli::{Cli, Role};
use rollup_rpc::RpcClient;

#[tokio::main]
async fn main() {
    std::process::exit(run().await);
}

async fn run() -> i32 {
    let cli = Cli::parse();

    if let Err(err) = init_observability() {
        eprintln!("failed to initialize logging: {err:?}");
        return 1;
    }

    let result = match cli.command {
        Role::Driver(args) => run_driver(args).await,
        Role::Proposer(args) => run_proposer(args).await,
        Role::Prover(args) => run_prover(args).await,
    };

    match result {
        Ok(()) => 0,
        Err(err) => {
            tracing::error!(%err, "fatal error");
            match err.downcast_ref::<InitError>() {
                Some(_) => 1,
                None => 2,
            }
        }
    }
}

/// Marks an error as having occurred during startup (config/RPC connect),
/// vs. during the run loop, so `main` can choose exit code 1 vs. 2.
#[derive(Debug, thiserror::Error)]
#[error("{0}")]
struct InitError(anyhow::Error);

fn init_observability() -> anyhow::Result<()> {
    use tracing_subscriber::{fmt, EnvFilter};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    fmt().with_env_filter(filter).with_target(true).init();
    Ok(())
}

fn stop_on_ctrl_c() -> tokio::sync::watch::Receiver<bool> {
    let (tx, rx) = tokio::sync::watch::channel(false);
    tokio::spawn(async move {
        let _ = tokio::signal::ctrl_c().await;
        tracing::info!("received shutdown signal");
        let _ = tx.send(true);
    });
    rx
}

async fn connect_rpc(common: &cli::CommonArgs) -> anyhow::Result<Arc<RpcClient>> {
    let config = common.clone().into_config();
    RpcClient::connect(&config).await.map(Arc::new).map_err(|e| InitError(e.into()).into())
}

async fn run_driver(args: cli::DriverArgs) -> anyhow::Result<()> {
    let common = args.common.clone();
    let rpc = connect_rpc(&common).await?;
    let config = Arc::new(common.into_config());
    let driver_config = Arc::new(args.into_config());

    let stop_rx = stop_on_ctrl_c();
    let (tracker, _tracker_handle) = state_tracker::StateTracker::spawn_refresh(rpc.clone(), stop_rx.clone());

    let driver = Arc::new(driver::Driver::new(rpc, config, driver_config, tracker).map_err(InitError)?);
    driver.run(stop_rx).await;
    Ok(())
}

async fn run_proposer(args: cli::ProposerArgs) -> anyhow::Result<()> {
    let common = args.common.clone();
    let rpc = connect_rpc(&common).await?;
    let config = Arc::new(common.into_config());
    let tx_sender_config = args.tx_sender.clone().into_config();
    let proposer_config = Arc::new(args.into_config());

    let stop_rx = stop_on_ctrl_c();
    let proposer = Arc::new(
        proposer::Proposer::new(rpc, config, proposer_config, tx_sender_config).map_err(InitError)?,
    );
    proposer.run(stop_rx).await;
    Ok(())
}

async fn run_prover(args: cli::ProverArgs) -> anyhow::Result<()> {
    let common = args.common.clone();
    let rpc = connect_rpc(&common).await?;
    let config = Arc::new(common.into_config());
    let tx_sender_config = args.tx_sender.clone().into_config();
    let prover_config = Arc::new(args.into_config().map_err(InitError)?);

    let stop_rx = stop_on_ctrl_c();
    let (tracker, _tracker_handle) = state_tracker::StateTracker::spawn_refresh(rpc.clone(), stop_rx.clone());

    let prover = Arc::new(
        prover::Prover::new(rpc.clone(), config.clone(), prover_config.clone(), tracker, tx_sender_config)
            .map_err(InitError)?,
    );

    let private_key = hex::decode(config.private_key.trim_start_matches("0x")).map_err(|e| InitError(e.into()))?;
    let signer = PrivateKeySigner::from_slice(&private_key).map_err(|e| InitError(e.into()))?;

    let assignment_server_fut = assignment_server::run(
        rpc,
        config,
        prover_config,
        signer,
        prover.capacity(),
        stop_rx.clone(),
    );

    tokio::select! {
        _ = prover.run(stop_rx.clone()) => {}
        result = assignment_server_fut => {
            result.map_err(InitError)?;
        }
    }
    Ok(())
}
