#![recursion_limit = "256"]

use alloy::primitives::Address;
use anyhow::Result;
use clap::{Parser, Subcommand};
use node_watchtower::jobs::{Confirmation, DissolveTimedOutMinipoolsJob, ProcessWithdrawalsJob};
use node_watchtower::node::{require_node_registered, wait_node_registered};
use node_watchtower::units::{parse_amount, Unit};
use node_watchtower::{api, ChainConfig, Provider, Scheduler};
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "node-watchtower", about = "Staking pool node watchtower and operator commands")]
struct Cli {
    /// Path to the network config file
    #[arg(long, global = true, default_value = "configs/mainnet.toml", env = "WATCHTOWER_CONFIG")]
    config: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run the watchtower tasks until interrupted
    Daemon,
    /// Print the status of every minipool owned by the node
    MinipoolStatus,
    /// Check whether the node account can send an amount
    NodeCanSend {
        #[arg(long)]
        amount: String,
        #[arg(long, value_parser = parse_unit)]
        unit: Unit,
        /// Interpret the amount as an integer number of wei
        #[arg(long)]
        wei: bool,
    },
    /// Send an amount from the node account
    NodeSend {
        #[arg(long)]
        to: Address,
        #[arg(long)]
        amount: String,
        #[arg(long, value_parser = parse_unit)]
        unit: Unit,
        #[arg(long)]
        wei: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = ChainConfig::load(&cli.config)?;

    match cli.command {
        Command::Daemon => run_daemon(config).await,
        Command::MinipoolStatus => {
            let provider = Provider::connect(&config).await?;
            print_json(&api::get_status(&provider).await?)
        }
        Command::NodeCanSend { amount, unit, wei } => {
            let amount = parse_amount(&amount, wei)?;
            let provider = Provider::connect(&config).await?;
            print_json(&api::can_send_from_node(&provider, amount, unit).await?)
        }
        Command::NodeSend {
            to,
            amount,
            unit,
            wei,
        } => {
            let amount = parse_amount(&amount, wei)?;
            let provider = Provider::connect(&config).await?;
            print_json(&api::send_from_node(&provider, to, amount, unit).await?)
        }
    }
}

async fn run_daemon(config: ChainConfig) -> Result<()> {
    info!(chain_id = config.chain.chain_id, "starting node watchtower");

    let provider = Arc::new(Provider::connect(&config).await?);
    let cancel = CancellationToken::new();

    let node = if config.watchtower.wait_for_registration {
        let poll = Duration::from_secs(config.watchtower.registration_poll_seconds);
        let wait = wait_node_registered(&provider, poll, &cancel);
        tokio::select! {
            result = wait => match result? {
                Some(node) => node,
                None => return Ok(()),
            },
            _ = tokio::signal::ctrl_c() => {
                info!("interrupted while waiting for node registration");
                return Ok(());
            }
        }
    } else {
        require_node_registered(&provider).await?
    };
    info!(%node, "node registration confirmed");

    let confirmation = Confirmation::from_settings(&config.monitoring);
    let watchtower = &config.watchtower;

    let mut scheduler = Scheduler::with_cancellation(provider, cancel);
    scheduler
        .register(
            ProcessWithdrawalsJob::new(confirmation),
            Duration::from_secs(watchtower.process_withdrawals_interval_seconds),
        )
        .register(
            DissolveTimedOutMinipoolsJob::new(confirmation),
            Duration::from_secs(watchtower.dissolve_timed_out_interval_seconds),
        );

    let handle = scheduler.spawn();

    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("could not listen for shutdown signal: {}", e);
    }
    info!("shutdown signal received");

    for snapshot in handle.stats() {
        info!(
            task = snapshot.name,
            started = snapshot.cycles_started,
            failed = snapshot.cycles_failed,
            skipped = snapshot.cycles_skipped,
            "task summary"
        );
    }
    handle.shutdown().await;
    info!("node watchtower stopped");
    Ok(())
}

fn parse_unit(value: &str) -> Result<Unit, String> {
    value.parse::<Unit>().map_err(|e| e.to_string())
}

fn print_json<T: Serialize>(response: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(response)?);
    Ok(())
}
