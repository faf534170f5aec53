use anyhow::Context;
use clap::Parser;
use feed_bridge::bridge::{default_bind_address, FeedBridge};
use log::info;
use std::net::SocketAddr;
use std::path::PathBuf;
use workflow::config::SimulatorConfig;
use workflow::runner::Runner;

mod feed_bridge;
mod generator;
mod workflow;

#[derive(Parser)]
#[command(author, version, about = "Synthetic aircraft feed for the Beastie dashboard")]
struct Args {
    /// Load the simulator config from YAML
    #[arg(long)]
    config: Option<PathBuf>,
    #[arg(long, default_value_t = default_bind_address())]
    bind: SocketAddr,
    #[arg(long, default_value_t = 1000)]
    interval_ms: u64,
    #[arg(long, default_value_t = 12)]
    aircraft: usize,
    #[arg(long, default_value_t = 0)]
    seed: u64,
    /// Stop after this many ticks instead of running until Ctrl+C
    #[arg(long)]
    ticks: Option<u64>,
    /// Print one encoded snapshot and exit without serving
    #[arg(long, default_value_t = false)]
    offline: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    env_logger::init();
    let args = Args::parse();

    let config = if let Some(path) = args.config {
        SimulatorConfig::load(path)?
    } else {
        SimulatorConfig::from_args(args.bind, args.interval_ms, args.aircraft, args.seed)
    };
    let mut runner = Runner::new(config.clone())?;

    if args.offline {
        let snapshot = runner.step(0.0)?;
        let payload = beastiecore::codec::encode(&snapshot).context("encoding offline snapshot")?;
        println!("{payload}");
        return Ok(());
    }

    let bridge = FeedBridge::new();
    let bound = bridge.serve(config.bind)?;
    println!("Serving http://{bound}/stream?stream=aircraft (Ctrl+C to stop)");
    let ticks = runner.run(&bridge, args.ticks).await?;
    info!("simulator stopped after {ticks} ticks");
    Ok(())
}
