use anyhow::{bail, Context};
use beastiecore::stream::{PollingClient, ReconnectingClient};
use beastiecore::{
    ConnectionState, DashboardSession, IcaoAddress, LiveTableModel, StreamClient,
};
use clap::Parser;
use config::{DashboardConfig, SortConfig};
use log::{info, warn};
use std::path::PathBuf;
use tokio::runtime::Builder as TokioBuilder;
use tokio::signal;
use tokio::sync::mpsc;
use tokio::task::LocalSet;

mod config;
mod render;

#[derive(Parser)]
#[command(author, version, about = "Live aircraft table over the Beastie push stream")]
struct Args {
    /// Load the dashboard config from YAML
    #[arg(long)]
    config: Option<PathBuf>,
    /// Push stream URL, overrides the config
    #[arg(long)]
    endpoint: Option<String>,
    /// Column key to sort by (icao, call, rng, hdg, alt, xpdr, spd, rssi)
    #[arg(long)]
    sort: Option<String>,
    #[arg(long, default_value_t = false)]
    descending: bool,
    /// Aircraft to select once it appears, as hex
    #[arg(long)]
    select: Option<IcaoAddress>,
    /// Resubscribe with exponential backoff after connection errors
    #[arg(long, default_value_t = false)]
    reconnect: bool,
    /// Fetch one snapshot from the polling endpoint and exit
    #[arg(long, default_value_t = false)]
    poll: bool,
}

impl Args {
    fn resolve_config(&self) -> anyhow::Result<DashboardConfig> {
        let mut config = match &self.config {
            Some(path) => DashboardConfig::load(path)?,
            None => DashboardConfig::default(),
        };
        if let Some(endpoint) = &self.endpoint {
            config.stream.endpoint = endpoint.clone();
        }
        if let Some(column) = &self.sort {
            config.sort = Some(SortConfig {
                column: column.clone(),
                descending: self.descending,
            });
        }
        config.reconnect |= self.reconnect;
        config.validate()?;
        Ok(config)
    }
}

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let args = Args::parse();
    let config = args.resolve_config()?;

    let runtime = TokioBuilder::new_current_thread()
        .enable_all()
        .build()
        .context("creating dashboard runtime")?;
    // Stream callbacks run on this thread only.
    LocalSet::new().block_on(&runtime, async move {
        if args.poll {
            poll_once(&config, args.select).await
        } else {
            stream(&config, args.select).await
        }
    })
}

fn table_for(config: &DashboardConfig) -> anyhow::Result<LiveTableModel> {
    let mut table = LiveTableModel::new();
    if let Some(sort) = &config.sort {
        table
            .sort_by(&sort.column, sort.direction())
            .with_context(|| format!("applying sort on {}", sort.column))?;
    }
    Ok(table)
}

async fn poll_once(config: &DashboardConfig, select: Option<IcaoAddress>) -> anyhow::Result<()> {
    let client = PollingClient::new(config.stream.clone()).context("building polling client")?;
    let snapshot = client
        .fetch()
        .await
        .with_context(|| format!("polling {}", config.stream.poll_endpoint))?;
    let mut table = table_for(config)?;
    table.on_snapshot(snapshot);
    if let Some(icao) = select {
        if let Err(err) = table.select_row(icao) {
            warn!("{err}");
        }
    }
    print!("{}", render::frame(&table, &ConnectionState::Idle));
    Ok(())
}

async fn stream(config: &DashboardConfig, select: Option<IcaoAddress>) -> anyhow::Result<()> {
    let client = StreamClient::new(config.stream.clone()).context("building stream client")?;
    let mut session = DashboardSession::new(table_for(config)?);

    let (updates_tx, mut updates) = mpsc::unbounded_channel();
    session.on_update(move |_, state| {
        let _ = updates_tx.send(state.clone());
    });

    if config.reconnect {
        let client = ReconnectingClient::new(client, config.backoff.clone());
        session.start_reconnecting(&client)?;
    } else {
        session.start(&client)?;
    }
    info!("subscribed to {}", config.stream.endpoint);

    let mut pending_select = select;
    let shutdown = signal::ctrl_c();
    tokio::pin!(shutdown);
    loop {
        tokio::select! {
            update = updates.recv() => {
                let Some(state) = update else { break };
                if let Some(icao) = pending_select {
                    if session.select_row(icao).is_ok() {
                        info!("selected {icao}");
                        pending_select = None;
                    }
                }
                print!("{}", render::frame(&session.table(), &state));
                if let ConnectionState::Errored(err) = state {
                    bail!("stream stopped: {err}");
                }
            }
            result = &mut shutdown => {
                result.context("awaiting Ctrl+C")?;
                break;
            }
        }
    }
    session.stop();
    Ok(())
}
