use crate::feed_bridge::bridge::default_bind_address;
use crate::generator::traffic::TrafficConfig;
use anyhow::{ensure, Context};
use serde::{Deserialize, Serialize};
use std::fs;
use std::net::SocketAddr;
use std::path::Path;
use std::time::Duration;

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulatorConfig {
    pub bind: SocketAddr,
    pub interval_ms: u64,
    pub traffic: TrafficConfig,
}

impl Default for SimulatorConfig {
    fn default() -> Self {
        Self {
            bind: default_bind_address(),
            interval_ms: 1000,
            traffic: TrafficConfig::default(),
        }
    }
}

impl SimulatorConfig {
    pub fn load<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let path_ref = path.as_ref();
        let contents = fs::read_to_string(path_ref)
            .with_context(|| format!("reading simulator config {}", path_ref.display()))?;
        let config: SimulatorConfig = serde_yaml::from_str(&contents)
            .with_context(|| format!("parsing simulator config {}", path_ref.display()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_args(bind: SocketAddr, interval_ms: u64, aircraft: usize, seed: u64) -> Self {
        Self {
            bind,
            interval_ms,
            traffic: TrafficConfig {
                aircraft,
                seed,
                ..Default::default()
            },
        }
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        ensure!(self.interval_ms > 0, "interval_ms must be positive");
        Ok(())
    }

    pub fn interval(&self) -> Duration {
        Duration::from_millis(self.interval_ms)
    }
}
