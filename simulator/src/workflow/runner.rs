use crate::feed_bridge::bridge::FeedBridge;
use crate::generator::traffic::TrafficGenerator;
use crate::workflow::config::SimulatorConfig;
use anyhow::Context;
use beastiecore::feed::Snapshot;
use log::{debug, info};
use std::time::{SystemTime, UNIX_EPOCH};
use tokio::signal;
use tokio::time::{self, MissedTickBehavior};

pub struct TickSummary {
    pub tick: u64,
    pub aircraft: usize,
    pub subscribers: usize,
}

/// Drives the generator on a fixed interval and publishes each tick.
pub struct Runner {
    config: SimulatorConfig,
    generator: TrafficGenerator,
    ticks: u64,
}

impl Runner {
    pub fn new(config: SimulatorConfig) -> anyhow::Result<Self> {
        config.validate()?;
        let generator = TrafficGenerator::new(config.traffic.clone())
            .context("building traffic generator")?;
        Ok(Self {
            config,
            generator,
            ticks: 0,
        })
    }

    #[cfg(test)]
    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    /// Advances the traffic picture by one interval.
    pub fn step(&mut self, now: f64) -> anyhow::Result<Snapshot> {
        let snapshot = self
            .generator
            .advance(self.config.interval(), now)
            .with_context(|| format!("advancing traffic at tick {}", self.ticks + 1))?;
        self.ticks += 1;
        Ok(snapshot)
    }

    pub fn execute(&mut self, bridge: &FeedBridge) -> anyhow::Result<TickSummary> {
        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .context("reading wall clock")?
            .as_secs_f64();
        let snapshot = self.step(now.floor())?;
        let aircraft = snapshot.aircraft.len();
        let subscribers = bridge.publish(snapshot).context("publishing snapshot")?;
        Ok(TickSummary {
            tick: self.ticks,
            aircraft,
            subscribers,
        })
    }

    /// Publishes until `limit` ticks have run or Ctrl+C arrives. Returns the tick count.
    pub async fn run(&mut self, bridge: &FeedBridge, limit: Option<u64>) -> anyhow::Result<u64> {
        let mut interval = time::interval(self.config.interval());
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let shutdown = signal::ctrl_c();
        tokio::pin!(shutdown);

        while limit.map_or(true, |limit| self.ticks < limit) {
            tokio::select! {
                _ = interval.tick() => {
                    let summary = self.execute(bridge)?;
                    debug!(
                        "tick {} -> {} aircraft, {} subscribers",
                        summary.tick, summary.aircraft, summary.subscribers
                    );
                }
                result = &mut shutdown => {
                    result.context("awaiting Ctrl+C")?;
                    info!("interrupted after {} ticks", self.ticks);
                    break;
                }
            }
        }
        Ok(self.ticks)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::feed_bridge::bridge::default_bind_address;

    fn config() -> SimulatorConfig {
        SimulatorConfig::from_args(default_bind_address(), 1, 6, 3)
    }

    #[test]
    fn step_counts_ticks_and_stamps_time() {
        let mut runner = Runner::new(config()).unwrap();
        let snapshot = runner.step(1_530_000_000.0).unwrap();
        assert_eq!(runner.ticks(), 1);
        assert_eq!(snapshot.now, Some(1_530_000_000.0));
        assert_eq!(snapshot.aircraft.len(), 6);
    }

    #[tokio::test]
    async fn run_stops_after_tick_limit() {
        let bridge = FeedBridge::new();
        let mut runner = Runner::new(config()).unwrap();
        let ticks = runner.run(&bridge, Some(3)).await.unwrap();
        assert_eq!(ticks, 3);
        let published = bridge.snapshot().unwrap();
        assert_eq!(published.aircraft.len(), 6);
        assert!(published.now.is_some());
    }

    #[test]
    fn runner_rejects_invalid_traffic() {
        let mut cfg = config();
        cfg.traffic.max_range_nm = 0.0;
        assert!(Runner::new(cfg).is_err());
    }
}
