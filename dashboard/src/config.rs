use anyhow::{bail, Context};
use beastiecore::stream::{BackoffConfig, StreamConfig};
use beastiecore::table::default_columns;
use beastiecore::SortDirection;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DashboardConfig {
    pub stream: StreamConfig,
    pub backoff: BackoffConfig,
    /// Resubscribe with backoff instead of stopping on the first connection error.
    pub reconnect: bool,
    pub sort: Option<SortConfig>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SortConfig {
    pub column: String,
    pub descending: bool,
}

impl SortConfig {
    pub fn direction(&self) -> SortDirection {
        if self.descending {
            SortDirection::Descending
        } else {
            SortDirection::Ascending
        }
    }
}

impl DashboardConfig {
    pub fn load<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let path_ref = path.as_ref();
        let contents = fs::read_to_string(path_ref)
            .with_context(|| format!("reading dashboard config {}", path_ref.display()))?;
        let config: DashboardConfig = serde_yaml::from_str(&contents)
            .with_context(|| format!("parsing dashboard config {}", path_ref.display()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        if self.stream.endpoint.trim().is_empty() {
            bail!("stream.endpoint must not be empty");
        }
        if let Some(sort) = &self.sort {
            if !default_columns().iter().any(|column| column.key == sort.column) {
                bail!("unknown sort column {:?}", sort.column);
            }
        }
        if self.backoff.initial_ms == 0 || self.backoff.max_ms < self.backoff.initial_ms {
            bail!(
                "backoff needs 0 < initial_ms <= max_ms, got {} and {}",
                self.backoff.initial_ms,
                self.backoff.max_ms
            );
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn load(yaml: &str) -> anyhow::Result<DashboardConfig> {
        let mut temp = NamedTempFile::new().unwrap();
        temp.write_all(yaml.as_bytes()).unwrap();
        let path = temp.into_temp_path();
        DashboardConfig::load(&path)
    }

    #[test]
    fn defaults_match_stream_client_defaults() {
        let cfg = DashboardConfig::default();
        assert_eq!(cfg.stream, StreamConfig::default());
        assert!(!cfg.reconnect);
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn config_load_reads_yaml() {
        let cfg = load(
            "stream:\n  endpoint: http://feed.local/stream?stream=aircraft\n  heartbeat_timeout_ms: 2500\n\
             reconnect: true\nsort:\n  column: rng\n  descending: true\n",
        )
        .unwrap();
        assert_eq!(cfg.stream.endpoint, "http://feed.local/stream?stream=aircraft");
        assert_eq!(cfg.stream.heartbeat_timeout_ms, 2500);
        assert_eq!(cfg.stream.connection_timeout_ms, 10_000);
        assert!(cfg.reconnect);
        let sort = cfg.sort.unwrap();
        assert_eq!(sort.column, "rng");
        assert_eq!(sort.direction(), SortDirection::Descending);
    }

    #[test]
    fn config_load_rejects_unknown_sort_column() {
        let err = load("sort:\n  column: eta\n").unwrap_err();
        assert!(err.to_string().contains("eta"));
    }

    #[test]
    fn config_load_rejects_inverted_backoff() {
        assert!(load("backoff:\n  initial_ms: 5000\n  max_ms: 100\n").is_err());
    }
}
