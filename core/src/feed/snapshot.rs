use crate::feed::aircraft::{AircraftRecord, IcaoAddress};
use serde::Serialize;

/// Decode-session counters carried by every snapshot.
///
/// Serializes with the same keys the push stream uses.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct FeedMetrics {
    /// Producer timestamp, unit defined by the producer.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub now: Option<f64>,
    pub total: u64,
    pub good: u64,
    pub bad: u64,
    #[serde(rename = "modea")]
    pub mode_a_count: u64,
    #[serde(rename = "modesshort")]
    pub mode_s_short_count: u64,
    #[serde(rename = "modeslong")]
    pub mode_s_long_count: u64,
}

/// One full-state update pushed by the producer.
#[derive(Debug, Clone, PartialEq)]
pub struct Snapshot {
    pub now: Option<f64>,
    pub total: u64,
    pub good: u64,
    pub bad: u64,
    pub mode_a_count: u64,
    pub mode_s_short_count: u64,
    pub mode_s_long_count: u64,
    /// In producer order.
    pub aircraft: Vec<AircraftRecord>,
}

impl Snapshot {
    pub fn metrics(&self) -> FeedMetrics {
        FeedMetrics {
            now: self.now,
            total: self.total,
            good: self.good,
            bad: self.bad,
            mode_a_count: self.mode_a_count,
            mode_s_short_count: self.mode_s_short_count,
            mode_s_long_count: self.mode_s_long_count,
        }
    }

    pub fn contains(&self, icao: IcaoAddress) -> bool {
        self.aircraft.iter().any(|record| record.icao == icao)
    }

    pub fn find(&self, icao: IcaoAddress) -> Option<&AircraftRecord> {
        self.aircraft.iter().find(|record| record.icao == icao)
    }
}
