use anyhow::Context;
use beastiecore::codec;
use beastiecore::feed::{FeedMetrics, Snapshot};

/// Latest published picture, kept encoded so every route serves identical bytes.
#[derive(Debug, Clone)]
pub struct FeedModel {
    pub snapshot: Snapshot,
    pub payload: String,
}

impl FeedModel {
    pub fn new(snapshot: Snapshot) -> anyhow::Result<Self> {
        let payload = codec::encode(&snapshot).context("encoding snapshot for publication")?;
        Ok(Self { snapshot, payload })
    }

    pub fn metrics(&self) -> FeedMetrics {
        self.snapshot.metrics()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use beastiecore::feed::{AircraftRecord, IcaoAddress};

    #[test]
    fn payload_decodes_back_to_snapshot() {
        let mut record = AircraftRecord::new(IcaoAddress::new(0xabc123).unwrap());
        record.range = Some(12.5);
        let snapshot = Snapshot {
            now: Some(42.0),
            total: 1,
            good: 10,
            bad: 1,
            mode_a_count: 1,
            mode_s_short_count: 4,
            mode_s_long_count: 5,
            aircraft: vec![record],
        };
        let model = FeedModel::new(snapshot.clone()).unwrap();
        assert_eq!(codec::decode(&model.payload).unwrap(), snapshot);
        assert_eq!(model.metrics().good, 10);
    }
}
