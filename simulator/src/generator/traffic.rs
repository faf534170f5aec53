use anyhow::{ensure, Context};
use beastiecore::feed::{AircraftRecord, IcaoAddress, Snapshot, Squawk, MAX_ICAO};
use beastiecore::math::GeoHelper;
use rand::{rngs::StdRng, Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use std::time::Duration;

const CALLSIGN_PREFIXES: [&str; 8] = ["UAL", "DAL", "SWA", "ASA", "AAL", "SKW", "JBU", "FDX"];

/// Configuration for the synthetic traffic picture.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TrafficConfig {
    pub aircraft: usize,
    pub seed: u64,
    pub receiver_lat: f64,
    pub receiver_lon: f64,
    /// Aircraft leaving this radius are replaced by fresh traffic.
    pub max_range_nm: f64,
    /// Share of aircraft that never report a position.
    pub positionless_ratio: f64,
    /// Share of aircraft with no callsign and an unset squawk.
    pub anonymous_ratio: f64,
}

impl Default for TrafficConfig {
    fn default() -> Self {
        Self {
            aircraft: 12,
            seed: 0,
            receiver_lat: 37.6189,
            receiver_lon: -122.375,
            max_range_nm: 150.0,
            positionless_ratio: 0.15,
            anonymous_ratio: 0.1,
        }
    }
}

#[derive(Debug, Clone)]
struct Track {
    icao: IcaoAddress,
    callsign: Option<String>,
    squawk: Squawk,
    position: Option<(f64, f64)>,
    altitude: i32,
    ground_speed: i32,
    heading: f64,
    vertical_rate: i32,
    signal: f64,
    mlat: bool,
}

/// Seeded generator that moves a fixed-size fleet around a receiver.
pub struct TrafficGenerator {
    config: TrafficConfig,
    rng: StdRng,
    tracks: Vec<Track>,
    good: u64,
    bad: u64,
    mode_a: u64,
    mode_s_short: u64,
    mode_s_long: u64,
}

impl TrafficGenerator {
    pub fn new(config: TrafficConfig) -> anyhow::Result<Self> {
        ensure!(
            config.aircraft <= MAX_ICAO as usize,
            "aircraft count {} exceeds the ICAO address space",
            config.aircraft
        );
        ensure!(
            config.max_range_nm > 0.0,
            "max_range_nm must be positive, got {}",
            config.max_range_nm
        );
        for (name, ratio) in [
            ("positionless_ratio", config.positionless_ratio),
            ("anonymous_ratio", config.anonymous_ratio),
        ] {
            ensure!(
                (0.0..=1.0).contains(&ratio),
                "{name} must lie in [0, 1], got {ratio}"
            );
        }

        let mut generator = Self {
            rng: StdRng::seed_from_u64(config.seed),
            tracks: Vec::with_capacity(config.aircraft),
            config,
            good: 0,
            bad: 0,
            mode_a: 0,
            mode_s_short: 0,
            mode_s_long: 0,
        };
        for _ in 0..generator.config.aircraft {
            let track = generator.spawn_track()?;
            generator.tracks.push(track);
        }
        Ok(generator)
    }

    /// Moves every track forward by `elapsed` and returns the resulting picture.
    pub fn advance(&mut self, elapsed: Duration, now: f64) -> anyhow::Result<Snapshot> {
        let hours = elapsed.as_secs_f64() / 3600.0;
        let minutes = elapsed.as_secs_f64() / 60.0;
        let max_range = self.config.max_range_nm;
        let receiver = (self.config.receiver_lat, self.config.receiver_lon);

        let mut departed = Vec::new();
        for (index, track) in self.tracks.iter_mut().enumerate() {
            track.heading = (track.heading + self.rng.gen_range(-2.0..2.0)).rem_euclid(360.0);
            track.altitude =
                (track.altitude + (track.vertical_rate as f64 * minutes).round() as i32).max(0);
            track.signal = (track.signal + self.rng.gen_range(-0.5..0.5)).clamp(-40.0, -3.0);
            if let Some((lat, lon)) = track.position {
                let moved = GeoHelper::project(
                    lat,
                    lon,
                    track.heading,
                    track.ground_speed as f64 * hours,
                );
                track.position = Some(moved);
                if GeoHelper::distance_nm(receiver.0, receiver.1, moved.0, moved.1) > max_range {
                    departed.push(index);
                }
            }
        }
        for index in departed {
            self.tracks[index] = self.spawn_track()?;
        }

        let frames = self.rng.gen_range(40..160) * self.tracks.len().max(1) as u64;
        let damaged = self.rng.gen_range(0..=frames / 20);
        self.good += frames;
        self.bad += damaged;
        self.mode_a += frames / 10;
        self.mode_s_short += frames * 4 / 10;
        self.mode_s_long += frames - frames / 10 - frames * 4 / 10;

        Ok(Snapshot {
            now: Some(now),
            total: self.tracks.len() as u64,
            good: self.good,
            bad: self.bad,
            mode_a_count: self.mode_a,
            mode_s_short_count: self.mode_s_short,
            mode_s_long_count: self.mode_s_long,
            aircraft: self.tracks.iter().map(|track| self.record(track)).collect(),
        })
    }

    fn record(&self, track: &Track) -> AircraftRecord {
        let range = track.position.map(|(lat, lon)| {
            let nm = GeoHelper::distance_nm(
                self.config.receiver_lat,
                self.config.receiver_lon,
                lat,
                lon,
            );
            (nm * 10.0).round() / 10.0
        });
        AircraftRecord {
            callsign: track.callsign.clone(),
            squawk: Some(track.squawk),
            altitude: Some(track.altitude),
            ground_speed: Some(track.ground_speed),
            heading: Some(track.heading.round() as i32 % 360),
            range,
            signal_strength: Some((track.signal * 10.0).round() / 10.0),
            latitude: track.position.map(|(lat, _)| lat),
            longitude: track.position.map(|(_, lon)| lon),
            vertical_rate: Some(track.vertical_rate),
            mlat: track.mlat,
            ..AircraftRecord::new(track.icao)
        }
    }

    fn spawn_track(&mut self) -> anyhow::Result<Track> {
        let icao = loop {
            let candidate = self.rng.gen_range(1..=MAX_ICAO);
            if !self.tracks.iter().any(|track| track.icao.value() == candidate) {
                break IcaoAddress::new(candidate)
                    .with_context(|| format!("generated address {candidate:#x} out of range"))?;
            }
        };

        let anonymous = self.rng.gen_bool(self.config.anonymous_ratio);
        let (callsign, squawk) = if anonymous {
            (None, Squawk::UNSET)
        } else {
            let prefix = CALLSIGN_PREFIXES[self.rng.gen_range(0..CALLSIGN_PREFIXES.len())];
            let digits: u32 = self.rng.gen_range(1..=9999);
            (
                Some(format!("{prefix}{digits}")),
                Squawk::new(octal_squawk(&mut self.rng)),
            )
        };

        let position = if self.rng.gen_bool(self.config.positionless_ratio) {
            None
        } else {
            let bearing = self.rng.gen_range(0.0..360.0);
            let distance = self.rng.gen_range(0.0..self.config.max_range_nm * 0.9);
            Some(GeoHelper::project(
                self.config.receiver_lat,
                self.config.receiver_lon,
                bearing,
                distance,
            ))
        };

        Ok(Track {
            icao,
            callsign,
            squawk,
            mlat: position.is_some() && self.rng.gen_bool(0.1),
            position,
            altitude: self.rng.gen_range(10..=400) * 100,
            ground_speed: self.rng.gen_range(120..=520),
            heading: self.rng.gen_range(0.0..360.0),
            vertical_rate: self.rng.gen_range(-20..=20) * 64,
            signal: self.rng.gen_range(-35.0..-5.0),
        })
    }
}

/// Four octal digits in their decimal rendering, never the unset sentinel.
fn octal_squawk(rng: &mut StdRng) -> u32 {
    loop {
        let code = (0..4).fold(0, |acc, _| acc * 10 + rng.gen_range(0..8));
        if code != 0 {
            return code;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(aircraft: usize) -> TrafficConfig {
        TrafficConfig {
            aircraft,
            seed: 7,
            ..Default::default()
        }
    }

    #[test]
    fn generator_builds_requested_fleet_with_unique_addresses() {
        let mut generator = TrafficGenerator::new(config(40)).unwrap();
        let snapshot = generator.advance(Duration::from_secs(1), 1.0).unwrap();
        assert_eq!(snapshot.aircraft.len(), 40);
        assert_eq!(snapshot.total, 40);
        let mut addresses: Vec<_> = snapshot.aircraft.iter().map(|a| a.icao).collect();
        addresses.sort();
        addresses.dedup();
        assert_eq!(addresses.len(), 40);
    }

    #[test]
    fn same_seed_produces_same_traffic() {
        let mut a = TrafficGenerator::new(config(10)).unwrap();
        let mut b = TrafficGenerator::new(config(10)).unwrap();
        for tick in 0..5 {
            let now = tick as f64;
            assert_eq!(
                a.advance(Duration::from_secs(1), now).unwrap(),
                b.advance(Duration::from_secs(1), now).unwrap()
            );
        }
    }

    #[test]
    fn range_tracks_position_and_stays_inside_radius() {
        let mut generator = TrafficGenerator::new(config(60)).unwrap();
        for tick in 0..30 {
            let snapshot = generator.advance(Duration::from_secs(60), tick as f64).unwrap();
            for record in &snapshot.aircraft {
                assert_eq!(record.range.is_some(), record.has_position());
                if let Some(range) = record.range {
                    assert!(range <= 150.0 + 0.05, "range {range} outside radius");
                }
            }
        }
    }

    #[test]
    fn fleet_mixes_absent_and_present_optionals() {
        let config = TrafficConfig {
            aircraft: 50,
            positionless_ratio: 0.5,
            anonymous_ratio: 0.5,
            ..config(0)
        };
        let mut generator = TrafficGenerator::new(config).unwrap();
        let snapshot = generator.advance(Duration::from_secs(1), 0.0).unwrap();
        assert!(snapshot.aircraft.iter().any(|a| a.range.is_none()));
        assert!(snapshot.aircraft.iter().any(|a| a.range.is_some()));
        assert!(snapshot
            .aircraft
            .iter()
            .any(|a| a.callsign.is_none() && a.squawk == Some(Squawk::UNSET)));
    }

    #[test]
    fn counters_only_grow() {
        let mut generator = TrafficGenerator::new(config(5)).unwrap();
        let first = generator.advance(Duration::from_secs(1), 0.0).unwrap();
        let second = generator.advance(Duration::from_secs(1), 1.0).unwrap();
        assert!(second.good > first.good);
        assert!(second.bad >= first.bad);
        assert_eq!(
            second.good,
            second.mode_a_count + second.mode_s_short_count + second.mode_s_long_count
        );
    }

    #[test]
    fn rejects_invalid_ratios() {
        let config = TrafficConfig {
            positionless_ratio: 1.5,
            ..Default::default()
        };
        assert!(TrafficGenerator::new(config).is_err());
    }
}
