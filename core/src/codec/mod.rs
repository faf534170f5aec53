//! SnapshotCodec: raw event payload to typed [`Snapshot`].

mod fields;

use crate::feed::{AircraftRecord, IcaoAddress, Snapshot, Squawk};
use crate::prelude::{FeedError, FeedResult};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::HashSet;

type KeyAliases = (&'static str, &'static [&'static str]);

const SNAPSHOT_KEYS: &[KeyAliases] = &[
    ("modea", &["modeACount"]),
    ("modesshort", &["modeSShortCount"]),
    ("modeslong", &["modeSLongCount"]),
];

const AIRCRAFT_KEYS: &[KeyAliases] = &[
    ("icao", &["IcaoAddr"]),
    ("call", &["callsign", "Callsign"]),
    ("xpdr", &["squawk", "Squawk"]),
    ("alt", &["altitude", "Altitude"]),
    ("spd", &["groundSpeed", "Speed"]),
    ("hdg", &["heading", "Heading"]),
    ("rng", &["range", "Distance"]),
    ("rssi", &["signalStrength"]),
    ("lat", &["Latitude"]),
    ("lon", &["Longitude"]),
    ("vrate", &["VertRate"]),
    ("mlat", &["isMlat"]),
];

/// Keeps one spelling per field: the wire key if present, else the first alias
/// in listed order. The rest are dropped like any other unknown key.
fn keep_preferred_keys(object: &mut Map<String, Value>, keys: &[KeyAliases]) {
    for (primary, aliases) in keys {
        let mut kept = object.contains_key(*primary);
        for alias in aliases.iter() {
            if kept {
                object.remove(*alias);
            } else {
                kept = object.contains_key(*alias);
            }
        }
    }
}

#[derive(Debug, Deserialize)]
struct WireSnapshot {
    #[serde(default, deserialize_with = "fields::optional_float")]
    now: Option<f64>,
    #[serde(default, deserialize_with = "fields::optional_counter")]
    total: Option<u64>,
    #[serde(deserialize_with = "fields::counter")]
    good: u64,
    #[serde(deserialize_with = "fields::counter")]
    bad: u64,
    #[serde(default, alias = "modeACount", deserialize_with = "fields::counter")]
    modea: u64,
    #[serde(default, alias = "modeSShortCount", deserialize_with = "fields::counter")]
    modesshort: u64,
    #[serde(default, alias = "modeSLongCount", deserialize_with = "fields::counter")]
    modeslong: u64,
    #[serde(default)]
    aircraft: Vec<WireAircraft>,
}

#[derive(Debug, Deserialize)]
struct WireAircraft {
    #[serde(alias = "IcaoAddr", deserialize_with = "fields::icao")]
    icao: IcaoAddress,
    #[serde(
        default,
        alias = "callsign",
        alias = "Callsign",
        deserialize_with = "fields::optional_text"
    )]
    call: Option<String>,
    #[serde(
        default,
        alias = "squawk",
        alias = "Squawk",
        deserialize_with = "fields::optional_squawk"
    )]
    xpdr: Option<Squawk>,
    #[serde(
        default,
        alias = "altitude",
        alias = "Altitude",
        deserialize_with = "fields::optional_int"
    )]
    alt: Option<i32>,
    #[serde(
        default,
        alias = "groundSpeed",
        alias = "Speed",
        deserialize_with = "fields::optional_int"
    )]
    spd: Option<i32>,
    #[serde(
        default,
        alias = "heading",
        alias = "Heading",
        deserialize_with = "fields::optional_int"
    )]
    hdg: Option<i32>,
    #[serde(
        default,
        alias = "range",
        alias = "Distance",
        deserialize_with = "fields::optional_float"
    )]
    rng: Option<f64>,
    #[serde(
        default,
        alias = "signalStrength",
        deserialize_with = "fields::optional_float"
    )]
    rssi: Option<f64>,
    #[serde(default, alias = "Latitude", deserialize_with = "fields::optional_float")]
    lat: Option<f64>,
    #[serde(default, alias = "Longitude", deserialize_with = "fields::optional_float")]
    lon: Option<f64>,
    #[serde(default, alias = "VertRate", deserialize_with = "fields::optional_int")]
    vrate: Option<i32>,
    #[serde(default, alias = "isMlat", deserialize_with = "fields::flag")]
    mlat: bool,
}

impl From<WireAircraft> for AircraftRecord {
    fn from(wire: WireAircraft) -> Self {
        AircraftRecord {
            icao: wire.icao,
            callsign: wire.call,
            squawk: wire.xpdr,
            altitude: wire.alt,
            ground_speed: wire.spd,
            heading: wire.hdg,
            range: wire.rng,
            signal_strength: wire.rssi,
            latitude: wire.lat,
            longitude: wire.lon,
            vertical_rate: wire.vrate,
            mlat: wire.mlat,
        }
    }
}

/// Decodes one pushed payload.
///
/// Unknown keys are ignored. Missing optional aircraft fields decode as absent.
/// A payload that is not a JSON object, lacks the `good`/`bad` counters, carries
/// an unparseable value or repeats an `icao` fails with
/// [`FeedError::MalformedPayload`].
pub fn decode(raw: &str) -> FeedResult<Snapshot> {
    let mut value: Value =
        serde_json::from_str(raw).map_err(|err| FeedError::malformed(err.to_string()))?;
    let Some(object) = value.as_object_mut() else {
        return Err(FeedError::malformed("payload is not a JSON object"));
    };
    keep_preferred_keys(object, SNAPSHOT_KEYS);
    if let Some(Value::Array(entries)) = object.get_mut("aircraft") {
        for entry in entries.iter_mut().filter_map(Value::as_object_mut) {
            keep_preferred_keys(entry, AIRCRAFT_KEYS);
        }
    }
    let wire =
        WireSnapshot::deserialize(value).map_err(|err| FeedError::malformed(err.to_string()))?;

    let mut seen = HashSet::with_capacity(wire.aircraft.len());
    for record in &wire.aircraft {
        if !seen.insert(record.icao) {
            return Err(FeedError::malformed(format!(
                "duplicate icao {} in snapshot",
                record.icao
            )));
        }
    }

    let aircraft: Vec<AircraftRecord> = wire.aircraft.into_iter().map(Into::into).collect();
    Ok(Snapshot {
        now: wire.now,
        total: wire.total.unwrap_or(aircraft.len() as u64),
        good: wire.good,
        bad: wire.bad,
        mode_a_count: wire.modea,
        mode_s_short_count: wire.modesshort,
        mode_s_long_count: wire.modeslong,
        aircraft,
    })
}

#[derive(Serialize)]
struct WireSnapshotRef<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    now: Option<f64>,
    total: u64,
    good: u64,
    bad: u64,
    modea: u64,
    modesshort: u64,
    modeslong: u64,
    aircraft: Vec<WireAircraftRef<'a>>,
}

#[derive(Serialize)]
struct WireAircraftRef<'a> {
    icao: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    call: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    xpdr: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    alt: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    spd: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    hdg: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    rng: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    rssi: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    lat: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    lon: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    vrate: Option<i32>,
    mlat: bool,
}

impl<'a> From<&'a AircraftRecord> for WireAircraftRef<'a> {
    fn from(record: &'a AircraftRecord) -> Self {
        WireAircraftRef {
            icao: record.icao.to_string(),
            call: record.callsign.as_deref(),
            xpdr: record.squawk.map(Squawk::code),
            alt: record.altitude,
            spd: record.ground_speed,
            hdg: record.heading,
            rng: record.range,
            rssi: record.signal_strength,
            lat: record.latitude,
            lon: record.longitude,
            vrate: record.vertical_rate,
            mlat: record.mlat,
        }
    }
}

/// Encodes a snapshot with the primary wire keys. Absent fields are omitted.
pub fn encode(snapshot: &Snapshot) -> FeedResult<String> {
    let wire = WireSnapshotRef {
        now: snapshot.now,
        total: snapshot.total,
        good: snapshot.good,
        bad: snapshot.bad,
        modea: snapshot.mode_a_count,
        modesshort: snapshot.mode_s_short_count,
        modeslong: snapshot.mode_s_long_count,
        aircraft: snapshot.aircraft.iter().map(Into::into).collect(),
    };
    serde_json::to_string(&wire).map_err(|err| FeedError::malformed(err.to_string()))
}
