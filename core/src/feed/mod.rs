//! Typed snapshot model shared by the codec, the stream client and the table.

pub mod aircraft;
pub mod snapshot;

pub use aircraft::{AircraftRecord, IcaoAddress, Squawk, MAX_ICAO};
pub use snapshot::{FeedMetrics, Snapshot};
