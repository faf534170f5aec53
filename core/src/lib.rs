//! Live aircraft dashboard core.
//!
//! Pushed snapshots are decoded by [`codec`], delivered in order by
//! [`stream::StreamClient`] and reconciled into [`table::LiveTableModel`],
//! which keeps selection and ordering across updates. [`session`] ties the two
//! together and tracks the connection lifecycle.

pub mod codec;
pub mod feed;
pub mod math;
pub mod prelude;
pub mod session;
pub mod stream;
pub mod table;
pub mod telemetry;

pub use feed::{AircraftRecord, FeedMetrics, IcaoAddress, Snapshot, Squawk};
pub use prelude::{ConnectionError, FeedError, SessionError, TableError};
pub use session::{ConnectionState, DashboardSession};
pub use stream::{StreamClient, StreamConfig, Subscription};
pub use table::{LiveTableModel, SortDirection};
