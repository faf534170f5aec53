//! StreamClient: the long-lived push connection and its delivery semantics.

pub mod client;
pub mod config;
pub mod http;
pub mod reconnect;
pub mod source;
pub mod sse;

#[cfg(test)]
pub(crate) mod testing;

pub use client::{StreamClient, Subscription};
pub use config::{BackoffConfig, StreamConfig};
pub use http::{HttpConnector, HttpEventSource, PollingClient};
pub use reconnect::{ReconnectingClient, ReconnectingSubscription};
pub use source::{Connector, EventSource, SourceEvent};
pub use sse::EventStreamParser;
