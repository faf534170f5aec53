use crate::prelude::FeedResult;
use std::future::Future;

/// What an open connection yields between suspensions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourceEvent {
    /// A complete event payload, handed to the codec.
    Message(String),
    /// Proof of life without a payload (keep-alive comment or partial frame).
    Heartbeat,
}

/// An open push connection. Dropping it closes the connection.
pub trait EventSource {
    /// Waits for the next event. `Ok(None)` means the server ended the stream.
    fn next_event(&mut self) -> impl Future<Output = FeedResult<Option<SourceEvent>>>;
}

/// Opens connections to the push endpoint.
pub trait Connector {
    type Source: EventSource + 'static;

    fn connect(&self) -> impl Future<Output = FeedResult<Self::Source>>;
}
