use crate::feed::IcaoAddress;
use std::time::Duration;

/// Connection-level failure of a push subscription.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum ConnectionError {
    #[error("connection not established within {0:?}")]
    ConnectTimeout(Duration),
    #[error("no heartbeat within {0:?}")]
    HeartbeatTimeout(Duration),
    #[error("stream closed by server")]
    Closed,
    #[error("unexpected HTTP status {0}")]
    Status(u16),
    #[error("transport failure: {0}")]
    Transport(String),
}

/// Errors surfaced by the decode and streaming path.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum FeedError {
    #[error("malformed payload: {0}")]
    MalformedPayload(String),
    #[error(transparent)]
    Connection(#[from] ConnectionError),
}

impl FeedError {
    pub fn malformed(message: impl Into<String>) -> Self {
        FeedError::MalformedPayload(message.into())
    }
}

/// Non-fatal errors raised by user interaction with the live table.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum TableError {
    #[error("aircraft {0} is not in the current snapshot")]
    SelectionNotFound(IcaoAddress),
    #[error("unknown column: {0}")]
    UnknownColumn(String),
}

pub type FeedResult<T> = Result<T, FeedError>;
pub type TableResult<T> = Result<T, TableError>;

/// Invalid lifecycle request on a dashboard session.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum SessionError {
    #[error("session can only start from idle, current state is {0}")]
    NotIdle(&'static str),
}
