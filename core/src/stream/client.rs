use crate::codec;
use crate::feed::Snapshot;
use crate::prelude::{ConnectionError, FeedError, FeedResult};
use crate::stream::config::StreamConfig;
use crate::stream::http::HttpConnector;
use crate::stream::source::{Connector, EventSource, SourceEvent};
use crate::telemetry::{LogManager, StreamStats};
use log::trace;
use std::cell::Cell;
use std::rc::Rc;
use tokio::task::JoinHandle;
use tokio::time::timeout;

/// Client for the push endpoint.
///
/// Every [`subscribe`](StreamClient::subscribe) opens its own connection and
/// delivers decoded snapshots in arrival order. Failures end the subscription;
/// the client never retries on its own.
///
/// Callbacks run on the caller's event loop, so `subscribe` must be called
/// from inside a [`tokio::task::LocalSet`].
pub struct StreamClient<C = HttpConnector> {
    connector: Rc<C>,
    config: StreamConfig,
    stats: StreamStats,
    logger: LogManager,
}

impl<C> Clone for StreamClient<C> {
    fn clone(&self) -> Self {
        Self {
            connector: self.connector.clone(),
            config: self.config.clone(),
            stats: self.stats.clone(),
            logger: self.logger.clone(),
        }
    }
}

impl StreamClient<HttpConnector> {
    pub fn new(config: StreamConfig) -> FeedResult<Self> {
        let connector = HttpConnector::new(config.endpoint.clone())?;
        Ok(Self::with_connector(connector, config))
    }
}

impl<C: Connector + 'static> StreamClient<C> {
    pub fn with_connector(connector: C, config: StreamConfig) -> Self {
        Self {
            connector: Rc::new(connector),
            config,
            stats: StreamStats::new(),
            logger: LogManager::new("stream"),
        }
    }

    pub fn config(&self) -> &StreamConfig {
        &self.config
    }

    pub fn stats(&self) -> &StreamStats {
        &self.stats
    }

    /// Opens a connection and registers the callbacks.
    ///
    /// `on_snapshot` runs once per decoded message. `on_error` runs at most
    /// once, after the connection has been dropped, and nothing runs after it.
    pub fn subscribe<S, E>(&self, mut on_snapshot: S, on_error: E) -> Subscription
    where
        S: FnMut(Snapshot) + 'static,
        E: FnOnce(FeedError) + 'static,
    {
        let cancelled = Rc::new(Cell::new(false));
        let flag = cancelled.clone();
        let connector = self.connector.clone();
        let config = self.config.clone();
        let stats = self.stats.clone();
        let logger = self.logger.clone();

        let task = tokio::task::spawn_local(async move {
            let outcome = pump(
                connector.as_ref(),
                &config,
                &stats,
                &logger,
                &flag,
                &mut on_snapshot,
            )
            .await;
            if flag.get() {
                return;
            }
            if let Err(err) = outcome {
                match &err {
                    FeedError::MalformedPayload(_) => stats.record_decode_error(),
                    FeedError::Connection(_) => stats.record_connection_error(),
                }
                logger.failure(&format!("subscription to {} ended: {err}", config.endpoint));
                flag.set(true);
                on_error(err);
            }
        });

        Subscription {
            cancelled,
            task,
            logger: self.logger.clone(),
        }
    }
}

/// Drives one connection until it fails or the subscription is cancelled.
///
/// Returns `Ok(())` only when cancelled. The source is dropped, closing the
/// connection, before this returns.
async fn pump<C, S>(
    connector: &C,
    config: &StreamConfig,
    stats: &StreamStats,
    logger: &LogManager,
    cancelled: &Cell<bool>,
    on_snapshot: &mut S,
) -> FeedResult<()>
where
    C: Connector,
    S: FnMut(Snapshot),
{
    logger.record(&format!("connecting to {}", config.endpoint));
    let mut source = timeout(config.connection_timeout(), connector.connect())
        .await
        .map_err(|_| ConnectionError::ConnectTimeout(config.connection_timeout()))??;
    stats.record_connected();
    logger.record(&format!("streaming from {}", config.endpoint));

    loop {
        let event = timeout(config.heartbeat_timeout(), source.next_event())
            .await
            .map_err(|_| ConnectionError::HeartbeatTimeout(config.heartbeat_timeout()))??;
        if cancelled.get() {
            return Ok(());
        }
        match event {
            Some(SourceEvent::Message(payload)) => {
                let snapshot = codec::decode(&payload)?;
                logger.detail(&format!(
                    "snapshot with {} aircraft",
                    snapshot.aircraft.len()
                ));
                stats.record_delivered();
                on_snapshot(snapshot);
                if cancelled.get() {
                    return Ok(());
                }
            }
            Some(SourceEvent::Heartbeat) => trace!("[{}] heartbeat", logger.component()),
            None => return Err(ConnectionError::Closed.into()),
        }
    }
}

/// Handle owning one push connection.
///
/// Cancelling (or dropping) the handle closes the connection; no callback
/// runs after [`cancel`](Subscription::cancel) returns, including when it is
/// called from inside a callback.
#[derive(Debug)]
pub struct Subscription {
    cancelled: Rc<Cell<bool>>,
    task: JoinHandle<()>,
    logger: LogManager,
}

impl Subscription {
    pub fn cancel(&self) {
        if !self.cancelled.replace(true) {
            self.logger.record("subscription cancelled");
        }
        self.task.abort();
    }

    /// False once cancelled or once the connection has ended.
    pub fn is_active(&self) -> bool {
        !self.cancelled.get() && !self.task.is_finished()
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.cancel();
    }
}
