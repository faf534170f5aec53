use crate::codec;
use crate::feed::Snapshot;
use crate::prelude::{ConnectionError, FeedError, FeedResult};
use crate::stream::config::StreamConfig;
use crate::stream::source::{Connector, EventSource, SourceEvent};
use crate::stream::sse::EventStreamParser;
use reqwest::header::{ACCEPT, CACHE_CONTROL};
use std::collections::VecDeque;

fn transport(err: reqwest::Error) -> FeedError {
    ConnectionError::Transport(err.to_string()).into()
}

/// Opens `text/event-stream` connections with reqwest.
#[derive(Debug, Clone)]
pub struct HttpConnector {
    http: reqwest::Client,
    endpoint: String,
}

impl HttpConnector {
    pub fn new(endpoint: impl Into<String>) -> FeedResult<Self> {
        let http = reqwest::Client::builder().build().map_err(transport)?;
        Ok(Self {
            http,
            endpoint: endpoint.into(),
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

impl Connector for HttpConnector {
    type Source = HttpEventSource;

    async fn connect(&self) -> FeedResult<HttpEventSource> {
        let response = self
            .http
            .get(&self.endpoint)
            .header(ACCEPT, "text/event-stream")
            .header(CACHE_CONTROL, "no-cache")
            .send()
            .await
            .map_err(transport)?;
        let status = response.status();
        if !status.is_success() {
            return Err(ConnectionError::Status(status.as_u16()).into());
        }
        Ok(HttpEventSource {
            response,
            parser: EventStreamParser::new(),
            pending: VecDeque::new(),
        })
    }
}

/// One open HTTP event stream.
#[derive(Debug)]
pub struct HttpEventSource {
    response: reqwest::Response,
    parser: EventStreamParser,
    pending: VecDeque<SourceEvent>,
}

impl EventSource for HttpEventSource {
    async fn next_event(&mut self) -> FeedResult<Option<SourceEvent>> {
        if let Some(event) = self.pending.pop_front() {
            return Ok(Some(event));
        }
        match self.response.chunk().await.map_err(transport)? {
            Some(bytes) => {
                self.pending.extend(self.parser.feed(&bytes));
                // Bytes that did not finish an event still prove the connection is alive.
                Ok(Some(
                    self.pending.pop_front().unwrap_or(SourceEvent::Heartbeat),
                ))
            }
            None => Ok(None),
        }
    }
}

/// Request/response fallback returning the same snapshot shape as the stream.
#[derive(Debug, Clone)]
pub struct PollingClient {
    http: reqwest::Client,
    config: StreamConfig,
}

impl PollingClient {
    pub fn new(config: StreamConfig) -> FeedResult<Self> {
        let http = reqwest::Client::builder()
            .timeout(config.connection_timeout())
            .build()
            .map_err(transport)?;
        Ok(Self { http, config })
    }

    pub async fn fetch(&self) -> FeedResult<Snapshot> {
        let response = self
            .http
            .get(&self.config.poll_endpoint)
            .send()
            .await
            .map_err(|err| {
                if err.is_timeout() {
                    ConnectionError::ConnectTimeout(self.config.connection_timeout()).into()
                } else {
                    transport(err)
                }
            })?;
        let status = response.status();
        if !status.is_success() {
            return Err(ConnectionError::Status(status.as_u16()).into());
        }
        let body = response.text().await.map_err(transport)?;
        codec::decode(&body)
    }
}
