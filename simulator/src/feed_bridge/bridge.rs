use crate::feed_bridge::model::FeedModel;
use anyhow::Context;
use beastiecore::feed::Snapshot;
use futures::{stream, StreamExt};
use log::{debug, info, warn};
use serde::Deserialize;
use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::{Arc, PoisonError, RwLock};
use std::time::Duration;
use tokio::sync::broadcast::{self, error::RecvError};
use warp::http::StatusCode;
use warp::sse::Event;
use warp::{Filter, Rejection, Reply};

const STREAM_NAME: &str = "aircraft";
const CHANNEL_CAPACITY: usize = 16;
const KEEP_ALIVE: Duration = Duration::from_secs(5);

pub fn default_bind_address() -> SocketAddr {
    SocketAddr::from(([127, 0, 0, 1], 8000))
}

#[derive(Debug, Deserialize)]
struct StreamQuery {
    stream: Option<String>,
}

type SharedModel = Arc<RwLock<Option<FeedModel>>>;

/// Hosts the push stream and the polling endpoints over the latest published snapshot.
#[derive(Clone)]
pub struct FeedBridge {
    state: SharedModel,
    events: broadcast::Sender<String>,
}

impl FeedBridge {
    pub fn new() -> Self {
        let (events, _) = broadcast::channel(CHANNEL_CAPACITY);
        Self {
            state: Arc::new(RwLock::new(None)),
            events,
        }
    }

    pub fn routes(&self) -> impl Filter<Extract = (impl Reply,), Error = Rejection> + Clone {
        let state = self.state.clone();
        let state_filter = warp::any().map(move || state.clone());
        let events = self.events.clone();
        let events_filter = warp::any().map(move || events.clone());

        let stream_route = warp::path("stream")
            .and(warp::path::end())
            .and(warp::get())
            .and(warp::query::<StreamQuery>())
            .and(state_filter.clone())
            .and(events_filter)
            .and_then(
                |query: StreamQuery, state: SharedModel, events: broadcast::Sender<String>| async move {
                    if query.stream.as_deref().is_some_and(|name| name != STREAM_NAME) {
                        return Err(warp::reject::not_found());
                    }
                    let (latest, receiver) = {
                        let guard = state.read().unwrap_or_else(PoisonError::into_inner);
                        let latest = guard.as_ref().map(|model| model.payload.clone());
                        (latest, events.subscribe())
                    };
                    info!("stream subscriber connected ({} active)", events.receiver_count());
                    let payloads = stream::iter(latest)
                        .chain(stream::unfold(receiver, next_payload))
                        .map(|payload| Ok::<_, Infallible>(Event::default().data(payload)));
                    Ok(warp::sse::reply(
                        warp::sse::keep_alive().interval(KEEP_ALIVE).stream(payloads),
                    ))
                },
            );

        let aircraft_route = warp::path("aircraft")
            .and(warp::path::end())
            .and(warp::get())
            .and(state_filter.clone())
            .map(|state: SharedModel| match latest(&state) {
                Some(model) => warp::reply::with_header(
                    model.payload,
                    "content-type",
                    "application/json",
                )
                .into_response(),
                None => not_ready().into_response(),
            });

        let metrics_route = warp::path("metrics")
            .and(warp::path::end())
            .and(warp::get())
            .and(state_filter)
            .map(|state: SharedModel| match latest(&state) {
                Some(model) => warp::reply::json(&model.metrics()).into_response(),
                None => not_ready().into_response(),
            });

        stream_route
            .or(aircraft_route)
            .or(metrics_route)
            .with(warp::log("simulator::bridge"))
    }

    /// Binds the routes on the current runtime and returns the bound address.
    pub fn serve(&self, addr: SocketAddr) -> anyhow::Result<SocketAddr> {
        let (bound, server) = warp::serve(self.routes())
            .try_bind_ephemeral(addr)
            .with_context(|| format!("binding feed bridge on {addr}"))?;
        tokio::spawn(server);
        info!("feed bridge listening on http://{bound}");
        Ok(bound)
    }

    /// Stores the snapshot for polling and pushes it to every stream subscriber.
    /// Returns the number of subscribers reached.
    pub fn publish(&self, snapshot: Snapshot) -> anyhow::Result<usize> {
        let model = FeedModel::new(snapshot)?;
        let payload = model.payload.clone();
        let aircraft = model.snapshot.aircraft.len();

        let mut guard = self.state.write().unwrap_or_else(PoisonError::into_inner);
        *guard = Some(model);
        // Sent under the write lock so a new subscriber sees each snapshot once.
        let reached = self.events.send(payload).unwrap_or(0);
        drop(guard);

        debug!("published {aircraft} aircraft to {reached} subscribers");
        Ok(reached)
    }

    #[cfg(test)]
    pub fn snapshot(&self) -> Option<Snapshot> {
        latest(&self.state).map(|model| model.snapshot)
    }
}

impl Default for FeedBridge {
    fn default() -> Self {
        Self::new()
    }
}

fn latest(state: &SharedModel) -> Option<FeedModel> {
    state.read().unwrap_or_else(PoisonError::into_inner).clone()
}

fn not_ready() -> impl Reply {
    warp::reply::with_status("no snapshot published yet", StatusCode::SERVICE_UNAVAILABLE)
}

async fn next_payload(
    mut receiver: broadcast::Receiver<String>,
) -> Option<(String, broadcast::Receiver<String>)> {
    loop {
        match receiver.recv().await {
            Ok(payload) => return Some((payload, receiver)),
            Err(RecvError::Lagged(skipped)) => {
                warn!("stream subscriber lagged, dropped {skipped} snapshots")
            }
            Err(RecvError::Closed) => return None,
        }
    }
}
