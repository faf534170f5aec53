use beastiecore::stream::{PollingClient, StreamClient, StreamConfig};
use beastiecore::{ConnectionError, FeedError, Snapshot};
use std::net::SocketAddr;
use std::time::Duration;
use tokio::sync::mpsc::{unbounded_channel, UnboundedReceiver};
use tokio::task::LocalSet;
use warp::Filter;

const EVENT_STREAM: &str = "retry: 1000\n: connected\n\n\
id: 1\ndata: {\"now\":1,\"good\":10,\"bad\":0,\"aircraft\":[{\"icao\":\"a1b2c3\",\"alt\":33000,\"rng\":12.4}]}\n\n\
id: 2\ndata: {\"now\":2,\"good\":11,\"bad\":1,\"aircraft\":[{\"icao\":\"a1b2c3\"},{\"icao\":\"4840d6\",\"rng\":\"\"}]}\n\n";

const POLL_BODY: &str =
    r#"{"now":3,"total":1,"good":7,"bad":0,"aircraft":[{"icao":"00ff00","call":"TEST1"}]}"#;

#[derive(Debug)]
enum Delivered {
    Snapshot(Snapshot),
    Error(FeedError),
}

fn serve() -> SocketAddr {
    let stream = warp::path("stream")
        .and(warp::path::end())
        .map(|| warp::reply::with_header(EVENT_STREAM, "content-type", "text/event-stream"));
    let polling = warp::path("aircraft")
        .and(warp::path::end())
        .map(|| warp::reply::with_header(POLL_BODY, "content-type", "application/json"));
    let (addr, server) = warp::serve(stream.or(polling)).bind_ephemeral(([127, 0, 0, 1], 0));
    tokio::spawn(server);
    addr
}

fn config(addr: SocketAddr, path: &str) -> StreamConfig {
    StreamConfig {
        endpoint: format!("http://{addr}{path}"),
        poll_endpoint: format!("http://{addr}/aircraft"),
        heartbeat_timeout_ms: 5_000,
        connection_timeout_ms: 5_000,
    }
}

async fn next(rx: &mut UnboundedReceiver<Delivered>) -> Delivered {
    tokio::time::timeout(Duration::from_secs(10), rx.recv())
        .await
        .expect("callback within timeout")
        .expect("channel open")
}

#[tokio::test]
async fn streams_snapshots_until_server_closes() {
    let addr = serve();
    LocalSet::new()
        .run_until(async move {
            let client = StreamClient::new(config(addr, "/stream?stream=aircraft")).unwrap();
            let (tx, mut rx) = unbounded_channel();
            let error_tx = tx.clone();
            let _subscription = client.subscribe(
                move |snapshot| {
                    let _ = tx.send(Delivered::Snapshot(snapshot));
                },
                move |err| {
                    let _ = error_tx.send(Delivered::Error(err));
                },
            );

            let Delivered::Snapshot(first) = next(&mut rx).await else {
                panic!("expected first snapshot");
            };
            assert_eq!(first.good, 10);
            assert_eq!(first.aircraft[0].altitude, Some(33000));
            assert_eq!(first.aircraft[0].range, Some(12.4));

            let Delivered::Snapshot(second) = next(&mut rx).await else {
                panic!("expected second snapshot");
            };
            assert_eq!(second.total, 2);
            assert_eq!(second.aircraft[1].range, None);

            let Delivered::Error(err) = next(&mut rx).await else {
                panic!("expected close error");
            };
            assert_eq!(err, FeedError::Connection(ConnectionError::Closed));

            let stats = client.stats().snapshot();
            assert_eq!(stats.connections, 1);
            assert_eq!(stats.delivered, 2);
            assert_eq!(stats.connection_errors, 1);
        })
        .await;
}

#[tokio::test]
async fn missing_endpoint_reports_status() {
    let addr = serve();
    LocalSet::new()
        .run_until(async move {
            let client = StreamClient::new(config(addr, "/nowhere")).unwrap();
            let (tx, mut rx) = unbounded_channel();
            let error_tx = tx.clone();
            let _subscription = client.subscribe(
                move |snapshot| {
                    let _ = tx.send(Delivered::Snapshot(snapshot));
                },
                move |err| {
                    let _ = error_tx.send(Delivered::Error(err));
                },
            );
            match next(&mut rx).await {
                Delivered::Error(err) => {
                    assert_eq!(err, FeedError::Connection(ConnectionError::Status(404)))
                }
                other => panic!("unexpected {other:?}"),
            }
        })
        .await;
}

#[tokio::test]
async fn polling_fallback_returns_same_shape() {
    let addr = serve();
    let polling = PollingClient::new(config(addr, "/stream")).unwrap();
    let snapshot = polling.fetch().await.unwrap();
    assert_eq!(snapshot.total, 1);
    assert_eq!(snapshot.aircraft[0].callsign.as_deref(), Some("TEST1"));
}
