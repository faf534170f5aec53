//! In-memory connector used by the stream, reconnect and session tests.

use crate::feed::Snapshot;
use crate::prelude::{FeedError, FeedResult};
use crate::stream::source::{Connector, EventSource, SourceEvent};
use std::cell::{Cell, RefCell};
use std::collections::VecDeque;
use std::rc::Rc;
use std::time::Duration;
use tokio::sync::mpsc::{unbounded_channel, UnboundedReceiver, UnboundedSender};

/// Lets every ready task on the local set run to its next suspension point.
pub(crate) async fn settle() {
    tokio::time::sleep(Duration::from_millis(1)).await;
}

enum Scripted {
    Open(UnboundedReceiver<SourceEvent>),
    Fail(FeedError),
    Hang,
}

/// Connector whose connections are scripted by the test, in connect order.
/// Connecting with nothing scripted hangs.
#[derive(Clone, Default)]
pub(crate) struct ChannelConnector {
    script: Rc<RefCell<VecDeque<Scripted>>>,
    connects: Rc<Cell<usize>>,
}

impl ChannelConnector {
    pub(crate) fn open(&self) -> ChannelFeed {
        let (tx, rx) = unbounded_channel();
        self.script.borrow_mut().push_back(Scripted::Open(rx));
        ChannelFeed {
            tx: RefCell::new(Some(tx)),
        }
    }

    pub(crate) fn fail(&self, err: FeedError) {
        self.script.borrow_mut().push_back(Scripted::Fail(err));
    }

    pub(crate) fn hang(&self) {
        self.script.borrow_mut().push_back(Scripted::Hang);
    }

    pub(crate) fn connects(&self) -> usize {
        self.connects.get()
    }
}

pub(crate) struct ChannelSource {
    rx: UnboundedReceiver<SourceEvent>,
}

impl EventSource for ChannelSource {
    async fn next_event(&mut self) -> FeedResult<Option<SourceEvent>> {
        Ok(self.rx.recv().await)
    }
}

impl Connector for ChannelConnector {
    type Source = ChannelSource;

    async fn connect(&self) -> FeedResult<ChannelSource> {
        self.connects.set(self.connects.get() + 1);
        let next = self.script.borrow_mut().pop_front();
        match next {
            Some(Scripted::Open(rx)) => Ok(ChannelSource { rx }),
            Some(Scripted::Fail(err)) => Err(err),
            Some(Scripted::Hang) | None => std::future::pending().await,
        }
    }
}

/// Server side of one scripted connection.
pub(crate) struct ChannelFeed {
    tx: RefCell<Option<UnboundedSender<SourceEvent>>>,
}

impl ChannelFeed {
    fn send(&self, event: SourceEvent) {
        if let Some(tx) = self.tx.borrow().as_ref() {
            let _ = tx.send(event);
        }
    }

    pub(crate) fn message(&self, payload: &str) {
        self.send(SourceEvent::Message(payload.to_string()));
    }

    pub(crate) fn heartbeat(&self) {
        self.send(SourceEvent::Heartbeat);
    }

    /// Ends the stream from the server side.
    pub(crate) fn close(&self) {
        self.tx.borrow_mut().take();
    }

    /// True once the client dropped its end of the connection.
    pub(crate) fn is_closed(&self) -> bool {
        self.tx.borrow().as_ref().map_or(true, UnboundedSender::is_closed)
    }
}

/// Records callback invocations.
#[derive(Clone, Default)]
pub(crate) struct Recorder {
    snapshots: Rc<RefCell<Vec<Snapshot>>>,
    errors: Rc<RefCell<Vec<FeedError>>>,
}

impl Recorder {
    pub(crate) fn on_snapshot(&self) -> impl FnMut(Snapshot) + 'static {
        let snapshots = self.snapshots.clone();
        move |snapshot| snapshots.borrow_mut().push(snapshot)
    }

    pub(crate) fn on_error(&self) -> impl FnOnce(FeedError) + 'static {
        let errors = self.errors.clone();
        move |err| errors.borrow_mut().push(err)
    }

    pub(crate) fn snapshots(&self) -> Vec<Snapshot> {
        self.snapshots.borrow().clone()
    }

    pub(crate) fn errors(&self) -> Vec<FeedError> {
        self.errors.borrow().clone()
    }

    pub(crate) fn calls(&self) -> usize {
        self.snapshots.borrow().len() + self.errors.borrow().len()
    }
}
