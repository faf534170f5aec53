//! Consumer wiring between a stream subscription and the live table.

use crate::feed::{IcaoAddress, Snapshot};
use crate::prelude::{FeedError, SessionError, TableResult};
use crate::stream::{
    Connector, ReconnectingClient, ReconnectingSubscription, StreamClient, Subscription,
};
use crate::table::{LiveTableModel, SortDirection};
use crate::telemetry::LogManager;
use std::cell::{Ref, RefCell};
use std::rc::Rc;

/// Connection lifecycle as seen by the dashboard.
///
/// `Idle -> Connecting -> Streaming -> {Closed, Errored}`. `Closed` and
/// `Errored` are terminal. `Retrying` only occurs for sessions started with
/// [`DashboardSession::start_reconnecting`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConnectionState {
    Idle,
    Connecting,
    Streaming,
    Retrying { attempt: u32, error: FeedError },
    Closed,
    Errored(FeedError),
}

impl ConnectionState {
    pub fn name(&self) -> &'static str {
        match self {
            ConnectionState::Idle => "idle",
            ConnectionState::Connecting => "connecting",
            ConnectionState::Streaming => "streaming",
            ConnectionState::Retrying { .. } => "retrying",
            ConnectionState::Closed => "closed",
            ConnectionState::Errored(_) => "errored",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, ConnectionState::Closed | ConnectionState::Errored(_))
    }
}

type Observer = Box<dyn FnMut(&LiveTableModel, &ConnectionState)>;

struct Shared {
    table: RefCell<LiveTableModel>,
    state: RefCell<ConnectionState>,
    observer: RefCell<Option<Observer>>,
    logger: LogManager,
}

impl Shared {
    fn transition(&self, next: ConnectionState) {
        let mut state = self.state.borrow_mut();
        if state.is_terminal() {
            return;
        }
        if *state != next {
            self.logger
                .record(&format!("{} -> {}", state.name(), next.name()));
        }
        *state = next;
    }

    fn apply(&self, snapshot: Snapshot) {
        if self.state.borrow().is_terminal() {
            return;
        }
        self.table.borrow_mut().on_snapshot(snapshot);
        self.transition(ConnectionState::Streaming);
        self.notify();
    }

    fn fail(&self, next: ConnectionState) {
        // The table keeps its last contents so the view can show them as stale.
        self.transition(next);
        self.notify();
    }

    fn notify(&self) {
        let Ok(mut observer) = self.observer.try_borrow_mut() else {
            return;
        };
        if let Some(observer) = observer.as_mut() {
            observer(&self.table.borrow(), &self.state.borrow());
        }
    }
}

enum Handle {
    Direct(Subscription),
    Reconnecting(ReconnectingSubscription),
}

impl Handle {
    fn cancel(&self) {
        match self {
            Handle::Direct(subscription) => subscription.cancel(),
            Handle::Reconnecting(subscription) => subscription.cancel(),
        }
    }
}

/// One dashboard view: a table fed by exactly one subscription.
///
/// A session runs once; after `Closed` or `Errored` a new session is needed.
pub struct DashboardSession {
    shared: Rc<Shared>,
    handle: Option<Handle>,
}

impl Default for DashboardSession {
    fn default() -> Self {
        Self::new(LiveTableModel::new())
    }
}

impl DashboardSession {
    pub fn new(table: LiveTableModel) -> Self {
        Self {
            shared: Rc::new(Shared {
                table: RefCell::new(table),
                state: RefCell::new(ConnectionState::Idle),
                observer: RefCell::new(None),
                logger: LogManager::new("session"),
            }),
            handle: None,
        }
    }

    /// Called after every stream-driven state change (snapshot applied, error).
    pub fn on_update<F>(&mut self, observer: F)
    where
        F: FnMut(&LiveTableModel, &ConnectionState) + 'static,
    {
        *self.shared.observer.borrow_mut() = Some(Box::new(observer));
    }

    pub fn start<C: Connector + 'static>(
        &mut self,
        client: &StreamClient<C>,
    ) -> Result<(), SessionError> {
        self.begin()?;
        let on_snapshot = self.shared.clone();
        let on_error = self.shared.clone();
        let subscription = client.subscribe(
            move |snapshot| on_snapshot.apply(snapshot),
            move |err| on_error.fail(ConnectionState::Errored(err)),
        );
        self.handle = Some(Handle::Direct(subscription));
        Ok(())
    }

    /// Like [`start`](Self::start), but failures move the session to
    /// `Retrying` while the wrapper waits to resubscribe.
    pub fn start_reconnecting<C: Connector + 'static>(
        &mut self,
        client: &ReconnectingClient<C>,
    ) -> Result<(), SessionError> {
        self.begin()?;
        let on_snapshot = self.shared.clone();
        let on_error = self.shared.clone();
        let subscription = client.subscribe(
            move |snapshot| on_snapshot.apply(snapshot),
            move |error, attempt| on_error.fail(ConnectionState::Retrying { attempt, error }),
        );
        self.handle = Some(Handle::Reconnecting(subscription));
        Ok(())
    }

    fn begin(&mut self) -> Result<(), SessionError> {
        let state = self.shared.state.borrow().clone();
        if state != ConnectionState::Idle {
            return Err(SessionError::NotIdle(state.name()));
        }
        self.shared.transition(ConnectionState::Connecting);
        Ok(())
    }

    /// Closes the connection; no update is delivered after this returns.
    pub fn stop(&mut self) {
        if let Some(handle) = self.handle.take() {
            handle.cancel();
        }
        self.shared.transition(ConnectionState::Closed);
    }

    pub fn state(&self) -> ConnectionState {
        self.shared.state.borrow().clone()
    }

    /// True while the table shows contents from a connection that has failed.
    pub fn is_stale(&self) -> bool {
        matches!(
            *self.shared.state.borrow(),
            ConnectionState::Errored(_) | ConnectionState::Retrying { .. }
        )
    }

    pub fn table(&self) -> Ref<'_, LiveTableModel> {
        self.shared.table.borrow()
    }

    pub fn select_row(&self, icao: IcaoAddress) -> TableResult<()> {
        self.shared.table.borrow_mut().select_row(icao)
    }

    pub fn clear_selection(&self) {
        self.shared.table.borrow_mut().clear_selection();
    }

    pub fn sort_by(&self, column: &str, direction: SortDirection) -> TableResult<()> {
        self.shared.table.borrow_mut().sort_by(column, direction)
    }

    pub fn toggle_sort(&self, column: &str) -> TableResult<SortDirection> {
        self.shared.table.borrow_mut().toggle_sort(column)
    }
}

impl Drop for DashboardSession {
    fn drop(&mut self) {
        if let Some(handle) = self.handle.take() {
            handle.cancel();
        }
    }
}
