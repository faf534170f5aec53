use crate::feed::Snapshot;
use crate::prelude::FeedError;
use crate::stream::client::{StreamClient, Subscription};
use crate::stream::config::BackoffConfig;
use crate::stream::http::HttpConnector;
use crate::stream::source::Connector;
use crate::telemetry::LogManager;
use std::cell::{Cell, RefCell};
use std::rc::Rc;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;

/// Opt-in wrapper that resubscribes with exponential backoff after each failure.
///
/// Every failure still reaches the consumer through `on_error`, together with
/// the number of consecutive failed attempts. A delivered snapshot resets the
/// count.
pub struct ReconnectingClient<C = HttpConnector> {
    client: StreamClient<C>,
    backoff: BackoffConfig,
    logger: LogManager,
}

impl<C: Connector + 'static> ReconnectingClient<C> {
    pub fn new(client: StreamClient<C>, backoff: BackoffConfig) -> Self {
        Self {
            client,
            backoff,
            logger: LogManager::new("reconnect"),
        }
    }

    pub fn client(&self) -> &StreamClient<C> {
        &self.client
    }

    pub fn subscribe<S, E>(&self, on_snapshot: S, mut on_error: E) -> ReconnectingSubscription
    where
        S: FnMut(Snapshot) + 'static,
        E: FnMut(FeedError, u32) + 'static,
    {
        let cancelled = Rc::new(Cell::new(false));
        let current: Rc<RefCell<Option<Subscription>>> = Rc::new(RefCell::new(None));
        let on_snapshot = Rc::new(RefCell::new(on_snapshot));
        let failures = Rc::new(Cell::new(0u32));

        let client = self.client.clone();
        let backoff = self.backoff.clone();
        let logger = self.logger.clone();
        let flag = cancelled.clone();
        let slot = current.clone();

        let task = tokio::task::spawn_local(async move {
            loop {
                let (error_tx, error_rx) = oneshot::channel();
                let deliver = {
                    let on_snapshot = on_snapshot.clone();
                    let failures = failures.clone();
                    let flag = flag.clone();
                    move |snapshot: Snapshot| {
                        if flag.get() {
                            return;
                        }
                        failures.set(0);
                        let mut callback = on_snapshot.borrow_mut();
                        (*callback)(snapshot);
                    }
                };
                let subscription = client.subscribe(deliver, move |err| {
                    let _ = error_tx.send(err);
                });
                *slot.borrow_mut() = Some(subscription);

                let Ok(err) = error_rx.await else {
                    return;
                };
                slot.borrow_mut().take();
                if flag.get() {
                    return;
                }

                let attempt = failures.get().saturating_add(1);
                failures.set(attempt);
                on_error(err, attempt);
                if flag.get() {
                    return;
                }

                let delay = backoff.delay(attempt);
                logger.record(&format!(
                    "reconnecting in {}ms after {attempt} consecutive failure(s)",
                    delay.as_millis()
                ));
                tokio::time::sleep(delay).await;
            }
        });

        ReconnectingSubscription {
            cancelled,
            current,
            task,
        }
    }
}

/// Handle for a [`ReconnectingClient`] subscription; same cancellation
/// guarantee as [`Subscription`].
#[derive(Debug)]
pub struct ReconnectingSubscription {
    cancelled: Rc<Cell<bool>>,
    current: Rc<RefCell<Option<Subscription>>>,
    task: JoinHandle<()>,
}

impl ReconnectingSubscription {
    pub fn cancel(&self) {
        self.cancelled.set(true);
        self.task.abort();
        // Dropping the inner subscription closes the live connection immediately.
        if let Ok(mut current) = self.current.try_borrow_mut() {
            current.take();
        }
    }

    pub fn is_active(&self) -> bool {
        !self.cancelled.get() && !self.task.is_finished()
    }
}

impl Drop for ReconnectingSubscription {
    fn drop(&mut self) {
        self.cancel();
    }
}
