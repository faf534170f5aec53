use std::cell::Cell;
use std::rc::Rc;

/// Delivery counters for one stream client.
///
/// Shared by handle between the client and its delivery tasks, which all run
/// on the same event loop.
#[derive(Debug, Clone, Default)]
pub struct StreamStats {
    inner: Rc<Counters>,
}

#[derive(Debug, Default)]
struct Counters {
    connections: Cell<usize>,
    delivered: Cell<usize>,
    decode_errors: Cell<usize>,
    connection_errors: Cell<usize>,
}

/// Point-in-time copy of [`StreamStats`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StreamStatsSnapshot {
    pub connections: usize,
    pub delivered: usize,
    pub decode_errors: usize,
    pub connection_errors: usize,
}

fn bump(cell: &Cell<usize>) {
    cell.set(cell.get().saturating_add(1));
}

impl StreamStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_connected(&self) {
        bump(&self.inner.connections);
    }

    pub fn record_delivered(&self) {
        bump(&self.inner.delivered);
    }

    pub fn record_decode_error(&self) {
        bump(&self.inner.decode_errors);
    }

    pub fn record_connection_error(&self) {
        bump(&self.inner.connection_errors);
    }

    pub fn snapshot(&self) -> StreamStatsSnapshot {
        StreamStatsSnapshot {
            connections: self.inner.connections.get(),
            delivered: self.inner.delivered.get(),
            decode_errors: self.inner.decode_errors.get(),
            connection_errors: self.inner.connection_errors.get(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clones_share_counters() {
        let stats = StreamStats::new();
        let handle = stats.clone();
        handle.record_delivered();
        handle.record_delivered();
        stats.record_decode_error();
        let snapshot = stats.snapshot();
        assert_eq!(snapshot.delivered, 2);
        assert_eq!(snapshot.decode_errors, 1);
        assert_eq!(snapshot.connection_errors, 0);
    }
}
