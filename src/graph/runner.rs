//! Off-thread clique counting with streamed progress.
//!
//! A counting run moves through `Started → Building → Counting →
//! Done | Error`; callers receive those states as events over a bounded
//! channel instead of polling a shared flag. Runs are single-flight: a
//! request while one is in progress subscribes to the same run, and a
//! request after completion is answered from the memoized cache entry
//! (which every catalog write invalidates). A terminal event is always
//! emitted, and a worker failure never leaves the in-flight slot locked.

use crate::catalog::Catalog;
use crate::graph::build_collaboration_graph;
use crate::graph::clique::{count_cliques, CancelToken, CliqueCounts};
use parking_lot::{Mutex, RwLock};
use std::sync::mpsc::{sync_channel, Receiver, SyncSender, TrySendError};
use std::sync::Arc;
use std::thread;
use tracing::{info, warn};

/// Bound on buffered events per subscriber. Intermediate progress is
/// dropped for a subscriber whose buffer is full; terminal events are
/// never dropped.
pub const EVENT_CHANNEL_CAPACITY: usize = 64;

/// One event in the lifecycle of a counting run. Monotonic within a run.
#[derive(Debug, Clone)]
pub enum CliqueEvent {
    Started,
    /// Graph-build progress: vertices processed out of total.
    Building { completed: u64, total: u64 },
    /// The enumeration itself has begun; no finer progress is available
    /// until it completes.
    Counting,
    Done(Arc<CliqueCounts>),
    Error(String),
}

impl CliqueEvent {
    pub fn is_terminal(&self) -> bool {
        matches!(self, CliqueEvent::Done(_) | CliqueEvent::Error(_))
    }
}

struct Inflight {
    subscribers: Vec<SyncSender<CliqueEvent>>,
    cancel: CancelToken,
}

type InflightSlot = Arc<Mutex<Option<Inflight>>>;

/// Launches and multiplexes clique-counting runs over a shared catalog.
#[derive(Default)]
pub struct CliqueRunner {
    inflight: InflightSlot,
}

impl CliqueRunner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Requests the clique-size counts of the catalog's collaboration
    /// graph, returning a receiver of lifecycle events.
    ///
    /// If a run is already in flight, the receiver joins it. If a
    /// memoized result exists, `Started` and `Done` arrive immediately
    /// with no worker spawned. Otherwise a worker thread builds the
    /// graph (holding only a read lock) and counts.
    pub fn count_cliques(&self, catalog: Arc<RwLock<Catalog>>) -> Receiver<CliqueEvent> {
        let (tx, rx) = sync_channel(EVENT_CHANNEL_CAPACITY);

        let mut slot = self.inflight.lock();
        if let Some(run) = slot.as_mut() {
            let _ = tx.try_send(CliqueEvent::Started);
            run.subscribers.push(tx);
            return rx;
        }

        if let Some(counts) = catalog.read().cache.clique_counts() {
            let _ = tx.try_send(CliqueEvent::Started);
            let _ = tx.try_send(CliqueEvent::Done(counts));
            return rx;
        }

        let cancel = CancelToken::new();
        *slot = Some(Inflight {
            subscribers: vec![tx],
            cancel: cancel.clone(),
        });
        drop(slot);

        let inflight = Arc::clone(&self.inflight);
        thread::spawn(move || run_worker(inflight, catalog, cancel));
        rx
    }

    /// Cancels the in-flight run, if any; its subscribers receive a
    /// terminal `Error`.
    pub fn cancel(&self) {
        if let Some(run) = self.inflight.lock().as_ref() {
            run.cancel.cancel();
        }
    }

    pub fn is_running(&self) -> bool {
        self.inflight.lock().is_some()
    }
}

fn run_worker(inflight: InflightSlot, catalog: Arc<RwLock<Catalog>>, cancel: CancelToken) {
    broadcast(&inflight, CliqueEvent::Started);

    let result = (|| {
        let graph = {
            let catalog = catalog.read();
            let interval = catalog.config().graph_progress_interval;
            build_collaboration_graph(&catalog, interval, |p| {
                broadcast(
                    &inflight,
                    CliqueEvent::Building {
                        completed: p.completed,
                        total: p.total,
                    },
                )
            })?
        };
        broadcast(&inflight, CliqueEvent::Counting);
        info!(
            vertices = graph.vertex_count(),
            edges = graph.edge_count(),
            "counting cliques"
        );
        let counts = Arc::new(count_cliques(&graph.adjacency, &cancel)?);
        catalog.read().cache.store_clique_counts(Arc::clone(&counts));
        Ok::<_, crate::error::StoreError>(counts)
    })();

    // Release the single-flight slot before the terminal sends, which
    // may block on a slow subscriber.
    let subscribers = inflight
        .lock()
        .take()
        .map(|run| run.subscribers)
        .unwrap_or_default();

    let terminal = match result {
        Ok(counts) => CliqueEvent::Done(counts),
        Err(e) => {
            warn!(error = %e, "clique counting failed");
            CliqueEvent::Error(e.to_string())
        }
    };
    for tx in subscribers {
        let _ = tx.send(terminal.clone());
    }
}

fn broadcast(inflight: &InflightSlot, event: CliqueEvent) {
    if let Some(run) = inflight.lock().as_mut() {
        run.subscribers.retain(|tx| match tx.try_send(event.clone()) {
            Ok(()) => true,
            // full buffer: drop this update for that subscriber only
            Err(TrySendError::Full(_)) => true,
            Err(TrySendError::Disconnected(_)) => false,
        });
    }
}
