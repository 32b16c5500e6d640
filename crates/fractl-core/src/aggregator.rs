//! Folds every adapter's status into one unified status.

use std::sync::Arc;

use fractl_protocol::{unify, AdapterStatus, UnifiedStatus};
use parking_lot::ReentrantMutex;
use tracing::debug;

use crate::store::{Store, Subscription};

/// Subscribes to a fixed set of status sources and keeps a unified status
/// store current. The output only notifies on real changes.
pub struct StatusAggregator {
    reducer: Arc<Reducer>,
    _subscriptions: Vec<Subscription>,
}

struct Reducer {
    sources: Vec<(String, Store<AdapterStatus>)>,
    output: Store<UnifiedStatus>,
    /// Read-all-then-set must not interleave with another thread's pass,
    /// or an older reduction could be written last.
    pass: ReentrantMutex<()>,
}

impl Reducer {
    fn run(&self) -> UnifiedStatus {
        let _pass = self.pass.lock();
        let unified = unify(self.sources.iter().map(|(_, store)| store.get()));
        if self.output.set(unified) {
            debug!(status = %unified, "Unified status changed");
        }
        unified
    }
}

impl StatusAggregator {
    /// `sources` pairs a label (used only in logs) with a status store.
    pub fn new(sources: Vec<(String, Store<AdapterStatus>)>) -> Self {
        let reducer = Arc::new(Reducer {
            sources,
            output: Store::new(UnifiedStatus::Disconnected),
            pass: ReentrantMutex::new(()),
        });
        reducer.run();

        let subscriptions = reducer
            .sources
            .iter()
            .map(|(label, store)| {
                let reducer = reducer.clone();
                let label = label.clone();
                store.subscribe(move |status| {
                    debug!(source = %label, status = %status, "Adapter status changed");
                    reducer.run();
                })
            })
            .collect();

        Self {
            reducer,
            _subscriptions: subscriptions,
        }
    }

    pub fn status(&self) -> UnifiedStatus {
        self.reducer.output.get()
    }

    /// The unified status store, for subscribing.
    pub fn store(&self) -> Store<UnifiedStatus> {
        self.reducer.output.clone()
    }

    /// Run the reduction against the latest source values. Idempotent.
    pub fn recompute(&self) -> UnifiedStatus {
        self.reducer.run()
    }
}
