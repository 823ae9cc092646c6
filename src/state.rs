use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::history::HistorySet;
use crate::snapshot::Snapshot;

/// What readers see: the current snapshot together with the history it was recorded into.
///
/// Only the generator writes here, and it updates both halves under one write lock.
#[derive(Debug)]
pub struct ModelState {
    snapshot: Arc<Snapshot>,
    history: HistorySet,
    /// Bumped every time the periodic timer is armed or cancelled
    activation: u64,
}

impl ModelState {
    /// State whose history starts with `initial`
    pub fn new(initial: Arc<Snapshot>) -> Self {
        let mut history = HistorySet::new();
        history.record(&initial);
        Self {
            snapshot: initial,
            history,
            activation: 0,
        }
    }

    pub fn snapshot(&self) -> &Arc<Snapshot> {
        &self.snapshot
    }

    pub fn history(&self) -> &HistorySet {
        &self.history
    }

    pub fn activation(&self) -> u64 {
        self.activation
    }

    pub(crate) fn next_activation(&mut self) -> u64 {
        self.activation += 1;
        self.activation
    }

    pub(crate) fn commit(&mut self, snapshot: Arc<Snapshot>) {
        self.history.record(&snapshot);
        self.snapshot = snapshot;
    }

    pub(crate) fn clear_history(&mut self) {
        self.history.clear();
    }
}

#[derive(Debug, Clone)]
pub struct SharedState(Arc<RwLock<ModelState>>);

impl SharedState {
    pub fn new(initial: Arc<Snapshot>) -> Self {
        Self(Arc::new(RwLock::new(ModelState::new(initial))))
    }

    /// A poisoned lock still holds a consistent state: commits never panic midway
    pub fn read(&self) -> RwLockReadGuard<'_, ModelState> {
        self.0.read().unwrap_or_else(PoisonError::into_inner)
    }

    pub(crate) fn write(&self) -> RwLockWriteGuard<'_, ModelState> {
        self.0.write().unwrap_or_else(PoisonError::into_inner)
    }
}
