use std::sync::{Mutex, MutexGuard, PoisonError};

/// A state machine phase that can be "in flight" (waiting on the network).
pub(crate) trait Phase: Clone + Default {
    fn is_in_flight(&self) -> bool;
}

pub(crate) fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Single-owner state cell allowing at most one run at a time.
///
/// The lock is only held for a transition, never across an `.await`.
#[derive(Debug, Default)]
pub(crate) struct StateCell<S> {
    state: Mutex<S>,
}

impl<S: Phase> StateCell<S> {
    pub(crate) fn get(&self) -> S {
        lock(&self.state).clone()
    }

    pub(crate) fn set(&self, next: S) {
        *lock(&self.state) = next;
    }

    /// Enter `first` unless a run is already in flight.
    pub(crate) fn begin(&self, first: S) -> Option<Run<'_, S>> {
        let mut state = lock(&self.state);
        if state.is_in_flight() {
            return None;
        }
        *state = first;
        Some(Run { cell: self })
    }
}

/// An in-flight run. Dropping it without `finish` (early return, dropped
/// future) puts the cell back to its idle phase.
pub(crate) struct Run<'a, S: Phase> {
    cell: &'a StateCell<S>,
}

impl<S: Phase> Run<'_, S> {
    pub(crate) fn advance(&self, next: S) {
        self.cell.set(next);
    }

    pub(crate) fn finish(self, terminal: S) {
        self.cell.set(terminal);
    }
}

impl<S: Phase> Drop for Run<'_, S> {
    fn drop(&mut self) {
        let mut state = lock(&self.cell.state);
        if state.is_in_flight() {
            *state = S::default();
        }
    }
}
