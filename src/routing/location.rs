//! Ambient navigation state.
//!
//! # Responsibilities
//! - Hold the current raw hash and the back-navigation history
//! - Emit a change notification when the hash actually changes
//! - Accept external (non-fragment) destinations
//!
//! # Design Decisions
//! - Setting the hash to its current value emits nothing, like a browser;
//!   the router special-cases that when it needs a refresh
//! - Notifications travel over unbounded tokio channels so the event loop
//!   can await them and tests can drain them synchronously

use std::cell::RefCell;
use std::rc::Rc;

use tokio::sync::mpsc;

/// A change of the ambient hash.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NavigationEvent {
    pub old: String,
    pub new: String,
}

/// Source of truth for the current navigation state.
pub trait Location {
    /// The raw current hash (not necessarily normalized).
    fn hash(&self) -> String;

    /// Replace the hash. Emits a [`NavigationEvent`] only if the value changed.
    fn set_hash(&mut self, hash: &str);

    /// Whether [`Location::back`] has an entry to return to.
    fn has_history(&self) -> bool;

    /// Return to the previous hash.
    fn back(&mut self);

    /// Leave for a destination outside the fragment space.
    fn assign(&mut self, destination: &str);

    /// Register a channel for change notifications.
    fn subscribe(&mut self, tx: mpsc::UnboundedSender<NavigationEvent>);
}

#[derive(Debug, Default)]
struct LocationState {
    hash: String,
    history: Vec<String>,
    external: Vec<String>,
    listeners: Vec<mpsc::UnboundedSender<NavigationEvent>>,
}

impl LocationState {
    fn change(&mut self, new: String) {
        let old = std::mem::replace(&mut self.hash, new.clone());
        tracing::trace!(old = %old, new = %new, "Hash changed");
        let event = NavigationEvent { old, new };
        self.listeners.retain(|tx| tx.send(event.clone()).is_ok());
    }
}

/// In-process [`Location`].
///
/// Cloning yields another handle to the same state, so a test or the CLI can
/// keep one handle while the router owns the other.
#[derive(Debug, Clone, Default)]
pub struct MemoryLocation {
    inner: Rc<RefCell<LocationState>>,
}

impl MemoryLocation {
    pub fn new(initial_hash: &str) -> Self {
        let state = LocationState {
            hash: initial_hash.to_string(),
            ..Default::default()
        };
        Self {
            inner: Rc::new(RefCell::new(state)),
        }
    }

    /// Destinations passed to [`Location::assign`], oldest first.
    pub fn external_destinations(&self) -> Vec<String> {
        self.inner.borrow().external.clone()
    }

    pub fn history_len(&self) -> usize {
        self.inner.borrow().history.len()
    }
}

impl Location for MemoryLocation {
    fn hash(&self) -> String {
        self.inner.borrow().hash.clone()
    }

    fn set_hash(&mut self, hash: &str) {
        let mut state = self.inner.borrow_mut();
        if state.hash == hash {
            return;
        }
        let previous = state.hash.clone();
        state.history.push(previous);
        state.change(hash.to_string());
    }

    fn has_history(&self) -> bool {
        !self.inner.borrow().history.is_empty()
    }

    fn back(&mut self) {
        let mut state = self.inner.borrow_mut();
        if let Some(previous) = state.history.pop() {
            if previous != state.hash {
                state.change(previous);
            }
        }
    }

    fn assign(&mut self, destination: &str) {
        tracing::info!(destination = %destination, "Leaving for external destination");
        self.inner.borrow_mut().external.push(destination.to_string());
    }

    fn subscribe(&mut self, tx: mpsc::UnboundedSender<NavigationEvent>) {
        self.inner.borrow_mut().listeners.push(tx);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identical_hash_emits_nothing() {
        let mut location = MemoryLocation::new("#/a");
        let (tx, mut rx) = mpsc::unbounded_channel();
        location.subscribe(tx);

        location.set_hash("#/a");
        assert!(rx.try_recv().is_err());
        assert!(!location.has_history());
    }

    #[test]
    fn test_change_emits_once_and_records_history() {
        let mut location = MemoryLocation::new("#/a");
        let (tx, mut rx) = mpsc::unbounded_channel();
        location.subscribe(tx);

        location.set_hash("#/b");
        let event = rx.try_recv().unwrap();
        assert_eq!(event.old, "#/a");
        assert_eq!(event.new, "#/b");
        assert!(rx.try_recv().is_err());
        assert_eq!(location.history_len(), 1);
    }

    #[test]
    fn test_back_restores_previous_hash() {
        let mut location = MemoryLocation::new("");
        location.set_hash("#/one");
        location.set_hash("#/two");
        location.back();
        assert_eq!(location.hash(), "#/one");
        location.back();
        assert_eq!(location.hash(), "");
        assert!(!location.has_history());
    }

    #[test]
    fn test_assign_records_external_destination() {
        let mut location = MemoryLocation::new("#/");
        location.assign("https://example.com/");
        assert_eq!(location.external_destinations(), vec!["https://example.com/"]);
        assert_eq!(location.hash(), "#/");
    }
}
