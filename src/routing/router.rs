//! Current-fragment tracking and navigation decisions.
//!
//! # Responsibilities
//! - Hold the single current fragment
//! - Recompute it from the ambient [`Location`]
//! - Decide whether a navigation needs a forced broadcast
//!
//! # Design Decisions
//! - The current fragment changes only through [`Router::refresh`]
//! - Broadcasting to instances is the application context's job; the router
//!   only reports which kind of navigation happened

use tokio::sync::mpsc;

use crate::routing::fragment::Fragment;
use crate::routing::location::{Location, NavigationEvent};
use crate::routing::matcher::{Matcher, RouteSpec};

/// Outcome of [`Router::navigate`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Navigation {
    /// Target equals the ambient fragment; no notification will fire, so the
    /// caller must broadcast directly.
    Refresh,
    /// The ambient hash was changed; exactly one notification is on its way.
    Pending,
}

pub struct Router {
    current: Fragment,
    location: Box<dyn Location>,
}

impl Router {
    pub fn new(location: Box<dyn Location>) -> Self {
        let current = Fragment::normalize(&location.hash());
        Self { current, location }
    }

    pub fn current_fragment(&self) -> &Fragment {
        &self.current
    }

    /// Recompute the current fragment from the ambient hash.
    pub fn refresh(&mut self) -> &Fragment {
        self.current = Fragment::normalize(&self.location.hash());
        &self.current
    }

    pub fn matches(&self, spec: &RouteSpec) -> bool {
        spec.matches(&self.current)
    }

    /// Subscribe to ambient hash changes.
    pub fn subscribe(&mut self) -> mpsc::UnboundedReceiver<NavigationEvent> {
        let (tx, rx) = mpsc::unbounded_channel();
        self.location.subscribe(tx);
        rx
    }

    pub fn navigate(&mut self, input: &str) -> Navigation {
        let target = Fragment::normalize(input);
        let ambient = Fragment::normalize(&self.location.hash());
        if target == ambient {
            tracing::debug!(fragment = %target, "Re-navigating to current fragment");
            Navigation::Refresh
        } else {
            tracing::debug!(from = %ambient, to = %target, "Navigating");
            self.location.set_hash(target.as_str());
            Navigation::Pending
        }
    }

    pub fn location(&self) -> &dyn Location {
        self.location.as_ref()
    }

    pub fn location_mut(&mut self) -> &mut dyn Location {
        self.location.as_mut()
    }
}

impl std::fmt::Debug for Router {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Router")
            .field("current", &self.current)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::routing::location::MemoryLocation;

    #[test]
    fn test_initial_fragment_is_normalized() {
        let router = Router::new(Box::new(MemoryLocation::new("about")));
        assert_eq!(router.current_fragment().as_str(), "#/about");

        let router = Router::new(Box::new(MemoryLocation::new("")));
        assert!(router.current_fragment().is_root());
    }

    #[test]
    fn test_navigate_to_same_fragment_requests_refresh() {
        let location = MemoryLocation::new("#/x");
        let mut router = Router::new(Box::new(location.clone()));
        let mut rx = router.subscribe();

        assert_eq!(router.navigate("x"), Navigation::Refresh);
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn test_navigate_changes_ambient_hash_only() {
        let location = MemoryLocation::new("#/");
        let mut router = Router::new(Box::new(location.clone()));
        let mut rx = router.subscribe();

        assert_eq!(router.navigate("x"), Navigation::Pending);
        assert_eq!(location.hash(), "#/x");
        // Current fragment moves only on refresh
        assert!(router.current_fragment().is_root());
        assert!(rx.try_recv().is_ok());

        router.refresh();
        assert_eq!(router.current_fragment().as_str(), "#/x");
    }
}
