//! Routing subsystem.
//!
//! # Data Flow
//! ```text
//! Raw input ("about", "#about", "/about", "")
//!     → fragment.rs (normalize to "#/about")
//!     → matcher.rs (RouteSpec: absent | literal | predicate)
//!     → bool: is the instance visible?
//!
//! Navigation:
//!     router.rs navigate(target)
//!         same as ambient  → Navigation::Refresh (caller broadcasts now)
//!         different        → location.rs set_hash → NavigationEvent
//!                            → caller broadcasts once per event
//! ```
//!
//! # Design Decisions
//! - Every fragment handled internally is canonical
//! - Exact path equality for literal routes (no prefixes, no params)
//! - One current fragment per application context, no process globals

pub mod fragment;
pub mod location;
pub mod matcher;
pub mod router;

pub use fragment::{normalize, path_from_fragment, Fragment};
pub use location::{Location, MemoryLocation, NavigationEvent};
pub use matcher::{match_route, Matcher, Predicate, RouteSpec};
pub use router::{Navigation, Router};
