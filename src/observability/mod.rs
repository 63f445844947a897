//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! All subsystems produce:
//!     → tracing events with structured fields (instance, component, fragment)
//!     → metrics.rs counters (renders, route changes, compile failures, dispatches)
//!
//! Consumers:
//!     → logging.rs subscriber (stderr, pretty or JSON)
//!     → whichever metrics recorder the embedding program installs
//! ```
//!
//! # Design Decisions
//! - Structured logging (JSON) for machine parsing
//! - Metrics are cheap and no-ops without a recorder
//! - The library never installs a subscriber itself; the binary does

pub mod logging;
pub mod metrics;
