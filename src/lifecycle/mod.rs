//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Shutdown (shutdown.rs):
//!     Ctrl-C or caller trigger → broadcast → App::run leaves its loop
//!     → watchers dropped → exit
//! ```
//!
//! # Design Decisions
//! - One broadcast channel; every long-running loop subscribes before
//!   starting
//! - A trigger with no subscribers is not an error

pub mod shutdown;

pub use shutdown::Shutdown;
