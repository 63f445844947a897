//! Runtime subsystem.
//!
//! # Data Flow
//! ```text
//! App::new(location, document)
//!     → register definitions / mount instances
//!     → App::init (subscribe to location, first broadcast)
//!     → App::run or App::process_pending
//!         navigation event → update_all → every instance: hook, update_ui
//!         interaction      → dispatch   → state writes → update_ui
//! ```
//!
//! # Design Decisions
//! - Everything runs on one thread; the app is not `Send`
//! - Unmounting is explicit; an unmounted instance gets no further broadcasts

pub mod app;
pub mod event_loop;

pub use app::{App, AppError};
pub use event_loop::Interaction;
