//! Template loading subsystem.
//!
//! # Data Flow
//! ```text
//! Page markup
//!     → discovery.rs: <script type="text/hashview" data-mount="ID"> bodies
//!     → bootstrap.rs: compile → register definitions → instantiate first
//!       component → mount on ID
//!     → LoadReport { mounted, failures }
//! ```
//!
//! # Design Decisions
//! - A failing source aborts only itself
//! - A source without `data-mount` targets the configured default surface

pub mod bootstrap;
pub mod discovery;

pub use bootstrap::{bootstrap, LoadError, LoadFailure, LoadReport, Mounted};
pub use discovery::{discover_template_sources, TemplateSource};
