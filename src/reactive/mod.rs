//! Reactive component subsystem.
//!
//! # Data Flow
//! ```text
//! ComponentDecl (compiler)
//!     → instance.rs: ComponentInstance::new evaluates state initializers
//!     → registry.rs: registered in mount order
//!
//! State write (set / update / handler action):
//!     → state.rs stores the value
//!     → instance.rs update_ui
//!         route does not match → surface hidden
//!         route matches        → surface shown
//!                              → render.rs: view + state → markup + handlers
//!                              → surface content replaced
//!
//! Interaction (handler index) → dispatch.rs → actions → writes above
//! ```
//!
//! # Design Decisions
//! - Single-threaded: instances are owned by the runtime and mutated in place
//! - Values are JSON values; display and truthiness follow value.rs
//! - Writing a key always triggers exactly one UI update, even if the value
//!   did not change

pub mod dispatch;
pub mod instance;
pub mod registry;
pub mod render;
pub mod state;
pub mod value;

pub use dispatch::{DispatchError, IgnoreScripts, ScriptHost};
pub use instance::{ComponentInstance, InitError, InstanceId, RouteHook};
pub use registry::Registry;
pub use render::{render, HandlerBinding, RenderError, RenderOptions, Rendered};
pub use state::State;
