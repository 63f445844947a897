//! hashview: a template compiler, reactive component state and a
//! hash-fragment router for micro front-ends.
//!
//! # Architecture Overview
//!
//! ```text
//!   page markup ──► loader ──► compiler ──► ComponentDecl (instruction tree)
//!                                                │
//!                                                ▼
//!   Location ──► routing::Router ◄──── runtime::App ───► reactive::Registry
//!   (hash)         current fragment        │                 │
//!                                          │                 ▼
//!                                          │          ComponentInstance
//!                                          │           state ─► render ─► Surface
//!                                          ▼
//!                                     store::Store (optional shared values)
//! ```

// Core subsystems
pub mod compiler;
pub mod reactive;
pub mod routing;
pub mod runtime;

// Collaborators
pub mod loader;
pub mod store;
pub mod surface;

// Cross-cutting concerns
pub mod config;
pub mod lifecycle;
pub mod observability;

pub use compiler::{compile, Compiler};
pub use config::AppConfig;
pub use lifecycle::Shutdown;
pub use runtime::{App, Interaction};
