//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML)
//!     → loader.rs (parse & deserialize)
//!     → validation.rs (semantic checks)
//!     → AppConfig (validated, immutable)
//!     → CLI builds the location, render options and logging from it
//!
//! While watching (hashview watch):
//!     watcher.rs detects a template source change
//!     → CLI recompiles and re-renders
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded; changes require full reload
//! - All fields have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks

pub mod loader;
pub mod schema;
pub mod validation;
pub mod watcher;

pub use loader::{load_config, parse_config, ConfigError};
pub use schema::{
    AppConfig, LoaderConfig, LogFormat, ObservabilityConfig, RenderConfig, RouterConfig,
    WatchConfig,
};
pub use watcher::SourceWatcher;
