//! Mount surfaces.
//!
//! # Responsibilities
//! - Abstract the host element a component instance renders into
//! - Resolve surfaces by identifier from a document
//!
//! # Design Decisions
//! - Two operations are all the runtime needs: show/hide and full content
//!   replacement
//! - `memory` provides an in-process document used by the CLI and tests

pub mod memory;

pub use memory::{MemoryDocument, MemorySurface, SurfaceRecord};

/// A host element owned by one mounted instance.
pub trait Surface {
    fn id(&self) -> &str;

    fn set_visible(&mut self, visible: bool);

    /// Replace the entire content with `markup`.
    fn replace_content(&mut self, markup: &str);
}

/// Source of surfaces, looked up by identifier.
pub trait Document {
    fn surface(&self, id: &str) -> Option<Box<dyn Surface>>;
}
