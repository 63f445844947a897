//! Shared utilities for integration tests.

use hashview::routing::MemoryLocation;
use hashview::surface::MemoryDocument;
use hashview::App;

/// An app over in-memory location and document, plus handles to both.
pub struct Harness {
    pub app: App,
    pub location: MemoryLocation,
    pub document: MemoryDocument,
}

impl Harness {
    pub fn new(initial_hash: &str, surfaces: &[&str]) -> Self {
        let location = MemoryLocation::new(initial_hash);
        let document = MemoryDocument::with_surfaces(surfaces.iter().copied());
        let app = App::new(location.clone(), document.clone());
        Self {
            app,
            location,
            document,
        }
    }

    /// Compile `source` and register all of its components.
    pub fn define(&mut self, source: &str) {
        let program = self.app.compile(source).expect("template compiles");
        for component in program.components {
            self.app.register_definition(component);
        }
    }

    pub fn content(&self, surface: &str) -> String {
        self.document.content(surface).unwrap_or_default()
    }

    pub fn visible(&self, surface: &str) -> bool {
        self.document.is_visible(surface).unwrap_or(false)
    }

    #[allow(dead_code)]
    pub fn writes(&self, surface: &str) -> usize {
        self.document
            .record(surface)
            .map(|r| r.content_writes)
            .unwrap_or_default()
    }

    #[allow(dead_code)]
    pub fn visibility_updates(&self, surface: &str) -> usize {
        self.document
            .record(surface)
            .map(|r| r.visibility_updates)
            .unwrap_or_default()
    }
}
