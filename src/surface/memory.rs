//! In-memory document.
//!
//! Surfaces are shared handles into one table, so the document can be
//! inspected after the runtime has taken ownership of its surfaces. The
//! write counters let callers observe how often content was replaced.

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::rc::Rc;

use serde::Serialize;

use crate::surface::{Document, Surface};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SurfaceRecord {
    pub visible: bool,
    pub content: String,
    pub visibility_updates: usize,
    pub content_writes: usize,
}

type Table = Rc<RefCell<BTreeMap<String, SurfaceRecord>>>;

#[derive(Debug, Clone, Default)]
pub struct MemoryDocument {
    surfaces: Table,
}

impl MemoryDocument {
    pub fn new() -> Self {
        Self::default()
    }

    /// Document with the given surfaces, initially visible and empty.
    pub fn with_surfaces<I, S>(ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let document = Self::new();
        for id in ids {
            document.add_surface(id);
        }
        document
    }

    pub fn add_surface(&self, id: impl Into<String>) {
        self.surfaces.borrow_mut().insert(
            id.into(),
            SurfaceRecord {
                visible: true,
                ..SurfaceRecord::default()
            },
        );
    }

    pub fn record(&self, id: &str) -> Option<SurfaceRecord> {
        self.surfaces.borrow().get(id).cloned()
    }

    pub fn content(&self, id: &str) -> Option<String> {
        self.surfaces.borrow().get(id).map(|r| r.content.clone())
    }

    pub fn is_visible(&self, id: &str) -> Option<bool> {
        self.surfaces.borrow().get(id).map(|r| r.visible)
    }

    pub fn snapshot(&self) -> BTreeMap<String, SurfaceRecord> {
        self.surfaces.borrow().clone()
    }
}

impl Document for MemoryDocument {
    fn surface(&self, id: &str) -> Option<Box<dyn Surface>> {
        if !self.surfaces.borrow().contains_key(id) {
            return None;
        }
        Some(Box::new(MemorySurface {
            id: id.to_string(),
            table: Rc::clone(&self.surfaces),
        }))
    }
}

#[derive(Debug, Clone)]
pub struct MemorySurface {
    id: String,
    table: Table,
}

impl MemorySurface {
    fn with_record(&self, f: impl FnOnce(&mut SurfaceRecord)) {
        if let Some(record) = self.table.borrow_mut().get_mut(&self.id) {
            f(record);
        }
    }
}

impl Surface for MemorySurface {
    fn id(&self) -> &str {
        &self.id
    }

    fn set_visible(&mut self, visible: bool) {
        self.with_record(|r| {
            r.visible = visible;
            r.visibility_updates += 1;
        });
    }

    fn replace_content(&mut self, markup: &str) {
        self.with_record(|r| {
            r.content = markup.to_string();
            r.content_writes += 1;
        });
    }
}
