//! Per-instance state map.
//!
//! `State` itself never renders. Reactive writes go through the owning
//! [`ComponentInstance`](crate::reactive::ComponentInstance), which stores the
//! value and then re-renders.

use serde::Serialize;
use serde_json::{Map, Value};

use crate::compiler::Scope;

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct State {
    values: Map<String, Value>,
}

impl State {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.values.get(key)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.values.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn snapshot(&self) -> Map<String, Value> {
        self.values.clone()
    }

    /// Store a value without rendering.
    ///
    /// Only meaningful where a render is already guaranteed to follow, such
    /// as inside a route-change hook.
    pub fn stage(&mut self, key: impl Into<String>, value: Value) -> Option<Value> {
        self.values.insert(key.into(), value)
    }
}

impl Scope for State {
    fn lookup(&self, name: &str) -> Option<Value> {
        self.values.get(name).cloned()
    }
}
