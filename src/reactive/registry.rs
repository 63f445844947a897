//! Registry of live component instances.
//!
//! Iteration follows registration order. Identifiers are never reused, so a
//! stale [`InstanceId`] simply stops resolving after `remove`.

use crate::reactive::instance::{ComponentInstance, InstanceId};

#[derive(Debug, Default)]
pub struct Registry {
    instances: Vec<ComponentInstance>,
    next_id: u64,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn allocate_id(&mut self) -> InstanceId {
        self.next_id += 1;
        InstanceId(self.next_id)
    }

    pub fn register(&mut self, instance: ComponentInstance) -> InstanceId {
        let id = instance.id();
        self.instances.push(instance);
        id
    }

    pub fn remove(&mut self, id: InstanceId) -> Option<ComponentInstance> {
        let position = self.instances.iter().position(|i| i.id() == id)?;
        Some(self.instances.remove(position))
    }

    pub fn get(&self, id: InstanceId) -> Option<&ComponentInstance> {
        self.instances.iter().find(|i| i.id() == id)
    }

    pub fn get_mut(&mut self, id: InstanceId) -> Option<&mut ComponentInstance> {
        self.instances.iter_mut().find(|i| i.id() == id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &ComponentInstance> {
        self.instances.iter()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut ComponentInstance> {
        self.instances.iter_mut()
    }

    pub fn ids(&self) -> Vec<InstanceId> {
        self.instances.iter().map(ComponentInstance::id).collect()
    }

    pub fn len(&self) -> usize {
        self.instances.len()
    }

    pub fn is_empty(&self) -> bool {
        self.instances.is_empty()
    }
}
