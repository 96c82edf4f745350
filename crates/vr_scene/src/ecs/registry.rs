//! Type-indexed component storage for a single entity
//!
//! At most one instance per concrete type. Lookup is by exact type: asking
//! for a trait or a wrapper type never finds a component stored under a
//! different concrete type.

use std::any::TypeId;
use std::collections::HashMap;

use super::component::Component;

/// Components attached to one entity, in attach order
#[derive(Default)]
pub struct ComponentRegistry {
    entries: Vec<(TypeId, Box<dyn Component>)>,
    index: HashMap<TypeId, usize>,
}

impl ComponentRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of attached components
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether no component is attached
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Whether a component of exactly type `T` is attached
    pub fn contains<T: Component>(&self) -> bool {
        self.contains_type(TypeId::of::<T>())
    }

    /// Whether a component with the given type id is attached
    pub fn contains_type(&self, type_id: TypeId) -> bool {
        self.index.contains_key(&type_id)
    }

    /// Borrow the component of type `T`
    pub fn get<T: Component>(&self) -> Option<&T> {
        let slot = *self.index.get(&TypeId::of::<T>())?;
        let component: &dyn Component = &*self.entries[slot].1;
        component.as_any().downcast_ref::<T>()
    }

    /// Mutably borrow the component of type `T`
    pub fn get_mut<T: Component>(&mut self) -> Option<&mut T> {
        let slot = *self.index.get(&TypeId::of::<T>())?;
        let component: &mut dyn Component = &mut *self.entries[slot].1;
        component.as_any_mut().downcast_mut::<T>()
    }

    /// Insert a boxed component under its concrete type id
    ///
    /// Hands the component back if that type is already present.
    pub(crate) fn insert(
        &mut self,
        type_id: TypeId,
        component: Box<dyn Component>,
    ) -> Result<(), Box<dyn Component>> {
        if self.contains_type(type_id) {
            return Err(component);
        }
        self.index.insert(type_id, self.entries.len());
        self.entries.push((type_id, component));
        Ok(())
    }

    /// Remove the component with the given type id
    pub(crate) fn remove(&mut self, type_id: TypeId) -> Option<Box<dyn Component>> {
        let slot = self.index.remove(&type_id)?;
        let (_, component) = self.entries.remove(slot);
        self.reindex();
        Some(component)
    }

    /// Remove every component, in attach order
    pub(crate) fn drain(&mut self) -> Vec<Box<dyn Component>> {
        self.index.clear();
        self.entries.drain(..).map(|(_, component)| component).collect()
    }

    /// Type ids in attach order
    pub fn type_ids(&self) -> impl Iterator<Item = TypeId> + '_ {
        self.entries.iter().map(|(type_id, _)| *type_id)
    }

    /// Iterate components mutably, in attach order
    pub(crate) fn iter_mut(&mut self) -> impl Iterator<Item = &mut Box<dyn Component>> {
        self.entries.iter_mut().map(|(_, component)| component)
    }

    /// Move components from `other` into `self`
    ///
    /// Returns the components of `other` whose type was already present.
    pub(crate) fn merge(&mut self, mut other: ComponentRegistry) -> Vec<Box<dyn Component>> {
        let mut rejected = Vec::new();
        for (type_id, component) in other.entries.drain(..) {
            if let Err(component) = self.insert(type_id, component) {
                rejected.push(component);
            }
        }
        rejected
    }

    fn reindex(&mut self) {
        self.index = self
            .entries
            .iter()
            .enumerate()
            .map(|(slot, (type_id, _))| (*type_id, slot))
            .collect();
    }
}
