//! Root activation hooks and component dispatch
//!
//! A scene starts rendering once, usually on the first frame. From then on,
//! every root switch stops the old root and starts the new one. Hooks are
//! delivered to the components of the root entity only.

use std::mem;

use crate::ecs::{Component, ComponentContext, ComponentRegistry};

use super::entity::EntityId;
use super::graph::Scene;

impl Scene {
    /// Start rendering the active root
    ///
    /// Fires [`Component::on_scene_init`] (first activation of this root only)
    /// and then [`Component::on_start_rendering`] on the root's components.
    /// Does nothing if the scene is already rendering.
    pub fn start_rendering(&mut self) {
        if self.rendering {
            return;
        }
        self.rendering = true;
        self.activate(self.root);
    }

    /// Stop rendering the active root
    ///
    /// Fires [`Component::on_stop_rendering`] on the root's components. Does
    /// nothing if the scene is not rendering.
    pub fn stop_rendering(&mut self) {
        if !self.rendering {
            return;
        }
        self.rendering = false;
        self.deactivate(self.root);
    }

    /// Whether root hooks are live
    pub fn is_rendering(&self) -> bool {
        self.rendering
    }

    pub(crate) fn activate(&mut self, root: EntityId) {
        let first_time = self
            .nodes
            .get_mut(root)
            .is_some_and(|node| !mem::replace(&mut node.initialized, true));

        if first_time {
            log::debug!("Initializing scene root {:?}", root);
            self.run_components(root, |component, ctx| component.on_scene_init(ctx));
        }
        self.run_components(root, |component, ctx| component.on_start_rendering(ctx));
    }

    pub(crate) fn deactivate(&mut self, root: EntityId) {
        self.run_components(root, |component, ctx| component.on_stop_rendering(ctx));
    }

    /// Call `f` on every component of `entity`, in attach order
    ///
    /// The registry is moved out of the node while `f` runs so components can
    /// borrow the scene mutably. Components attached meanwhile are merged in
    /// afterwards; a duplicate type is detached. Returns false if the entity
    /// no longer exists.
    pub(crate) fn run_components(
        &mut self,
        entity: EntityId,
        mut f: impl FnMut(&mut dyn Component, &mut ComponentContext<'_>),
    ) -> bool {
        let mut running = match self.nodes.get_mut(entity) {
            Some(node) if !node.components.is_empty() => mem::take(&mut node.components),
            Some(_) => return true,
            None => return false,
        };

        for component in running.iter_mut() {
            let mut ctx = ComponentContext::new(self, entity);
            f(&mut **component, &mut ctx);
        }

        let Some(node) = self.nodes.get_mut(entity) else {
            // A component destroyed its own entity
            for mut component in running.drain() {
                component.on_detach(&mut ComponentContext::new(self, entity));
            }
            return false;
        };

        let added: ComponentRegistry = mem::replace(&mut node.components, running);
        let rejected = node.components.merge(added);
        for mut component in rejected {
            component.on_detach(&mut ComponentContext::new(self, entity));
        }
        true
    }
}
