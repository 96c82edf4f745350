//! Subtree propagation of world dirtiness, visibility and opacity

use super::entity::EntityId;
use super::graph::Scene;

impl Scene {
    /// Mark the world matrix of `entity` and all its descendants dirty
    pub(crate) fn invalidate_world(&mut self, entity: EntityId) {
        for id in self.subtree(entity) {
            self.nodes[id].world_dirty = true;
        }
    }

    /// Recompute `shown` for the subtree
    ///
    /// Only nodes whose shown state changed are pushed to native; native
    /// entities start out visible, matching a fresh node.
    pub(crate) fn refresh_visibility(&mut self, entity: EntityId) {
        for id in self.subtree(entity) {
            let parent_shown = self.nodes[id]
                .parent
                .and_then(|parent| self.nodes.get(parent))
                .map_or(true, |parent| parent.shown);

            let node = &mut self.nodes[id];
            let shown = node.visible && parent_shown;
            if node.shown != shown {
                node.shown = shown;
                self.backend.set_visible(node.native, shown);
            }
        }
    }

    /// Recompute effective opacity for the subtree and notify components
    ///
    /// The subtree root inherits from the ancestors' own opacities, so writes
    /// still pending on an ancestor are already honored. Clears the pending
    /// opacity flag of every node visited. Returns the number of nodes
    /// refreshed.
    pub(crate) fn refresh_opacity(&mut self, entity: EntityId) -> usize {
        let inherited = self.parent(entity).map_or(1.0, |parent| self.live_opacity(parent));
        let order = self.subtree(entity);
        let Self { nodes, backend, .. } = self;

        for id in &order {
            let parent_opacity = if *id == entity {
                inherited
            } else {
                nodes[*id]
                    .parent
                    .and_then(|parent| nodes.get(parent))
                    .map_or(1.0, |parent| parent.effective_opacity)
            };

            let node = &mut nodes[*id];
            node.effective_opacity = node.opacity * parent_opacity;
            node.opacity_dirty = false;

            let opacity = node.effective_opacity;
            for component in node.components.iter_mut() {
                component.opacity_changed(opacity, &mut **backend);
            }
        }

        order.len()
    }

    /// Own opacity of `entity` times that of each ancestor, ignoring cached values
    pub(crate) fn live_opacity(&self, entity: EntityId) -> f32 {
        let mut opacity = 1.0;
        let mut current = Some(entity);
        while let Some(id) = current {
            let Some(node) = self.nodes.get(id) else {
                break;
            };
            opacity *= node.opacity;
            current = node.parent;
        }
        opacity
    }
}
