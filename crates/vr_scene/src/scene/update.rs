//! Once-per-frame pre-order update pass
//!
//! For every node, parents before children:
//! 1. resolve a dirty local matrix and mark the subtree's world matrices dirty
//! 2. resolve a dirty world matrix
//! 3. resolve pending opacity for the subtree
//! 4. run attached components in attach order
//! 5. upload the world matrix to native if it changed this frame
//! 6. descend into a snapshot of the children
//!
//! Steps 1-3 are repeated after step 4 when a component touched its own
//! entity, so children see the change in the same frame. Each node is visited
//! at most once per pass, even if a component moves it under a node that has
//! not been visited yet.

use std::collections::HashSet;

use crate::foundation::math::to_column_major;
use crate::input::FrameInput;

use super::entity::EntityId;
use super::graph::Scene;

/// Work done by one update pass
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct UpdateStats {
    /// Nodes visited
    pub visited: usize,
    /// Local matrices recomputed
    pub local_updates: usize,
    /// World matrices uploaded, at most one per node
    pub world_updates: usize,
    /// Nodes whose effective opacity was refreshed
    pub opacity_updates: usize,
    /// Component `update` calls
    pub component_updates: usize,
}

impl Scene {
    /// Run the update pass from the active root
    pub fn update(&mut self, frame: &FrameInput) -> UpdateStats {
        self.update_from(self.root, frame)
    }

    /// Run the update pass over the subtree rooted at `start`
    pub fn update_from(&mut self, start: EntityId, frame: &FrameInput) -> UpdateStats {
        let mut stats = UpdateStats::default();
        let mut visited = HashSet::new();

        // (node, parent it was listed under when the snapshot was taken)
        let mut stack = vec![(start, None)];
        while let Some((entity, listed_under)) = stack.pop() {
            let Some(node) = self.nodes.get(entity) else {
                continue;
            };
            if listed_under.is_some() && node.parent != listed_under {
                // Moved elsewhere by a component earlier this frame
                continue;
            }
            if !visited.insert(entity) {
                // Moved under a later node after it already ran
                continue;
            }

            stats.visited += 1;
            let mut world_changed = self.settle(entity, &mut stats);
            if self.dispatch_components(entity, frame, &mut stats) {
                world_changed |= self.settle(entity, &mut stats);
            }
            if world_changed {
                self.upload_world(entity);
                stats.world_updates += 1;
            }

            if let Some(node) = self.nodes.get(entity) {
                stack.extend(node.children.iter().rev().map(|child| (*child, Some(entity))));
            }
        }

        stats
    }

    /// Resolve pending local, world and opacity work for one node
    ///
    /// Returns true if the world matrix was recomputed.
    fn settle(&mut self, entity: EntityId, stats: &mut UpdateStats) -> bool {
        let Some(node) = self.nodes.get_mut(entity) else {
            return false;
        };

        if node.local_dirty {
            node.local_matrix = node.transform.to_matrix();
            node.local_dirty = false;
            stats.local_updates += 1;
            self.invalidate_world(entity);
        }

        let node = &self.nodes[entity];
        let world_changed = node.world_dirty;
        if world_changed {
            let world = match node.parent.and_then(|parent| self.nodes.get(parent)) {
                Some(parent) => parent.world_matrix * node.local_matrix,
                None => node.local_matrix,
            };

            let node = &mut self.nodes[entity];
            node.world_matrix = world;
            node.world_dirty = false;
        }

        if self.nodes[entity].opacity_dirty {
            stats.opacity_updates += self.refresh_opacity(entity);
        }

        world_changed
    }

    fn upload_world(&mut self, entity: EntityId) {
        if let Some(node) = self.nodes.get(entity) {
            self.backend
                .set_world_matrix(node.native, &to_column_major(&node.world_matrix));
        }
    }

    /// Run every component of `entity` once
    ///
    /// Returns true if the node needs settling again.
    fn dispatch_components(
        &mut self,
        entity: EntityId,
        frame: &FrameInput,
        stats: &mut UpdateStats,
    ) -> bool {
        let alive = self.run_components(entity, |component, ctx| {
            component.update(ctx, frame);
            stats.component_updates += 1;
        });

        alive
            && self
                .nodes
                .get(entity)
                .is_some_and(|node| node.local_dirty || node.world_dirty || node.opacity_dirty)
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::rc::Rc;

    use approx::assert_relative_eq;

    use super::*;
    use crate::ecs::{Component, ComponentContext};
    use crate::foundation::math::{Mat4, Quat, Transform, Vec3};
    use crate::native::RecordingBackend;

    fn frame() -> FrameInput {
        FrameInput::new(1, 1.0 / 60.0)
    }

    fn chain(scene: &mut Scene, len: usize) -> Vec<EntityId> {
        let mut ids = vec![scene.root()];
        for _ in 0..len {
            let child = scene.create_entity();
            let parent = ids[ids.len() - 1];
            assert!(scene.add_child(parent, child));
            ids.push(child);
        }
        ids
    }

    fn uploads(scene: &Scene) -> usize {
        scene.backend_as::<RecordingBackend>().unwrap().stats().matrix_uploads
    }

    #[test]
    fn test_world_matrix_matches_direct_composition() {
        let mut scene = Scene::new(RecordingBackend::new());
        let ids = chain(&mut scene, 2);
        let (a, b) = (ids[1], ids[2]);

        scene.set_position(a, Vec3::new(1.0, 2.0, 3.0));
        scene.set_scale(a, Vec3::new(2.0, 2.0, 2.0));
        scene.set_rotation(a, Quat::from_euler_angles(0.3, 0.0, 0.0));
        // Intermediate writes are overwritten before the pass
        scene.set_position(b, Vec3::new(9.0, 9.0, 9.0));
        scene.set_x(b, 0.5);
        scene.set_y(b, -1.0);
        scene.set_z(b, 4.0);
        scene.set_rotation(b, Quat::from_euler_angles(0.0, 1.2, 0.0));
        scene.set_scale_x(b, 3.0);

        scene.update(&frame());

        let parent = Transform {
            position: Vec3::new(1.0, 2.0, 3.0),
            rotation: Quat::from_euler_angles(0.3, 0.0, 0.0),
            scale: Vec3::new(2.0, 2.0, 2.0),
        };
        let child = Transform {
            position: Vec3::new(0.5, -1.0, 4.0),
            rotation: Quat::from_euler_angles(0.0, 1.2, 0.0),
            scale: Vec3::new(3.0, 1.0, 1.0),
        };
        let expected = parent.to_matrix() * child.to_matrix();

        assert_relative_eq!(scene.world_matrix(b).unwrap(), expected, epsilon = 1e-5);
        assert_relative_eq!(
            scene.compute_world_matrix(b).unwrap(),
            expected,
            epsilon = 1e-5
        );

        let handle = scene.native_handle(b).unwrap();
        let pushed = scene
            .backend_as::<RecordingBackend>()
            .and_then(|backend| backend.world_matrix(handle))
            .unwrap();
        assert_eq!(pushed, to_column_major(&expected));
    }

    #[test]
    fn test_parent_change_reaches_untouched_descendants() {
        let mut scene = Scene::new(RecordingBackend::new());
        let ids = chain(&mut scene, 3);
        scene.update(&frame());

        scene.set_position(ids[1], Vec3::new(0.0, 5.0, 0.0));
        let stats = scene.update(&frame());

        assert_eq!(stats.local_updates, 1);
        assert_eq!(stats.world_updates, 3);
        for id in &ids[1..] {
            assert_relative_eq!(scene.world_matrix(*id).unwrap()[(1, 3)], 5.0);
            assert!(!scene.is_world_dirty(*id));
        }
    }

    #[test]
    fn test_second_pass_is_idle() {
        let mut scene = Scene::new(RecordingBackend::new());
        let ids = chain(&mut scene, 3);
        scene.set_position(ids[2], Vec3::new(1.0, 0.0, 0.0));

        let first = scene.update(&frame());
        let before: Vec<Mat4> = ids.iter().map(|id| scene.world_matrix(*id).unwrap()).collect();
        let uploads_after_first = uploads(&scene);

        let second = scene.update(&frame());
        let after: Vec<Mat4> = ids.iter().map(|id| scene.world_matrix(*id).unwrap()).collect();

        assert_eq!(first.world_updates, 4);
        assert_eq!(second.local_updates, 0);
        assert_eq!(second.world_updates, 0);
        assert_eq!(uploads(&scene), uploads_after_first);
        assert_eq!(before, after);
    }

    #[test]
    fn test_orphan_world_is_local() {
        let mut scene = Scene::new(RecordingBackend::new());
        let orphan = scene.create_entity();
        scene.set_position(orphan, Vec3::new(3.0, 0.0, 0.0));

        scene.update_from(orphan, &frame());

        assert_eq!(scene.world_matrix(orphan), scene.local_matrix(orphan));
    }

    #[test]
    fn test_opacity_chain() {
        let mut scene = Scene::new(RecordingBackend::new());
        let ids = chain(&mut scene, 3);
        let (root, a, b, c) = (ids[0], ids[1], ids[2], ids[3]);

        scene.set_opacity(root, 0.5);
        scene.set_opacity(a, 0.8);
        scene.set_opacity(b, 1.0);
        scene.set_opacity(c, 0.5);
        scene.update(&frame());

        assert_relative_eq!(scene.effective_opacity(c).unwrap(), 0.2, epsilon = 1e-6);
    }

    #[test]
    fn test_opacity_after_reparent() {
        let mut scene = Scene::new(RecordingBackend::new());
        let root = scene.root();
        let a = scene.create_entity();
        let b = scene.create_entity();
        let c = scene.create_entity();
        assert!(scene.add_child(root, a));
        assert!(scene.add_child(a, b));

        scene.set_opacity(a, 0.8);
        scene.set_opacity(b, 1.0);
        scene.set_opacity(c, 0.5);
        scene.update(&frame());

        // Attach resolves the new subtree right away
        assert!(scene.add_child(b, c));
        assert_relative_eq!(scene.effective_opacity(c).unwrap(), 0.4, epsilon = 1e-6);

        scene.update(&frame());
        assert_relative_eq!(scene.effective_opacity(c).unwrap(), 0.4, epsilon = 1e-6);
    }

    #[test]
    fn test_opacity_clamped_and_lazy() {
        let mut scene = Scene::new(RecordingBackend::new());
        let ids = chain(&mut scene, 1);
        let a = ids[1];

        scene.set_opacity(a, 1.7);
        assert_relative_eq!(scene.opacity(a).unwrap(), 1.0);

        scene.set_opacity(a, -0.5);
        assert_relative_eq!(scene.opacity(a).unwrap(), 0.0);
        assert_relative_eq!(scene.effective_opacity(a).unwrap(), 1.0);

        scene.update(&frame());
        assert_relative_eq!(scene.effective_opacity(a).unwrap(), 0.0);
    }

    struct Tag {
        name: &'static str,
        log: Rc<RefCell<Vec<&'static str>>>,
    }

    impl Component for Tag {
        fn update(&mut self, _ctx: &mut ComponentContext<'_>, _frame: &FrameInput) {
            self.log.borrow_mut().push(self.name);
        }
    }

    #[test]
    fn test_traversal_is_pre_order() {
        let mut scene = Scene::new(RecordingBackend::new());
        let ids = chain(&mut scene, 2);
        let log = Rc::new(RefCell::new(Vec::new()));

        for (id, name) in ids.iter().zip(["root", "A", "B"]) {
            let tag = Tag { name, log: Rc::clone(&log) };
            assert!(scene.add_component(*id, tag));
        }

        scene.update(&frame());

        assert_eq!(*log.borrow(), vec!["root", "A", "B"]);
    }

    #[test]
    fn test_duplicate_component_keeps_first() {
        let mut scene = Scene::new(RecordingBackend::new());
        let root = scene.root();
        let log = Rc::new(RefCell::new(Vec::new()));

        assert!(scene.add_component(root, Tag { name: "first", log: Rc::clone(&log) }));
        assert!(!scene.add_component(root, Tag { name: "second", log: Rc::clone(&log) }));

        scene.update(&frame());

        assert_eq!(*log.borrow(), vec!["first"]);
        assert_eq!(scene.component::<Tag>(root).map(|tag| tag.name), Some("first"));
        assert_eq!(scene.component_count(root), 1);
    }

    /// Moves its entity every frame
    struct Drift;

    impl Component for Drift {
        fn update(&mut self, ctx: &mut ComponentContext<'_>, frame: &FrameInput) {
            #[allow(clippy::cast_precision_loss)]
            let x = frame.frame_number as f32;
            ctx.set_position(Vec3::new(x, 0.0, 0.0));
        }
    }

    #[test]
    fn test_component_move_reaches_children_same_frame() {
        let mut scene = Scene::new(RecordingBackend::new());
        let ids = chain(&mut scene, 2);
        assert!(scene.add_component(ids[1], Drift));

        scene.update(&FrameInput::new(7, 0.016));

        assert_relative_eq!(scene.world_matrix(ids[2]).unwrap()[(0, 3)], 7.0);
        assert!(!scene.is_local_dirty(ids[1]));
    }

    /// Reparents a sibling under itself on its first update
    struct Adopt(EntityId);

    impl Component for Adopt {
        fn update(&mut self, ctx: &mut ComponentContext<'_>, _frame: &FrameInput) {
            let me = ctx.entity();
            ctx.scene_mut().add_child(me, self.0);
        }
    }

    #[test]
    fn test_moved_child_visited_once() {
        let mut scene = Scene::new(RecordingBackend::new());
        let root = scene.root();
        let a = scene.create_entity();
        let b = scene.create_entity();
        assert!(scene.add_child(root, a));
        assert!(scene.add_child(root, b));
        assert!(scene.add_component(a, Adopt(b)));

        let stats = scene.update(&frame());

        assert_eq!(scene.parent(b), Some(a));
        assert_eq!(stats.visited, 3);
    }

    #[test]
    fn test_node_adopted_after_running_is_not_updated_again() {
        let mut scene = Scene::new(RecordingBackend::new());
        let root = scene.root();
        let a = scene.create_entity();
        let b = scene.create_entity();
        assert!(scene.add_child(root, a));
        assert!(scene.add_child(root, b));
        let log = Rc::new(RefCell::new(Vec::new()));
        assert!(scene.add_component(a, Tag { name: "A", log: Rc::clone(&log) }));
        assert!(scene.add_component(b, Adopt(a)));

        let stats = scene.update(&frame());

        assert_eq!(scene.parent(a), Some(b));
        assert_eq!(*log.borrow(), vec!["A"]);
        assert_eq!(stats.visited, 3);

        scene.update(&frame());
        assert_eq!(*log.borrow(), vec!["A", "A"]);
    }

    #[test]
    fn test_world_uploaded_once_when_component_moves_dirty_node() {
        let mut scene = Scene::new(RecordingBackend::new());
        let ids = chain(&mut scene, 2);
        scene.set_position(ids[1], Vec3::new(0.0, 1.0, 0.0));
        assert!(scene.add_component(ids[1], Drift));

        let stats = scene.update(&FrameInput::new(3, 0.016));

        assert_eq!(stats.world_updates, 3);
        assert_eq!(uploads(&scene), 3);
        assert_relative_eq!(scene.world_matrix(ids[2]).unwrap()[(0, 3)], 3.0);

        let handle = scene.native_handle(ids[1]).unwrap();
        let pushed = scene
            .backend_as::<RecordingBackend>()
            .and_then(|backend| backend.world_matrix(handle))
            .unwrap();
        assert_relative_eq!(pushed[12], 3.0);
    }

    /// Adds a component of its own type to its entity while running
    struct Spawner;

    impl Component for Spawner {
        fn update(&mut self, ctx: &mut ComponentContext<'_>, _frame: &FrameInput) {
            let me = ctx.entity();
            ctx.scene_mut().add_component(me, Drift);
        }
    }

    #[test]
    fn test_components_added_during_update_are_kept() {
        let mut scene = Scene::new(RecordingBackend::new());
        let root = scene.root();
        assert!(scene.add_component(root, Spawner));

        scene.update(&frame());

        assert!(scene.has_component::<Spawner>(root));
        assert!(scene.has_component::<Drift>(root));
    }
}
