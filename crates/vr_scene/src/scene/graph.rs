//! The scene graph
//!
//! [`Scene`] owns every entity, the component registries and the native
//! backend. All mutation goes through it; entities are addressed by
//! [`EntityId`].
//!
//! Propagation rules:
//! - position/rotation/scale writes only set a dirty flag; matrices are
//!   recomputed by the next [`Scene::update`] pass
//! - opacity writes set a flag resolved by the next pass, except when a child
//!   is attached, which resolves its subtree immediately
//! - visibility writes are resolved and pushed to native immediately
//!
//! `Scene` is intentionally `!Send`: the tree belongs to the frame thread.
//! Other threads reach it through [`crate::driver::TaskSender`].

use std::any::TypeId;

use slotmap::SlotMap;

use crate::core::{SceneConfig, SceneError};
use crate::ecs::components::{AnimatorComponent, GeometryComponent, SurfaceRendererComponent};
use crate::ecs::{AsAny, Component, ComponentContext};
use crate::foundation::math::{is_finite_vec3, Mat4, Quat, Transform, Vec3};
use crate::native::{NativeBackend, NativeHandle};

use super::entity::{hash_id, EntityId, EntityNode};

/// Tree of entities plus the native backend they render through
pub struct Scene {
    pub(crate) nodes: SlotMap<EntityId, EntityNode>,
    pub(crate) root: EntityId,
    pub(crate) backend: Box<dyn NativeBackend>,
    /// Root hooks have fired and the scene is being rendered
    pub(crate) rendering: bool,
    validate_transforms: bool,
}

impl Scene {
    /// Create a scene with an empty root entity
    pub fn new(backend: impl NativeBackend + 'static) -> Self {
        Self::with_config(backend, &SceneConfig::default())
    }

    /// Create a scene using the given configuration
    pub fn with_config(backend: impl NativeBackend + 'static, config: &SceneConfig) -> Self {
        let mut backend: Box<dyn NativeBackend> = Box::new(backend);
        let mut nodes = SlotMap::with_key();

        let mut root_node = EntityNode::new(backend.create_entity());
        root_node.in_scene = true;
        let root = nodes.insert(root_node);

        Self {
            nodes,
            root,
            backend,
            rendering: false,
            validate_transforms: config.validate_transforms,
        }
    }

    // ------------------------------------------------------------------
    // Backend
    // ------------------------------------------------------------------

    /// The native backend
    pub fn backend(&self) -> &dyn NativeBackend {
        self.backend.as_ref()
    }

    /// The native backend, mutably
    pub fn backend_mut(&mut self) -> &mut dyn NativeBackend {
        self.backend.as_mut()
    }

    /// The native backend as its concrete type
    pub fn backend_as<B: NativeBackend + 'static>(&self) -> Option<&B> {
        NativeBackend::as_any(self.backend.as_ref()).downcast_ref::<B>()
    }

    // ------------------------------------------------------------------
    // Entity lifetime
    // ------------------------------------------------------------------

    /// The entity the frame pass starts from
    pub fn root(&self) -> EntityId {
        self.root
    }

    /// Switch the active root
    ///
    /// The previous root and its subtree leave the scene but are not
    /// destroyed, so they can be switched back in later. While the scene is
    /// rendering, the previous root's components get
    /// [`Component::on_stop_rendering`] and the new root's components get
    /// [`Component::on_start_rendering`].
    pub fn set_root(&mut self, root: EntityId) -> Result<(), SceneError> {
        let node = self.nodes.get(root).ok_or(SceneError::EntityNotFound(root))?;
        if node.parent.is_some() {
            return Err(SceneError::RootHasParent(root));
        }
        if root == self.root {
            return Ok(());
        }

        let previous = self.root;
        if self.rendering {
            self.deactivate(previous);
        }
        self.set_in_scene(previous, false);
        self.root = root;
        self.set_in_scene(root, true);
        if self.rendering {
            self.activate(root);
        }

        log::info!("Scene root switched from {:?} to {:?}", previous, root);
        Ok(())
    }

    /// Create an orphan entity with an identity transform
    pub fn create_entity(&mut self) -> EntityId {
        let native = self.backend.create_entity();
        self.nodes.insert(EntityNode::new(native))
    }

    /// Destroy an entity and its whole subtree
    ///
    /// Components are detached, then native objects are released. The
    /// active root cannot be destroyed.
    pub fn destroy_entity(&mut self, entity: EntityId) -> bool {
        if entity == self.root {
            log::warn!("Refusing to destroy the active scene root {:?}", entity);
            return false;
        }
        if !self.nodes.contains_key(entity) {
            return false;
        }

        self.detach(entity);

        let subtree = self.subtree(entity);
        for id in subtree.iter().rev() {
            self.release_entity(*id);
        }

        log::debug!("Destroyed entity {:?} ({} nodes)", entity, subtree.len());
        true
    }

    /// Detach all components, release the native handle and drop the node
    fn release_entity(&mut self, entity: EntityId) {
        let Some(node) = self.nodes.get_mut(entity) else {
            return;
        };
        let components = node.components.drain();
        for mut component in components {
            let mut ctx = ComponentContext::new(self, entity);
            component.on_detach(&mut ctx);
        }

        if let Some(node) = self.nodes.remove(entity) {
            self.backend.release(node.native);
        }
    }

    /// Whether the entity exists
    pub fn contains(&self, entity: EntityId) -> bool {
        self.nodes.contains_key(entity)
    }

    /// Number of live entities, including the root
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Always false: a scene has at least its root
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Native counterpart of an entity
    pub fn native_handle(&self, entity: EntityId) -> Option<NativeHandle> {
        self.nodes.get(entity).map(|node| node.native)
    }

    // ------------------------------------------------------------------
    // Identity
    // ------------------------------------------------------------------

    /// Set the application id
    pub fn set_id(&mut self, entity: EntityId, id: i32) {
        if let Some(node) = self.nodes.get_mut(entity) {
            node.id = Some(id);
        }
    }

    /// Set the application id from a string
    pub fn set_id_str(&mut self, entity: EntityId, id: &str) {
        self.set_id(entity, hash_id(id));
    }

    /// Application id, if one was assigned
    pub fn id(&self, entity: EntityId) -> Option<i32> {
        self.nodes.get(entity).and_then(|node| node.id)
    }

    /// Depth-first search of `start`'s subtree (including `start`)
    ///
    /// Linear in subtree size; look entities up once and keep the
    /// [`EntityId`] rather than calling this every frame.
    pub fn find_by_id(&self, start: EntityId, id: i32) -> Option<EntityId> {
        let mut stack = vec![start];
        while let Some(current) = stack.pop() {
            let Some(node) = self.nodes.get(current) else {
                continue;
            };
            if node.id == Some(id) {
                return Some(current);
            }
            stack.extend(node.children.iter().rev().copied());
        }
        None
    }

    /// [`Scene::find_by_id`] with a string id
    pub fn find_by_name(&self, start: EntityId, id: &str) -> Option<EntityId> {
        self.find_by_id(start, hash_id(id))
    }

    // ------------------------------------------------------------------
    // Transform
    // ------------------------------------------------------------------

    fn accepts(&self, entity: EntityId, what: &str, finite: bool) -> bool {
        if self.validate_transforms && !finite {
            log::warn!("Rejected non-finite {} for entity {:?}", what, entity);
            return false;
        }
        true
    }

    fn with_transform(&mut self, entity: EntityId, f: impl FnOnce(&mut Transform)) {
        if let Some(node) = self.nodes.get_mut(entity) {
            f(&mut node.transform);
            node.local_dirty = true;
        }
    }

    /// Set the local position
    pub fn set_position(&mut self, entity: EntityId, position: Vec3) {
        if self.accepts(entity, "position", is_finite_vec3(&position)) {
            self.with_transform(entity, |t| t.position = position);
        }
    }

    /// Set the x component of the local position
    pub fn set_x(&mut self, entity: EntityId, x: f32) {
        if self.accepts(entity, "position", x.is_finite()) {
            self.with_transform(entity, |t| t.position.x = x);
        }
    }

    /// Set the y component of the local position
    pub fn set_y(&mut self, entity: EntityId, y: f32) {
        if self.accepts(entity, "position", y.is_finite()) {
            self.with_transform(entity, |t| t.position.y = y);
        }
    }

    /// Set the z component of the local position
    pub fn set_z(&mut self, entity: EntityId, z: f32) {
        if self.accepts(entity, "position", z.is_finite()) {
            self.with_transform(entity, |t| t.position.z = z);
        }
    }

    /// Set the local scale
    pub fn set_scale(&mut self, entity: EntityId, scale: Vec3) {
        if self.accepts(entity, "scale", is_finite_vec3(&scale)) {
            self.with_transform(entity, |t| t.scale = scale);
        }
    }

    /// Set the x component of the local scale
    pub fn set_scale_x(&mut self, entity: EntityId, x: f32) {
        if self.accepts(entity, "scale", x.is_finite()) {
            self.with_transform(entity, |t| t.scale.x = x);
        }
    }

    /// Set the y component of the local scale
    pub fn set_scale_y(&mut self, entity: EntityId, y: f32) {
        if self.accepts(entity, "scale", y.is_finite()) {
            self.with_transform(entity, |t| t.scale.y = y);
        }
    }

    /// Set the z component of the local scale
    pub fn set_scale_z(&mut self, entity: EntityId, z: f32) {
        if self.accepts(entity, "scale", z.is_finite()) {
            self.with_transform(entity, |t| t.scale.z = z);
        }
    }

    /// Set the local rotation
    pub fn set_rotation(&mut self, entity: EntityId, rotation: Quat) {
        let finite = rotation.coords.iter().all(|c| c.is_finite());
        if self.accepts(entity, "rotation", finite) {
            self.with_transform(entity, |t| t.rotation = rotation);
        }
    }

    /// Replace position, rotation and scale at once
    pub fn set_transform(&mut self, entity: EntityId, transform: Transform) {
        if self.accepts(entity, "transform", transform.is_finite()) {
            self.with_transform(entity, |t| *t = transform);
        }
    }

    /// Local transform
    pub fn transform(&self, entity: EntityId) -> Option<Transform> {
        self.nodes.get(entity).map(|node| node.transform)
    }

    /// Local position
    pub fn position(&self, entity: EntityId) -> Option<Vec3> {
        self.nodes.get(entity).map(|node| node.transform.position)
    }

    /// Local scale
    pub fn scale(&self, entity: EntityId) -> Option<Vec3> {
        self.nodes.get(entity).map(|node| node.transform.scale)
    }

    /// Local rotation
    pub fn rotation(&self, entity: EntityId) -> Option<Quat> {
        self.nodes.get(entity).map(|node| node.transform.rotation)
    }

    /// Cached local matrix, as of the last update pass
    pub fn local_matrix(&self, entity: EntityId) -> Option<Mat4> {
        self.nodes.get(entity).map(|node| node.local_matrix)
    }

    /// Cached world matrix, as of the last update pass
    ///
    /// Stale between a transform write and the next pass.
    pub fn world_matrix(&self, entity: EntityId) -> Option<Mat4> {
        self.nodes.get(entity).map(|node| node.world_matrix)
    }

    /// World matrix composed directly from the current transforms
    ///
    /// Walks to the root on every call and ignores the cache.
    pub fn compute_world_matrix(&self, entity: EntityId) -> Option<Mat4> {
        let mut node = self.nodes.get(entity)?;
        let mut world = node.transform.to_matrix();
        while let Some(parent) = node.parent.and_then(|p| self.nodes.get(p)) {
            world = parent.transform.to_matrix() * world;
            node = parent;
        }
        Some(world)
    }

    /// Whether the local matrix awaits recomputation
    pub fn is_local_dirty(&self, entity: EntityId) -> bool {
        self.nodes.get(entity).is_some_and(|node| node.local_dirty)
    }

    /// Whether the world matrix awaits recomputation
    pub fn is_world_dirty(&self, entity: EntityId) -> bool {
        self.nodes.get(entity).is_some_and(|node| node.world_dirty)
    }

    // ------------------------------------------------------------------
    // Visibility and opacity
    // ------------------------------------------------------------------

    /// Set the entity's own visibility
    ///
    /// Takes effect immediately for the whole subtree, including the native
    /// side. No update pass is needed.
    pub fn set_visible(&mut self, entity: EntityId, visible: bool) {
        let Some(node) = self.nodes.get_mut(entity) else {
            return;
        };
        if node.visible == visible {
            return;
        }
        node.visible = visible;
        self.refresh_visibility(entity);
    }

    /// The entity's own visibility flag
    pub fn is_visible(&self, entity: EntityId) -> bool {
        self.nodes.get(entity).is_some_and(|node| node.visible)
    }

    /// True if this entity and all its ancestors are visible
    pub fn is_shown(&self, entity: EntityId) -> bool {
        self.nodes.get(entity).is_some_and(|node| node.shown)
    }

    /// Set the entity's own opacity, clamped to `0.0..=1.0`
    ///
    /// The effective opacity of the subtree is recomputed by the next update
    /// pass.
    #[allow(clippy::float_cmp)]
    pub fn set_opacity(&mut self, entity: EntityId, opacity: f32) {
        if !self.accepts(entity, "opacity", !opacity.is_nan()) {
            return;
        }
        let Some(node) = self.nodes.get_mut(entity) else {
            return;
        };

        let opacity = opacity.clamp(0.0, 1.0);
        if node.opacity == opacity {
            return;
        }
        node.opacity = opacity;
        node.opacity_dirty = true;
    }

    /// The entity's own opacity
    pub fn opacity(&self, entity: EntityId) -> Option<f32> {
        self.nodes.get(entity).map(|node| node.opacity)
    }

    /// Opacity used for rendering: own opacity times the parent's effective opacity
    pub fn effective_opacity(&self, entity: EntityId) -> Option<f32> {
        self.nodes.get(entity).map(|node| node.effective_opacity)
    }

    // ------------------------------------------------------------------
    // Hierarchy
    // ------------------------------------------------------------------

    /// Parent of an entity
    pub fn parent(&self, entity: EntityId) -> Option<EntityId> {
        self.nodes.get(entity).and_then(|node| node.parent)
    }

    /// Children of an entity, in update order
    pub fn children(&self, entity: EntityId) -> &[EntityId] {
        self.nodes
            .get(entity)
            .map(|node| node.children.as_slice())
            .unwrap_or(&[])
    }

    /// Whether the entity is reachable from the active root
    pub fn is_in_scene(&self, entity: EntityId) -> bool {
        self.nodes.get(entity).is_some_and(|node| node.in_scene)
    }

    /// Whether `ancestor` is a strict ancestor of `entity`
    pub fn is_ancestor(&self, ancestor: EntityId, entity: EntityId) -> bool {
        let mut current = self.parent(entity);
        while let Some(id) = current {
            if id == ancestor {
                return true;
            }
            current = self.parent(id);
        }
        false
    }

    /// Append `child` to `parent`'s children
    ///
    /// A child that already has a parent is moved. The child's subtree
    /// inherits the new parent's opacity and visibility right away; its world
    /// matrices are refreshed by the next update pass.
    ///
    /// Returns false if either entity is missing, if `child` is already a
    /// child of `parent`, or if the link would create a cycle.
    pub fn add_child(&mut self, parent: EntityId, child: EntityId) -> bool {
        if !self.nodes.contains_key(parent) || !self.nodes.contains_key(child) {
            return false;
        }
        if parent == child || self.is_ancestor(child, parent) {
            log::warn!("Refusing to attach {:?} under {:?}: would create a cycle", child, parent);
            return false;
        }
        if child == self.root {
            log::warn!("Refusing to attach the active scene root {:?} as a child", child);
            return false;
        }

        match self.nodes[child].parent {
            Some(current) if current == parent => return false,
            Some(current) => self.unlink(current, child),
            None => {}
        }

        self.nodes[parent].children.push(child);
        self.nodes[child].parent = Some(parent);

        let in_scene = self.nodes[parent].in_scene;
        self.set_in_scene(child, in_scene);
        self.invalidate_world(child);
        self.refresh_opacity(child);
        self.refresh_visibility(child);

        log::debug!("Attached {:?} under {:?}", child, parent);
        true
    }

    /// Remove `child` from `parent`'s children
    ///
    /// The child is not destroyed; its subtree becomes an orphan tree.
    pub fn remove_child(&mut self, parent: EntityId, child: EntityId) -> bool {
        if self.parent(child) != Some(parent) {
            return false;
        }

        self.unlink(parent, child);

        self.set_in_scene(child, false);
        self.invalidate_world(child);
        self.refresh_opacity(child);
        self.refresh_visibility(child);

        log::debug!("Detached {:?} from {:?}", child, parent);
        true
    }

    /// Remove an entity from its parent, if it has one
    pub fn detach(&mut self, entity: EntityId) -> bool {
        match self.parent(entity) {
            Some(parent) => self.remove_child(parent, entity),
            None => false,
        }
    }

    fn unlink(&mut self, parent: EntityId, child: EntityId) {
        if let Some(node) = self.nodes.get_mut(parent) {
            node.children.retain(|id| *id != child);
        }
        if let Some(node) = self.nodes.get_mut(child) {
            node.parent = None;
        }
    }

    /// `entity` followed by all its descendants, pre-order
    pub(crate) fn subtree(&self, entity: EntityId) -> Vec<EntityId> {
        let mut order = Vec::new();
        let mut stack = vec![entity];
        while let Some(current) = stack.pop() {
            if let Some(node) = self.nodes.get(current) {
                order.push(current);
                stack.extend(node.children.iter().rev().copied());
            }
        }
        order
    }

    fn set_in_scene(&mut self, entity: EntityId, in_scene: bool) {
        for id in self.subtree(entity) {
            self.nodes[id].in_scene = in_scene;
        }
    }

    // ------------------------------------------------------------------
    // Components
    // ------------------------------------------------------------------

    /// Attach a component
    ///
    /// Fails if the entity does not exist or already has a component of
    /// exactly this type; the existing component stays attached.
    pub fn add_component<T: Component>(&mut self, entity: EntityId, component: T) -> bool {
        let type_id = TypeId::of::<T>();
        match self.nodes.get(entity) {
            None => return false,
            Some(node) if node.components.contains_type(type_id) => {
                log::debug!(
                    "Entity {:?} already has a {}",
                    entity,
                    std::any::type_name::<T>()
                );
                return false;
            }
            Some(_) => {}
        }

        let mut component: Box<dyn Component> = Box::new(component);
        component.on_attach(&mut ComponentContext::new(self, entity));

        let rejected = match self.nodes.get_mut(entity) {
            Some(node) => node.components.insert(type_id, component).err(),
            None => Some(component),
        };

        match rejected {
            None => true,
            Some(mut component) => {
                // on_attach removed the entity or attached the same type itself
                component.on_detach(&mut ComponentContext::new(self, entity));
                false
            }
        }
    }

    /// Detach and return the component of type `T`
    pub fn take_component<T: Component>(&mut self, entity: EntityId) -> Option<T> {
        let mut component = self
            .nodes
            .get_mut(entity)?
            .components
            .remove(TypeId::of::<T>())?;
        component.on_detach(&mut ComponentContext::new(self, entity));

        <dyn Component as AsAny>::into_any(component)
            .downcast::<T>()
            .ok()
            .map(|component| *component)
    }

    /// Detach and drop the component of type `T`
    pub fn remove_component<T: Component>(&mut self, entity: EntityId) -> bool {
        self.take_component::<T>(entity).is_some()
    }

    /// Borrow the component of type `T`
    pub fn component<T: Component>(&self, entity: EntityId) -> Option<&T> {
        self.nodes.get(entity)?.components.get::<T>()
    }

    /// Mutably borrow the component of type `T`
    pub fn component_mut<T: Component>(&mut self, entity: EntityId) -> Option<&mut T> {
        self.nodes.get_mut(entity)?.components.get_mut::<T>()
    }

    /// Whether a component of exactly type `T` is attached
    pub fn has_component<T: Component>(&self, entity: EntityId) -> bool {
        self.nodes
            .get(entity)
            .is_some_and(|node| node.components.contains::<T>())
    }

    /// Number of components attached to an entity
    pub fn component_count(&self, entity: EntityId) -> usize {
        self.nodes.get(entity).map_or(0, |node| node.components.len())
    }

    /// First `T` found depth-first among the descendants, else on `entity` itself
    pub fn component_in_children<T: Component>(&self, entity: EntityId) -> Option<&T> {
        let node = self.nodes.get(entity)?;
        node.children
            .iter()
            .find_map(|child| self.component_in_children::<T>(*child))
            .or_else(|| node.components.get::<T>())
    }

    /// `T` on `entity`, else on the nearest ancestor that has one
    pub fn component_in_parent<T: Component>(&self, entity: EntityId) -> Option<&T> {
        let mut current = Some(entity);
        while let Some(id) = current {
            let node = self.nodes.get(id)?;
            if let Some(component) = node.components.get::<T>() {
                return Some(component);
            }
            current = node.parent;
        }
        None
    }

    /// Whether the entity has both geometry and a surface to render
    pub fn is_renderable(&self, entity: EntityId) -> bool {
        self.has_component::<GeometryComponent>(entity)
            && self.has_component::<SurfaceRendererComponent>(entity)
    }

    /// Play `animator` on `entity`, replacing any animator already attached
    ///
    /// The replaced animator is detached without its end callback.
    pub fn animate(&mut self, entity: EntityId, animator: AnimatorComponent) -> bool {
        self.remove_component::<AnimatorComponent>(entity);
        self.add_component(entity, animator)
    }
}

impl Drop for Scene {
    fn drop(&mut self) {
        let ids: Vec<EntityId> = self.nodes.keys().collect();
        let count = ids.len();
        for id in ids {
            self.release_entity(id);
        }
        log::debug!("Scene dropped, released {} entities", count);
    }
}
