//! Component trait and the context components are called with
//!
//! A component is a behavior attached to one entity. The scene owns attached
//! components; the owning entity is handed to every callback through
//! [`ComponentContext`] instead of being stored as a back-reference.

use std::any::Any;

use crate::foundation::math::{Quat, Vec3};
use crate::input::FrameInput;
use crate::native::{NativeBackend, NativeHandle};
use crate::scene::{EntityId, Scene};

/// Downcasting support for trait objects
///
/// Implemented for every `'static` type, so components never implement it
/// by hand.
pub trait AsAny: Any {
    /// Borrow as `dyn Any`
    fn as_any(&self) -> &dyn Any;

    /// Mutably borrow as `dyn Any`
    fn as_any_mut(&mut self) -> &mut dyn Any;

    /// Convert a boxed value into `Box<dyn Any>`
    fn into_any(self: Box<Self>) -> Box<dyn Any>;
}

impl<T: Any> AsAny for T {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }

    fn into_any(self: Box<Self>) -> Box<dyn Any> {
        self
    }
}

/// Behavior attached to an entity
///
/// Every method has an empty default so a component only overrides what it
/// needs.
pub trait Component: AsAny {
    /// Called once when attached, before the first [`Component::update`]
    fn on_attach(&mut self, _ctx: &mut ComponentContext<'_>) {}

    /// Called once when detached, while the context still names the entity
    fn on_detach(&mut self, _ctx: &mut ComponentContext<'_>) {}

    /// Called every frame while attached
    ///
    /// Runs after the entity's own matrices are resolved and before any of
    /// its children are visited.
    fn update(&mut self, _ctx: &mut ComponentContext<'_>, _frame: &FrameInput) {}

    /// Called when the entity's effective opacity has been recomputed
    fn opacity_changed(&mut self, _opacity: f32, _backend: &mut dyn NativeBackend) {}

    /// Called on the root's components the first time that root starts rendering
    ///
    /// Runs right before [`Component::on_start_rendering`], and never again
    /// for the same root.
    fn on_scene_init(&mut self, _ctx: &mut ComponentContext<'_>) {}

    /// Called on the root's components when the root becomes the rendered one
    fn on_start_rendering(&mut self, _ctx: &mut ComponentContext<'_>) {}

    /// Called on the root's components when another root replaces it
    fn on_stop_rendering(&mut self, _ctx: &mut ComponentContext<'_>) {}
}

/// Access to the scene from inside a component callback
pub struct ComponentContext<'a> {
    scene: &'a mut Scene,
    entity: EntityId,
}

impl<'a> ComponentContext<'a> {
    pub(crate) fn new(scene: &'a mut Scene, entity: EntityId) -> Self {
        Self { scene, entity }
    }

    /// The entity this component is attached to
    pub fn entity(&self) -> EntityId {
        self.entity
    }

    /// Read access to the whole scene
    pub fn scene(&self) -> &Scene {
        self.scene
    }

    /// Write access to the whole scene
    ///
    /// While a component is running, the components of its own entity are
    /// not reachable through the scene.
    pub fn scene_mut(&mut self) -> &mut Scene {
        self.scene
    }

    /// Native counterpart of the entity
    pub fn native_handle(&self) -> Option<NativeHandle> {
        self.scene.native_handle(self.entity)
    }

    /// The native backend
    pub fn backend_mut(&mut self) -> &mut dyn NativeBackend {
        self.scene.backend_mut()
    }

    /// Set the entity's local position
    pub fn set_position(&mut self, position: Vec3) {
        self.scene.set_position(self.entity, position);
    }

    /// Set the entity's local rotation
    pub fn set_rotation(&mut self, rotation: Quat) {
        self.scene.set_rotation(self.entity, rotation);
    }

    /// Set the entity's local scale
    pub fn set_scale(&mut self, scale: Vec3) {
        self.scene.set_scale(self.entity, scale);
    }

    /// Set the entity's own opacity
    pub fn set_opacity(&mut self, opacity: f32) {
        self.scene.set_opacity(self.entity, opacity);
    }
}
