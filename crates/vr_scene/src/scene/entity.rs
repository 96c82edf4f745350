//! Entity storage
//!
//! Entities live in a [`slotmap`] arena owned by [`super::Scene`]. The parent
//! link is a plain [`EntityId`], so parents and children never own each
//! other and no reference cycles can form.

use slotmap::new_key_type;

use crate::ecs::ComponentRegistry;
use crate::foundation::math::{Mat4, Transform};
use crate::native::NativeHandle;

new_key_type! {
    /// Stable handle to an entity in a [`super::Scene`]
    ///
    /// Generational: a handle to a destroyed entity never aliases a newer one.
    pub struct EntityId;
}

/// One node of the scene tree
pub(crate) struct EntityNode {
    /// Application-assigned id, see [`super::Scene::find_by_id`]
    pub(crate) id: Option<i32>,
    /// Native counterpart, released when the entity is destroyed
    pub(crate) native: NativeHandle,

    pub(crate) transform: Transform,
    pub(crate) local_matrix: Mat4,
    pub(crate) world_matrix: Mat4,
    pub(crate) local_dirty: bool,
    pub(crate) world_dirty: bool,

    pub(crate) visible: bool,
    /// Own flag AND every ancestor's own flag
    pub(crate) shown: bool,

    pub(crate) opacity: f32,
    /// Own opacity times the parent's effective opacity
    pub(crate) effective_opacity: f32,
    pub(crate) opacity_dirty: bool,

    pub(crate) parent: Option<EntityId>,
    pub(crate) children: Vec<EntityId>,
    pub(crate) components: ComponentRegistry,

    /// Reachable from the scene's active root
    pub(crate) in_scene: bool,
    /// Has started rendering as a root at least once
    pub(crate) initialized: bool,
}

impl EntityNode {
    pub(crate) fn new(native: NativeHandle) -> Self {
        Self {
            id: None,
            native,
            transform: Transform::identity(),
            local_matrix: Mat4::identity(),
            world_matrix: Mat4::identity(),
            // Fresh entities upload their matrix on the first pass.
            local_dirty: true,
            world_dirty: true,
            visible: true,
            shown: true,
            opacity: 1.0,
            effective_opacity: 1.0,
            opacity_dirty: false,
            parent: None,
            children: Vec::new(),
            components: ComponentRegistry::new(),
            in_scene: false,
            initialized: false,
        }
    }
}

/// Hash a string id into the integer id space
///
/// The classic 31-multiplier string hash over UTF-16 code units, wrapping at
/// 32 bits. Ids written by existing scene descriptions hash to the same value.
pub fn hash_id(name: &str) -> i32 {
    name.encode_utf16()
        .fold(0_i32, |hash, unit| hash.wrapping_mul(31).wrapping_add(i32::from(unit)))
}
