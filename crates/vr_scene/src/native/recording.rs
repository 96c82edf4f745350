//! In-memory backend that records everything pushed to it
//!
//! Used by the demo application and by tests to observe exactly which native
//! calls a frame produced.

use std::any::Any;

use slotmap::{new_key_type, Key, KeyData, SlotMap};

use super::backend::{GeometrySource, NativeBackend, NativeHandle, StereoMode};

new_key_type! {
    struct NativeKey;
}

#[derive(Debug, Clone)]
enum NativeObject {
    Entity {
        world_matrix: Option<[f32; 16]>,
        visible: bool,
        geometry: Option<NativeHandle>,
        surface: Option<NativeHandle>,
    },
    Geometry(GeometrySource),
    Surface {
        opacity: f32,
        stereo_mode: StereoMode,
    },
}

/// Counters of calls received since creation or the last [`RecordingBackend::reset_stats`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BackendStats {
    /// `set_world_matrix` calls
    pub matrix_uploads: usize,
    /// `set_visible` calls
    pub visibility_updates: usize,
    /// `set_surface_opacity` calls
    pub opacity_updates: usize,
    /// `release` calls that freed a live object
    pub releases: usize,
}

/// Backend that keeps native objects in memory
#[derive(Debug, Default)]
pub struct RecordingBackend {
    objects: SlotMap<NativeKey, NativeObject>,
    stats: BackendStats,
}

impl RecordingBackend {
    /// Create an empty backend
    pub fn new() -> Self {
        Self::default()
    }

    fn key(handle: NativeHandle) -> NativeKey {
        KeyData::from_ffi(handle.0).into()
    }

    fn handle(key: NativeKey) -> NativeHandle {
        NativeHandle(key.data().as_ffi())
    }

    fn insert(&mut self, object: NativeObject) -> NativeHandle {
        Self::handle(self.objects.insert(object))
    }

    fn entity_mut(&mut self, handle: NativeHandle) -> Option<&mut NativeObject> {
        match self.objects.get_mut(Self::key(handle)) {
            Some(object @ NativeObject::Entity { .. }) => Some(object),
            _ => {
                log::warn!("Native entity {:?} does not exist", handle);
                None
            }
        }
    }

    /// Number of native objects currently alive
    pub fn live_objects(&self) -> usize {
        self.objects.len()
    }

    /// Whether the handle refers to a live object
    pub fn contains(&self, handle: NativeHandle) -> bool {
        self.objects.contains_key(Self::key(handle))
    }

    /// Call counters
    pub fn stats(&self) -> BackendStats {
        self.stats
    }

    /// Zero the call counters
    pub fn reset_stats(&mut self) {
        self.stats = BackendStats::default();
    }

    /// Last world matrix uploaded for an entity
    pub fn world_matrix(&self, entity: NativeHandle) -> Option<[f32; 16]> {
        match self.objects.get(Self::key(entity)) {
            Some(NativeObject::Entity { world_matrix, .. }) => *world_matrix,
            _ => None,
        }
    }

    /// Native visibility of an entity
    pub fn is_visible(&self, entity: NativeHandle) -> Option<bool> {
        match self.objects.get(Self::key(entity)) {
            Some(NativeObject::Entity { visible, .. }) => Some(*visible),
            _ => None,
        }
    }

    /// Geometry currently bound to an entity
    pub fn geometry_of(&self, entity: NativeHandle) -> Option<NativeHandle> {
        match self.objects.get(Self::key(entity)) {
            Some(NativeObject::Entity { geometry, .. }) => *geometry,
            _ => None,
        }
    }

    /// Surface currently bound to an entity
    pub fn surface_of(&self, entity: NativeHandle) -> Option<NativeHandle> {
        match self.objects.get(Self::key(entity)) {
            Some(NativeObject::Entity { surface, .. }) => *surface,
            _ => None,
        }
    }

    /// Source a geometry was built from
    pub fn geometry_source(&self, geometry: NativeHandle) -> Option<&GeometrySource> {
        match self.objects.get(Self::key(geometry)) {
            Some(NativeObject::Geometry(source)) => Some(source),
            _ => None,
        }
    }

    /// Opacity last pushed to a surface
    pub fn surface_opacity(&self, surface: NativeHandle) -> Option<f32> {
        match self.objects.get(Self::key(surface)) {
            Some(NativeObject::Surface { opacity, .. }) => Some(*opacity),
            _ => None,
        }
    }

    /// Stereo mode of a surface
    pub fn surface_stereo_mode(&self, surface: NativeHandle) -> Option<StereoMode> {
        match self.objects.get(Self::key(surface)) {
            Some(NativeObject::Surface { stereo_mode, .. }) => Some(*stereo_mode),
            _ => None,
        }
    }
}

impl NativeBackend for RecordingBackend {
    fn create_entity(&mut self) -> NativeHandle {
        self.insert(NativeObject::Entity {
            world_matrix: None,
            visible: true,
            geometry: None,
            surface: None,
        })
    }

    fn release(&mut self, handle: NativeHandle) {
        if self.objects.remove(Self::key(handle)).is_some() {
            self.stats.releases += 1;
        } else {
            log::warn!("Release of unknown native handle {:?}", handle);
        }
    }

    fn set_world_matrix(&mut self, entity: NativeHandle, matrix: &[f32; 16]) {
        self.stats.matrix_uploads += 1;
        if let Some(NativeObject::Entity { world_matrix, .. }) = self.entity_mut(entity) {
            *world_matrix = Some(*matrix);
        }
    }

    fn set_visible(&mut self, entity: NativeHandle, visible: bool) {
        self.stats.visibility_updates += 1;
        if let Some(NativeObject::Entity { visible: current, .. }) = self.entity_mut(entity) {
            *current = visible;
        }
    }

    fn create_geometry(&mut self, source: &GeometrySource) -> NativeHandle {
        self.insert(NativeObject::Geometry(source.clone()))
    }

    fn bind_geometry(&mut self, entity: NativeHandle, geometry: Option<NativeHandle>) {
        if let Some(NativeObject::Entity { geometry: bound, .. }) = self.entity_mut(entity) {
            *bound = geometry;
        }
    }

    fn create_surface(&mut self) -> NativeHandle {
        self.insert(NativeObject::Surface {
            opacity: 1.0,
            stereo_mode: StereoMode::Normal,
        })
    }

    fn bind_surface(&mut self, entity: NativeHandle, surface: Option<NativeHandle>) {
        if let Some(NativeObject::Entity { surface: bound, .. }) = self.entity_mut(entity) {
            *bound = surface;
        }
    }

    fn set_surface_opacity(&mut self, surface: NativeHandle, opacity: f32) {
        self.stats.opacity_updates += 1;
        match self.objects.get_mut(Self::key(surface)) {
            Some(NativeObject::Surface { opacity: current, .. }) => *current = opacity,
            _ => log::warn!("Native surface {:?} does not exist", surface),
        }
    }

    fn set_surface_stereo_mode(&mut self, surface: NativeHandle, mode: StereoMode) {
        match self.objects.get_mut(Self::key(surface)) {
            Some(NativeObject::Surface { stereo_mode, .. }) => *stereo_mode = mode,
            _ => log::warn!("Native surface {:?} does not exist", surface),
        }
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}
