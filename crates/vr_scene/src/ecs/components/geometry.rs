//! Geometry component
//!
//! Owns the native geometry built from a [`GeometrySource`] and keeps it
//! bound to its entity while attached.

use crate::ecs::{Component, ComponentContext};
use crate::native::{GeometrySource, NativeHandle};

/// Shape an entity renders with
#[derive(Debug, Clone)]
pub struct GeometryComponent {
    source: GeometrySource,
    native: Option<NativeHandle>,
}

impl GeometryComponent {
    /// Create a geometry component from a description
    pub fn new(source: GeometrySource) -> Self {
        Self {
            source,
            native: None,
        }
    }

    /// Flat quad facing +Z
    pub fn quad(width: f32, height: f32) -> Self {
        Self::new(GeometrySource::Quad { width, height })
    }

    /// Inside-out sphere for 360 content
    pub fn globe() -> Self {
        Self::new(GeometrySource::Globe)
    }

    /// Sphere cap above `lat_rads`
    pub fn dome(lat_rads: f32) -> Self {
        Self::new(GeometrySource::Dome { lat_rads })
    }

    /// Sphere patch covering `fov` radians
    pub fn sphere_patch(fov: f32) -> Self {
        Self::new(GeometrySource::SpherePatch { fov })
    }

    /// The description this component was built from
    pub fn source(&self) -> &GeometrySource {
        &self.source
    }

    /// Native geometry, present while attached
    pub fn native_geometry(&self) -> Option<NativeHandle> {
        self.native
    }
}

impl Component for GeometryComponent {
    fn on_attach(&mut self, ctx: &mut ComponentContext<'_>) {
        let Some(entity) = ctx.native_handle() else {
            return;
        };
        let backend = ctx.backend_mut();
        let geometry = backend.create_geometry(&self.source);
        backend.bind_geometry(entity, Some(geometry));
        self.native = Some(geometry);
    }

    fn on_detach(&mut self, ctx: &mut ComponentContext<'_>) {
        let Some(geometry) = self.native.take() else {
            return;
        };
        let entity = ctx.native_handle();
        let backend = ctx.backend_mut();
        if let Some(entity) = entity {
            backend.bind_geometry(entity, None);
        }
        backend.release(geometry);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::native::RecordingBackend;
    use crate::scene::Scene;

    #[test]
    fn test_attach_builds_and_binds_geometry() {
        let mut scene = Scene::new(RecordingBackend::new());
        let entity = scene.create_entity();

        assert!(scene.add_component(entity, GeometryComponent::quad(2.0, 1.0)));

        let handle = scene.native_handle(entity).unwrap();
        let geometry = scene
            .component::<GeometryComponent>(entity)
            .and_then(GeometryComponent::native_geometry)
            .unwrap();
        let backend = scene.backend_as::<RecordingBackend>().unwrap();

        assert_eq!(backend.geometry_of(handle), Some(geometry));
        assert_eq!(
            backend.geometry_source(geometry),
            Some(&GeometrySource::Quad { width: 2.0, height: 1.0 })
        );
    }

    #[test]
    fn test_detach_releases_geometry() {
        let mut scene = Scene::new(RecordingBackend::new());
        let entity = scene.create_entity();
        assert!(scene.add_component(entity, GeometryComponent::globe()));

        let taken = scene.take_component::<GeometryComponent>(entity).unwrap();

        assert!(taken.native_geometry().is_none());
        let handle = scene.native_handle(entity).unwrap();
        let backend = scene.backend_as::<RecordingBackend>().unwrap();
        assert_eq!(backend.geometry_of(handle), None);
        // Root and entity only
        assert_eq!(backend.live_objects(), 2);
    }
}
