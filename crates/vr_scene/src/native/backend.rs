//! Backend abstraction for the native rendering engine
//!
//! The scene graph never renders anything itself. Every result it produces
//! (world matrices, visibility, opacity, geometry and surface bindings) is
//! pushed through this trait to whatever owns the GPU side.

use std::any::Any;

/// Opaque handle to an object owned by the native side
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NativeHandle(pub u64);

/// Geometry description handed to the native side for building
#[derive(Debug, Clone, PartialEq)]
pub enum GeometrySource {
    /// Plane centred on the origin, facing +Z
    Quad {
        /// Width in meters
        width: f32,
        /// Height in meters
        height: f32,
    },
    /// Full sphere seen from the inside, for 360 content
    Globe,
    /// Partial sphere above the given latitude
    Dome {
        /// Latitude in radians
        lat_rads: f32,
    },
    /// Sphere patch covering the given field of view
    SpherePatch {
        /// Field of view in radians
        fov: f32,
    },
    /// Arbitrary triangle mesh
    Mesh {
        /// Vertex positions, xyz per vertex
        positions: Vec<f32>,
        /// Vertex colors, rgba per vertex (may be empty)
        colors: Vec<f32>,
        /// Texture coordinates, uv per vertex (may be empty)
        uvs: Vec<f32>,
        /// Triangle indices
        triangles: Vec<u32>,
    },
}

/// How a surface texture maps onto the two eyes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StereoMode {
    /// Same image for both eyes
    #[default]
    Normal,
    /// Top half left eye, bottom half right eye
    TopBottom,
    /// Top half right eye, bottom half left eye
    BottomTop,
    /// Left half left eye, right half right eye
    LeftRight,
    /// Left half right eye, right half left eye
    RightLeft,
}

/// Native rendering backend
///
/// Implementations own the native objects behind each [`NativeHandle`].
/// Handles are created and released explicitly by the scene graph; a handle
/// is never used after [`NativeBackend::release`].
pub trait NativeBackend {
    /// Allocate the native counterpart of a scene entity
    fn create_entity(&mut self) -> NativeHandle;

    /// Free a native object of any kind
    fn release(&mut self, handle: NativeHandle);

    /// Upload the world model matrix (16 floats, column-major)
    fn set_world_matrix(&mut self, entity: NativeHandle, matrix: &[f32; 16]);

    /// Include or exclude the entity from the surface-collection pass
    fn set_visible(&mut self, entity: NativeHandle, visible: bool);

    /// Build native geometry from a description
    fn create_geometry(&mut self, source: &GeometrySource) -> NativeHandle;

    /// Attach geometry to an entity, or detach it with `None`
    fn bind_geometry(&mut self, entity: NativeHandle, geometry: Option<NativeHandle>);

    /// Allocate a native surface (texture target)
    fn create_surface(&mut self) -> NativeHandle;

    /// Attach a surface to an entity, or detach it with `None`
    fn bind_surface(&mut self, entity: NativeHandle, surface: Option<NativeHandle>);

    /// Set the rendering opacity of a surface's material
    fn set_surface_opacity(&mut self, surface: NativeHandle, opacity: f32);

    /// Set how a surface maps onto the eyes
    fn set_surface_stereo_mode(&mut self, surface: NativeHandle, mode: StereoMode);

    /// Downcasting support for inspecting a concrete backend
    fn as_any(&self) -> &dyn Any;
}
