//! Built-in components
//!
//! Geometry and surface rendering bind native objects to an entity; the
//! camera component drives an entity from head tracking and the animator
//! tweens it over time.

pub mod animator;
pub mod camera;
pub mod geometry;
pub mod surface_renderer;

pub use animator::{AnimatorComponent, Easing};
pub use camera::CameraComponent;
pub use geometry::GeometryComponent;
pub use surface_renderer::SurfaceRendererComponent;
