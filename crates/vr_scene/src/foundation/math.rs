//! Math utilities and types
//!
//! Thin aliases over `nalgebra` plus the transform composition used by the
//! scene graph. All matrices are column-vector convention: a point is
//! transformed as `M * p`.

pub use nalgebra::{Matrix4, Quaternion, Unit, Vector3};

/// 3D vector type
pub type Vec3 = Vector3<f32>;

/// 4x4 matrix type
pub type Mat4 = Matrix4<f32>;

/// 3D point type
pub type Point3 = nalgebra::Point3<f32>;

/// Quaternion type for rotations
pub type Quat = Unit<Quaternion<f32>>;

/// Transform representing position, rotation, and scale
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transform {
    /// Position relative to the parent
    pub position: Vec3,

    /// Rotation quaternion
    pub rotation: Quat,

    /// Scale factors
    pub scale: Vec3,
}

impl Default for Transform {
    fn default() -> Self {
        Self {
            position: Vec3::zeros(),
            rotation: Quat::identity(),
            scale: Vec3::new(1.0, 1.0, 1.0),
        }
    }
}

impl Transform {
    /// Create a new identity transform
    pub fn identity() -> Self {
        Self::default()
    }

    /// Create a transform with only position
    pub fn from_position(position: Vec3) -> Self {
        Self {
            position,
            ..Default::default()
        }
    }

    /// Convert to a transformation matrix: `T(position) * R(rotation) * S(scale)`
    pub fn to_matrix(&self) -> Mat4 {
        Mat4::new_translation(&self.position)
            * self.rotation.to_homogeneous()
            * Mat4::new_nonuniform_scaling(&self.scale)
    }

    /// Whether every component is finite
    pub fn is_finite(&self) -> bool {
        is_finite_vec3(&self.position)
            && is_finite_vec3(&self.scale)
            && self.rotation.coords.iter().all(|c| c.is_finite())
    }
}

/// Whether every component of a vector is finite
pub fn is_finite_vec3(v: &Vec3) -> bool {
    v.iter().all(|c| c.is_finite())
}

/// Flatten a matrix into 16 floats in column-major order
///
/// This is the layout the native side expects for world model matrices.
pub fn to_column_major(matrix: &Mat4) -> [f32; 16] {
    let mut values = [0.0; 16];
    values.copy_from_slice(matrix.as_slice());
    values
}

/// Math constants
pub mod constants {
    /// Pi constant
    pub const PI: f32 = std::f32::consts::PI;

    /// Degrees to radians conversion factor
    pub const DEG_TO_RAD: f32 = PI / 180.0;
}
