//! Math utilities and types
//!
//! Provides the vector/quaternion aliases and the TRS [`Transform`] used to
//! place entities and their children.

pub use nalgebra::{
    Vector3, Vector4,
    Matrix4,
    Quaternion,
    Unit,
};

/// 3D vector type
pub type Vec3 = Vector3<f32>;

/// 4D vector type
pub type Vec4 = Vector4<f32>;

/// 4x4 matrix type
pub type Mat4 = Matrix4<f32>;

/// 3D point type
pub type Point3 = nalgebra::Point3<f32>;

/// Quaternion type for rotations
pub type Quat = Unit<Quaternion<f32>>;

/// Quaternions whose norm falls below this cannot be normalized.
pub const MIN_ROTATION_NORM: f32 = 1e-6;

/// Norms this close to one are accepted as already unit length.
const UNIT_NORM_TOLERANCE: f32 = 1e-6;

/// Transform representing position, rotation, and scale
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transform {
    /// Position relative to the parent origin
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

    /// Create a transform from all three parts
    pub fn new(position: Vec3, rotation: Quat, scale: Vec3) -> Self {
        Self { position, rotation, scale }
    }

    /// Create a transform with only position
    pub fn from_position(position: Vec3) -> Self {
        Self {
            position,
            ..Default::default()
        }
    }

    /// Create a transform with position and rotation
    pub fn from_position_rotation(position: Vec3, rotation: Quat) -> Self {
        Self {
            position,
            rotation,
            ..Default::default()
        }
    }

    /// Set the scale
    pub fn with_scale(mut self, scale: Vec3) -> Self {
        self.scale = scale;
        self
    }

    /// Whether every part holds its default value exactly
    pub fn is_identity(&self) -> bool {
        *self == Self::identity()
    }

    /// Convert to a transformation matrix
    pub fn to_matrix(&self) -> Mat4 {
        Mat4::new_translation(&self.position)
            * self.rotation.to_homogeneous()
            * Mat4::new_nonuniform_scaling(&self.scale)
    }

    /// Apply this transform to a point
    pub fn transform_point(&self, point: Point3) -> Point3 {
        Point3::from(self.position + self.rotation * self.scale.component_mul(&point.coords))
    }

    /// Compose `self` (the parent) with a local transform.
    ///
    /// The local transform is scaled, rotated and then offset in the
    /// parent's space. `parent.combine(&local).transform_point(p)` equals
    /// `parent.transform_point(local.transform_point(p))` when the parent's
    /// scale is uniform or the local rotation is identity. A non-uniform
    /// parent scale applied to a rotated child is a shear, which TRS cannot
    /// hold: the child's origin still lands exactly, its scale is taken
    /// per axis and the shear is dropped.
    pub fn combine(&self, local: &Transform) -> Transform {
        Transform {
            position: self.position + self.rotation * self.scale.component_mul(&local.position),
            rotation: self.rotation * local.rotation,
            scale: self.scale.component_mul(&local.scale),
        }
    }

    /// Get the inverse transform, such that `t.combine(&t.inverse()?)` is
    /// the identity.
    ///
    /// Returns `None` when a scale axis is zero.
    pub fn inverse(&self) -> Option<Transform> {
        if self.scale.iter().any(|axis| *axis == 0.0) {
            return None;
        }

        let inv_scale = Vec3::new(1.0 / self.scale.x, 1.0 / self.scale.y, 1.0 / self.scale.z);
        let inv_rotation = self.rotation.inverse();
        let inv_position = -(inv_rotation * self.position).component_mul(&inv_scale);

        Some(Transform {
            position: inv_position,
            rotation: inv_rotation,
            scale: inv_scale,
        })
    }

    /// Compare two transforms component-wise within `epsilon`.
    ///
    /// Quaternions `q` and `-q` describe the same rotation and compare equal.
    pub fn approx_eq(&self, other: &Transform, epsilon: f32) -> bool {
        let close = |a: &Vec3, b: &Vec3| (a - b).amax() <= epsilon;
        let rotation_close = (self.rotation.coords - other.rotation.coords).amax() <= epsilon
            || (self.rotation.coords + other.rotation.coords).amax() <= epsilon;

        close(&self.position, &other.position) && close(&self.scale, &other.scale) && rotation_close
    }
}

/// Build a unit rotation from raw `(x, y, z, w)` components.
///
/// Values already within tolerance of unit length are kept bit-for-bit so a
/// written rotation reads back identically. Returns `None` when the norm is
/// below `min_norm` or not finite.
pub fn normalize_rotation(x: f32, y: f32, z: f32, w: f32, min_norm: f32) -> Option<Quat> {
    let raw = Quaternion::new(w, x, y, z);
    let norm = raw.norm();

    if !norm.is_finite() || norm < min_norm {
        return None;
    }

    if (norm - 1.0).abs() <= UNIT_NORM_TOLERANCE {
        Some(Unit::new_unchecked(raw))
    } else {
        Some(Unit::new_normalize(raw))
    }
}
