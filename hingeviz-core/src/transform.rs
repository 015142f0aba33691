//! 3D transformation matrices, pivot rotations and object rotation state
use std::str::FromStr;

use nalgebra::{Matrix3, Matrix4, Point3, Unit, Vector3};

use crate::error::HingevizError;

/// Principal axis selector for object rotation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Axis {
    X,
    Y,
    Z,
}

impl FromStr for Axis {
    type Err = HingevizError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "x" => Ok(Axis::X),
            "y" => Ok(Axis::Y),
            "z" => Ok(Axis::Z),
            _ => Err(HingevizError::UnknownName {
                what: "axis",
                name: s.to_string(),
                expected: "x, y or z",
            }),
        }
    }
}

impl Axis {
    pub fn unit(self) -> Unit<Vector3<f32>> {
        match self {
            Axis::X => Vector3::x_axis(),
            Axis::Y => Vector3::y_axis(),
            Axis::Z => Vector3::z_axis(),
        }
    }
}

/// Rotation state around three axes (in degrees)
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RotationState {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl RotationState {
    pub fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }

    pub fn zero() -> Self {
        Self {
            x: 0.0,
            y: 0.0,
            z: 0.0,
        }
    }

    /// Rotate by delta amounts (in degrees)
    pub fn rotate(&mut self, dx: f32, dy: f32, dz: f32) {
        self.x += dx;
        self.y += dy;
        self.z += dz;
    }

    /// Advance one axis, wrapping into `[0, 360)`
    pub fn spin(&mut self, axis: Axis, degrees: f32) {
        let angle = match axis {
            Axis::X => &mut self.x,
            Axis::Y => &mut self.y,
            Axis::Z => &mut self.z,
        };
        *angle = (*angle + degrees).rem_euclid(360.0);
    }
}

impl Default for RotationState {
    fn default() -> Self {
        Self::zero()
    }
}

/// Object rotation and scale applied as the model matrix
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ObjectTransform {
    pub rotation: RotationState,
    pub scale: Vector3<f32>,
}

impl ObjectTransform {
    /// `Rx * Ry * Rz * S`
    pub fn model_matrix(&self) -> Matrix4<f32> {
        Transform::rotation_matrix(&self.rotation)
            * Transform::scale_matrix(self.scale.x, self.scale.y, self.scale.z)
    }
}

impl Default for ObjectTransform {
    fn default() -> Self {
        Self {
            rotation: RotationState::zero(),
            scale: Vector3::new(1.0, 1.0, 1.0),
        }
    }
}

/// Transform builder for 3D transformations
pub struct Transform;

impl Transform {
    /// Create a rotation matrix from a rotation state, applied X then Y then Z
    pub fn rotation_matrix(rotation: &RotationState) -> Matrix4<f32> {
        let rx = Self::rotation_about(&Vector3::x_axis(), rotation.x);
        let ry = Self::rotation_about(&Vector3::y_axis(), rotation.y);
        let rz = Self::rotation_about(&Vector3::z_axis(), rotation.z);

        rx * ry * rz
    }

    /// Rotation of `degrees` about `axis` through the origin
    pub fn rotation_about(axis: &Unit<Vector3<f32>>, degrees: f32) -> Matrix4<f32> {
        Matrix4::from_axis_angle(axis, degrees.to_radians())
    }

    /// Rotation of `degrees` about the line through `pivot` along `axis`:
    /// `T(pivot) * R * T(-pivot)`
    pub fn pivot_rotation(pivot: &Point3<f32>, axis: &Unit<Vector3<f32>>, degrees: f32) -> Matrix4<f32> {
        Matrix4::new_translation(&pivot.coords)
            * Self::rotation_about(axis, degrees)
            * Matrix4::new_translation(&-pivot.coords)
    }

    /// Create a translation matrix
    pub fn translation_matrix(x: f32, y: f32, z: f32) -> Matrix4<f32> {
        Matrix4::new_translation(&Vector3::new(x, y, z))
    }

    /// Create a scale matrix
    pub fn scale_matrix(sx: f32, sy: f32, sz: f32) -> Matrix4<f32> {
        Matrix4::new_nonuniform_scaling(&Vector3::new(sx, sy, sz))
    }

    /// Upper-left 3x3 block (rotation and scale, no translation)
    pub fn normal_block(m: &Matrix4<f32>) -> Matrix3<f32> {
        m.fixed_view::<3, 3>(0, 0).into_owned()
    }

    /// Move a normal through a linear block and re-normalize it
    pub fn apply_normal(linear: &Matrix3<f32>, normal: &Vector3<f32>) -> Vector3<f32> {
        (linear * normal)
            .try_normalize(f32::EPSILON)
            .unwrap_or(*normal)
    }

    /// Shader normal matrix: inverse-transpose of the upper 3x3 block
    pub fn normal_matrix(model_view: &Matrix4<f32>) -> Matrix3<f32> {
        let upper = Self::normal_block(model_view);
        upper
            .transpose()
            .try_inverse()
            .unwrap_or_else(Matrix3::identity)
    }

    /// Create a model-view-projection matrix
    pub fn mvp_matrix(
        model: &Matrix4<f32>,
        view: &Matrix4<f32>,
        projection: &Matrix4<f32>,
    ) -> Matrix4<f32> {
        projection * view * model
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_axis_from_str() {
        assert_eq!("Y".parse::<Axis>(), Ok(Axis::Y));
        assert_eq!(
            "w".parse::<Axis>(),
            Err(HingevizError::UnknownName {
                what: "axis",
                name: "w".to_string(),
                expected: "x, y or z",
            })
        );
    }

    #[test]
    fn test_rotation_state() {
        let mut state = RotationState::zero();
        assert_eq!(state.x, 0.0);
        assert_eq!(state.y, 0.0);
        assert_eq!(state.z, 0.0);

        state.rotate(10.0, 20.0, 30.0);
        assert!((state.x - 10.0).abs() < 1e-6);
        assert!((state.y - 20.0).abs() < 1e-6);
        assert!((state.z - 30.0).abs() < 1e-6);
    }

    #[test]
    fn test_spin_wraps() {
        let mut state = RotationState::new(0.0, 359.0, 0.0);
        state.spin(Axis::Y, 2.0);
        assert!((state.y - 1.0).abs() < 1e-4);
    }

    #[test]
    fn test_identity_rotation() {
        let rotation = RotationState::zero();
        let matrix = Transform::rotation_matrix(&rotation);
        assert!((matrix - Matrix4::identity()).norm() < 1e-6);
    }

    #[test]
    fn test_pivot_rotation_fixes_pivot() {
        let pivot = Point3::new(0.0, 0.0, 0.6);
        let m = Transform::pivot_rotation(&pivot, &Vector3::x_axis(), -37.0);
        let moved = m.transform_point(&pivot);
        assert!((moved - pivot).norm() < 1e-6);

        let other = m.transform_point(&Point3::new(0.0, 0.0, 0.0));
        assert!(((other - pivot).norm() - 0.6).abs() < 1e-5);
    }

    #[test]
    fn test_rotation_about_y_quarter_turn() {
        let m = Transform::rotation_about(&Vector3::y_axis(), 90.0);
        let p = m.transform_point(&Point3::new(1.0, 0.0, 0.0));
        assert!((p - Point3::new(0.0, 0.0, -1.0)).norm() < 1e-6);
    }

    #[test]
    fn test_normal_matrix_ignores_translation() {
        let m = Transform::translation_matrix(3.0, -2.0, 7.0);
        assert!((Transform::normal_matrix(&m) - Matrix3::identity()).norm() < 1e-6);
    }

    #[test]
    fn test_normal_matrix_inverts_nonuniform_scale() {
        let m = Transform::scale_matrix(2.0, 1.0, 1.0);
        let n = Transform::normal_matrix(&m);
        assert!((n[(0, 0)] - 0.5).abs() < 1e-6);
    }

    #[test]
    fn test_object_transform_default_is_identity() {
        let object = ObjectTransform::default();
        assert!((object.model_matrix() - Matrix4::identity()).norm() < 1e-6);
    }
}
