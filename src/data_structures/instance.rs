//! Per-draw placement.
//!
//! An [`Instance`] is the position/rotation/scale triple a scene uses to
//! build the model matrix it hands to a draw call.

use cgmath::{One, Vector3};

#[derive(Clone, Debug, PartialEq)]
pub struct Instance {
    pub position: cgmath::Vector3<f32>,
    pub rotation: cgmath::Quaternion<f32>,
    pub scale: cgmath::Vector3<f32>,
}

impl Instance {
    /// Create a new instance with identity transformation (no move, rotate, or scale).
    pub fn new() -> Self {
        Self {
            position: cgmath::Vector3::new(0.0, 0.0, 0.0),
            // `Quaternion::one()` is the identity quaternion (no rotation)
            rotation: cgmath::Quaternion::one(),
            scale: cgmath::Vector3::new(1.0, 1.0, 1.0),
        }
    }

    pub fn at<V: Into<Vector3<f32>>>(position: V) -> Self {
        Self {
            position: position.into(),
            ..Default::default()
        }
    }

    pub fn with_uniform_scale(mut self, scale: f32) -> Self {
        self.scale = Vector3::new(scale, scale, scale);
        self
    }

    /// Translate, then rotate, then scale, i.e. `T * R * S`.
    pub fn to_matrix(&self) -> cgmath::Matrix4<f32> {
        cgmath::Matrix4::from_translation(self.position)
            * cgmath::Matrix4::from(self.rotation)
            * cgmath::Matrix4::from_nonuniform_scale(self.scale.x, self.scale.y, self.scale.z)
    }
}

impl From<cgmath::Vector3<f32>> for Instance {
    fn from(position: cgmath::Vector3<f32>) -> Self {
        Instance::at(position)
    }
}

impl Default for Instance {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cgmath::{Matrix4, SquareMatrix, Vector4};

    #[test]
    fn default_instance_is_identity() {
        assert_eq!(Instance::default().to_matrix(), Matrix4::identity());
    }

    #[test]
    fn scale_is_applied_before_translation() {
        let matrix = Instance::at([1.2, 1.0, 2.0])
            .with_uniform_scale(0.2)
            .to_matrix();
        let corner = matrix * Vector4::new(0.5, 0.5, 0.5, 1.0);
        assert!((corner.x - 1.3).abs() < 1e-5);
        assert!((corner.y - 1.1).abs() < 1e-5);
        assert!((corner.z - 2.1).abs() < 1e-5);
        assert_eq!(matrix.w.truncate(), Vector3::new(1.2, 1.0, 2.0));
    }
}
