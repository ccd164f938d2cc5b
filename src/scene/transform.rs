//! Transform component

use bevy_ecs::prelude::*;
use bytemuck::{Pod, Zeroable};
use glam::{Mat3, Mat4, Quat, Vec3};

/// Transform component for positioning objects in 3D space
#[derive(Component, Debug, Clone, Copy, PartialEq)]
pub struct Transform {
    pub position: Vec3,
    pub rotation: Quat,
    pub scale: Vec3,
}

impl Default for Transform {
    fn default() -> Self {
        Self {
            position: Vec3::ZERO,
            rotation: Quat::IDENTITY,
            scale: Vec3::ONE,
        }
    }
}

impl Transform {
    pub fn from_position(position: Vec3) -> Self {
        Self {
            position,
            ..Default::default()
        }
    }

    pub fn with_rotation_degrees(mut self, euler: Vec3) -> Self {
        self.set_rotation_degrees(euler);
        self
    }

    /// Set rotation from XYZ Euler angles in degrees
    pub fn set_rotation_degrees(&mut self, euler: Vec3) {
        self.rotation = Quat::from_euler(
            glam::EulerRot::XYZ,
            euler.x.to_radians(),
            euler.y.to_radians(),
            euler.z.to_radians(),
        );
    }

    /// Get the model matrix for this transform
    pub fn matrix(&self) -> Mat4 {
        Mat4::from_scale_rotation_translation(self.scale, self.rotation, self.position)
    }

    /// Get forward direction (local -Z in world space)
    pub fn forward(&self) -> Vec3 {
        self.rotation * -Vec3::Z
    }

    /// Get right direction (local +X in world space)
    pub fn right(&self) -> Vec3 {
        self.rotation * Vec3::X
    }

    /// Get up direction (local +Y in world space)
    pub fn up(&self) -> Vec3 {
        self.rotation * Vec3::Y
    }

    /// Rotate around a world axis
    pub fn rotate_axis(&mut self, axis: Vec3, angle: f32) {
        self.rotation = (Quat::from_axis_angle(axis, angle) * self.rotation).normalize();
    }

    /// Point local -Z at `target`, keeping local +Y as close to `up` as possible
    pub fn look_at(&mut self, target: Vec3, up: Vec3) {
        let forward = (target - self.position).normalize();
        let right = forward.cross(up).normalize();
        let up = right.cross(forward);

        self.rotation = Quat::from_mat3(&Mat3::from_cols(right, up, -forward));
    }

    /// Build uniform data for shaders
    pub fn uniform_data(&self) -> TransformUniformData {
        let model = self.matrix();
        TransformUniformData {
            model,
            normal_matrix: model.inverse().transpose(),
        }
    }
}

/// Transform uniform data for GPU
#[repr(C)]
#[derive(Debug, Clone, Copy, Pod, Zeroable)]
pub struct TransformUniformData {
    pub model: Mat4,
    pub normal_matrix: Mat4,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn look_at_points_forward_at_target() {
        let mut t = Transform::from_position(Vec3::new(3.0, 3.0, 3.0));
        t.look_at(Vec3::ZERO, Vec3::Z);
        let expected = (-Vec3::new(3.0, 3.0, 3.0)).normalize();
        assert!((t.forward() - expected).length() < 1e-5);
        // right-handed basis, up stays on the Z side
        assert!(t.up().z > 0.0);
        assert!((t.right().cross(t.up()) - (-t.forward())).length() < 1e-5);
    }

    #[test]
    fn euler_degrees_rotate_about_z() {
        let t = Transform::default().with_rotation_degrees(Vec3::new(0.0, 0.0, 90.0));
        assert!((t.rotation * Vec3::X - Vec3::Y).length() < 1e-5);
    }

    #[test]
    fn matrix_applies_scale_rotation_translation() {
        let mut t = Transform::from_position(Vec3::new(1.0, 2.0, 3.0));
        t.scale = Vec3::splat(2.0);
        t.set_rotation_degrees(Vec3::new(0.0, 0.0, 180.0));
        let p = t.matrix().transform_point3(Vec3::X);
        assert!((p - Vec3::new(-1.0, 2.0, 3.0)).length() < 1e-5);
    }

    #[test]
    fn normal_matrix_undoes_non_uniform_scale() {
        let mut t = Transform::default();
        t.scale = Vec3::new(2.0, 1.0, 1.0);
        let data = t.uniform_data();
        let n = data.normal_matrix.transform_vector3(Vec3::X);
        assert!((n - Vec3::new(0.5, 0.0, 0.0)).length() < 1e-5);
    }
}
