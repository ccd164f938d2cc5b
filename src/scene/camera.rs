//! Camera component

use bevy_ecs::prelude::*;
use bytemuck::{Pod, Zeroable};
use glam::{Mat3, Mat4, Vec3, Vec4};

/// Camera projection type
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Projection {
    Perspective,
    Orthographic,
}

/// Camera attached to an entity; the view comes from the entity's transform
#[derive(Component, Debug, Clone)]
pub struct Camera {
    pub projection: Projection,
    /// Vertical field of view in degrees
    pub fov_degrees: f32,
    /// Visible height of the orthographic volume in world units
    pub ortho_height: f32,
    pub aspect: f32,
    pub near: f32,
    pub far: f32,
}

impl Default for Camera {
    fn default() -> Self {
        Self {
            projection: Projection::Perspective,
            fov_degrees: 90.0,
            ortho_height: 3.0,
            aspect: 16.0 / 9.0,
            near: 0.01,
            far: 1000.0,
        }
    }
}

impl Camera {
    pub fn is_ortho(&self) -> bool {
        self.projection == Projection::Orthographic
    }

    /// Switch between perspective and orthographic projection
    pub fn toggle_ortho(&mut self) {
        self.projection = match self.projection {
            Projection::Perspective => Projection::Orthographic,
            Projection::Orthographic => Projection::Perspective,
        };
    }

    /// Update aspect ratio from a window size
    pub fn set_aspect(&mut self, width: f32, height: f32) {
        if width > 0.0 && height > 0.0 {
            self.aspect = width / height;
        }
    }

    pub fn projection_matrix(&self) -> Mat4 {
        match self.projection {
            Projection::Perspective => Mat4::perspective_rh(
                self.fov_degrees.to_radians(),
                self.aspect,
                self.near,
                self.far,
            ),
            Projection::Orthographic => {
                let half_h = self.ortho_height / 2.0;
                let half_w = half_h * self.aspect;
                Mat4::orthographic_rh(-half_w, half_w, -half_h, half_h, self.near, self.far)
            }
        }
    }

    /// Build camera uniform data from the camera entity's world matrix
    pub fn uniform_data(&self, camera_world: Mat4) -> CameraUniformData {
        let view = camera_world.inverse();
        let proj = self.projection_matrix();
        // rotation only, so the skybox stays centred on the eye
        let sky_view = Mat4::from_mat3(Mat3::from_mat4(view));

        CameraUniformData {
            view,
            proj,
            view_proj: proj * view,
            sky_view_proj: proj * sky_view,
            position: camera_world.w_axis.truncate().extend(1.0),
        }
    }
}

/// Camera uniform data for GPU
#[repr(C)]
#[derive(Debug, Clone, Copy, Pod, Zeroable)]
pub struct CameraUniformData {
    pub view: Mat4,
    pub proj: Mat4,
    pub view_proj: Mat4,
    pub sky_view_proj: Mat4,
    pub position: Vec4,
}

impl CameraUniformData {
    pub fn eye(&self) -> Vec3 {
        self.position.truncate()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene::Transform;

    #[test]
    fn toggle_switches_projection() {
        let mut cam = Camera::default();
        assert!(!cam.is_ortho());
        cam.toggle_ortho();
        assert!(cam.is_ortho());
        cam.toggle_ortho();
        assert!(!cam.is_ortho());
    }

    #[test]
    fn ortho_height_sets_visible_extent() {
        let mut cam = Camera::default();
        cam.toggle_ortho();
        cam.set_aspect(2.0, 1.0);
        let p = cam.projection_matrix().project_point3(Vec3::new(3.0, 1.5, -1.0));
        assert!((p.x - 1.0).abs() < 1e-5);
        assert!((p.y - 1.0).abs() < 1e-5);
    }

    #[test]
    fn ninety_degree_fov_maps_edge_to_clip_border() {
        let mut cam = Camera::default();
        cam.set_aspect(1.0, 1.0);
        let p = cam.projection_matrix().project_point3(Vec3::new(0.0, 2.0, -2.0));
        assert!((p.y - 1.0).abs() < 1e-4);
    }

    #[test]
    fn view_is_inverse_of_camera_transform() {
        let mut t = Transform::from_position(Vec3::new(3.0, 3.0, 3.0));
        t.look_at(Vec3::ZERO, Vec3::Z);
        let data = Camera::default().uniform_data(t.matrix());
        let origin_in_view = data.view.transform_point3(Vec3::ZERO);
        // the target sits straight ahead on -Z
        assert!(origin_in_view.x.abs() < 1e-4);
        assert!(origin_in_view.y.abs() < 1e-4);
        assert!((origin_in_view.z + 27f32.sqrt()).abs() < 1e-4);
        assert!((data.eye() - Vec3::new(3.0, 3.0, 3.0)).length() < 1e-5);
    }

    #[test]
    fn zero_size_keeps_previous_aspect() {
        let mut cam = Camera::default();
        cam.set_aspect(800.0, 0.0);
        assert!((cam.aspect - 16.0 / 9.0).abs() < 1e-6);
    }
}
