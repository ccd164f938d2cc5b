//! Per-entity scripted behaviours
//!
//! An entity carries a [`BehaviourBinding`] listing the behaviours attached to
//! it. Every frame [`update_behaviours`] runs the enabled ones in the order
//! they were bound, each with full access to the world.

use bevy_ecs::prelude::*;
use glam::{Vec2, Vec3};
use std::any::Any;
use winit::keyboard::KeyCode;

use super::Transform;
use crate::input::InputState;
use crate::timing::Timing;

pub trait Behaviour: Send + Sync + 'static {
    fn name(&self) -> &'static str;

    /// Advance the behaviour by one frame for `entity`
    fn update(&mut self, entity: Entity, world: &mut World);

    fn as_any_mut(&mut self) -> &mut dyn Any;
}

pub struct BehaviourSlot {
    pub enabled: bool,
    behaviour: Box<dyn Behaviour>,
}

impl BehaviourSlot {
    pub fn name(&self) -> &'static str {
        self.behaviour.name()
    }
}

/// Behaviours attached to an entity, updated in order
#[derive(Component, Default)]
pub struct BehaviourBinding {
    slots: Vec<BehaviourSlot>,
}

impl BehaviourBinding {
    pub fn new() -> Self {
        Self::default()
    }

    /// Attach an enabled behaviour
    pub fn with<T: Behaviour>(mut self, behaviour: T) -> Self {
        self.bind(behaviour);
        self
    }

    pub fn bind<T: Behaviour>(&mut self, behaviour: T) -> &mut Self {
        self.slots.push(BehaviourSlot {
            enabled: true,
            behaviour: Box::new(behaviour),
        });
        self
    }

    /// First attached behaviour of type `T`
    pub fn get_mut<T: Behaviour>(&mut self) -> Option<&mut T> {
        self.slots
            .iter_mut()
            .find_map(|slot| slot.behaviour.as_any_mut().downcast_mut::<T>())
    }

    /// Enable or disable every behaviour of type `T`. Returns how many matched.
    pub fn set_enabled<T: Behaviour>(&mut self, enabled: bool) -> usize {
        let mut count = 0;
        for slot in &mut self.slots {
            if slot.behaviour.as_any_mut().is::<T>() {
                slot.enabled = enabled;
                count += 1;
            }
        }
        count
    }

    pub fn slots(&self) -> &[BehaviourSlot] {
        &self.slots
    }
}

/// Run every enabled behaviour on every entity that has a binding.
///
/// The binding is taken out of the entity while its behaviours run so they
/// can borrow the world mutably, then put back.
pub fn update_behaviours(world: &mut World) {
    let entities: Vec<Entity> = world
        .query_filtered::<Entity, With<BehaviourBinding>>()
        .iter(world)
        .collect();

    for entity in entities {
        let Some(mut binding) = world
            .get_mut::<BehaviourBinding>(entity)
            .map(|mut b| std::mem::take(&mut *b))
        else {
            continue;
        };

        for slot in binding.slots.iter_mut().filter(|s| s.enabled) {
            slot.behaviour.update(entity, world);
        }

        if let Some(mut slot) = world.get_mut::<BehaviourBinding>(entity) {
            // keep anything bound during the update
            binding.slots.append(&mut slot.slots);
            *slot = binding;
        }
    }
}

fn frame_delta(world: &World) -> f32 {
    world.get_resource::<Timing>().map(|t| t.delta).unwrap_or(0.0)
}

/// Spins an entity at a constant rate
pub struct RotateObjectBehaviour {
    pub axis: Vec3,
    /// Degrees per second
    pub speed: f32,
}

impl Default for RotateObjectBehaviour {
    fn default() -> Self {
        Self {
            axis: Vec3::Z,
            speed: 90.0,
        }
    }
}

impl Behaviour for RotateObjectBehaviour {
    fn name(&self) -> &'static str {
        "RotateObject"
    }

    fn update(&mut self, entity: Entity, world: &mut World) {
        let dt = frame_delta(world);
        if let Some(mut transform) = world.get_mut::<Transform>(entity) {
            transform.rotate_axis(self.axis.normalize_or_zero(), (self.speed * dt).to_radians());
        }
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

/// Moves an entity back and forth along a list of points
pub struct FollowPathBehaviour {
    pub points: Vec<Vec3>,
    /// Units per second
    pub speed: f32,
    target: usize,
}

impl FollowPathBehaviour {
    pub fn new(points: Vec<Vec3>, speed: f32) -> Self {
        Self {
            points,
            speed,
            target: 0,
        }
    }

    /// Index of the point currently being approached
    pub fn target_index(&self) -> usize {
        self.target
    }

    /// Step `position` toward the current target; on arrival snap to it and
    /// aim for the next point, wrapping at the end
    pub fn step(&mut self, position: Vec3, dt: f32) -> Vec3 {
        if self.points.is_empty() {
            return position;
        }
        self.target %= self.points.len();
        let target = self.points[self.target];
        let to_target = target - position;
        let travel = self.speed * dt;

        if to_target.length() <= travel {
            self.target = (self.target + 1) % self.points.len();
            target
        } else {
            position + to_target.normalize() * travel
        }
    }
}

impl Behaviour for FollowPathBehaviour {
    fn name(&self) -> &'static str {
        "FollowPath"
    }

    fn update(&mut self, entity: Entity, world: &mut World) {
        let dt = frame_delta(world);
        if let Some(mut transform) = world.get_mut::<Transform>(entity) {
            transform.position = self.step(transform.position, dt);
        }
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

/// Free-fly camera control with +Z up
///
/// - Right mouse + drag: look around
/// - WASD: move along the view direction / strafe
/// - Space / Left Shift: move up / down
pub struct CameraControlBehaviour {
    /// Heading around +Z in radians, 0 looks along +X
    pub yaw: f32,
    /// Elevation in radians
    pub pitch: f32,
    /// Units per second
    pub move_speed: f32,
    /// Radians per pixel
    pub mouse_sensitivity: f32,
    synced: bool,
}

impl Default for CameraControlBehaviour {
    fn default() -> Self {
        Self {
            yaw: 0.0,
            pitch: 0.0,
            move_speed: 5.0,
            mouse_sensitivity: 0.003,
            synced: false,
        }
    }
}

impl CameraControlBehaviour {
    /// Take yaw and pitch from a transform's current facing
    pub fn sync_with_transform(&mut self, transform: &Transform) {
        let forward = transform.forward();
        self.yaw = forward.y.atan2(forward.x);
        self.pitch = forward.z.clamp(-1.0, 1.0).asin();
        self.synced = true;
    }

    pub fn forward_direction(&self) -> Vec3 {
        Vec3::new(
            self.yaw.cos() * self.pitch.cos(),
            self.yaw.sin() * self.pitch.cos(),
            self.pitch.sin(),
        )
    }

    /// Horizontal right vector
    pub fn right_direction(&self) -> Vec3 {
        Vec3::new(self.yaw.sin(), -self.yaw.cos(), 0.0)
    }

    /// Apply one frame of input to `transform`
    pub fn apply(&mut self, transform: &mut Transform, input: &InputState, dt: f32) {
        if !self.synced {
            self.sync_with_transform(transform);
        }

        let delta = input.mouse_delta();
        if input.right_mouse_down() && delta != Vec2::ZERO {
            self.yaw -= delta.x * self.mouse_sensitivity;
            self.pitch -= delta.y * self.mouse_sensitivity;

            let max_pitch = std::f32::consts::FRAC_PI_2 - 0.01;
            self.pitch = self.pitch.clamp(-max_pitch, max_pitch);
            self.yaw %= std::f32::consts::TAU;
        }

        let forward = self.forward_direction();
        let right = self.right_direction();

        let mut velocity = Vec3::ZERO;
        let bindings = [
            (KeyCode::KeyW, forward),
            (KeyCode::KeyS, -forward),
            (KeyCode::KeyD, right),
            (KeyCode::KeyA, -right),
            (KeyCode::Space, Vec3::Z),
            (KeyCode::ShiftLeft, -Vec3::Z),
        ];
        for (key, direction) in bindings {
            if input.is_key_down(key) {
                velocity += direction;
            }
        }

        transform.position += velocity.normalize_or_zero() * self.move_speed * dt;
        let target = transform.position + forward;
        transform.look_at(target, Vec3::Z);
    }
}

impl Behaviour for CameraControlBehaviour {
    fn name(&self) -> &'static str {
        "CameraControl"
    }

    fn update(&mut self, entity: Entity, world: &mut World) {
        let dt = frame_delta(world);
        let Some(input) = world.get_resource::<InputState>().cloned() else {
            return;
        };
        if let Some(mut transform) = world.get_mut::<Transform>(entity) {
            self.apply(&mut transform, &input, dt);
        }
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn world_with_delta(delta: f32) -> World {
        let mut world = World::new();
        world.insert_resource(Timing {
            current_frame: delta,
            last_frame: 0.0,
            delta,
        });
        world.insert_resource(InputState::new());
        world
    }

    #[test]
    fn follow_path_moves_at_speed() {
        let mut path = FollowPathBehaviour::new(vec![Vec3::new(0.0, 0.0, 3.0), Vec3::new(0.0, 0.0, 4.0)], 0.6);
        let p = path.step(Vec3::new(0.0, 0.0, 3.5), 0.5);
        assert!((p - Vec3::new(0.0, 0.0, 3.2)).length() < 1e-5);
        assert_eq!(path.target_index(), 0);
    }

    #[test]
    fn follow_path_snaps_and_cycles() {
        let mut path = FollowPathBehaviour::new(vec![Vec3::new(0.0, 0.0, 3.0), Vec3::new(0.0, 0.0, 4.0)], 0.6);
        let p = path.step(Vec3::new(0.0, 0.0, 3.1), 1.0);
        assert_eq!(p, Vec3::new(0.0, 0.0, 3.0));
        assert_eq!(path.target_index(), 1);

        let mut p = p;
        for _ in 0..10 {
            p = path.step(p, 0.25);
        }
        // reached 4.0 and turned back toward 3.0
        assert_eq!(path.target_index(), 0);
        assert!(p.z < 4.0 && p.z > 3.0);
    }

    #[test]
    fn empty_path_leaves_position() {
        let mut path = FollowPathBehaviour::new(Vec::new(), 1.0);
        assert_eq!(path.step(Vec3::ONE, 1.0), Vec3::ONE);
    }

    #[test]
    fn rotate_object_turns_at_rate() {
        let mut world = world_with_delta(0.5);
        let entity = world
            .spawn((
                Transform::default(),
                BehaviourBinding::new().with(RotateObjectBehaviour::default()),
            ))
            .id();

        update_behaviours(&mut world);

        let t = world.get::<Transform>(entity).unwrap();
        // 45 degrees about Z
        let x = t.rotation * Vec3::X;
        let expected = Vec3::new(1.0, 1.0, 0.0).normalize();
        assert!((x - expected).length() < 1e-5);
        assert_eq!(world.get::<BehaviourBinding>(entity).unwrap().slots().len(), 1);
    }

    #[test]
    fn disabled_behaviours_are_skipped() {
        let mut world = world_with_delta(1.0);
        let mut binding = BehaviourBinding::new()
            .with(RotateObjectBehaviour::default())
            .with(FollowPathBehaviour::new(vec![Vec3::new(10.0, 0.0, 0.0)], 1.0));
        assert_eq!(binding.set_enabled::<RotateObjectBehaviour>(false), 1);
        let entity = world.spawn((Transform::default(), binding)).id();

        update_behaviours(&mut world);

        let t = world.get::<Transform>(entity).unwrap();
        assert_eq!(t.rotation, glam::Quat::IDENTITY);
        assert!((t.position - Vec3::X).length() < 1e-5);
    }

    #[test]
    fn behaviours_can_be_reconfigured() {
        let mut binding = BehaviourBinding::new().with(FollowPathBehaviour::new(vec![], 1.0));
        binding.get_mut::<FollowPathBehaviour>().unwrap().speed = 0.6;
        assert!(binding.get_mut::<RotateObjectBehaviour>().is_none());
        assert!((binding.get_mut::<FollowPathBehaviour>().unwrap().speed - 0.6).abs() < 1e-6);
    }

    #[test]
    fn camera_control_moves_along_view() {
        let mut transform = Transform::from_position(Vec3::new(3.0, 3.0, 3.0));
        transform.look_at(Vec3::ZERO, Vec3::Z);
        let start_forward = transform.forward();

        let mut input = InputState::new();
        input.set_key(KeyCode::KeyW, true);
        let mut control = CameraControlBehaviour::default();
        control.apply(&mut transform, &input, 0.2);

        let moved = transform.position - Vec3::new(3.0, 3.0, 3.0);
        assert!((moved.length() - 1.0).abs() < 1e-4);
        assert!((moved.normalize() - start_forward).length() < 1e-4);
        assert!((transform.forward() - start_forward).length() < 1e-4);
    }

    #[test]
    fn camera_control_space_moves_up_z() {
        let mut transform = Transform::from_position(Vec3::ZERO);
        transform.look_at(Vec3::X, Vec3::Z);
        let mut input = InputState::new();
        input.set_key(KeyCode::Space, true);
        let mut control = CameraControlBehaviour::default();
        control.apply(&mut transform, &input, 1.0);
        assert!((transform.position - Vec3::new(0.0, 0.0, 5.0)).length() < 1e-5);
    }

    #[test]
    fn mouse_look_needs_right_button() {
        let mut transform = Transform::from_position(Vec3::ZERO);
        transform.look_at(Vec3::X, Vec3::Z);
        let mut input = InputState::new();
        input.handle_mouse_motion(100.0, 0.0);
        let mut control = CameraControlBehaviour::default();
        control.apply(&mut transform, &input, 0.0);
        assert!((transform.forward() - Vec3::X).length() < 1e-5);

        input.set_right_mouse(true);
        control.apply(&mut transform, &input, 0.0);
        assert!(transform.forward().y < 0.0);
    }
}
