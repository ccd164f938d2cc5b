//! Keyboard and mouse state
//!
//! Window events are folded into an [`InputState`] resource which behaviours
//! read during their update. [`KeyPressWatcher`] turns a held key into a
//! one-shot action.

use bevy_ecs::prelude::*;
use glam::Vec2;
use std::collections::HashSet;
use winit::event::{ElementState, MouseButton, WindowEvent};
use winit::keyboard::{KeyCode, PhysicalKey};

#[derive(Resource, Debug, Clone, Default)]
pub struct InputState {
    held: HashSet<KeyCode>,
    right_mouse: bool,
    /// Raw mouse motion accumulated since the last `end_frame`
    mouse_delta: Vec2,
}

impl InputState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold a window event into the state. Presses the UI consumed are
    /// dropped; releases always land so nothing stays held.
    pub fn handle_window_event(&mut self, event: &WindowEvent, consumed_by_ui: bool) {
        match event {
            WindowEvent::KeyboardInput { event, .. } => {
                if let PhysicalKey::Code(code) = event.physical_key {
                    self.key_input(code, event.state == ElementState::Pressed, consumed_by_ui);
                }
            }
            WindowEvent::MouseInput { state, button: MouseButton::Right, .. } => {
                self.right_mouse_input(*state == ElementState::Pressed, consumed_by_ui);
            }
            WindowEvent::Focused(false) => {
                self.held.clear();
                self.right_mouse = false;
            }
            _ => {}
        }
    }

    pub fn key_input(&mut self, key: KeyCode, pressed: bool, consumed_by_ui: bool) {
        if pressed && consumed_by_ui {
            return;
        }
        self.set_key(key, pressed);
    }

    pub fn right_mouse_input(&mut self, pressed: bool, consumed_by_ui: bool) {
        if pressed && consumed_by_ui {
            return;
        }
        self.right_mouse = pressed;
    }

    pub fn handle_mouse_motion(&mut self, dx: f64, dy: f64) {
        self.mouse_delta += Vec2::new(dx as f32, dy as f32);
    }

    pub fn set_key(&mut self, key: KeyCode, down: bool) {
        if down {
            self.held.insert(key);
        } else {
            self.held.remove(&key);
        }
    }

    pub fn set_right_mouse(&mut self, down: bool) {
        self.right_mouse = down;
    }

    pub fn is_key_down(&self, key: KeyCode) -> bool {
        self.held.contains(&key)
    }

    pub fn right_mouse_down(&self) -> bool {
        self.right_mouse
    }

    pub fn mouse_delta(&self) -> Vec2 {
        self.mouse_delta
    }

    /// Clear per-frame deltas
    pub fn end_frame(&mut self) {
        self.mouse_delta = Vec2::ZERO;
    }
}

/// Fires `action` once on the frame `key` goes from up to down
#[derive(Debug, Clone)]
pub struct KeyPressWatcher<A: Copy> {
    pub key: KeyCode,
    pub action: A,
    was_down: bool,
}

impl<A: Copy> KeyPressWatcher<A> {
    pub fn new(key: KeyCode, action: A) -> Self {
        Self {
            key,
            action,
            was_down: false,
        }
    }

    pub fn poll(&mut self, input: &InputState) -> Option<A> {
        let down = input.is_key_down(self.key);
        let fired = down && !self.was_down;
        self.was_down = down;
        fired.then_some(self.action)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, Copy, PartialEq)]
    enum Action {
        ToggleOrtho,
    }

    #[test]
    fn watcher_fires_once_per_press() {
        let mut input = InputState::new();
        let mut watcher = KeyPressWatcher::new(KeyCode::KeyT, Action::ToggleOrtho);

        assert_eq!(watcher.poll(&input), None);
        input.set_key(KeyCode::KeyT, true);
        assert_eq!(watcher.poll(&input), Some(Action::ToggleOrtho));
        assert_eq!(watcher.poll(&input), None);
        assert_eq!(watcher.poll(&input), None);
        input.set_key(KeyCode::KeyT, false);
        assert_eq!(watcher.poll(&input), None);
        input.set_key(KeyCode::KeyT, true);
        assert_eq!(watcher.poll(&input), Some(Action::ToggleOrtho));
    }

    #[test]
    fn other_keys_do_not_trigger() {
        let mut input = InputState::new();
        let mut watcher = KeyPressWatcher::new(KeyCode::KeyT, Action::ToggleOrtho);
        input.set_key(KeyCode::KeyW, true);
        assert_eq!(watcher.poll(&input), None);
    }

    #[test]
    fn mouse_delta_accumulates_until_end_of_frame() {
        let mut input = InputState::new();
        input.handle_mouse_motion(2.0, -1.0);
        input.handle_mouse_motion(1.0, 0.5);
        assert!((input.mouse_delta() - Vec2::new(3.0, -0.5)).length() < 1e-6);
        input.end_frame();
        assert_eq!(input.mouse_delta(), Vec2::ZERO);
    }

    #[test]
    fn losing_focus_releases_everything() {
        let mut input = InputState::new();
        input.set_key(KeyCode::KeyW, true);
        input.set_right_mouse(true);
        input.handle_window_event(&WindowEvent::Focused(false), true);
        assert!(!input.is_key_down(KeyCode::KeyW));
        assert!(!input.right_mouse_down());
    }

    #[test]
    fn releases_over_the_ui_still_land() {
        let mut input = InputState::new();
        input.right_mouse_input(true, false);
        input.key_input(KeyCode::KeyW, true, false);

        input.right_mouse_input(false, true);
        input.key_input(KeyCode::KeyW, false, true);
        assert!(!input.right_mouse_down());
        assert!(!input.is_key_down(KeyCode::KeyW));
    }

    #[test]
    fn presses_over_the_ui_are_dropped() {
        let mut input = InputState::new();
        input.right_mouse_input(true, true);
        input.key_input(KeyCode::KeyA, true, true);
        assert!(!input.right_mouse_down());
        assert!(!input.is_key_down(KeyCode::KeyA));
    }
}
