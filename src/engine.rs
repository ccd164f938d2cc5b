//! Main engine orchestrator
//!
//! Owns the backend, the scene and the effect chain, and drives one frame:
//! behaviours, scene pass into the offscreen framebuffer, active post effect,
//! screen blit and the control panel.

use std::sync::Arc;
use std::time::Instant;

use bevy_ecs::prelude::*;
use winit::event::WindowEvent;
use winit::keyboard::KeyCode;
use winit::window::Window as WinitWindow;

use crate::backend::traits::*;
use crate::backend::wgpu_backend::WgpuBackend;
use crate::demo::build_demo_scene;
use crate::egui_integration::WgpuEguiIntegration;
use crate::error::DemoResult;
use crate::input::{InputState, KeyPressWatcher};
use crate::pipeline::ForwardPass;
use crate::postfx::{EffectChain, Framebuffer};
use crate::scene::{Camera, GameScene, LightSettings};
use crate::timing::{FpsTracker, Timing};
use crate::ui::{ControlPanel, PanelState, UiChanges};
use crate::DemoConfig;

/// One-shot actions bound to keys
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineAction {
    ToggleOrtho,
}

/// Main engine
pub struct Engine {
    window: Arc<WinitWindow>,
    backend: WgpuBackend,
    forward: ForwardPass,
    scene: GameScene,
    camera: Entity,
    scene_buffer: Framebuffer,
    effects: EffectChain<WgpuBackend>,
    egui: WgpuEguiIntegration,
    panel: ControlPanel,
    fps: FpsTracker,
    watchers: Vec<KeyPressWatcher<EngineAction>>,
    clear_color: [f32; 4],
    started: Instant,
    width: u32,
    height: u32,
    frame_count: u64,
}

impl Engine {
    /// Create the backend and build the scene from the configured asset root
    pub fn new(window: Arc<WinitWindow>, config: &DemoConfig) -> DemoResult<Self> {
        log::info!("Initializing engine");

        let mut backend = WgpuBackend::new(Arc::clone(&window), config.vsync)?;
        let (width, height) = backend.surface_size();

        let mut forward = ForwardPass::new(&mut backend)?;
        let mut scene = GameScene::new();
        let demo = build_demo_scene(&mut backend, &mut forward, &mut scene, &config.asset_root)?;

        let mut scene_buffer = Framebuffer::new("Scene", true);
        scene_buffer.init(&mut backend, width, height)?;

        let mut effects = EffectChain::new(demo.lut);
        effects.init(&mut backend, width, height)?;
        if let Some(name) = &config.initial_effect {
            effects.set_active_by_name(name);
        }

        let egui = WgpuEguiIntegration::new(&backend, &window);

        let mut engine = Self {
            window,
            backend,
            forward,
            scene,
            camera: demo.camera,
            scene_buffer,
            effects,
            egui,
            panel: ControlPanel::new(),
            fps: FpsTracker::new(),
            watchers: vec![KeyPressWatcher::new(KeyCode::KeyT, EngineAction::ToggleOrtho)],
            clear_color: config.clear_color,
            started: Instant::now(),
            width,
            height,
            frame_count: 0,
        };
        engine.update_camera_aspect();

        log::info!(
            "Engine ready at {}x{}, active effect: {}",
            width,
            height,
            engine.effects.active().name()
        );
        Ok(engine)
    }

    pub fn frame_count(&self) -> u64 {
        self.frame_count
    }

    pub fn scene(&mut self) -> &mut GameScene {
        &mut self.scene
    }

    pub fn effects(&mut self) -> &mut EffectChain<WgpuBackend> {
        &mut self.effects
    }

    fn update_camera_aspect(&mut self) {
        let (width, height) = (self.width as f32, self.height as f32);
        if let Some(mut camera) = self.scene.world_mut().get_mut::<Camera>(self.camera) {
            camera.set_aspect(width, height);
        }
    }

    /// Feed a window event to the UI first, then to scene input
    pub fn handle_window_event(&mut self, event: &WindowEvent) {
        let consumed = self.egui.on_window_event(&self.window, event);
        if let Some(mut input) = self.scene.world_mut().get_resource_mut::<InputState>() {
            input.handle_window_event(event, consumed);
        }
    }

    /// Raw mouse motion, used for mouse look
    pub fn handle_mouse_motion(&mut self, dx: f64, dy: f64) {
        if self.egui.wants_pointer_input() {
            return;
        }
        if let Some(mut input) = self.scene.world_mut().get_resource_mut::<InputState>() {
            input.handle_mouse_motion(dx, dy);
        }
    }

    pub fn resize(&mut self, width: u32, height: u32) -> DemoResult<()> {
        if width == 0 || height == 0 {
            return Ok(());
        }
        self.backend.resize(width, height);
        let (width, height) = self.backend.surface_size();
        if (width, height) == (self.width, self.height) {
            return Ok(());
        }
        self.width = width;
        self.height = height;

        self.scene_buffer.resize(&mut self.backend, width, height)?;
        self.effects.resize(&mut self.backend, width, height)?;
        self.update_camera_aspect();
        log::debug!("Resized to {}x{}", width, height);
        Ok(())
    }

    fn run_actions(&mut self) {
        if self.egui.wants_keyboard_input() {
            return;
        }
        let Some(input) = self.scene.world().get_resource::<InputState>() else {
            return;
        };
        let fired: Vec<EngineAction> = self
            .watchers
            .iter_mut()
            .filter_map(|watcher| watcher.poll(input))
            .collect();

        for action in fired {
            match action {
                EngineAction::ToggleOrtho => {
                    if let Some(mut camera) = self.scene.world_mut().get_mut::<Camera>(self.camera) {
                        camera.toggle_ortho();
                        log::info!("Orthographic camera: {}", camera.is_ortho());
                    }
                }
            }
        }
    }

    /// Update the scene and render one frame
    pub fn frame(&mut self) -> DemoResult<()> {
        let now = self.started.elapsed().as_secs_f32();
        if let Some(mut timing) = self.scene.world_mut().get_resource_mut::<Timing>() {
            let delta = timing.advance(now);
            self.fps.record(delta);
        }

        self.run_actions();
        self.scene.update_behaviours();
        if let Some(mut input) = self.scene.world_mut().get_resource_mut::<InputState>() {
            input.end_frame();
        }

        let frame = match self.backend.begin_frame() {
            Ok(frame) => frame,
            Err(BackendError::SurfaceLost) => {
                log::warn!("Surface lost, reconfiguring");
                let (width, height) = (self.width, self.height);
                self.backend.resize(width, height);
                return Ok(());
            }
            Err(err) => return Err(err.into()),
        };

        self.effects.clear_all(&mut self.backend);

        let light = self
            .scene
            .world()
            .get_resource::<LightSettings>()
            .cloned()
            .unwrap_or_default();
        if let Some((_, camera, camera_world)) = self.scene.main_camera() {
            self.forward.write_frame_uniforms(
                &mut self.backend,
                &camera.uniform_data(camera_world),
                &light.uniform_data(),
            );
        }

        self.forward
            .sync_objects(&mut self.backend, self.scene.world_mut())?;
        let items = self.forward.collect_draws(self.scene.world_mut());
        let stats = self
            .forward
            .draw(&mut self.backend, &self.scene_buffer, self.clear_color, &items)?;
        log::trace!(
            "Frame {}: {} draws, {} pipeline switches, {} material switches",
            self.frame_count,
            stats.draws,
            stats.pipeline_switches,
            stats.material_switches
        );

        self.effects
            .apply_active(&mut self.backend, &self.scene_buffer)?;
        self.effects
            .draw_active_to_screen(&mut self.backend, frame.swapchain_view)?;

        let effect_names = self.effects.names();
        let panel_state = PanelState {
            light: &light,
            effect_names: &effect_names,
            active_effect: self.effects.active_index(),
            effect_parameter: self.effects.active_parameter(),
            fps: &self.fps,
        };
        let panel = &mut self.panel;
        let changes = self
            .egui
            .run(&self.window, |ctx| panel.show(ctx, &panel_state));
        self.egui
            .render(&mut self.backend, frame.swapchain_view, frame.width, frame.height);

        self.backend.end_frame()?;

        if !changes.is_empty() {
            self.apply_ui_changes(changes);
        }
        self.frame_count += 1;
        Ok(())
    }

    fn apply_ui_changes(&mut self, changes: UiChanges) {
        let world = self.scene.world_mut();

        if let Some(settings) = changes.light_settings {
            if let Some(mut light) = world.get_resource_mut::<LightSettings>() {
                let mode = light.mode;
                *light = LightSettings { mode, ..settings };
            }
        }

        if let Some(mode) = changes.lighting_mode {
            if let Some(mut light) = world.get_resource_mut::<LightSettings>() {
                light.mode = mode;
            }
            self.effects.set_apply_bloom(mode.flags().apply_bloom);
            log::info!("Lighting mode: {}", mode.label());
        }

        if let Some(index) = changes.active_effect {
            if self.effects.set_active(index) {
                log::info!("Active effect: {}", self.effects.active().name());
            }
        }

        if let Some(value) = changes.effect_parameter {
            self.effects.set_active_parameter(value);
        }
    }

    /// Release GPU resources owned outside the backend's own drop
    pub fn shutdown(&mut self) {
        log::info!("Shutting down after {} frames", self.frame_count);
        self.effects.release(&mut self.backend);
        self.scene_buffer.release(&mut self.backend);
    }
}
