//! Brick Scene - a small ECS scene renderer with Blinn-Phong lighting and a
//! switchable post-processing chain
//!
//! # Features
//! - Handle-based GPU abstraction over wgpu
//! - Scene built on Bevy ECS with per-entity behaviours
//! - OBJ meshes, PNG/BMP/JPG textures, cube maps and `.cube` colour LUTs
//! - Greyscale, sepia, bloom and LUT colour correction post effects
//! - egui control panel for lighting modes, effects and an FPS graph

pub mod args;
pub mod backend;
pub mod demo;
pub mod egui_integration;
pub mod engine;
pub mod error;
pub mod input;
pub mod pipeline;
pub mod postfx;
pub mod resources;
pub mod scene;
pub mod timing;
pub mod ui;
pub mod window;

pub use egui_integration::WgpuEguiIntegration;
pub use engine::Engine;
pub use error::{AssetError, AssetResult, DemoError, DemoResult};
pub use window::Window;

// Re-export wgpu backend for direct access
pub use backend::wgpu_backend::WgpuBackend;

use std::path::PathBuf;

/// Configuration for the demo window and renderer
#[derive(Debug, Clone)]
pub struct DemoConfig {
    /// Window title
    pub title: String,
    /// Initial window width
    pub width: u32,
    /// Initial window height
    pub height: u32,
    /// Enable vsync
    pub vsync: bool,
    /// Directory holding models/, images/ and cubes/
    pub asset_root: PathBuf,
    /// Name of the effect active at startup; bloom when unset
    pub initial_effect: Option<String>,
    /// Scene framebuffer clear colour
    pub clear_color: [f32; 4],
    /// Stop after this many frames
    pub max_frames: Option<u64>,
}

impl Default for DemoConfig {
    fn default() -> Self {
        Self {
            title: "Brick Scene".to_string(),
            width: 1280,
            height: 720,
            vsync: true,
            asset_root: PathBuf::from("."),
            initial_effect: None,
            clear_color: [0.08, 0.17, 0.31, 1.0],
            max_frames: None,
        }
    }
}
