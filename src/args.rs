//! Command line arguments

use clap::Parser;
use std::path::PathBuf;

use crate::DemoConfig;

/// Brick scene renderer arguments.
#[derive(Parser, Debug)]
#[command(
    name = "brick-scene",
    about = "Blinn-Phong brick scene with switchable post effects",
    long_about = "Renders a small scene of brick figures with Blinn-Phong lighting, \
        then runs one post effect (greyscale, sepia, bloom or colour correction) \
        over the result.\n\n\
        CONTROLS:\n\
          Right mouse + drag   look around\n\
          W A S D              move\n\
          Space / Left Shift   up / down\n\
          T                    toggle orthographic camera\n\n\
        EXAMPLES:\n\
          # Run with assets from another directory\n\
          ./brick-scene --assets ../res\n\
        \n\
          # Start on the sepia effect and quit after 100 frames\n\
          ./brick-scene --effect sepia --max-frames 100",
    version
)]
pub struct Args {
    /// Directory containing models/, images/ and cubes/.
    #[arg(long, default_value = ".")]
    pub assets: PathBuf,

    /// Initial window width in pixels.
    #[arg(long, default_value = "1280")]
    pub width: u32,

    /// Initial window height in pixels.
    #[arg(long, default_value = "720")]
    pub height: u32,

    /// Disable vertical sync.
    #[arg(long)]
    pub no_vsync: bool,

    /// Effect active at startup (greyscale, sepia, bloom, "colour correction").
    #[arg(long)]
    pub effect: Option<String>,

    /// Exit after this many frames.
    #[arg(long)]
    pub max_frames: Option<u64>,
}

impl Args {
    pub fn into_config(self) -> DemoConfig {
        DemoConfig {
            width: self.width.max(1),
            height: self.height.max(1),
            vsync: !self.no_vsync,
            asset_root: self.assets,
            initial_effect: self.effect,
            max_frames: self.max_frames,
            ..Default::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_config_defaults() {
        let config = Args::try_parse_from(["brick-scene"]).unwrap().into_config();
        let defaults = DemoConfig::default();
        assert_eq!(config.width, defaults.width);
        assert_eq!(config.height, defaults.height);
        assert!(config.vsync);
        assert_eq!(config.asset_root, PathBuf::from("."));
        assert!(config.initial_effect.is_none());
        assert!(config.max_frames.is_none());
    }

    #[test]
    fn flags_are_applied() {
        let config = Args::try_parse_from([
            "brick-scene",
            "--assets",
            "res",
            "--width",
            "800",
            "--height",
            "600",
            "--no-vsync",
            "--effect",
            "sepia",
            "--max-frames",
            "10",
        ])
        .unwrap()
        .into_config();

        assert_eq!((config.width, config.height), (800, 600));
        assert!(!config.vsync);
        assert_eq!(config.asset_root, PathBuf::from("res"));
        assert_eq!(config.initial_effect.as_deref(), Some("sepia"));
        assert_eq!(config.max_frames, Some(10));
    }

    #[test]
    fn zero_size_is_raised() {
        let config = Args::try_parse_from(["brick-scene", "--width", "0"])
            .unwrap()
            .into_config();
        assert_eq!(config.width, 1);
    }
}
