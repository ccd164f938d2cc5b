//! Scene lighting settings and lighting modes

use bevy_ecs::prelude::*;
use bytemuck::{Pod, Zeroable};
use glam::{Vec3, Vec4};

/// Lighting mode picked in the control panel
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LightingMode {
    #[default]
    NoLighting,
    AmbientOnly,
    SpecularOnly,
    AmbientAndSpecular,
    /// Ambient and specular lighting with bloom enabled on the bloom effect
    AmbientSpecularAndBloom,
}

/// Shader switches derived from a [`LightingMode`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct LightingFlags {
    pub no_light: bool,
    pub ambient_only: bool,
    pub specular_only: bool,
    pub apply_bloom: bool,
}

impl LightingMode {
    pub const ALL: [LightingMode; 5] = [
        LightingMode::NoLighting,
        LightingMode::AmbientOnly,
        LightingMode::SpecularOnly,
        LightingMode::AmbientAndSpecular,
        LightingMode::AmbientSpecularAndBloom,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            LightingMode::NoLighting => "No Lighting",
            LightingMode::AmbientOnly => "Ambient Only",
            LightingMode::SpecularOnly => "Specular Only",
            LightingMode::AmbientAndSpecular => "Ambient and Specular",
            LightingMode::AmbientSpecularAndBloom => {
                "Ambient and Specular Light with Custom Shader"
            }
        }
    }

    pub fn flags(&self) -> LightingFlags {
        let mut flags = LightingFlags::default();
        match self {
            LightingMode::NoLighting => flags.no_light = true,
            LightingMode::AmbientOnly => flags.ambient_only = true,
            LightingMode::SpecularOnly => flags.specular_only = true,
            LightingMode::AmbientAndSpecular => {}
            LightingMode::AmbientSpecularAndBloom => flags.apply_bloom = true,
        }
        flags
    }
}

/// Scene-wide light parameters, stored as a world resource
#[derive(Resource, Debug, Clone, PartialEq)]
pub struct LightSettings {
    pub mode: LightingMode,
    pub light_position: Vec3,
    pub light_color: Vec3,
    pub light_ambient_strength: f32,
    pub light_specular_strength: f32,
    pub ambient_color: Vec3,
    pub ambient_strength: f32,
    pub attenuation_constant: f32,
    pub attenuation_linear: f32,
    pub attenuation_quadratic: f32,
}

impl Default for LightSettings {
    fn default() -> Self {
        Self {
            mode: LightingMode::NoLighting,
            light_position: Vec3::new(0.0, 0.0, 5.0),
            light_color: Vec3::new(0.9, 0.85, 0.5),
            light_ambient_strength: 0.05,
            light_specular_strength: 1.0,
            ambient_color: Vec3::ONE,
            ambient_strength: 0.1,
            attenuation_constant: 1.0,
            attenuation_linear: 0.09,
            attenuation_quadratic: 0.032,
        }
    }
}

impl LightSettings {
    /// Light intensity factor at `distance` from the light
    pub fn attenuation(&self, distance: f32) -> f32 {
        1.0 / (self.attenuation_constant
            + self.attenuation_linear * distance
            + self.attenuation_quadratic * distance * distance)
    }

    pub fn uniform_data(&self) -> LightingUniformData {
        let flags = self.mode.flags();
        let as_f32 = |b: bool| if b { 1.0 } else { 0.0 };
        LightingUniformData {
            light_position: self.light_position.extend(1.0),
            light_color: self.light_color.extend(self.light_ambient_strength),
            ambient: self.ambient_color.extend(self.ambient_strength),
            attenuation: Vec4::new(
                self.attenuation_constant,
                self.attenuation_linear,
                self.attenuation_quadratic,
                self.light_specular_strength,
            ),
            flags: Vec4::new(
                as_f32(flags.no_light),
                as_f32(flags.ambient_only),
                as_f32(flags.specular_only),
                0.0,
            ),
        }
    }
}

/// Lighting uniform data for GPU
#[repr(C)]
#[derive(Debug, Clone, Copy, Pod, Zeroable)]
pub struct LightingUniformData {
    pub light_position: Vec4,
    pub light_color: Vec4, // w = light ambient strength
    pub ambient: Vec4,     // w = ambient strength
    pub attenuation: Vec4, // x=constant, y=linear, z=quadratic, w=specular strength
    pub flags: Vec4,       // x=no light, y=ambient only, z=specular only
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flag_table() {
        let table = [
            (LightingMode::NoLighting, [true, false, false, false]),
            (LightingMode::AmbientOnly, [false, true, false, false]),
            (LightingMode::SpecularOnly, [false, false, true, false]),
            (LightingMode::AmbientAndSpecular, [false, false, false, false]),
            (LightingMode::AmbientSpecularAndBloom, [false, false, false, true]),
        ];
        for (mode, [no_light, ambient_only, specular_only, apply_bloom]) in table {
            let f = mode.flags();
            assert_eq!(
                (f.no_light, f.ambient_only, f.specular_only, f.apply_bloom),
                (no_light, ambient_only, specular_only, apply_bloom),
                "{:?}",
                mode
            );
        }
    }

    #[test]
    fn initial_mode_is_no_lighting() {
        let settings = LightSettings::default();
        assert_eq!(settings.mode, LightingMode::NoLighting);
        assert_eq!(settings.uniform_data().flags.x, 1.0);
    }

    #[test]
    fn attenuation_uses_default_falloff() {
        let settings = LightSettings::default();
        assert!((settings.attenuation(0.0) - 1.0).abs() < 1e-6);
        let expected = 1.0 / (1.0 + 0.09 * 5.0 + 0.032 * 25.0);
        assert!((settings.attenuation(5.0) - expected).abs() < 1e-6);
    }

    #[test]
    fn uniform_packs_strengths() {
        let data = LightSettings::default().uniform_data();
        assert!((data.light_color.w - 0.05).abs() < 1e-6);
        assert!((data.ambient.w - 0.1).abs() < 1e-6);
        assert!((data.attenuation.w - 1.0).abs() < 1e-6);
    }
}
