//! Control panel
//!
//! Lighting mode checkboxes, effect selection and tuning, light settings and
//! an FPS graph. Drawing never mutates engine state directly; it reports a
//! [`UiChanges`] for the engine to apply.

use egui::{Color32, Pos2, Rect, Sense, Shape, Stroke, Vec2};

use crate::postfx::EffectParameter;
use crate::scene::{LightSettings, LightingMode};
use crate::timing::{FpsTracker, FPS_HISTORY};

/// What the user changed this frame
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UiChanges {
    pub lighting_mode: Option<LightingMode>,
    pub light_settings: Option<LightSettings>,
    pub active_effect: Option<usize>,
    pub effect_parameter: Option<f32>,
}

impl UiChanges {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

/// Exclusive lighting mode choice after a checkbox click. Unchecking the
/// active mode keeps it active instead of leaving no mode selected.
pub fn click_lighting_mode(
    current: LightingMode,
    clicked: LightingMode,
    now_checked: bool,
) -> LightingMode {
    if now_checked {
        clicked
    } else {
        current
    }
}

/// Engine state the panel reads
pub struct PanelState<'a> {
    pub light: &'a LightSettings,
    pub effect_names: &'a [&'static str],
    pub active_effect: usize,
    pub effect_parameter: Option<EffectParameter>,
    pub fps: &'a FpsTracker,
}

pub struct ControlPanel {
    pub open: bool,
}

impl Default for ControlPanel {
    fn default() -> Self {
        Self { open: true }
    }
}

impl ControlPanel {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn show(&mut self, ctx: &egui::Context, state: &PanelState) -> UiChanges {
        let mut changes = UiChanges::default();

        egui::Window::new("Controls")
            .open(&mut self.open)
            .default_width(320.0)
            .show(ctx, |ui| {
                lighting_section(ui, state, &mut changes);
                ui.separator();
                effect_section(ui, state, &mut changes);
                ui.separator();
                light_settings_section(ui, state, &mut changes);
                ui.separator();
                fps_section(ui, state.fps);
            });

        changes
    }
}

fn lighting_section(ui: &mut egui::Ui, state: &PanelState, changes: &mut UiChanges) {
    let current = state.light.mode;
    for mode in LightingMode::ALL {
        let mut checked = current == mode;
        if ui.checkbox(&mut checked, mode.label()).clicked() {
            let selected = click_lighting_mode(current, mode, checked);
            if selected != current {
                changes.lighting_mode = Some(selected);
            }
        }
    }
}

fn effect_section(ui: &mut egui::Ui, state: &PanelState, changes: &mut UiChanges) {
    egui::CollapsingHeader::new("Effect Controls")
        .default_open(true)
        .show(ui, |ui| {
            let mut active = state.active_effect;
            let selected_name = state.effect_names.get(active).copied().unwrap_or("-");
            egui::ComboBox::from_label("Effect")
                .selected_text(selected_name)
                .show_ui(ui, |ui| {
                    for (index, name) in state.effect_names.iter().enumerate() {
                        ui.selectable_value(&mut active, index, *name);
                    }
                });
            if active != state.active_effect {
                changes.active_effect = Some(active);
            }

            if let Some(parameter) = state.effect_parameter {
                let mut value = parameter.value;
                let slider = egui::Slider::new(&mut value, parameter.min..=parameter.max)
                    .text(parameter.label);
                if ui.add(slider).changed() {
                    changes.effect_parameter = Some(parameter.clamp(value));
                }
            }
        });
}

fn vec3_drag(ui: &mut egui::Ui, label: &str, value: &mut glam::Vec3, speed: f32) -> bool {
    ui.horizontal(|ui| {
        ui.label(label);
        let mut changed = false;
        for component in [&mut value.x, &mut value.y, &mut value.z] {
            changed |= ui.add(egui::DragValue::new(component).speed(speed)).changed();
        }
        changed
    })
    .inner
}

fn colour_edit(ui: &mut egui::Ui, label: &str, value: &mut glam::Vec3) -> bool {
    ui.horizontal(|ui| {
        ui.label(label);
        let mut rgb = value.to_array();
        let changed = ui.color_edit_button_rgb(&mut rgb).changed();
        *value = glam::Vec3::from_array(rgb);
        changed
    })
    .inner
}

fn light_settings_section(ui: &mut egui::Ui, state: &PanelState, changes: &mut UiChanges) {
    egui::CollapsingHeader::new("Light Settings").show(ui, |ui| {
        let mut light = state.light.clone();
        let mut changed = false;

        changed |= vec3_drag(ui, "Position", &mut light.light_position, 0.1);
        changed |= colour_edit(ui, "Light Colour", &mut light.light_color);
        changed |= ui
            .add(egui::Slider::new(&mut light.light_ambient_strength, 0.0..=1.0).text("Light Ambient"))
            .changed();
        changed |= ui
            .add(egui::Slider::new(&mut light.light_specular_strength, 0.0..=1.0).text("Light Specular"))
            .changed();
        changed |= colour_edit(ui, "Ambient Colour", &mut light.ambient_color);
        changed |= ui
            .add(egui::Slider::new(&mut light.ambient_strength, 0.0..=1.0).text("Ambient Strength"))
            .changed();
        changed |= ui
            .add(egui::DragValue::new(&mut light.attenuation_constant).speed(0.01).prefix("Constant "))
            .changed();
        changed |= ui
            .add(egui::DragValue::new(&mut light.attenuation_linear).speed(0.01).prefix("Linear "))
            .changed();
        changed |= ui
            .add(egui::DragValue::new(&mut light.attenuation_quadratic).speed(0.01).prefix("Quadratic "))
            .changed();

        if changed {
            changes.light_settings = Some(light);
        }
    });
}

/// Points of the FPS graph inside `rect`, oldest sample on the left
pub fn fps_plot_points(samples: &[f32], rect: Rect, max: f32) -> Vec<Pos2> {
    let step = rect.width() / (FPS_HISTORY - 1) as f32;
    let max = max.max(1.0);
    samples
        .iter()
        .enumerate()
        .map(|(i, fps)| {
            let t = (fps / max).clamp(0.0, 1.0);
            Pos2::new(rect.left() + i as f32 * step, rect.bottom() - t * rect.height())
        })
        .collect()
}

fn fps_section(ui: &mut egui::Ui, fps: &FpsTracker) {
    let Some(stats) = fps.stats() else {
        ui.label("FPS: waiting for samples");
        return;
    };

    let samples: Vec<f32> = fps.samples().collect();
    let (response, painter) =
        ui.allocate_painter(Vec2::new(ui.available_width(), 80.0), Sense::hover());
    let rect = response.rect;
    painter.rect_filled(rect, 2.0, Color32::from_gray(20));
    painter.add(Shape::line(
        fps_plot_points(&samples, rect, stats.max),
        Stroke::new(1.5, Color32::LIGHT_GREEN),
    ));

    ui.label(format!(
        "MIN: {:.1}  MAX: {:.1}  AVG: {:.1}",
        stats.min, stats.max, stats.avg
    ));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clicking_active_mode_keeps_it() {
        let mode = LightingMode::AmbientOnly;
        assert_eq!(click_lighting_mode(mode, mode, false), mode);
    }

    #[test]
    fn clicking_other_mode_replaces_selection() {
        assert_eq!(
            click_lighting_mode(LightingMode::NoLighting, LightingMode::SpecularOnly, true),
            LightingMode::SpecularOnly
        );
    }

    #[test]
    fn empty_changes() {
        assert!(UiChanges::default().is_empty());
        let changes = UiChanges {
            active_effect: Some(1),
            ..Default::default()
        };
        assert!(!changes.is_empty());
    }

    #[test]
    fn plot_spans_rect() {
        let rect = Rect::from_min_size(Pos2::new(10.0, 0.0), Vec2::new(127.0, 50.0));
        let samples = vec![60.0; FPS_HISTORY];
        let points = fps_plot_points(&samples, rect, 120.0);
        assert_eq!(points.len(), FPS_HISTORY);
        assert!((points[0].x - 10.0).abs() < 1e-4);
        assert!((points[FPS_HISTORY - 1].x - 137.0).abs() < 1e-3);
        assert!((points[0].y - 25.0).abs() < 1e-4);
    }
}
