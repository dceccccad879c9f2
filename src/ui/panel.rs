use crate::renderer::graph::RenderGraph;
use crate::scene::Scene;
use crate::ui::bindings::{Binding, FieldKind, FieldValue, scene_bindings};
use winit::keyboard::KeyCode;

/// Settings side panel.
///
/// Widgets show the live scene values every frame. Edits are queued and
/// applied by the viewport at the start of its next frame.
#[derive(Debug)]
pub struct DebugPanel
{
        pub visible: bool,
        pub ui_scale: f32,
        toggle_key: KeyCode,
        bindings: Vec<Binding<Scene>>,
        pending: Vec<(usize, FieldValue)>,
}

impl DebugPanel
{
        pub fn new(
                visible: bool,
                ui_scale: f32,
        ) -> Self
        {
                Self {
                        visible,
                        ui_scale,
                        toggle_key: KeyCode::Tab,
                        bindings: scene_bindings(),
                        pending: Vec::new(),
                }
        }

        /// Names `key` in the on-screen hint instead of Tab.
        pub fn with_toggle_key(
                mut self,
                key: KeyCode,
        ) -> Self
        {
                self.toggle_key = key;
                self
        }

        pub fn hint(&self) -> String
        {
                let name = format!("{:?}", self.toggle_key);

                let label = name
                        .strip_prefix("Key")
                        .or_else(|| name.strip_prefix("Digit"))
                        .unwrap_or(&name);

                format!("Press [{label}] to toggle the settings panel")
        }

        /// Drops the binding table and any queued edits and starts over.
        pub fn rebuild(&mut self)
        {
                self.bindings = scene_bindings();
                self.pending.clear();
        }

        pub fn toggle(&mut self)
        {
                self.visible = !self.visible;

                log::info!("Debug panel {}", if self.visible { "shown" } else { "hidden" });
        }

        pub fn bindings(&self) -> &[Binding<Scene>]
        {
                &self.bindings
        }

        /// Queues an edit of the binding called `name` in `folder`.
        pub fn queue_edit(
                &mut self,
                folder: &str,
                name: &str,
                value: FieldValue,
        ) -> bool
        {
                match self
                        .bindings
                        .iter()
                        .position(|b| b.folder == folder && b.name == name)
                {
                        Some(index) =>
                        {
                                self.pending.push((index, value));
                                true
                        }
                        None => false,
                }
        }

        pub fn pending(&self) -> usize
        {
                self.pending.len()
        }

        /// Writes queued edits in the order they were made.
        pub fn apply_pending(
                &mut self,
                scene: &mut Scene,
        ) -> usize
        {
                let mut applied = 0;

                for (index, value) in self.pending.drain(..)
                {
                        if let Some(binding) = self.bindings.get(index)
                        {
                                if binding.write(scene, value)
                                {
                                        log::debug!("{}/{} = {:?}", binding.folder, binding.name, value);
                                        applied += 1;
                                }
                        }
                }

                applied
        }

        pub fn show(
                &mut self,
                ctx: &egui::Context,
                scene: &Scene,
                graph: &mut RenderGraph,
        )
        {
                let hint = self.hint();

                egui::Area::new("hint".into())
                        .fixed_pos(egui::pos2(10.0, 10.0))
                        .show(ctx, |ui| {
                                ui.label(hint);
                        });

                if !self.visible
                {
                        return;
                }

                let mut edits = Vec::new();
                let mut scale = self.ui_scale;

                egui::SidePanel::right("settings_panel")
                        .resizable(true)
                        .show(ctx, |ui| {
                                egui::ScrollArea::new(true).show(ui, |ui| {
                                        ui.horizontal(|ui| {
                                                if ui.button("-").clicked()
                                                {
                                                        scale = (scale - 0.1).max(0.5);
                                                }
                                                if ui.button("+").clicked()
                                                {
                                                        scale = (scale + 0.1).min(3.0);
                                                }
                                                ui.label(format!("UI Scale: {:.1}", scale));
                                        });

                                        let mut folder = "";
                                        let mut start = 0;

                                        // Bindings are grouped by consecutive folder names.
                                        for i in 0..=self.bindings.len()
                                        {
                                                let next = self.bindings.get(i).map(|b| b.folder);

                                                if next != Some(folder) || i == self.bindings.len()
                                                {
                                                        if i > start
                                                        {
                                                                Self::folder_ui(
                                                                        ui,
                                                                        folder,
                                                                        &self.bindings[start..i],
                                                                        start,
                                                                        scene,
                                                                        &mut edits,
                                                                );
                                                        }

                                                        folder = next.unwrap_or("");
                                                        start = i;
                                                }
                                        }

                                        egui::CollapsingHeader::new("Render passes")
                                                .default_open(false)
                                                .show(ui, |ui| {
                                                        for pass in graph.passes.iter_mut()
                                                        {
                                                                let mut enabled = pass.enabled();

                                                                ui.horizontal(|ui| {
                                                                        ui.checkbox(&mut enabled, "");
                                                                        ui.vertical(|ui| pass.ui(ui));
                                                                });

                                                                pass.set_enabled(enabled);
                                                        }
                                                });
                                });
                        });

                self.ui_scale = scale;
                self.pending.extend(edits);
        }

        fn folder_ui(
                ui: &mut egui::Ui,
                folder: &str,
                bindings: &[Binding<Scene>],
                offset: usize,
                scene: &Scene,
                edits: &mut Vec<(usize, FieldValue)>,
        )
        {
                egui::CollapsingHeader::new(folder)
                        .default_open(true)
                        .show(ui, |ui| {
                                egui::Grid::new(folder)
                                        .num_columns(2)
                                        .spacing([40.0, 8.0])
                                        .show(ui, |ui| {
                                                for (i, binding) in bindings.iter().enumerate()
                                                {
                                                        let Some(current) = binding.read(scene)
                                                        else
                                                        {
                                                                continue;
                                                        };

                                                        ui.label(binding.name);

                                                        if let Some(value) = Self::widget(ui, binding.kind, current)
                                                        {
                                                                edits.push((offset + i, value));
                                                        }

                                                        ui.end_row();
                                                }
                                        });
                        });
        }

        fn widget(
                ui: &mut egui::Ui,
                kind: FieldKind,
                current: FieldValue,
        ) -> Option<FieldValue>
        {
                match (kind, current)
                {
                        (FieldKind::Color, FieldValue::Color(mut c)) =>
                        {
                                ui.color_edit_button_rgb(&mut c)
                                        .changed()
                                        .then_some(FieldValue::Color(c))
                        }
                        (FieldKind::Scalar { min, max, step }, FieldValue::Scalar(mut x)) =>
                        {
                                ui.add(egui::Slider::new(&mut x, min..=max).step_by(step))
                                        .changed()
                                        .then_some(FieldValue::Scalar(x))
                        }
                        (FieldKind::Toggle, FieldValue::Toggle(mut b)) =>
                        {
                                ui.checkbox(&mut b, "")
                                        .changed()
                                        .then_some(FieldValue::Toggle(b))
                        }
                        _ => None,
                }
        }
}

#[cfg(test)]
mod tests
{
        use super::*;
        use crate::config::LightingConfig;

        #[test]
        fn hint_names_the_configured_key()
        {
                assert_eq!(
                        DebugPanel::new(true, 1.0).hint(),
                        "Press [Tab] to toggle the settings panel"
                );

                let panel = DebugPanel::new(true, 1.0).with_toggle_key(KeyCode::KeyP);
                assert_eq!(panel.hint(), "Press [P] to toggle the settings panel");

                let panel = DebugPanel::new(true, 1.0).with_toggle_key(KeyCode::F1);
                assert_eq!(panel.hint(), "Press [F1] to toggle the settings panel");
        }

        #[test]
        fn edits_wait_for_apply()
        {
                let mut panel = DebugPanel::new(true, 1.0);
                let mut scene = Scene::new(&LightingConfig::default());

                assert!(panel.queue_edit("Ambient light", "Intensity", FieldValue::Scalar(3.0)));
                assert_ne!(scene.ambient.intensity, 3.0);

                assert_eq!(panel.apply_pending(&mut scene), 1);
                assert_eq!(scene.ambient.intensity, 3.0);
                assert_eq!(panel.pending(), 0);
        }

        #[test]
        fn later_edits_win()
        {
                let mut panel = DebugPanel::new(true, 1.0);
                let mut scene = Scene::new(&LightingConfig::default());

                panel.queue_edit("Environment", "Exposure", FieldValue::Scalar(0.5));
                panel.queue_edit("Environment", "Exposure", FieldValue::Scalar(2.0));
                panel.apply_pending(&mut scene);

                assert_eq!(scene.environment.exposure, 2.0);
        }

        #[test]
        fn unknown_field_is_not_queued()
        {
                let mut panel = DebugPanel::new(true, 1.0);

                assert!(!panel.queue_edit("Fog", "Density", FieldValue::Scalar(1.0)));
                assert_eq!(panel.pending(), 0);
        }

        #[test]
        fn rebuild_starts_from_scratch()
        {
                let mut panel = DebugPanel::new(false, 1.0);

                panel.queue_edit("Helpers", "Light helper", FieldValue::Toggle(true));
                panel.rebuild();
                panel.rebuild();

                assert_eq!(panel.pending(), 0);
                assert_eq!(panel.bindings().len(), scene_bindings().len());
        }

        #[test]
        fn toggle_flips_visibility()
        {
                let mut panel = DebugPanel::new(true, 1.0);

                panel.toggle();
                assert!(!panel.visible);
                panel.toggle();
                assert!(panel.visible);
        }
}
