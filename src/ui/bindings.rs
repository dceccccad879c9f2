//! Named getter/setter pairs the debug panel binds its widgets to.
//!
//! The panel never reaches into the scene on its own: every editable value
//! is listed here with the widget it uses, a getter that reads the live value
//! and a setter that writes an edited one back.

use crate::scene::Scene;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FieldKind
{
        Color,
        Scalar
        {
                min: f32,
                max: f32,
                step: f64,
        },
        Toggle,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FieldValue
{
        Color([f32; 3]),
        Scalar(f32),
        Toggle(bool),
}

pub struct Binding<T>
{
        pub name: &'static str,
        pub folder: &'static str,
        pub kind: FieldKind,
        /// `None` hides the row, e.g. when the target does not exist yet.
        pub get: fn(&T) -> Option<FieldValue>,
        pub set: fn(&mut T, FieldValue),
}

impl<T> std::fmt::Debug for Binding<T>
{
        fn fmt(
                &self,
                f: &mut std::fmt::Formatter<'_>,
        ) -> std::fmt::Result
        {
                f.debug_struct("Binding")
                        .field("name", &self.name)
                        .field("folder", &self.folder)
                        .field("kind", &self.kind)
                        .finish()
        }
}

impl<T> Binding<T>
{
        pub fn read(
                &self,
                target: &T,
        ) -> Option<FieldValue>
        {
                (self.get)(target)
        }

        /// Writes `value` if it matches the binding's kind.
        pub fn write(
                &self,
                target: &mut T,
                value: FieldValue,
        ) -> bool
        {
                let matches = matches!(
                        (self.kind, value),
                        (FieldKind::Color, FieldValue::Color(_))
                                | (FieldKind::Scalar { .. }, FieldValue::Scalar(_))
                                | (FieldKind::Toggle, FieldValue::Toggle(_))
                );

                if !matches
                {
                        log::warn!("Ignoring {value:?} for {}/{}", self.folder, self.name);
                        return false;
                }

                let value = match (self.kind, value)
                {
                        (FieldKind::Scalar { min, max, .. }, FieldValue::Scalar(v)) =>
                        {
                                FieldValue::Scalar(v.clamp(min, max))
                        }
                        (_, v) => v,
                };

                (self.set)(target, value);

                true
        }
}

fn color(v: FieldValue) -> Option<[f32; 3]>
{
        match v
        {
                FieldValue::Color(c) => Some(c),
                _ => None,
        }
}

fn scalar(v: FieldValue) -> Option<f32>
{
        match v
        {
                FieldValue::Scalar(s) => Some(s),
                _ => None,
        }
}

fn toggle(v: FieldValue) -> Option<bool>
{
        match v
        {
                FieldValue::Toggle(b) => Some(b),
                _ => None,
        }
}

const INTENSITY: FieldKind = FieldKind::Scalar {
        min: 0.0,
        max: 10.0,
        step: 0.01,
};

const POSITION: FieldKind = FieldKind::Scalar {
        min: -20.0,
        max: 20.0,
        step: 0.1,
};

/// The full table, rebuilt from scratch whenever the panel is.
pub fn scene_bindings() -> Vec<Binding<Scene>>
{
        vec![
                Binding {
                        name: "Color",
                        folder: "Background",
                        kind: FieldKind::Color,
                        get: |s| Some(FieldValue::Color(s.background)),
                        set: |s, v| {
                                if let Some(c) = color(v)
                                {
                                        s.background = c;
                                }
                        },
                },
                Binding {
                        name: "Intensity",
                        folder: "Ambient light",
                        kind: INTENSITY,
                        get: |s| Some(FieldValue::Scalar(s.ambient.intensity)),
                        set: |s, v| {
                                if let Some(x) = scalar(v)
                                {
                                        s.ambient.intensity = x;
                                }
                        },
                },
                Binding {
                        name: "Color",
                        folder: "Ambient light",
                        kind: FieldKind::Color,
                        get: |s| Some(FieldValue::Color(s.ambient.color)),
                        set: |s, v| {
                                if let Some(c) = color(v)
                                {
                                        s.ambient.color = c;
                                }
                        },
                },
                Binding {
                        name: "Visible",
                        folder: "Directional light",
                        kind: FieldKind::Toggle,
                        get: |s| Some(FieldValue::Toggle(s.directional.visible)),
                        set: |s, v| {
                                if let Some(b) = toggle(v)
                                {
                                        s.directional.visible = b;
                                }
                        },
                },
                Binding {
                        name: "Intensity",
                        folder: "Directional light",
                        kind: INTENSITY,
                        get: |s| Some(FieldValue::Scalar(s.directional.intensity)),
                        set: |s, v| {
                                if let Some(x) = scalar(v)
                                {
                                        s.directional.intensity = x;
                                }
                        },
                },
                Binding {
                        name: "Color",
                        folder: "Directional light",
                        kind: FieldKind::Color,
                        get: |s| Some(FieldValue::Color(s.directional.color)),
                        set: |s, v| {
                                if let Some(c) = color(v)
                                {
                                        s.directional.color = c;
                                }
                        },
                },
                Binding {
                        name: "X",
                        folder: "Directional light",
                        kind: POSITION,
                        get: |s| Some(FieldValue::Scalar(s.directional.position.x)),
                        set: |s, v| {
                                if let Some(x) = scalar(v)
                                {
                                        s.directional.position.x = x;
                                }
                        },
                },
                Binding {
                        name: "Y",
                        folder: "Directional light",
                        kind: POSITION,
                        get: |s| Some(FieldValue::Scalar(s.directional.position.y)),
                        set: |s, v| {
                                if let Some(y) = scalar(v)
                                {
                                        s.directional.position.y = y;
                                }
                        },
                },
                Binding {
                        name: "Z",
                        folder: "Directional light",
                        kind: POSITION,
                        get: |s| Some(FieldValue::Scalar(s.directional.position.z)),
                        set: |s, v| {
                                if let Some(z) = scalar(v)
                                {
                                        s.directional.position.z = z;
                                }
                        },
                },
                Binding {
                        name: "Exposure",
                        folder: "Environment",
                        kind: FieldKind::Scalar {
                                min: 0.0,
                                max: 4.0,
                                step: 0.01,
                        },
                        get: |s| Some(FieldValue::Scalar(s.environment.exposure)),
                        set: |s, v| {
                                if let Some(x) = scalar(v)
                                {
                                        s.environment.exposure = x;
                                }
                        },
                },
                Binding {
                        name: "Light helper",
                        folder: "Helpers",
                        kind: FieldKind::Toggle,
                        get: |s| Some(FieldValue::Toggle(s.directional.helper_visible)),
                        set: |s, v| {
                                if let Some(b) = toggle(v)
                                {
                                        s.directional.helper_visible = b;
                                }
                        },
                },
                Binding {
                        name: "Scale",
                        folder: "Asset",
                        kind: FieldKind::Scalar {
                                min: 0.01,
                                max: 10.0,
                                step: 0.01,
                        },
                        get: |s| {
                                let id = s.subject()?;
                                s.node(id).map(|n| FieldValue::Scalar(n.transform.scale.x))
                        },
                        set: |s, v| {
                                let Some(x) = scalar(v)
                                else
                                {
                                        return;
                                };

                                if let Some(node) = s.subject().and_then(|id| s.node_mut(id))
                                {
                                        node.transform.set_uniform_scale(x);
                                }
                        },
                },
        ]
}

#[cfg(test)]
mod tests
{
        use super::*;
        use crate::config::LightingConfig;
        use crate::loader::AssetData;
        use crate::scene::{SceneNode, Transform};
        use std::sync::Arc;

        fn find<'a>(
                table: &'a [Binding<Scene>],
                folder: &str,
                name: &str,
        ) -> &'a Binding<Scene>
        {
                table.iter()
                        .find(|b| b.folder == folder && b.name == name)
                        .unwrap()
        }

        #[test]
        fn every_panel_field_is_bound()
        {
                let table = scene_bindings();

                for (folder, name) in [
                        ("Background", "Color"),
                        ("Ambient light", "Intensity"),
                        ("Ambient light", "Color"),
                        ("Directional light", "Visible"),
                        ("Directional light", "Intensity"),
                        ("Directional light", "Color"),
                        ("Directional light", "X"),
                        ("Directional light", "Y"),
                        ("Directional light", "Z"),
                        ("Environment", "Exposure"),
                        ("Helpers", "Light helper"),
                        ("Asset", "Scale"),
                ]
                {
                        find(&table, folder, name);
                }

                assert_eq!(table.len(), 12);
        }

        #[test]
        fn code_changes_are_visible_through_getters()
        {
                let table = scene_bindings();
                let mut scene = Scene::new(&LightingConfig::default());

                scene.directional.intensity = 7.5;

                assert_eq!(
                        find(&table, "Directional light", "Intensity").read(&scene),
                        Some(FieldValue::Scalar(7.5))
                );
        }

        #[test]
        fn setters_write_and_clamp()
        {
                let table = scene_bindings();
                let mut scene = Scene::new(&LightingConfig::default());

                assert!(find(&table, "Environment", "Exposure").write(&mut scene, FieldValue::Scalar(9.0)));
                assert_eq!(scene.environment.exposure, 4.0);

                assert!(find(&table, "Background", "Color").write(&mut scene, FieldValue::Color([1.0, 0.0, 0.0])));
                assert_eq!(scene.background, [1.0, 0.0, 0.0]);
        }

        #[test]
        fn mismatched_value_is_rejected()
        {
                let table = scene_bindings();
                let mut scene = Scene::new(&LightingConfig::default());
                let before = scene.ambient.intensity;

                assert!(!find(&table, "Ambient light", "Intensity").write(&mut scene, FieldValue::Toggle(true)));
                assert_eq!(scene.ambient.intensity, before);
        }

        #[test]
        fn scale_follows_the_subject()
        {
                let table = scene_bindings();
                let scale = find(&table, "Asset", "Scale");
                let mut scene = Scene::new(&LightingConfig::default());

                assert_eq!(scale.read(&scene), None);

                let id = scene.attach(SceneNode {
                        name: "crown".to_string(),
                        transform: Transform::default(),
                        visible: true,
                        asset: Arc::new(AssetData::default()),
                });
                scene.set_subject(id);

                scale.write(&mut scene, FieldValue::Scalar(2.5));

                let node = scene.node(id).unwrap();
                assert_eq!(node.transform.scale.x, 2.5);
                assert_eq!(node.transform.scale.z, 2.5);
                assert_eq!(scale.read(&scene), Some(FieldValue::Scalar(2.5)));
        }
}
