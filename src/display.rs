//! The showcased asset: loading, pointer-driven orientation and the
//! reveal/conceal transitions.

use crate::animation::{Property, Tween};
use crate::config::DisplayConfig;
use crate::error::AssetLoadError;
use crate::loader::{self, Aabb};
use crate::scene::{self, NodeId, SceneNode, SceneRoot, Transform};
use cgmath::{Point3, Rad, Vector2};
use std::sync::Arc;

/// Smoothed orientation, in radians.
///
/// `x` is rotation about the horizontal axis (pitch), `y` about the vertical
/// axis (yaw).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OrientationState
{
        pub target: Vector2<f32>,
        pub current: Vector2<f32>,
        pub sensitivity: f32,
        pub smoothness: f32,
}

impl OrientationState
{
        pub fn new(
                sensitivity: f32,
                smoothness: f32,
        ) -> Self
        {
                Self {
                        target: Vector2::new(0.0, 0.0),
                        current: Vector2::new(0.0, 0.0),
                        sensitivity,
                        smoothness,
                }
        }

        /// Horizontal pointer offset turns the asset about its vertical axis
        /// and vice versa.
        pub fn set_target(
                &mut self,
                nx: f32,
                ny: f32,
        )
        {
                self.target.y = nx * self.sensitivity;
                self.target.x = ny * self.sensitivity;
        }

        pub fn advance(&mut self)
        {
                self.current += (self.target - self.current) * self.smoothness;
        }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssetState
{
        Unloaded,
        Loading,
        Ready,
        LoadFailed,
}

pub struct DisplayObject
{
        scene: SceneRoot,
        config: DisplayConfig,
        orientation: OrientationState,
        state: AssetState,
        node: Option<NodeId>,
        bounds: Option<Aabb>,
}

impl DisplayObject
{
        pub fn new(
                scene: SceneRoot,
                config: DisplayConfig,
        ) -> Self
        {
                let orientation = OrientationState::new(config.sensitivity, config.smoothness);

                Self {
                        scene,
                        config,
                        orientation,
                        state: AssetState::Unloaded,
                        node: None,
                        bounds: None,
                }
        }

        /// Loads `file_name` from `root` and attaches it to the scene.
        ///
        /// Nothing is attached when the load fails; the object returns to a
        /// state from which `load` may be called again.
        pub async fn load(
                &mut self,
                root: &str,
                file_name: &str,
        ) -> Result<NodeId, AssetLoadError>
        {
                if self.state == AssetState::Ready
                {
                        return Err(AssetLoadError::AlreadyLoaded);
                }

                self.state = AssetState::Loading;

                let asset = match loader::load_asset(root, file_name).await
                {
                        Ok(asset) => asset,
                        Err(e) =>
                        {
                                self.state = AssetState::LoadFailed;
                                return Err(e);
                        }
                };

                let [x, y, z] = self.config.initial_position;

                let mut transform = Transform {
                        position: Point3::new(x, y, z),
                        ..Default::default()
                };
                transform.set_uniform_scale(self.config.initial_scale);

                if let Some(bounds) = asset.bounds().map(|b| b.transformed(&transform.matrix()))
                {
                        let size = bounds.size();
                        let center = bounds.center();

                        log::info!(
                                "{} size {:.3} x {:.3} x {:.3}, centre ({:.3}, {:.3}, {:.3})",
                                file_name,
                                size.x,
                                size.y,
                                size.z,
                                center.x,
                                center.y,
                                center.z
                        );

                        self.bounds = Some(bounds);
                }

                let node = SceneNode {
                        name: file_name.to_string(),
                        transform,
                        visible: true,
                        asset: Arc::new(asset),
                };

                let id = {
                        let mut scene = scene::lock(&self.scene);
                        let id = scene.attach(node);
                        scene.set_subject(id);
                        id
                };

                self.orientation.current = Vector2::new(transform.rotation.x.0, transform.rotation.y.0);
                self.orientation.target = self.orientation.current;
                self.node = Some(id);
                self.state = AssetState::Ready;

                Ok(id)
        }

        pub fn set_orientation_target(
                &mut self,
                nx: f32,
                ny: f32,
        )
        {
                if self.node.is_none()
                {
                        return;
                }

                self.orientation.set_target(nx, ny);
        }

        /// One smoothing step, written onto the node's rotation.
        pub fn advance(&mut self)
        {
                let Some(id) = self.node
                else
                {
                        return;
                };

                self.orientation.advance();

                let mut scene = scene::lock(&self.scene);

                if let Some(node) = scene.node_mut(id)
                {
                        node.transform.rotation.x = Rad(self.orientation.current.x);
                        node.transform.rotation.y = Rad(self.orientation.current.y);
                }
        }

        pub fn reveal(&mut self)
        {
                self.transition_to(self.config.visible_offset, "reveal");
        }

        pub fn conceal(&mut self)
        {
                self.transition_to(self.config.hidden_offset, "conceal");
        }

        fn transition_to(
                &mut self,
                offset: f32,
                label: &str,
        )
        {
                let Some(id) = self.node
                else
                {
                        return;
                };

                let mut scene = scene::lock(&self.scene);

                let Some(from) = scene.node(id).map(|n| n.transform.property(Property::PositionY))
                else
                {
                        return;
                };

                log::info!("Starting {label}: y {from:.3} -> {offset:.3}");

                scene.animator.start(
                        id,
                        Property::PositionY,
                        Tween::new(from, offset, self.config.transition_secs, self.config.easing),
                );
        }

        pub fn asset(&self) -> Option<NodeId>
        {
                self.node
        }

        pub fn state(&self) -> AssetState
        {
                self.state
        }

        pub fn bounds(&self) -> Option<Aabb>
        {
                self.bounds
        }

        pub fn orientation(&self) -> &OrientationState
        {
                &self.orientation
        }
}

#[cfg(test)]
mod tests
{
        use super::*;
        use crate::config::LightingConfig;
        use crate::loader::tests::fixture_root;
        use crate::scene::Scene;
        use std::time::Duration;

        const EPS: f32 = 1e-6;

        fn root() -> SceneRoot
        {
                scene::new_root(Scene::new(&LightingConfig::default()))
        }

        fn loaded(tag: &str) -> (SceneRoot, DisplayObject)
        {
                let scene = root();
                let mut display = DisplayObject::new(scene.clone(), DisplayConfig::default());
                let dir = fixture_root(tag);

                pollster::block_on(display.load(&dir, "triangle.gltf")).unwrap();

                (scene, display)
        }

        #[test]
        fn target_scales_pointer_by_sensitivity()
        {
                let mut state = OrientationState::new(0.2, 0.1);

                for (nx, ny) in [(1.0, -1.0), (-0.5, 0.25), (0.0, 1.0), (-1.0, -1.0)]
                {
                        state.set_target(nx, ny);

                        assert!((state.target.y - nx * 0.2).abs() < EPS);
                        assert!((state.target.x - ny * 0.2).abs() < EPS);

                        let before = state.target;
                        state.advance();
                        assert_eq!(state.target, before);
                }
        }

        #[test]
        fn advance_converges_monotonically()
        {
                let mut state = OrientationState::new(1.0, 0.1);
                state.set_target(1.0, -1.0);

                let mut previous = (state.target - state.current).x.abs();
                let mut steps = 0;

                while (state.target - state.current).x.abs() > 1e-6 || (state.target - state.current).y.abs() > 1e-6
                {
                        state.advance();
                        steps += 1;

                        let distance = (state.target - state.current).x.abs();
                        assert!(distance <= previous);
                        previous = distance;

                        assert!(steps < 200, "did not converge");
                }
        }

        #[test]
        fn end_to_end_single_step()
        {
                let (_scene, mut display) = loaded("display-e2e");

                display.set_orientation_target(1.0, -1.0);

                let target = display.orientation().target;
                assert!((target.x + 0.2).abs() < EPS);
                assert!((target.y - 0.2).abs() < EPS);

                display.advance();

                let current = display.orientation().current;
                assert!((current.x + 0.02).abs() < EPS);
                assert!((current.y - 0.02).abs() < EPS);
        }

        #[test]
        fn advance_only_touches_rotation()
        {
                let (scene, mut display) = loaded("display-rotation");
                let id = display.asset().unwrap();

                let before = scene::lock(&scene).node(id).unwrap().transform;

                display.set_orientation_target(0.5, 0.5);
                display.advance();

                let after = scene::lock(&scene).node(id).unwrap().transform;

                assert_eq!(after.position, before.position);
                assert_eq!(after.scale, before.scale);
                assert!((after.rotation.x.0 - 0.01).abs() < EPS);
                assert!((after.rotation.y.0 - 0.01).abs() < EPS);
                assert_eq!(after.rotation.z, before.rotation.z);
        }

        #[test]
        fn calls_before_load_are_no_ops()
        {
                let scene = root();
                let mut display = DisplayObject::new(scene.clone(), DisplayConfig::default());

                display.set_orientation_target(1.0, 1.0);
                display.advance();
                display.reveal();
                display.conceal();

                assert_eq!(*display.orientation(), OrientationState::new(0.2, 0.1));
                assert_eq!(display.state(), AssetState::Unloaded);
                assert!(display.asset().is_none());

                let scene = scene::lock(&scene);
                assert!(scene.is_empty());
                assert!(scene.animator.is_empty());
        }

        #[test]
        fn last_transition_wins()
        {
                let (scene, mut display) = loaded("display-tween");
                let id = display.asset().unwrap();
                let config = DisplayConfig::default();

                display.conceal();
                scene::lock(&scene).step_animations(Duration::from_secs(2));

                display.reveal();
                scene::lock(&scene).step_animations(Duration::from_millis(400));
                display.conceal();

                let mut last = scene::lock(&scene).node(id).unwrap().transform.position.y;

                for _ in 0..40
                {
                        let mut guard = scene::lock(&scene);
                        guard.step_animations(Duration::from_millis(50));

                        let y = guard.node(id).unwrap().transform.position.y;
                        assert!(y <= last + EPS, "moved away from the concealed offset");
                        last = y;
                }

                let guard = scene::lock(&scene);
                assert_eq!(guard.node(id).unwrap().transform.position.y, config.hidden_offset);
                assert!(guard.animator.is_empty());
        }

        #[test]
        fn failed_load_attaches_nothing()
        {
                let scene = root();
                let mut display = DisplayObject::new(scene.clone(), DisplayConfig::default());
                let dir = fixture_root("display-missing");

                let result = pollster::block_on(display.load(&dir, "missing.glb"));

                assert!(result.is_err());
                assert_eq!(display.state(), AssetState::LoadFailed);
                assert!(display.asset().is_none());
                assert!(scene::lock(&scene).is_empty());

                pollster::block_on(display.load(&dir, "triangle.gltf")).unwrap();
                assert_eq!(display.state(), AssetState::Ready);
        }

        #[test]
        fn second_load_is_rejected()
        {
                let (scene, mut display) = loaded("display-twice");
                let dir = fixture_root("display-twice");

                let err = pollster::block_on(display.load(&dir, "triangle.gltf")).unwrap_err();

                assert!(matches!(err, AssetLoadError::AlreadyLoaded));
                assert_eq!(scene::lock(&scene).len(), 1);
        }

        #[test]
        fn load_places_node_and_marks_subject()
        {
                let (scene, display) = loaded("display-place");
                let id = display.asset().unwrap();
                let scene = scene::lock(&scene);

                assert_eq!(scene.subject(), Some(id));
                assert_eq!(scene.node(id).unwrap().transform.position, Point3::new(0.0, 0.0, 0.0));
                assert!(display.bounds().is_some());
        }
}
