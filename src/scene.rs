//! CPU-side scene graph shared between the viewport and the display object.
//!
//! The scene holds the live values the renderer reads every frame: the
//! background, the lighting rig, the environment state and a flat list of
//! nodes. GPU resources for nodes are owned by the renderer and looked up by
//! [`NodeId`].

use crate::animation::{Animator, Property};
use crate::config::LightingConfig;
use crate::loader::AssetData;
use cgmath::{Euler, Matrix4, Point3, Quaternion, Rad, Vector3};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

/// Shared handle to the scene graph root.
pub type SceneRoot = Arc<Mutex<Scene>>;

pub fn new_root(scene: Scene) -> SceneRoot
{
        Arc::new(Mutex::new(scene))
}

/// Locks the scene, recovering the data if a previous holder panicked.
pub fn lock(root: &SceneRoot) -> MutexGuard<'_, Scene>
{
        root.lock().unwrap_or_else(|e| e.into_inner())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub usize);

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transform
{
        pub position: Point3<f32>,
        /// XYZ-ordered Euler angles.
        pub rotation: Euler<Rad<f32>>,
        pub scale: Vector3<f32>,
}

impl Default for Transform
{
        fn default() -> Self
        {
                Self {
                        position: Point3::new(0.0, 0.0, 0.0),
                        rotation: Euler::new(Rad(0.0), Rad(0.0), Rad(0.0)),
                        scale: Vector3::new(1.0, 1.0, 1.0),
                }
        }
}

impl Transform
{
        pub fn matrix(&self) -> Matrix4<f32>
        {
                let translation = Matrix4::from_translation(Vector3::new(
                        self.position.x,
                        self.position.y,
                        self.position.z,
                ));
                let rotation = Matrix4::from(Quaternion::from(self.rotation));
                let scale = Matrix4::from_nonuniform_scale(self.scale.x, self.scale.y, self.scale.z);

                translation * rotation * scale
        }

        pub fn set_uniform_scale(
                &mut self,
                scale: f32,
        )
        {
                self.scale = Vector3::new(scale, scale, scale);
        }

        fn property_mut(
                &mut self,
                property: Property,
        ) -> &mut f32
        {
                match property
                {
                        Property::PositionX => &mut self.position.x,
                        Property::PositionY => &mut self.position.y,
                        Property::PositionZ => &mut self.position.z,
                }
        }

        pub fn property(
                &self,
                property: Property,
        ) -> f32
        {
                match property
                {
                        Property::PositionX => self.position.x,
                        Property::PositionY => self.position.y,
                        Property::PositionZ => self.position.z,
                }
        }
}

#[derive(Debug)]
pub struct SceneNode
{
        pub name: String,
        pub transform: Transform,
        pub visible: bool,
        pub asset: Arc<AssetData>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AmbientLight
{
        pub color: [f32; 3],
        pub intensity: f32,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DirectionalLight
{
        pub color: [f32; 3],
        pub intensity: f32,
        pub visible: bool,
        /// The light shines from here towards the origin.
        pub position: Point3<f32>,
        pub helper_visible: bool,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Environment
{
        pub exposure: f32,
        /// False while the scene runs on the neutral fallback.
        pub loaded: bool,
}

#[derive(Debug)]
pub struct Scene
{
        pub background: [f32; 3],
        pub ambient: AmbientLight,
        pub directional: DirectionalLight,
        pub environment: Environment,
        pub animator: Animator,
        nodes: Vec<SceneNode>,
        /// Node whose uniform scale the debug panel edits.
        subject: Option<NodeId>,
}

impl Scene
{
        pub fn new(lighting: &LightingConfig) -> Self
        {
                let [x, y, z] = lighting.directional_position;

                Self {
                        background: lighting.background,
                        ambient: AmbientLight {
                                color: lighting.ambient_color,
                                intensity: lighting.ambient_intensity,
                        },
                        directional: DirectionalLight {
                                color: lighting.directional_color,
                                intensity: lighting.directional_intensity,
                                visible: true,
                                position: Point3::new(x, y, z),
                                helper_visible: false,
                        },
                        environment: Environment {
                                exposure: lighting.exposure,
                                loaded: false,
                        },
                        animator: Animator::new(),
                        nodes: Vec::new(),
                        subject: None,
                }
        }

        pub fn attach(
                &mut self,
                node: SceneNode,
        ) -> NodeId
        {
                let id = NodeId(self.nodes.len());

                log::info!("Attaching node {:?} as {:?}", node.name, id);

                self.nodes.push(node);

                id
        }

        pub fn node(
                &self,
                id: NodeId,
        ) -> Option<&SceneNode>
        {
                self.nodes.get(id.0)
        }

        pub fn node_mut(
                &mut self,
                id: NodeId,
        ) -> Option<&mut SceneNode>
        {
                self.nodes.get_mut(id.0)
        }

        pub fn nodes(&self) -> impl Iterator<Item = (NodeId, &SceneNode)>
        {
                self.nodes
                        .iter()
                        .enumerate()
                        .map(|(i, node)| (NodeId(i), node))
        }

        pub fn len(&self) -> usize
        {
                self.nodes.len()
        }

        pub fn is_empty(&self) -> bool
        {
                self.nodes.is_empty()
        }

        pub fn subject(&self) -> Option<NodeId>
        {
                self.subject
        }

        pub fn set_subject(
                &mut self,
                id: NodeId,
        )
        {
                self.subject = Some(id);
        }

        /// Steps the animator and writes the sampled values onto the nodes.
        pub fn step_animations(
                &mut self,
                dt: Duration,
        )
        {
                for sample in self.animator.tick(dt)
                {
                        let Some(node) = self.nodes.get_mut(sample.node.0)
                        else
                        {
                                continue;
                        };

                        *node.transform.property_mut(sample.property) = sample.value;

                        if sample.finished
                        {
                                log::info!(
                                        "Transition of {:?} {:?} finished at {:.3}",
                                        node.name,
                                        sample.property,
                                        sample.value
                                );
                        }
                }
        }
}

#[cfg(test)]
mod tests
{
        use super::*;
        use crate::animation::{Easing, Tween};
        use cgmath::{SquareMatrix, Transform as _};

        fn node(name: &str) -> SceneNode
        {
                SceneNode {
                        name: name.to_string(),
                        transform: Transform::default(),
                        visible: true,
                        asset: Arc::new(AssetData::default()),
                }
        }

        #[test]
        fn identity_transform_is_identity_matrix()
        {
                assert_eq!(Transform::default().matrix(), Matrix4::identity());
        }

        #[test]
        fn matrix_applies_scale_before_translation()
        {
                let mut transform = Transform::default();
                transform.position = Point3::new(1.0, 2.0, 3.0);
                transform.set_uniform_scale(2.0);

                let p = transform.matrix().transform_point(Point3::new(1.0, 0.0, 0.0));

                assert_eq!(p, Point3::new(3.0, 2.0, 3.0));
        }

        #[test]
        fn attach_hands_out_sequential_ids()
        {
                let mut scene = Scene::new(&LightingConfig::default());

                assert_eq!(scene.attach(node("a")), NodeId(0));
                assert_eq!(scene.attach(node("b")), NodeId(1));
                assert_eq!(scene.node(NodeId(1)).unwrap().name, "b");
                assert!(scene.node(NodeId(2)).is_none());
        }

        #[test]
        fn animations_write_node_position()
        {
                let mut scene = Scene::new(&LightingConfig::default());
                let id = scene.attach(node("crown"));

                scene.animator.start(
                        id,
                        Property::PositionY,
                        Tween::new(0.0, -2.0, 1.0, Easing::Linear),
                );

                scene.step_animations(Duration::from_millis(500));
                assert!((scene.node(id).unwrap().transform.position.y + 1.0).abs() < 1e-6);

                scene.step_animations(Duration::from_millis(600));
                assert_eq!(scene.node(id).unwrap().transform.position.y, -2.0);
                assert!(scene.animator.is_empty());
        }
}
