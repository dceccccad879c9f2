//! Asset and environment-map loading.
//!
//! Everything here produces CPU-side data only; GPU upload happens in the
//! renderer once the data has been attached to the scene. Native builds read
//! from the asset root directory, wasm builds fetch relative to the page's
//! origin.

use crate::error::{AssetLoadError, EnvironmentLoadError};
use crate::geometry::mesh::MeshData;
use crate::geometry::vertex::ModelVertex;
use crate::material::MaterialData;
use cgmath::{Matrix4, Point3, Quaternion, SquareMatrix, Transform as _, Vector3};
use std::path::{Path, PathBuf};

/// Decoded RGBA8 image.
#[derive(Debug, Clone, PartialEq)]
pub struct ImageData
{
        pub width: u32,
        pub height: u32,
        pub rgba: Vec<u8>,
}

/// Axis-aligned bounding box.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Aabb
{
        pub min: Point3<f32>,
        pub max: Point3<f32>,
}

impl Aabb
{
        pub fn size(&self) -> Vector3<f32>
        {
                self.max - self.min
        }

        pub fn center(&self) -> Point3<f32>
        {
                Point3::new(
                        (self.min.x + self.max.x) * 0.5,
                        (self.min.y + self.max.y) * 0.5,
                        (self.min.z + self.max.z) * 0.5,
                )
        }

        pub fn transformed(
                &self,
                m: &Matrix4<f32>,
        ) -> Aabb
        {
                let corners = [
                        Point3::new(self.min.x, self.min.y, self.min.z),
                        Point3::new(self.max.x, self.min.y, self.min.z),
                        Point3::new(self.min.x, self.max.y, self.min.z),
                        Point3::new(self.min.x, self.min.y, self.max.z),
                        Point3::new(self.max.x, self.max.y, self.min.z),
                        Point3::new(self.max.x, self.min.y, self.max.z),
                        Point3::new(self.min.x, self.max.y, self.max.z),
                        Point3::new(self.max.x, self.max.y, self.max.z),
                ];

                Aabb::from_points(corners.iter().map(|c| m.transform_point(*c)))
                        .unwrap_or(*self)
        }

        pub fn from_points(points: impl IntoIterator<Item = Point3<f32>>) -> Option<Aabb>
        {
                points.into_iter().fold(None, |acc, p| {
                        Some(match acc
                        {
                                None => Aabb {
                                        min: p,
                                        max: p,
                                },
                                Some(b) => Aabb {
                                        min: Point3::new(
                                                b.min.x.min(p.x),
                                                b.min.y.min(p.y),
                                                b.min.z.min(p.z),
                                        ),
                                        max: Point3::new(
                                                b.max.x.max(p.x),
                                                b.max.y.max(p.y),
                                                b.max.z.max(p.z),
                                        ),
                                },
                        })
                })
        }
}

/// A decoded glTF asset.
#[derive(Debug, Default)]
pub struct AssetData
{
        pub name: String,
        pub meshes: Vec<MeshData>,
        pub materials: Vec<MaterialData>,
        pub images: Vec<ImageData>,
}

impl AssetData
{
        /// Bounds of every vertex in asset space.
        pub fn bounds(&self) -> Option<Aabb>
        {
                Aabb::from_points(self.meshes.iter().flat_map(|mesh| {
                        mesh.vertices.iter().map(move |v| {
                                let [x, y, z] = v.position;
                                mesh.transform.transform_point(Point3::new(x, y, z))
                        })
                }))
        }

        pub fn vertex_count(&self) -> usize
        {
                self.meshes.iter().map(|m| m.vertices.len()).sum()
        }
}

#[cfg(not(target_arch = "wasm32"))]
pub fn resource_path(
        root: &str,
        file_name: &str,
) -> PathBuf
{
        let root = Path::new(root);

        if root.is_absolute()
        {
                return root.join(file_name);
        }

        if let Ok(dir) = std::env::var("CARGO_MANIFEST_DIR")
        {
                let candidate = Path::new(&dir).join(root);

                if candidate.exists()
                {
                        return candidate.join(file_name);
                }
        }

        root.join(file_name)
}

#[cfg(target_arch = "wasm32")]
pub fn resource_url(
        root: &str,
        file_name: &str,
) -> Option<reqwest::Url>
{
        let window = web_sys::window()?;
        let origin = window.location().origin().ok()?;
        let root = root.trim_matches('/');

        let base = if root.is_empty()
        {
                format!("{origin}/")
        }
        else
        {
                format!("{origin}/{root}/")
        };

        reqwest::Url::parse(&base).ok()?.join(file_name).ok()
}

#[cfg(target_arch = "wasm32")]
async fn fetch_bytes(url: reqwest::Url) -> Result<Vec<u8>, String>
{
        let response = reqwest::get(url.clone())
                .await
                .map_err(|e| format!("{url}: {e}"))?
                .error_for_status()
                .map_err(|e| format!("{url}: {e}"))?;

        let bytes = response.bytes().await.map_err(|e| format!("{url}: {e}"))?;

        Ok(bytes.to_vec())
}

fn check_extension(file_name: &str) -> Result<(), AssetLoadError>
{
        let lower = file_name.to_ascii_lowercase();

        if lower.ends_with(".gltf") || lower.ends_with(".glb")
        {
                Ok(())
        }
        else
        {
                Err(AssetLoadError::UnsupportedFormat(file_name.to_string()))
        }
}

/// Fetches and decodes a glTF or GLB asset.
pub async fn load_asset(
        root: &str,
        file_name: &str,
) -> Result<AssetData, AssetLoadError>
{
        check_extension(file_name)?;

        #[cfg(not(target_arch = "wasm32"))]
        let (doc, buffers, images) = {
                let path = resource_path(root, file_name);
                let display = path.display().to_string();

                log::info!("Loading glTF from {display}");

                if let Err(source) = std::fs::metadata(&path)
                {
                        return Err(AssetLoadError::Io {
                                path: display,
                                source,
                        });
                }

                gltf::import(&path).map_err(|source| AssetLoadError::Gltf {
                        path: display,
                        source,
                })?
        };

        #[cfg(target_arch = "wasm32")]
        let (doc, buffers, images) = {
                let url = resource_url(root, file_name)
                        .ok_or_else(|| AssetLoadError::Fetch(file_name.to_string()))?;

                log::info!("Fetching glTF from {url}");

                let bytes = fetch_bytes(url).await.map_err(AssetLoadError::Fetch)?;

                gltf::import_slice(&bytes).map_err(|source| AssetLoadError::Gltf {
                        path: file_name.to_string(),
                        source,
                })?
        };

        let asset = read_document(file_name, &doc, &buffers, &images);

        if asset.meshes.is_empty()
        {
                return Err(AssetLoadError::Empty(file_name.to_string()));
        }

        log::info!(
                "Loaded {}: {} meshes, {} materials, {} images, {} vertices",
                file_name,
                asset.meshes.len(),
                asset.materials.len(),
                asset.images.len(),
                asset.vertex_count()
        );

        Ok(asset)
}

/// Fetches and decodes the equirectangular environment image.
pub async fn load_environment(
        root: &str,
        file_name: &str,
) -> Result<ImageData, EnvironmentLoadError>
{
        #[cfg(not(target_arch = "wasm32"))]
        let bytes = {
                let path = resource_path(root, file_name);

                log::info!("Loading environment map from {}", path.display());

                std::fs::read(&path).map_err(|source| EnvironmentLoadError::Io {
                        path: path.display().to_string(),
                        source,
                })?
        };

        #[cfg(target_arch = "wasm32")]
        let bytes = {
                let url = resource_url(root, file_name)
                        .ok_or_else(|| EnvironmentLoadError::Fetch(file_name.to_string()))?;

                log::info!("Fetching environment map from {url}");

                fetch_bytes(url).await.map_err(EnvironmentLoadError::Fetch)?
        };

        let rgba = image::load_from_memory(&bytes)?.to_rgba8();

        Ok(ImageData {
                width: rgba.width(),
                height: rgba.height(),
                rgba: rgba.into_raw(),
        })
}

fn read_document(
        name: &str,
        doc: &gltf::Document,
        buffers: &[gltf::buffer::Data],
        images: &[gltf::image::Data],
) -> AssetData
{
        let materials = doc
                .materials()
                .map(|mat| {
                        let pbr = mat.pbr_metallic_roughness();

                        MaterialData {
                                name: mat.name().unwrap_or("unnamed").to_string(),
                                base_color_factor: pbr.base_color_factor(),
                                metallic_factor: pbr.metallic_factor(),
                                roughness_factor: pbr.roughness_factor(),
                                base_color_texture_index: pbr
                                        .base_color_texture()
                                        .map(|info| info.texture().source().index()),
                        }
                })
                .collect();

        let mut meshes = Vec::new();

        let scenes: Vec<gltf::Scene> = match doc.default_scene()
        {
                Some(scene) => vec![scene],
                None => doc.scenes().collect(),
        };

        for scene in scenes
        {
                for node in scene.nodes()
                {
                        process_node(&node, buffers, &mut meshes, Matrix4::identity());
                }
        }

        AssetData {
                name: name.to_string(),
                meshes,
                materials,
                images: images.iter().map(to_rgba8).collect(),
        }
}

fn process_node(
        node: &gltf::Node,
        buffers: &[gltf::buffer::Data],
        meshes: &mut Vec<MeshData>,
        parent_transform: Matrix4<f32>,
)
{
        let node_transform = parent_transform * node_transform(node);

        if let Some(mesh) = node.mesh()
        {
                let mesh_name = mesh.name().unwrap_or("Unnamed").to_string();
                let primitive_count = mesh.primitives().len();

                for (primitive_index, primitive) in mesh.primitives().enumerate()
                {
                        let reader = primitive.reader(|b| Some(&buffers[b.index()]));

                        let positions: Vec<[f32; 3]> = reader
                                .read_positions()
                                .map(|iter| iter.collect())
                                .unwrap_or_default();

                        if positions.is_empty()
                        {
                                continue;
                        }

                        let normals: Vec<[f32; 3]> = reader
                                .read_normals()
                                .map(|iter| iter.collect())
                                .unwrap_or_else(|| vec![[0.0, 1.0, 0.0]; positions.len()]);

                        let tex_coords: Vec<[f32; 2]> = reader
                                .read_tex_coords(0)
                                .map(|tc| tc.into_f32().collect())
                                .unwrap_or_else(|| vec![[0.0, 0.0]; positions.len()]);

                        let indices: Vec<u32> = reader
                                .read_indices()
                                .map(|i| i.into_u32().collect())
                                .unwrap_or_else(|| (0..positions.len() as u32).collect());

                        let vertices = positions
                                .iter()
                                .enumerate()
                                .map(|(i, position)| ModelVertex {
                                        position: *position,
                                        tex_coords: tex_coords.get(i).copied().unwrap_or([0.0, 0.0]),
                                        normal: normals.get(i).copied().unwrap_or([0.0, 1.0, 0.0]),
                                })
                                .collect();

                        let name = if primitive_count > 1
                        {
                                format!("{mesh_name}_primitive_{primitive_index}")
                        }
                        else
                        {
                                mesh_name.clone()
                        };

                        meshes.push(MeshData {
                                name,
                                vertices,
                                indices,
                                material_id: primitive.material().index(),
                                transform: node_transform,
                        });
                }
        }

        for child in node.children()
        {
                process_node(&child, buffers, meshes, node_transform);
        }
}

fn node_transform(node: &gltf::Node) -> Matrix4<f32>
{
        let (translation, rotation, scale) = node.transform().decomposed();

        let translation = Vector3::new(translation[0], translation[1], translation[2]);
        let rotation = Quaternion::new(rotation[3], rotation[0], rotation[1], rotation[2]);

        Matrix4::from_translation(translation)
                * Matrix4::from(rotation)
                * Matrix4::from_nonuniform_scale(scale[0], scale[1], scale[2])
}

fn to_rgba8(image: &gltf::image::Data) -> ImageData
{
        use gltf::image::Format;

        let pixel_count = (image.width * image.height) as usize;

        let rgba = match image.format
        {
                Format::R8G8B8A8 => image.pixels.clone(),
                Format::R8G8B8 => image
                        .pixels
                        .chunks_exact(3)
                        .flat_map(|p| [p[0], p[1], p[2], 255])
                        .collect(),
                Format::R8G8 => image
                        .pixels
                        .chunks_exact(2)
                        .flat_map(|p| [p[0], p[1], 0, 255])
                        .collect(),
                Format::R8 => image.pixels.iter().flat_map(|&v| [v, v, v, 255]).collect(),
                other =>
                {
                        log::warn!("Unsupported glTF image format {other:?}, substituting white");

                        vec![255; pixel_count * 4]
                }
        };

        ImageData {
                width: image.width,
                height: image.height,
                rgba,
        }
}

#[cfg(test)]
pub(crate) mod tests
{
        use super::*;

        /// One triangle spanning (0,0,0)-(1,1,0), placed at y = 2 by its node.
        pub const TRIANGLE_GLTF: &str = r#"{
                "asset": { "version": "2.0" },
                "scene": 0,
                "scenes": [{ "nodes": [0] }],
                "nodes": [{ "mesh": 0, "translation": [0.0, 2.0, 0.0] }],
                "meshes": [{
                        "name": "tri",
                        "primitives": [{ "attributes": { "POSITION": 0 }, "material": 0 }]
                }],
                "materials": [{
                        "name": "gold",
                        "pbrMetallicRoughness": {
                                "baseColorFactor": [1.0, 0.8, 0.2, 1.0],
                                "metallicFactor": 1.0,
                                "roughnessFactor": 0.3
                        }
                }],
                "buffers": [{
                        "byteLength": 36,
                        "uri": "data:application/octet-stream;base64,AAAAAAAAAAAAAAAAAACAPwAAAAAAAAAAAAAAAAAAgD8AAAAA"
                }],
                "bufferViews": [{ "buffer": 0, "byteOffset": 0, "byteLength": 36 }],
                "accessors": [{
                        "bufferView": 0,
                        "componentType": 5126,
                        "count": 3,
                        "type": "VEC3",
                        "min": [0.0, 0.0, 0.0],
                        "max": [1.0, 1.0, 0.0]
                }]
        }"#;

        /// Writes the fixture into a fresh temp directory and returns that
        /// directory as an asset root.
        pub fn fixture_root(tag: &str) -> String
        {
                let dir = std::env::temp_dir().join(format!(
                        "showcase-{}-{}",
                        tag,
                        std::process::id()
                ));

                std::fs::create_dir_all(&dir).unwrap();
                std::fs::write(dir.join("triangle.gltf"), TRIANGLE_GLTF).unwrap();

                dir.to_string_lossy().to_string()
        }

        #[test]
        fn loads_gltf_fixture()
        {
                let root = fixture_root("loader");

                let asset = pollster::block_on(load_asset(&root, "triangle.gltf")).unwrap();

                assert_eq!(asset.meshes.len(), 1);
                assert_eq!(asset.meshes[0].name, "tri");
                assert_eq!(asset.meshes[0].indices, vec![0, 1, 2]);
                assert_eq!(asset.meshes[0].material_id, Some(0));
                assert_eq!(asset.materials[0].name, "gold");
                assert_eq!(asset.materials[0].roughness_factor, 0.3);
                assert!(asset.images.is_empty());
        }

        #[test]
        fn bounds_include_node_transform()
        {
                let root = fixture_root("bounds");

                let asset = pollster::block_on(load_asset(&root, "triangle.gltf")).unwrap();
                let bounds = asset.bounds().unwrap();

                assert_eq!(bounds.min, Point3::new(0.0, 2.0, 0.0));
                assert_eq!(bounds.max, Point3::new(1.0, 3.0, 0.0));
                assert_eq!(bounds.size(), Vector3::new(1.0, 1.0, 0.0));
        }

        #[test]
        fn missing_file_is_an_io_error()
        {
                let root = fixture_root("missing");

                let err = pollster::block_on(load_asset(&root, "nope.glb")).unwrap_err();

                assert!(matches!(err, AssetLoadError::Io { .. }), "{err}");
        }

        #[test]
        fn unknown_extension_is_rejected()
        {
                let err = pollster::block_on(load_asset("resources", "crown.fbx")).unwrap_err();

                assert!(matches!(err, AssetLoadError::UnsupportedFormat(_)));
        }

        #[test]
        fn missing_environment_is_reported()
        {
                let root = fixture_root("env");

                let err = pollster::block_on(load_environment(&root, "absent.jpg")).unwrap_err();

                assert!(matches!(err, EnvironmentLoadError::Io { .. }));
        }

        #[test]
        fn aabb_transform_moves_corners()
        {
                let aabb = Aabb {
                        min: Point3::new(-1.0, -1.0, -1.0),
                        max: Point3::new(1.0, 1.0, 1.0),
                };

                let moved = aabb.transformed(&Matrix4::from_translation(Vector3::new(0.0, 5.0, 0.0)));

                assert_eq!(moved.center(), Point3::new(0.0, 5.0, 0.0));
                assert_eq!(moved.size(), Vector3::new(2.0, 2.0, 2.0));
        }
}
