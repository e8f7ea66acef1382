//! Conversion of parsed model files into mesh sources.
//!
//! Nothing here touches the GPU: a [`MeshSource`] is vertices, indices and
//! the textures each mesh wants, by slot name. Uploading happens in
//! [`crate::resources::load_model_obj`] / [`crate::resources::load_model_gltf`].

use std::path::{Path, PathBuf};

use cgmath::{InnerSpace, Matrix, Matrix4, SquareMatrix, Vector3, Vector4};

use crate::data_structures::model::ModelVertex;

/// Where a texture's encoded bytes come from.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum TextureSource {
    /// Relative to the asset directory.
    File(PathBuf),
    /// Stored inside the model file.
    Embedded { label: String, bytes: Vec<u8> },
}

#[derive(Clone, Debug, PartialEq)]
pub struct TextureRef {
    pub source: TextureSource,
    pub slot: String,
}

#[derive(Clone, Debug, Default)]
pub struct MeshSource {
    pub name: String,
    pub vertices: Vec<ModelVertex>,
    pub indices: Option<Vec<u32>>,
    pub textures: Vec<TextureRef>,
}

/// Slot names follow `material.texture_<kind>N`, numbered from 1 per kind.
fn slot_name(kind: &str, n: usize) -> String {
    format!("material.texture_{kind}{n}")
}

/**
 * OBJ texture coordinates have v = 0 at the bottom of the image, wgpu samples
 * with v = 0 at the top, so v is flipped here. Missing normals and texture
 * coordinates become zero.
 */
pub fn obj_sources(
    models: &[tobj::Model],
    materials: &[tobj::Material],
    base_dir: &Path,
) -> Vec<MeshSource> {
    models
        .iter()
        .map(|m| {
            let vertices = (0..m.mesh.positions.len() / 3)
                .map(|i| ModelVertex {
                    position: [
                        m.mesh.positions[i * 3],
                        m.mesh.positions[i * 3 + 1],
                        m.mesh.positions[i * 3 + 2],
                    ],
                    tex_coords: [
                        m.mesh.texcoords.get(i * 2).map_or(0.0, |f| *f),
                        1.0 - m.mesh.texcoords.get(i * 2 + 1).map_or(0.0, |f| *f),
                    ],
                    normal: [
                        m.mesh.normals.get(i * 3).map_or(0.0, |f| *f),
                        m.mesh.normals.get(i * 3 + 1).map_or(0.0, |f| *f),
                        m.mesh.normals.get(i * 3 + 2).map_or(0.0, |f| *f),
                    ],
                })
                .collect::<Vec<_>>();

            let mut textures = Vec::new();
            if let Some(material) = m.mesh.material_id.and_then(|id| materials.get(id)) {
                let maps = [
                    ("diffuse", &material.diffuse_texture),
                    ("specular", &material.specular_texture),
                ];
                for (kind, texture) in maps {
                    if let Some(texture) = texture {
                        textures.push(TextureRef {
                            source: TextureSource::File(base_dir.join(texture)),
                            slot: slot_name(kind, 1),
                        });
                    }
                }
            }

            MeshSource {
                name: m.name.clone(),
                vertices,
                indices: Some(m.mesh.indices.clone()),
                textures,
            }
        })
        .collect()
}

/// Walks the default scene (or the first one) and bakes every node's world
/// transform into its meshes' positions and normals.
pub fn gltf_sources(
    document: &gltf::Document,
    buffers: &[Vec<u8>],
    base_dir: &Path,
) -> Vec<MeshSource> {
    let mut sources = Vec::new();
    if let Some(scene) = document.default_scene().or_else(|| document.scenes().next()) {
        for node in scene.nodes() {
            visit_node(&node, Matrix4::identity(), buffers, base_dir, &mut sources);
        }
    }
    sources
}

fn visit_node(
    node: &gltf::Node,
    parent: Matrix4<f32>,
    buffers: &[Vec<u8>],
    base_dir: &Path,
    out: &mut Vec<MeshSource>,
) {
    let world = parent * Matrix4::from(node.transform().matrix());
    if let Some(mesh) = node.mesh() {
        let normal_matrix = world
            .invert()
            .map(|inverse| inverse.transpose())
            .unwrap_or_else(Matrix4::identity);
        let name = mesh.name().unwrap_or("unknown_mesh");
        for primitive in mesh.primitives() {
            let reader =
                primitive.reader(|buffer| buffers.get(buffer.index()).map(Vec::as_slice));

            let mut vertices: Vec<ModelVertex> = match reader.read_positions() {
                Some(positions) => positions
                    .map(|p| ModelVertex {
                        position: (world * Vector4::new(p[0], p[1], p[2], 1.0)).truncate().into(),
                        ..Default::default()
                    })
                    .collect(),
                None => {
                    log::warn!("primitive {} of {name} has no positions", primitive.index());
                    continue;
                }
            };
            if let Some(normals) = reader.read_normals() {
                for (vertex, n) in vertices.iter_mut().zip(normals) {
                    let n = (normal_matrix * Vector4::new(n[0], n[1], n[2], 0.0)).truncate();
                    vertex.normal = normalize_or_zero(n).into();
                }
            }
            if let Some(tex_coords) = reader.read_tex_coords(0).map(|v| v.into_f32()) {
                for (vertex, uv) in vertices.iter_mut().zip(tex_coords) {
                    vertex.tex_coords = uv;
                }
            }
            let indices = reader
                .read_indices()
                .map(|indices| indices.into_u32().collect::<Vec<u32>>());

            let textures = primitive
                .material()
                .pbr_metallic_roughness()
                .base_color_texture()
                .and_then(|info| image_source(info.texture().source(), buffers, base_dir))
                .map(|source| TextureRef {
                    source,
                    slot: slot_name("diffuse", 1),
                })
                .into_iter()
                .collect();

            out.push(MeshSource {
                name: name.to_string(),
                vertices,
                indices,
                textures,
            });
        }
    }
    for child in node.children() {
        visit_node(&child, world, buffers, base_dir, out);
    }
}

fn normalize_or_zero(v: Vector3<f32>) -> Vector3<f32> {
    if v.magnitude2() > 0.0 { v.normalize() } else { v }
}

fn image_source(
    image: gltf::Image,
    buffers: &[Vec<u8>],
    base_dir: &Path,
) -> Option<TextureSource> {
    match image.source() {
        gltf::image::Source::View { view, .. } => {
            let start = view.offset();
            let bytes = buffers
                .get(view.buffer().index())
                .and_then(|buffer| buffer.get(start..start + view.length()));
            match bytes {
                Some(bytes) => Some(TextureSource::Embedded {
                    label: format!("image {}", image.index()),
                    bytes: bytes.to_vec(),
                }),
                None => {
                    log::warn!("image {} points outside its buffer", image.index());
                    None
                }
            }
        }
        gltf::image::Source::Uri { uri, .. } if uri.starts_with("data:") => {
            log::warn!("image {} is a data URI, which is not supported", image.index());
            None
        }
        gltf::image::Source::Uri { uri, .. } => Some(TextureSource::File(base_dir.join(uri))),
    }
}
