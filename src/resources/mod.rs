//! Loading meshes, textures and shader sources from the asset directory.
//!
//! Every path is relative to [`config::ASSET_DIR`]. When the working
//! directory has no such folder the copy `build.rs` places in `OUT_DIR` is
//! used instead.

use std::{
    collections::HashMap,
    io::{BufReader, Cursor},
    path::{Path, PathBuf},
};

use crate::{
    config,
    data_structures::{
        model::{Mesh, MeshData, Model},
        texture::Texture,
    },
    error::AssetError,
    resources::{
        mesh::{MeshSource, TextureSource},
        texture::TextureLoader,
    },
};

pub mod mesh;
pub mod texture;

pub fn asset_path(file_name: impl AsRef<Path>) -> PathBuf {
    let local = Path::new(config::ASSET_DIR).join(&file_name);
    let bundled = Path::new(env!("OUT_DIR"))
        .join(config::ASSET_DIR)
        .join(&file_name);
    if !local.exists() && bundled.exists() {
        bundled
    } else {
        local
    }
}

pub async fn load_string(file_name: impl AsRef<Path>) -> Result<String, AssetError> {
    let path = asset_path(file_name);
    std::fs::read_to_string(&path).map_err(|e| AssetError::from_io(path, e))
}

pub async fn load_binary(file_name: impl AsRef<Path>) -> Result<Vec<u8>, AssetError> {
    let path = asset_path(file_name);
    std::fs::read(&path).map_err(|e| AssetError::from_io(path, e))
}

fn parent_dir(file_name: &str) -> PathBuf {
    Path::new(file_name)
        .parent()
        .map(Path::to_path_buf)
        .unwrap_or_default()
}

/// Loads a Wavefront OBJ file and the materials it references.
///
/// A missing or broken MTL file is logged and the meshes are loaded without
/// textures. A mesh with out-of-range indices is skipped.
pub async fn load_model_obj(
    file_name: &str,
    device: &wgpu::Device,
    queue: &wgpu::Queue,
) -> Result<Model, AssetError> {
    let obj_text = load_string(file_name).await?;
    let base_dir = parent_dir(file_name);
    let mut obj_reader = BufReader::new(Cursor::new(obj_text));

    let (models, obj_materials) = tobj::load_obj_buf_async(
        &mut obj_reader,
        &tobj::LoadOptions {
            triangulate: true,
            single_index: true,
            ..Default::default()
        },
        |p| {
            let path = base_dir.join(&p);
            async move {
                match load_string(&path).await {
                    Ok(mat_text) => tobj::load_mtl_buf(&mut BufReader::new(Cursor::new(mat_text))),
                    Err(e) => {
                        log::warn!("{e}");
                        Err(tobj::LoadError::OpenFileFailed)
                    }
                }
            }
        },
    )
    .await
    .map_err(|e| AssetError::Model {
        path: asset_path(file_name),
        reason: e.to_string(),
    })?;

    let materials = obj_materials.unwrap_or_else(|e| {
        log::warn!("materials of {file_name} could not be loaded: {e}");
        Vec::new()
    });
    let sources = mesh::obj_sources(&models, &materials, &base_dir);
    Ok(upload(file_name, sources, device, queue).await)
}

/// Loads the default scene of a glTF file, flattening its node hierarchy.
pub async fn load_model_gltf(
    file_name: &str,
    device: &wgpu::Device,
    queue: &wgpu::Queue,
) -> Result<Model, AssetError> {
    let model_error = |reason: String| AssetError::Model {
        path: asset_path(file_name),
        reason,
    };
    let gltf_bytes = load_binary(file_name).await?;
    let gltf = gltf::Gltf::from_slice(&gltf_bytes).map_err(|e| model_error(e.to_string()))?;
    let base_dir = parent_dir(file_name);

    let mut buffer_data = Vec::new();
    for buffer in gltf.buffers() {
        match buffer.source() {
            gltf::buffer::Source::Bin => match gltf.blob.as_deref() {
                Some(blob) => buffer_data.push(blob.to_vec()),
                None => return Err(model_error("binary chunk is missing".to_string())),
            },
            gltf::buffer::Source::Uri(uri) if uri.starts_with("data:") => {
                return Err(model_error("data URIs are not supported".to_string()));
            }
            gltf::buffer::Source::Uri(uri) => {
                buffer_data.push(load_binary(base_dir.join(uri)).await?);
            }
        }
    }

    let sources = mesh::gltf_sources(&gltf.document, &buffer_data, &base_dir);
    Ok(upload(file_name, sources, device, queue).await)
}

/// Uploads parsed meshes. Within one call every texture source is decoded once.
async fn upload(
    file_name: &str,
    sources: Vec<MeshSource>,
    device: &wgpu::Device,
    queue: &wgpu::Queue,
) -> Model {
    let loader = TextureLoader::new(device, queue);
    let mut loaded: HashMap<TextureSource, Texture> = HashMap::new();
    let mut meshes = Vec::with_capacity(sources.len());

    for (idx, source) in sources.into_iter().enumerate() {
        let mut textures = Vec::with_capacity(source.textures.len());
        for texture_ref in source.textures {
            let texture = match loaded.get(&texture_ref.source) {
                Some(texture) => texture.clone(),
                None => {
                    let texture = loader.load_source(&texture_ref.source).await;
                    loaded.insert(texture_ref.source.clone(), texture.clone());
                    texture
                }
            };
            textures.push((texture, texture_ref.slot));
        }
        let data = MeshData {
            name: source.name,
            vertices: source.vertices,
            indices: source.indices,
            textures,
        };
        match Mesh::new(device, data) {
            Ok(mesh) => meshes.push(mesh),
            Err(e) => log::warn!("mesh {idx} of {file_name} skipped: {e}"),
        }
    }

    log::info!(
        "loaded {file_name}: {} meshes, {} textures",
        meshes.len(),
        loaded.len()
    );
    Model {
        name: file_name.to_string(),
        meshes,
    }
}
