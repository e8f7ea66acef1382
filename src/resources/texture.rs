use std::path::{Path, PathBuf};

use crate::{
    data_structures::texture::Texture,
    error::AssetError,
    resources::{asset_path, load_binary, mesh::TextureSource},
};

/// Decodes image files into GPU textures.
///
/// There is no cache: loading the same path twice decodes and uploads it twice.
#[derive(Clone, Debug)]
pub struct TextureLoader {
    device: wgpu::Device,
    queue: wgpu::Queue,
}

impl TextureLoader {
    pub fn new(device: &wgpu::Device, queue: &wgpu::Queue) -> Self {
        Self {
            device: device.clone(),
            queue: queue.clone(),
        }
    }

    pub async fn load(&self, file_name: impl AsRef<Path>) -> Result<Texture, AssetError> {
        let file_name = file_name.as_ref();
        let data = load_binary(file_name).await?;
        let texture = self.decode(&data, &file_name.to_string_lossy(), || asset_path(file_name))?;
        log::debug!("loaded texture {}", file_name.display());
        Ok(texture)
    }

    /// Like [`TextureLoader::load`], but a failure is logged and replaced by [`TextureLoader::placeholder`].
    pub async fn load_or_placeholder(&self, file_name: impl AsRef<Path>) -> Texture {
        match self.load(file_name).await {
            Ok(texture) => texture,
            Err(e) => {
                log::error!("{e}");
                self.placeholder()
            }
        }
    }

    /// Opaque magenta, so missing textures are easy to spot.
    pub fn placeholder(&self) -> Texture {
        Texture::create_solid([255, 0, 255, 255], "missing texture", &self.device, &self.queue)
    }

    pub(crate) async fn load_source(&self, source: &TextureSource) -> Texture {
        match source {
            TextureSource::File(path) => self.load_or_placeholder(path).await,
            TextureSource::Embedded { label, bytes } => {
                match self.decode(bytes, label, || label.into()) {
                    Ok(texture) => texture,
                    Err(e) => {
                        log::error!("{e}");
                        self.placeholder()
                    }
                }
            }
        }
    }

    fn decode(
        &self,
        bytes: &[u8],
        label: &str,
        path: impl FnOnce() -> PathBuf,
    ) -> Result<Texture, AssetError> {
        Texture::from_bytes(&self.device, &self.queue, bytes, label).map_err(|source| {
            AssetError::Decode {
                path: path(),
                source,
            }
        })
    }
}
