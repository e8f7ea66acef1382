//! Error types.
//!
//! Asset, shader and mesh failures are recoverable: callers get a typed error
//! and decide whether to substitute a placeholder. [`InitError`] is not: the
//! frame loop stops and [`crate::flow::run`] returns it.

use std::{io, path::PathBuf};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum AssetError {
    #[error("asset not found: {0}")]
    NotFound(PathBuf),
    #[error("asset {path} could not be read: {source}")]
    Unreadable {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("image {path} could not be decoded: {source}")]
    Decode {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },
    #[error("model {path} could not be parsed: {reason}")]
    Model { path: PathBuf, reason: String },
}

impl AssetError {
    pub(crate) fn from_io(path: PathBuf, source: io::Error) -> Self {
        if source.kind() == io::ErrorKind::NotFound {
            AssetError::NotFound(path)
        } else {
            AssetError::Unreadable { path, source }
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Stage {
    Vertex,
    Fragment,
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Stage::Vertex => f.write_str("vertex"),
            Stage::Fragment => f.write_str("fragment"),
        }
    }
}

#[derive(Debug, Error)]
pub enum ShaderError {
    #[error(transparent)]
    Io(#[from] AssetError),
    #[error("{stage} shader of `{label}` failed to compile:\n{log}")]
    Compile {
        stage: Stage,
        label: String,
        log: String,
    },
    #[error("shader program `{label}` failed to link: {reason}")]
    Link { label: String, reason: String },
}

#[derive(Debug, Error)]
pub enum MeshError {
    #[error("interleaved vertex data has {len} floats, which is not a multiple of {stride}")]
    InterleavedLength { len: usize, stride: usize },
    #[error("index {index} is out of range for {vertices} vertices")]
    IndexOutOfRange { index: u32, vertices: usize },
}

#[derive(Debug, Error)]
pub enum InitError {
    #[error("failed to create window: {0}")]
    Window(#[from] winit::error::OsError),
    #[error("failed to create surface: {0}")]
    Surface(String),
    #[error("no suitable GPU adapter: {0}")]
    Adapter(String),
    #[error("failed to open GPU device: {0}")]
    Device(String),
}
