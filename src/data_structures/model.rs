//! Meshes, models and the vertex layout they share.
//!
//! A [`Mesh`] uploads its vertices (and optional indices) once, at
//! construction, and keeps a list of `(texture, slot name)` pairs. Drawing
//! binds every registered texture to the shader slot of the same name and
//! issues an indexed or non-indexed draw. A [`Model`] is an ordered list of
//! meshes, usually produced by one of the loaders in [`crate::resources`].

use std::{cell::RefCell, collections::HashMap};

use cgmath::Matrix4;
use wgpu::util::DeviceExt;

use crate::{
    data_structures::texture::Texture,
    error::MeshError,
    pipelines::{
        shader::{ProgramId, ShaderProgram},
        transform::TransformUniform,
    },
    render::Frame,
};

pub trait Vertex {
    fn desc() -> wgpu::VertexBufferLayout<'static>;
}

/// Position, normal and texture coordinate, tightly packed.
#[repr(C)]
#[derive(Copy, Clone, Debug, Default, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct ModelVertex {
    pub position: [f32; 3],
    pub normal: [f32; 3],
    pub tex_coords: [f32; 2],
}

impl ModelVertex {
    /// Floats per vertex in an interleaved array.
    pub const FLOATS: usize = 8;

    /// Splits an interleaved `[px, py, pz, nx, ny, nz, u, v, ...]` array.
    pub fn from_interleaved(data: &[f32]) -> Result<Vec<Self>, MeshError> {
        if data.len() % Self::FLOATS != 0 {
            return Err(MeshError::InterleavedLength {
                len: data.len(),
                stride: Self::FLOATS,
            });
        }
        Ok(data
            .chunks_exact(Self::FLOATS)
            .map(|v| ModelVertex {
                position: [v[0], v[1], v[2]],
                normal: [v[3], v[4], v[5]],
                tex_coords: [v[6], v[7]],
            })
            .collect())
    }
}

/**
 * The stride and attribute offsets never change after a mesh is built:
 *
 * location 0: position (offset 0)
 * location 1: normal (offset 12)
 * location 2: texture coordinate (offset 24)
 */
impl Vertex for ModelVertex {
    fn desc() -> wgpu::VertexBufferLayout<'static> {
        use std::mem;
        wgpu::VertexBufferLayout {
            array_stride: mem::size_of::<ModelVertex>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &[
                wgpu::VertexAttribute {
                    offset: 0,
                    shader_location: 0,
                    format: wgpu::VertexFormat::Float32x3,
                },
                wgpu::VertexAttribute {
                    offset: mem::size_of::<[f32; 3]>() as wgpu::BufferAddress,
                    shader_location: 1,
                    format: wgpu::VertexFormat::Float32x3,
                },
                wgpu::VertexAttribute {
                    offset: mem::size_of::<[f32; 6]>() as wgpu::BufferAddress,
                    shader_location: 2,
                    format: wgpu::VertexFormat::Float32x2,
                },
            ],
        }
    }
}

/// CPU-side input for [`Mesh::new`], as produced by the model loaders.
#[derive(Clone, Debug, Default)]
pub struct MeshData {
    pub name: String,
    pub vertices: Vec<ModelVertex>,
    pub indices: Option<Vec<u32>>,
    pub textures: Vec<(Texture, String)>,
}

/// Anything that can be drawn with a shader and a set of transforms.
///
/// The shader must already be the active program of `frame`
/// (see [`Frame::use_program`]); drawing never activates it implicitly.
pub trait Drawable {
    fn draw(
        &self,
        frame: &mut Frame<'_>,
        shader: &ShaderProgram,
        model: Matrix4<f32>,
        view: Matrix4<f32>,
        projection: Matrix4<f32>,
    );
}

#[derive(Debug)]
pub struct Mesh {
    pub name: String,
    vertices: Vec<ModelVertex>,
    indices: Option<Vec<u32>>,
    textures: Vec<(Texture, String)>,
    vertex_buffer: wgpu::Buffer,
    index_buffer: Option<wgpu::Buffer>,
    num_elements: u32,
    // texture bind groups resolved against a program's slots
    bind_groups: RefCell<HashMap<ProgramId, wgpu::BindGroup>>,
}

impl Mesh {
    pub fn new(device: &wgpu::Device, data: MeshData) -> Result<Self, MeshError> {
        let MeshData {
            name,
            vertices,
            indices,
            textures,
        } = data;
        if let Some(index) = indices
            .iter()
            .flatten()
            .copied()
            .find(|&i| i as usize >= vertices.len())
        {
            return Err(MeshError::IndexOutOfRange {
                index,
                vertices: vertices.len(),
            });
        }

        let vertex_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(&format!("{:?} Vertex Buffer", name)),
            contents: bytemuck::cast_slice(&vertices),
            usage: wgpu::BufferUsages::VERTEX,
        });
        let index_buffer = indices.as_ref().map(|indices| {
            device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some(&format!("{:?} Index Buffer", name)),
                contents: bytemuck::cast_slice(indices),
                usage: wgpu::BufferUsages::INDEX,
            })
        });
        let num_elements = match &indices {
            Some(indices) => indices.len(),
            None => vertices.len(),
        } as u32;

        Ok(Self {
            name,
            vertices,
            indices,
            textures,
            vertex_buffer,
            index_buffer,
            num_elements,
            bind_groups: RefCell::new(HashMap::new()),
        })
    }

    /// Builds a non-indexed mesh from an interleaved float array (see [`ModelVertex::from_interleaved`]).
    pub fn from_interleaved(
        device: &wgpu::Device,
        name: &str,
        data: &[f32],
    ) -> Result<Self, MeshError> {
        let vertices = ModelVertex::from_interleaved(data)?;
        Self::new(
            device,
            MeshData {
                name: name.to_string(),
                vertices,
                ..Default::default()
            },
        )
    }

    /// Registers `texture` for the shader slot called `binding`.
    pub fn add_texture(&mut self, texture: Texture, binding: impl Into<String>) {
        self.textures.push((texture, binding.into()));
        self.bind_groups.get_mut().clear();
    }

    pub fn vertices(&self) -> &[ModelVertex] {
        &self.vertices
    }

    pub fn indices(&self) -> Option<&[u32]> {
        self.indices.as_deref()
    }

    pub fn textures(&self) -> &[(Texture, String)] {
        &self.textures
    }

    pub fn num_elements(&self) -> u32 {
        self.num_elements
    }

    fn bind_group_for(&self, shader: &ShaderProgram) -> wgpu::BindGroup {
        self.bind_groups
            .borrow_mut()
            .entry(shader.id())
            .or_insert_with(|| shader.texture_bind_group(&self.name, &self.textures))
            .clone()
    }
}

impl Drawable for Mesh {
    fn draw(
        &self,
        frame: &mut Frame<'_>,
        shader: &ShaderProgram,
        model: Matrix4<f32>,
        view: Matrix4<f32>,
        projection: Matrix4<f32>,
    ) {
        if self.num_elements == 0 {
            log::warn!("mesh {} has nothing to draw", self.name);
            return;
        }
        if !frame.prepare(shader) {
            return;
        }
        if !frame.push_transform(&TransformUniform::new(model, view, projection)) {
            return;
        }
        let textures = self.bind_group_for(shader);
        let pass = frame.pass_mut();
        pass.set_bind_group(2, &textures, &[]);
        pass.set_vertex_buffer(0, self.vertex_buffer.slice(..));
        match &self.index_buffer {
            Some(index_buffer) => {
                pass.set_index_buffer(index_buffer.slice(..), wgpu::IndexFormat::Uint32);
                pass.draw_indexed(0..self.num_elements, 0, 0..1);
            }
            None => pass.draw(0..self.num_elements, 0..1),
        }
    }
}

/// An ordered set of meshes sharing one model matrix.
#[derive(Debug, Default)]
pub struct Model {
    pub name: String,
    pub meshes: Vec<Mesh>,
}

impl Model {
    pub fn empty(name: &str) -> Self {
        Self {
            name: name.to_string(),
            meshes: Vec::new(),
        }
    }
}

impl Drawable for Model {
    fn draw(
        &self,
        frame: &mut Frame<'_>,
        shader: &ShaderProgram,
        model: Matrix4<f32>,
        view: Matrix4<f32>,
        projection: Matrix4<f32>,
    ) {
        for mesh in &self.meshes {
            mesh.draw(frame, shader, model, view, projection);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn interleaved_array_splits_into_vertices() {
        let data = [
            1.0, 2.0, 3.0, 0.0, 0.0, 1.0, 0.25, 0.75, //
            -1.0, -2.0, -3.0, 0.0, 1.0, 0.0, 1.0, 0.0,
        ];
        let vertices = ModelVertex::from_interleaved(&data).unwrap();
        assert_eq!(vertices.len(), 2);
        assert_eq!(vertices[0].position, [1.0, 2.0, 3.0]);
        assert_eq!(vertices[0].normal, [0.0, 0.0, 1.0]);
        assert_eq!(vertices[0].tex_coords, [0.25, 0.75]);
        assert_eq!(vertices[1].position, [-1.0, -2.0, -3.0]);
    }

    #[test]
    fn truncated_interleaved_array_is_rejected() {
        let err = ModelVertex::from_interleaved(&[0.0; 12]).unwrap_err();
        assert!(matches!(
            err,
            MeshError::InterleavedLength { len: 12, stride: 8 }
        ));
    }

    #[test]
    fn vertex_layout_matches_struct() {
        let layout = ModelVertex::desc();
        assert_eq!(layout.array_stride, 32);
        let offsets: Vec<_> = layout.attributes.iter().map(|a| a.offset).collect();
        assert_eq!(offsets, vec![0, 12, 24]);
        let locations: Vec<_> = layout
            .attributes
            .iter()
            .map(|a| a.shader_location)
            .collect();
        assert_eq!(locations, vec![0, 1, 2]);
    }
}
