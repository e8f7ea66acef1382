//! Per-draw transforms.
//!
//! Every draw call gets its own `model`/`view`/`projection` block. The blocks
//! of one frame are staged on the CPU and uploaded in one write to a single
//! uniform buffer; each draw selects its block with a dynamic offset.

use cgmath::{Matrix, Matrix4, SquareMatrix, Vector4};

use crate::config;

#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct TransformUniform {
    pub model: [[f32; 4]; 4],
    pub view: [[f32; 4]; 4],
    pub projection: [[f32; 4]; 4],
    /// Inverse transpose of `model`, for normals.
    pub normal: [[f32; 4]; 4],
}

impl TransformUniform {
    pub fn new(model: Matrix4<f32>, view: Matrix4<f32>, projection: Matrix4<f32>) -> Self {
        let normal = model
            .invert()
            .map(|inverse| inverse.transpose())
            .unwrap_or_else(Matrix4::identity);
        Self {
            model: model.into(),
            view: view.into(),
            projection: projection.into(),
            normal: normal.into(),
        }
    }

    /// What the vertex stage computes for `position`: `projection * view * model * position`.
    pub fn clip_position(&self, position: [f32; 3]) -> Vector4<f32> {
        let model = Matrix4::from(self.model);
        let view = Matrix4::from(self.view);
        let projection = Matrix4::from(self.projection);
        projection * view * model * Vector4::new(position[0], position[1], position[2], 1.0)
    }
}

/// CPU staging for a frame's transform blocks.
#[derive(Debug)]
pub struct TransformStaging {
    stride: usize,
    capacity: usize,
    data: Vec<u8>,
}

impl TransformStaging {
    /// `alignment` is the device's `min_uniform_buffer_offset_alignment`.
    pub fn new(capacity: usize, alignment: u32) -> Self {
        let block = std::mem::size_of::<TransformUniform>();
        let alignment = alignment.max(1) as usize;
        Self {
            stride: block.div_ceil(alignment) * alignment,
            capacity,
            data: Vec::with_capacity(capacity * block),
        }
    }

    pub fn stride(&self) -> usize {
        self.stride
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.data.len() / self.stride
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn buffer_size(&self) -> u64 {
        (self.stride * self.capacity.max(1)) as u64
    }

    /// Appends a block and returns its dynamic offset, or `None` when the frame is full.
    pub fn push(&mut self, transform: &TransformUniform) -> Option<u32> {
        if self.len() >= self.capacity {
            return None;
        }
        let offset = self.data.len();
        self.data.extend_from_slice(bytemuck::bytes_of(transform));
        self.data.resize(offset + self.stride, 0);
        Some(offset as u32)
    }

    pub fn bytes(&self) -> &[u8] {
        &self.data
    }

    pub fn clear(&mut self) {
        self.data.clear();
    }
}

/// The GPU side: one dynamic-offset uniform buffer shared by every program.
#[derive(Debug)]
pub struct TransformArena {
    staging: TransformStaging,
    buffer: wgpu::Buffer,
    bind_group: wgpu::BindGroup,
}

impl TransformArena {
    pub fn new(device: &wgpu::Device, layout: &wgpu::BindGroupLayout) -> Self {
        let staging = TransformStaging::new(
            config::MAX_DRAWS_PER_FRAME,
            device.limits().min_uniform_buffer_offset_alignment,
        );
        let buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Transform Buffer"),
            size: staging.buffer_size(),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });
        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: wgpu::BindingResource::Buffer(wgpu::BufferBinding {
                    buffer: &buffer,
                    offset: 0,
                    size: wgpu::BufferSize::new(std::mem::size_of::<TransformUniform>() as u64),
                }),
            }],
            label: Some("transform_bind_group"),
        });
        Self {
            staging,
            buffer,
            bind_group,
        }
    }

    pub fn bind_group(&self) -> &wgpu::BindGroup {
        &self.bind_group
    }

    pub fn push(&mut self, transform: &TransformUniform) -> Option<u32> {
        self.staging.push(transform)
    }

    pub fn reset(&mut self) {
        self.staging.clear();
    }

    /// Uploads the staged blocks. Must run before the frame's commands are submitted.
    pub fn flush(&self, queue: &wgpu::Queue) {
        if !self.staging.is_empty() {
            queue.write_buffer(&self.buffer, 0, self.staging.bytes());
        }
    }
}

pub fn mk_bind_group_layout(device: &wgpu::Device) -> wgpu::BindGroupLayout {
    device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
        entries: &[wgpu::BindGroupLayoutEntry {
            binding: 0,
            visibility: wgpu::ShaderStages::VERTEX | wgpu::ShaderStages::FRAGMENT,
            ty: wgpu::BindingType::Buffer {
                ty: wgpu::BufferBindingType::Uniform,
                has_dynamic_offset: true,
                min_binding_size: wgpu::BufferSize::new(
                    std::mem::size_of::<TransformUniform>() as u64
                ),
            },
            count: None,
        }],
        label: Some("transform_bind_group_layout"),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use cgmath::{Deg, Vector3, perspective};

    #[test]
    fn identity_transforms_keep_positions() {
        let identity = Matrix4::identity();
        let transform = TransformUniform::new(identity, identity, identity);
        for position in [[0.5, -0.5, 0.0], [-1.0, 1.0, 0.25], [0.0, 0.0, 0.0]] {
            let clip = transform.clip_position(position);
            assert_eq!(clip, Vector4::new(position[0], position[1], position[2], 1.0));
        }
    }

    #[test]
    fn clip_position_applies_model_then_view_then_projection() {
        let model = Matrix4::from_translation(Vector3::new(0.0, 0.0, -5.0));
        let view = Matrix4::from_scale(2.0);
        let projection = perspective(Deg(90.0), 1.0, 0.1, 100.0);
        let transform = TransformUniform::new(model, view, projection);
        let expected = projection * view * model * Vector4::new(1.0, 0.0, 0.0, 1.0);
        assert_eq!(transform.clip_position([1.0, 0.0, 0.0]), expected);
    }

    #[test]
    fn normal_matrix_undoes_non_uniform_scale() {
        let model = Matrix4::from_nonuniform_scale(2.0, 1.0, 1.0);
        let transform = TransformUniform::new(model, Matrix4::identity(), Matrix4::identity());
        assert_eq!(transform.normal[0][0], 0.5);
        assert_eq!(transform.normal[1][1], 1.0);
    }

    #[test]
    fn staging_hands_out_aligned_offsets_until_full() {
        let mut staging = TransformStaging::new(3, 256);
        let transform = TransformUniform::new(
            Matrix4::identity(),
            Matrix4::identity(),
            Matrix4::identity(),
        );
        assert_eq!(staging.stride(), 256);
        assert_eq!(staging.push(&transform), Some(0));
        assert_eq!(staging.push(&transform), Some(256));
        assert_eq!(staging.push(&transform), Some(512));
        assert_eq!(staging.push(&transform), None);
        assert_eq!(staging.len(), 3);
        staging.clear();
        assert!(staging.is_empty());
        assert_eq!(staging.push(&transform), Some(0));
    }

    #[test]
    fn stride_rounds_up_to_device_alignment() {
        assert_eq!(TransformStaging::new(1, 64).stride(), 256);
        assert_eq!(TransformStaging::new(1, 512).stride(), 512);
    }
}
