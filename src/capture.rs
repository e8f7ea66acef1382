//! Headless rendering for golden-image tests.
//!
//! [`Offscreen`] runs the same frame encoding as the window path, but into an
//! `Rgba8Unorm` texture that is copied back into an [`image::RgbaImage`].

use instant::Duration;

use crate::{
    context::{InitContext, request_device},
    data_structures::texture::Texture,
    error::InitError,
    pipelines::transform::{self, TransformArena},
    render::{DrawCounts, Render, ViewState, encode_frame},
    transparency::SortPolicy,
};

pub const CAPTURE_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rgba8Unorm;

pub struct Offscreen {
    device: wgpu::Device,
    queue: wgpu::Queue,
    transform_layout: wgpu::BindGroupLayout,
    transforms: TransformArena,
    target: wgpu::Texture,
    depth: Texture,
    width: u32,
    height: u32,
    pub clear_colour: wgpu::Color,
    pub sort_policy: SortPolicy,
}

impl Offscreen {
    pub async fn new(width: u32, height: u32) -> Result<Self, InitError> {
        let instance = wgpu::Instance::new(wgpu::InstanceDescriptor {
            backends: wgpu::Backends::PRIMARY,
            ..wgpu::InstanceDescriptor::new_without_display_handle()
        });
        let (_adapter, device, queue) = request_device(&instance, None).await?;

        let target = device.create_texture(&wgpu::TextureDescriptor {
            label: Some("Golden Image Test Output Texture"),
            size: wgpu::Extent3d {
                width,
                height,
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: CAPTURE_FORMAT,
            usage: wgpu::TextureUsages::COPY_SRC | wgpu::TextureUsages::RENDER_ATTACHMENT,
            view_formats: &[],
        });
        let depth = Texture::create_depth_texture(&device, [width, height], "capture depth");
        let transform_layout = transform::mk_bind_group_layout(&device);
        let transforms = TransformArena::new(&device, &transform_layout);

        Ok(Self {
            device,
            queue,
            transform_layout,
            transforms,
            target,
            depth,
            width,
            height,
            clear_colour: wgpu::Color::BLACK,
            sort_policy: SortPolicy::default(),
        })
    }

    pub fn init_context(&self) -> InitContext {
        InitContext {
            device: self.device.clone(),
            queue: self.queue.clone(),
            color_format: CAPTURE_FORMAT,
            transform_layout: self.transform_layout.clone(),
        }
    }

    /// Renders one frame and reads it back.
    pub async fn capture(
        &mut self,
        render: Render<'_>,
        view: &ViewState,
    ) -> anyhow::Result<(DrawCounts, image::RgbaImage)> {
        let target_view = self
            .target
            .create_view(&wgpu::TextureViewDescriptor::default());
        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Capture Encoder"),
            });
        let counts = encode_frame(
            &mut encoder,
            &target_view,
            &self.depth.view,
            self.clear_colour,
            &mut self.transforms,
            render,
            view,
            self.sort_policy,
        );

        // rows of a texture-to-buffer copy must be 256-byte aligned
        let unpadded_row = 4 * self.width;
        let padded_row = unpadded_row.div_ceil(wgpu::COPY_BYTES_PER_ROW_ALIGNMENT)
            * wgpu::COPY_BYTES_PER_ROW_ALIGNMENT;
        let output_buffer = self.device.create_buffer(&wgpu::BufferDescriptor {
            size: (padded_row * self.height) as wgpu::BufferAddress,
            usage: wgpu::BufferUsages::COPY_DST | wgpu::BufferUsages::MAP_READ,
            label: Some("Capture Readback"),
            mapped_at_creation: false,
        });
        encoder.copy_texture_to_buffer(
            wgpu::TexelCopyTextureInfo {
                aspect: wgpu::TextureAspect::All,
                texture: &self.target,
                mip_level: 0,
                origin: wgpu::Origin3d::ZERO,
            },
            wgpu::TexelCopyBufferInfo {
                buffer: &output_buffer,
                layout: wgpu::TexelCopyBufferLayout {
                    offset: 0,
                    bytes_per_row: Some(padded_row),
                    rows_per_image: Some(self.height),
                },
            },
            wgpu::Extent3d {
                width: self.width,
                height: self.height,
                depth_or_array_layers: 1,
            },
        );
        self.transforms.flush(&self.queue);
        self.queue.submit(std::iter::once(encoder.finish()));

        let (tx, rx) = futures_intrusive::channel::shared::oneshot_channel();
        let buffer_slice = output_buffer.slice(..);
        buffer_slice.map_async(wgpu::MapMode::Read, move |result| {
            let _ = tx.send(result);
        });
        self.device.poll(wgpu::PollType::Wait {
            submission_index: None,
            timeout: Some(Duration::from_secs(3)),
        })?;
        rx.receive()
            .await
            .ok_or_else(|| anyhow::anyhow!("readback channel closed"))??;

        let pixels = {
            let data = buffer_slice.get_mapped_range();
            data.chunks_exact(padded_row as usize)
                .flat_map(|row| &row[..unpadded_row as usize])
                .copied()
                .collect::<Vec<u8>>()
        };
        output_buffer.unmap();
        let image = image::RgbaImage::from_raw(self.width, self.height, pixels)
            .ok_or_else(|| anyhow::anyhow!("readback has the wrong size"))?;
        Ok((counts, image))
    }
}
