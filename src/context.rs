use std::sync::Arc;

use winit::window::Window;

use crate::{
    camera::{Camera, CameraController, Projection},
    config,
    data_structures::texture,
    error::InitError,
    pipelines::transform::{self, TransformArena},
    render::{DrawCounts, Render, ViewState, encode_frame},
    transparency::SortPolicy,
};

/// The part of the [`Context`] needed to create GPU resources.
///
/// Cloning only clones handles; the device and queue are shared.
#[derive(Clone, Debug)]
pub struct InitContext {
    pub device: wgpu::Device,
    pub queue: wgpu::Queue,
    pub color_format: wgpu::TextureFormat,
    pub transform_layout: wgpu::BindGroupLayout,
}

impl From<&Context> for InitContext {
    fn from(ctx: &Context) -> Self {
        ctx.init_context()
    }
}

#[derive(Debug)]
pub struct Context {
    pub(crate) window: Arc<Window>,
    pub(crate) depth_texture: texture::Texture,
    pub surface: wgpu::Surface<'static>,
    pub device: wgpu::Device,
    pub queue: wgpu::Queue,
    pub config: wgpu::SurfaceConfiguration,
    pub(crate) transform_layout: wgpu::BindGroupLayout,
    pub(crate) transforms: TransformArena,
    pub camera: Camera,
    pub controller: CameraController,
    pub projection: Projection,
    pub clear_colour: wgpu::Color,
    pub sort_policy: SortPolicy,
    pub(crate) is_surface_configured: bool,
}

impl Context {
    pub async fn new(window: Arc<Window>) -> Result<Self, InitError> {
        let size = window.inner_size();

        log::info!("WGPU setup");
        let instance = wgpu::Instance::new(wgpu::InstanceDescriptor {
            backends: wgpu::Backends::PRIMARY,
            ..wgpu::InstanceDescriptor::new_without_display_handle()
        });

        let surface = instance
            .create_surface(window.clone())
            .map_err(|e| InitError::Surface(e.to_string()))?;

        let (adapter, device, queue) = request_device(&instance, Some(&surface)).await?;

        log::info!("Surface");
        let surface_caps = surface.get_capabilities(&adapter);
        // Shader code assumes an Srgb surface texture. Using a different
        // one will result in all the colours coming out darker.
        let surface_format = surface_caps
            .formats
            .iter()
            .copied()
            .find(|f| f.is_srgb())
            .or_else(|| surface_caps.formats.first().copied())
            .ok_or_else(|| InitError::Surface("surface supports no formats".to_string()))?;
        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format: surface_format,
            width: size.width,
            height: size.height,
            present_mode: surface_caps
                .present_modes
                .first()
                .copied()
                .unwrap_or(wgpu::PresentMode::Fifo),
            alpha_mode: surface_caps
                .alpha_modes
                .first()
                .copied()
                .unwrap_or(wgpu::CompositeAlphaMode::Auto),
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };

        let camera = Camera::default();
        let projection = Projection::new(config.width, config.height, config::Z_NEAR, config::Z_FAR);

        let depth_texture = texture::Texture::create_depth_texture(
            &device,
            [config.width, config.height],
            "depth_texture",
        );
        let transform_layout = transform::mk_bind_group_layout(&device);
        let transforms = TransformArena::new(&device, &transform_layout);

        let mut ctx = Self {
            window,
            depth_texture,
            surface,
            device,
            queue,
            config,
            transform_layout,
            transforms,
            camera,
            controller: CameraController::new(),
            projection,
            clear_colour: config::CLEAR_COLOUR,
            sort_policy: SortPolicy::default(),
            is_surface_configured: false,
        };
        ctx.resize(size.width, size.height);
        Ok(ctx)
    }

    pub fn init_context(&self) -> InitContext {
        InitContext {
            device: self.device.clone(),
            queue: self.queue.clone(),
            color_format: self.config.format,
            transform_layout: self.transform_layout.clone(),
        }
    }

    pub fn window(&self) -> &Window {
        &self.window
    }

    /// Follows the framebuffer size. A zero width or height (minimised window) is ignored.
    pub fn resize(&mut self, width: u32, height: u32) {
        if width == 0 || height == 0 {
            log::debug!("ignoring resize to {width}x{height}");
            return;
        }
        self.config.width = width;
        self.config.height = height;
        self.surface.configure(&self.device, &self.config);
        self.depth_texture =
            texture::Texture::create_depth_texture(&self.device, [width, height], "depth_texture");
        self.projection.resize(width, height);
        self.is_surface_configured = true;
    }

    pub fn view_state(&self) -> ViewState {
        ViewState::new(&self.camera, &self.projection)
    }

    /// Draws `render` to the window and presents it.
    pub fn render(&mut self, render: Render<'_>) -> Result<DrawCounts, wgpu::CurrentSurfaceTexture> {
        if !self.is_surface_configured {
            return Ok(DrawCounts::default());
        }
        let output = match self.surface.get_current_texture() {
            wgpu::CurrentSurfaceTexture::Success(t) | wgpu::CurrentSurfaceTexture::Suboptimal(t) => t,
            other => return Err(other),
        };
        let view = output
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());
        let view_state = self.view_state();

        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Render Encoder"),
            });
        let counts = encode_frame(
            &mut encoder,
            &view,
            &self.depth_texture.view,
            self.clear_colour,
            &mut self.transforms,
            render,
            &view_state,
            self.sort_policy,
        );
        self.transforms.flush(&self.queue);
        self.queue.submit(std::iter::once(encoder.finish()));
        output.present();
        Ok(counts)
    }
}

/// Picks an adapter (able to present to `surface` if given) and opens a device on it.
pub(crate) async fn request_device(
    instance: &wgpu::Instance,
    surface: Option<&wgpu::Surface<'_>>,
) -> Result<(wgpu::Adapter, wgpu::Device, wgpu::Queue), InitError> {
    let adapter = instance
        .request_adapter(&wgpu::RequestAdapterOptions {
            power_preference: wgpu::PowerPreference::default(),
            compatible_surface: surface,
            force_fallback_adapter: false,
        })
        .await
        .map_err(|e| InitError::Adapter(e.to_string()))?;
    log::info!("using adapter {}", adapter.get_info().name);

    let (device, queue) = adapter
        .request_device(&wgpu::DeviceDescriptor {
            label: None,
            required_features: wgpu::Features::empty(),
            required_limits: wgpu::Limits::default(),
            experimental_features: wgpu::ExperimentalFeatures::disabled(),
            memory_hints: Default::default(),
            trace: wgpu::Trace::Off,
        })
        .await
        .map_err(|e| InitError::Device(e.to_string()))?;
    Ok((adapter, device, queue))
}
