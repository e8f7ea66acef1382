//! The frame loop.
//!
//! A "flow" is the scene being shown: it loads its resources once, updates
//! every frame and describes what to draw with a [`Render`]. The loop owns the
//! window, the [`Context`] and the flow, all on the thread running winit.
//!
//! # Lifecycle
//!
//! Each redraw:
//! 1. measure `dt` with a monotonic clock
//! 2. move the camera according to the held keys
//! 3. call [`GraphicsFlow::on_update`]
//! 4. collect [`GraphicsFlow::on_render`] and draw it: opaques in declared
//!    order, then transparents farthest first
//! 5. present and request the next redraw
//!
//! Input events (keys, cursor, scroll) are fed to the camera controller as
//! they arrive. Escape or closing the window switches the loop to
//! [`LoopState::Closing`] and the event loop exits.

use std::{pin::Pin, sync::Arc};

use instant::{Duration, Instant};
use winit::{
    application::ApplicationHandler,
    dpi::PhysicalSize,
    event::{KeyEvent, MouseScrollDelta, WindowEvent},
    event_loop::{ActiveEventLoop, ControlFlow, EventLoop},
    keyboard::PhysicalKey,
    window::{Window, WindowId},
};

use crate::{
    camera::KeyResponse,
    config::WindowConfig,
    context::{Context, InitContext},
    error::InitError,
    render::Render,
};

/// Pixels of touchpad scrolling that count as one wheel line.
const PIXELS_PER_LINE: f64 = 20.0;

/// A scene driven by the frame loop.
pub trait GraphicsFlow {
    /// Called once after construction, before the first frame. The place to
    /// move the camera or change the clear colour.
    fn on_init(&mut self, _ctx: &mut Context) {}

    /// Called every frame, after the camera moved and before rendering.
    fn on_update(&mut self, ctx: &Context, dt: Duration);

    /// What to draw this frame.
    fn on_render(&self) -> Render<'_>;
}

/// Builds the flow once the GPU is ready.
///
/// Returning `Err` aborts start-up; [`run`] hands the error back to the caller.
pub type FlowConstructor = Box<
    dyn FnOnce(InitContext) -> Pin<Box<dyn Future<Output = anyhow::Result<Box<dyn GraphicsFlow>>>>>,
>;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum LoopState {
    #[default]
    Running,
    Closing,
}

impl LoopState {
    pub fn request_close(&mut self) {
        if *self == LoopState::Running {
            log::info!("close requested");
        }
        *self = LoopState::Closing;
    }

    pub fn is_running(self) -> bool {
        self == LoopState::Running
    }
}

/// Monotonic frame timer.
#[derive(Clone, Copy, Debug)]
pub struct FrameClock {
    last: Instant,
}

impl FrameClock {
    pub fn new() -> Self {
        Self {
            last: Instant::now(),
        }
    }

    /// Time since the previous tick (or since creation).
    pub fn tick(&mut self) -> Duration {
        let now = Instant::now();
        let dt = now.duration_since(self.last);
        self.last = now;
        dt
    }
}

impl Default for FrameClock {
    fn default() -> Self {
        Self::new()
    }
}

/// Converts a scroll event into wheel lines, positive away from the user.
pub fn scroll_lines(delta: MouseScrollDelta) -> f32 {
    match delta {
        MouseScrollDelta::LineDelta(_, y) => y,
        MouseScrollDelta::PixelDelta(pos) => (pos.y / PIXELS_PER_LINE) as f32,
    }
}

pub struct App {
    async_runtime: tokio::runtime::Runtime,
    window_config: WindowConfig,
    ctx: Option<Context>,
    flow: Option<Box<dyn GraphicsFlow>>,
    // taken on the first `resumed`
    constructor: Option<FlowConstructor>,
    clock: FrameClock,
    state: LoopState,
    error: Option<anyhow::Error>,
}

impl App {
    fn new(window_config: WindowConfig, constructor: FlowConstructor) -> anyhow::Result<Self> {
        Ok(Self {
            async_runtime: tokio::runtime::Runtime::new()?,
            window_config,
            ctx: None,
            flow: None,
            constructor: Some(constructor),
            clock: FrameClock::new(),
            state: LoopState::Running,
            error: None,
        })
    }

    fn fail(&mut self, event_loop: &ActiveEventLoop, error: anyhow::Error) {
        log::error!("{error:#}");
        self.error = Some(error);
        self.state.request_close();
        event_loop.exit();
    }

    fn close(&mut self, event_loop: &ActiveEventLoop) {
        self.state.request_close();
        event_loop.exit();
    }

    fn redraw(&mut self) {
        let (Some(ctx), Some(flow)) = (self.ctx.as_mut(), self.flow.as_mut()) else {
            return;
        };
        let dt = self.clock.tick();
        ctx.controller.update(&mut ctx.camera, dt);
        flow.on_update(ctx, dt);

        match ctx.render(flow.on_render()) {
            Ok(counts) => log::trace!(
                "frame: {} opaque, {} transparent draws",
                counts.opaque,
                counts.transparent
            ),
            // Reconfigure the surface if it's lost or outdated
            Err(wgpu::CurrentSurfaceTexture::Lost | wgpu::CurrentSurfaceTexture::Outdated) => {
                let size = ctx.window().inner_size();
                ctx.resize(size.width, size.height);
            }
            Err(e) => log::error!("Unable to render {e:?}"),
        }
        ctx.window().request_redraw();
    }
}

impl ApplicationHandler for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        let Some(constructor) = self.constructor.take() else {
            return;
        };
        let window_attributes = Window::default_attributes()
            .with_title(self.window_config.title)
            .with_inner_size(PhysicalSize::new(
                self.window_config.width,
                self.window_config.height,
            ));
        let window = match event_loop.create_window(window_attributes) {
            Ok(window) => Arc::new(window),
            Err(e) => return self.fail(event_loop, InitError::Window(e).into()),
        };

        let init_future = async move {
            let ctx = Context::new(window).await?;
            let flow = constructor(ctx.init_context()).await?;
            Ok::<_, anyhow::Error>((ctx, flow))
        };
        match self.async_runtime.block_on(init_future) {
            Ok((mut ctx, mut flow)) => {
                flow.on_init(&mut ctx);
                ctx.window().request_redraw();
                self.clock = FrameClock::new();
                self.ctx = Some(ctx);
                self.flow = Some(flow);
            }
            Err(e) => self.fail(event_loop, e),
        }
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, _window_id: WindowId, event: WindowEvent) {
        if !self.state.is_running() {
            return;
        }
        let Some(ctx) = self.ctx.as_mut() else {
            return;
        };

        match event {
            WindowEvent::CloseRequested => self.close(event_loop),
            WindowEvent::Resized(size) => ctx.resize(size.width, size.height),
            WindowEvent::KeyboardInput {
                event:
                    KeyEvent {
                        physical_key: PhysicalKey::Code(code),
                        state,
                        ..
                    },
                ..
            } => {
                if ctx.controller.process_key(code, state) == KeyResponse::CloseRequested {
                    self.close(event_loop);
                }
            }
            WindowEvent::CursorMoved { position, .. } => {
                ctx.controller
                    .process_cursor(&mut ctx.camera, position.x, position.y);
            }
            WindowEvent::MouseWheel { delta, .. } => {
                ctx.controller
                    .process_scroll(&mut ctx.camera, scroll_lines(delta));
            }
            WindowEvent::RedrawRequested => self.redraw(),
            _ => {}
        }
    }
}

/// Opens the window, builds the flow and runs the frame loop until it closes.
pub fn run(window_config: WindowConfig, constructor: FlowConstructor) -> anyhow::Result<()> {
    if let Err(e) = env_logger::try_init() {
        println!("Warning: Could not initialize logger: {}", e);
    };

    let event_loop = EventLoop::new()?;
    // draw as fast as the surface allows instead of waiting for input
    event_loop.set_control_flow(ControlFlow::Poll);

    let mut app = App::new(window_config, constructor)?;
    event_loop.run_app(&mut app)?;

    match app.error.take() {
        Some(e) => Err(e),
        None => Ok(()),
    }
}
