//! Compile-time configuration.
//!
//! There is no config file and there are no CLI flags: window size, asset
//! locations and the camera defaults are constants. `RUST_LOG` is picked up by
//! `env_logger` and is the only runtime knob.

use cgmath::Deg;

/// Initial window width in physical pixels.
pub const SCR_WIDTH: u32 = 1920;
/// Initial window height in physical pixels.
pub const SCR_HEIGHT: u32 = 1080;
pub const WINDOW_TITLE: &str = "SoftRendererGL";

/// Root directory that all asset paths are resolved against.
pub const ASSET_DIR: &str = "assets";

pub const CLEAR_COLOUR: wgpu::Color = wgpu::Color {
    r: 0.2,
    g: 0.3,
    b: 0.3,
    a: 1.0,
};

pub const Z_NEAR: f32 = 0.1;
pub const Z_FAR: f32 = 100.0;

pub const CAMERA_START: [f32; 3] = [0.0, 0.0, 3.0];
pub const WORLD_UP: [f32; 3] = [0.0, 1.0, 0.0];
pub const YAW: Deg<f32> = Deg(-90.0);
pub const PITCH: Deg<f32> = Deg(0.0);
/// World units per second.
pub const SPEED: f32 = 2.5;
/// Degrees per pixel of cursor travel.
pub const SENSITIVITY: f32 = 0.1;
pub const ZOOM: f32 = 45.0;
pub const ZOOM_MIN: f32 = 1.0;
pub const ZOOM_MAX: f32 = 45.0;
pub const PITCH_LIMIT: f32 = 89.0;

/// Upper bound of draw calls recorded in one frame. Draws past this are dropped with a warning.
pub const MAX_DRAWS_PER_FRAME: usize = 1024;

/// Window parameters handed to winit when the event loop resumes.
#[derive(Clone, Debug)]
pub struct WindowConfig {
    pub width: u32,
    pub height: u32,
    pub title: &'static str,
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            width: SCR_WIDTH,
            height: SCR_HEIGHT,
            title: WINDOW_TITLE,
        }
    }
}
