//! blend-ngin
//!
//! A small forward renderer built around one technique: drawing
//! half-transparent geometry correctly by sorting it back to front every
//! frame. Opaque meshes are drawn first with depth writes, then transparent
//! ones farthest-to-nearest with alpha blending, so each window blends over
//! everything behind it.
//!
//! High-level modules
//! - `camera`: fly camera, perspective projection and the keyboard/mouse controller
//! - `context`: window surface, device/queue and the per-frame state they own
//! - `data_structures`: meshes, textures, placement and built-in geometry
//! - `flow`: the frame loop and the `GraphicsFlow` trait scenes implement
//! - `pipelines`: shader programs, named uniforms and the per-draw transforms
//! - `render`: render composition and the per-frame draw protocol
//! - `resources`: loading textures, models and shader sources from `assets/`
//! - `transparency`: the distance sort behind back-to-front drawing
//! - `scene`: the demo scene run by the `blend-demo` binary
//!

pub mod camera;
#[cfg(feature = "integration-tests")]
pub mod capture;
pub mod config;
pub mod context;
pub mod data_structures;
pub mod error;
pub mod flow;
pub mod pipelines;
pub mod render;
pub mod resources;
pub mod scene;
pub mod transparency;

// Re-exports commonly used types for convenience in downstream code.
pub use cgmath;
pub use wgpu;
pub use winit;
