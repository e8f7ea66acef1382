//! Shader programs and the GPU state they share.
//!
//! - `shader`: compiling, validating and binding a [`shader::ShaderProgram`]
//! - `uniforms`: GL-style named uniform blocks laid out for WGSL
//! - `transform`: the per-draw model/view/projection arena
//! - `basic`: pipeline construction plus the `single_color` and `single_tex` programs
//! - `phong`: the lit model program and its lights

pub mod basic;
pub mod phong;
pub mod shader;
pub mod transform;
pub mod uniforms;
