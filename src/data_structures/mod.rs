//! Engine data structures: meshes, textures, placement and built-in geometry.
//!
//! - `model` contains the vertex layout, [`model::Mesh`], [`model::Model`] and the `Drawable` trait
//! - `texture` contains the GPU texture wrapper and creation utilities
//! - `instance` holds per-draw position/rotation/scale
//! - `primitives` has interleaved vertex arrays for a cube, a floor and a window quad

pub mod instance;
pub mod model;
pub mod primitives;
pub mod texture;
