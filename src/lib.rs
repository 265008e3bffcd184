//! Multi-threaded CPU triangle rasterizer.
//!
//! A [`Renderer`] runs a vertex shader once per model face, then scan converts the model's
//! triangles on a fixed pool of worker threads into a shared [`Framebuffer`], interpolating any
//! [`Interpolate`] attribute bundle with perspective-correct barycentric weights and resolving
//! visibility with a lock-free depth buffer.

// Lets `#[derive(Interpolate)]` refer to this crate by name from inside the crate.
extern crate self as tiny_rasterizer;

pub mod error;
pub mod framebuffer;
pub mod interpolate;
pub mod material;
pub mod model;
pub mod raster;
pub mod render;
pub mod scene;
pub mod shader;
pub mod util;

pub use error::{RasterError, Result};
pub use framebuffer::{Color, Framebuffer};
pub use interpolate::{Barycentric, Interpolate};
pub use material::{Material, Texture};
pub use model::{Face, Model, ModelBuilder, Triangle};
pub use raster::{rasterize, Coverage, CullMode};
pub use render::{render_wireframe, RenderStats, Renderer};
pub use scene::{Camera, SceneObject};
pub use shader::{PixelShader, VertexShader};
pub use tiny_rasterizer_derive::Interpolate;
