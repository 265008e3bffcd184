use nalgebra::Vector4;

use crate::framebuffer::Color;
use crate::material::Material;
use crate::model::Face;

/// Per-vertex stage. Turns a face corner into its attribute bundle and clip space position.
///
/// Called concurrently from the worker pool, so it must not rely on call order. Any
/// `Fn(&Face) -> (T, Vector4<f64>) + Send + Sync` closure is a vertex shader.
pub trait VertexShader<T>: Send + Sync {
    fn vertex(&self, face: &Face) -> (T, Vector4<f64>);
}

/// Per-fragment stage. Turns the material of a triangle and the interpolated attributes into a color.
///
/// Any `Fn(Option<&Material>, &T) -> Color + Send + Sync` closure is a pixel shader.
pub trait PixelShader<T>: Send + Sync {
    fn pixel(&self, material: Option<&Material>, attributes: &T) -> Color;
}

impl<T, F> VertexShader<T> for F
where
    F: Fn(&Face) -> (T, Vector4<f64>) + Send + Sync,
{
    #[inline]
    fn vertex(&self, face: &Face) -> (T, Vector4<f64>) {
        return self(face);
    }
}

impl<T, F> PixelShader<T> for F
where
    F: Fn(Option<&Material>, &T) -> Color + Send + Sync,
{
    #[inline]
    fn pixel(&self, material: Option<&Material>, attributes: &T) -> Color {
        return self(material, attributes);
    }
}
