use std::sync::Arc;

use nalgebra::{Vector2, Vector3, Vector4};

use super::buffer::Uniforms;
use super::util::{from_hom_vector, to_hom_point, to_hom_vector};
use crate::framebuffer::Color;
use crate::material::Material;
use crate::model::{Face, Model};
use crate::shader::{PixelShader, VertexShader};
use crate::Interpolate;

/// Attributes passed from the vertex to the pixel stage of [`Lambert`].
#[derive(Debug, Clone, Copy, PartialEq, Interpolate)]
pub struct SurfaceVertex {
    pub normal: Vector3<f64>, // World space.
    pub uv: Vector2<f64>,
}

/// Flat diffuse lighting with a single directional light.
///
/// The same value serves as vertex and pixel shader, clone it to hand one copy to each stage.
#[derive(Debug, Clone)]
pub struct Lambert {
    model: Arc<Model>,
    uniforms: Uniforms,
    fallback: Material, // For triangles without a material.
}

impl Lambert {
    pub fn new(model: Arc<Model>, uniforms: Uniforms) -> Lambert {
        return Lambert {
            model,
            uniforms,
            fallback: Material::default(),
        };
    }

    /// Light factor for a surface normal, in [0, 1].
    /// Intensity 0 ignores the normal, intensity 1 maps the cosine to the factor directly.
    pub fn shade(&self, normal: &Vector3<f64>) -> f64 {
        let intensity = self.uniforms.light_intensity;
        let shade = normal.dot(&self.uniforms.light_direction) * intensity + (1.0 - intensity);
        return shade.clamp(0.0, 1.0);
    }
}

impl VertexShader<SurfaceVertex> for Lambert {
    fn vertex(&self, face: &Face) -> (SurfaceVertex, Vector4<f64>) {
        let position = self.uniforms.world_view_projection * to_hom_point(self.model.position(face));
        let normal = from_hom_vector(self.uniforms.world * to_hom_vector(self.model.normal(face)));
        let vertex = SurfaceVertex {
            normal: normal.try_normalize(f64::EPSILON).unwrap_or_else(Vector3::zeros),
            uv: self.model.texture_coord(face),
        };
        return (vertex, position);
    }
}

impl PixelShader<SurfaceVertex> for Lambert {
    fn pixel(&self, material: Option<&Material>, attributes: &SurfaceVertex) -> Color {
        let material = material.unwrap_or(&self.fallback);
        let shade = self.shade(&attributes.normal);
        let color = match &material.ambient_texture {
            Some(texture) => texture.sample(attributes.uv),
            None => material.diffuse_color,
        };
        return Color::from_unit(color * shade);
    }
}
