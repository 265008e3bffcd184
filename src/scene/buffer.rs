use nalgebra::{Matrix4, Vector3};

/// Frame constants shared by the vertex and pixel stages of a shading pair.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Uniforms {
    pub world: Matrix4<f64>,                 // Object to world, applied to normals.
    pub world_view_projection: Matrix4<f64>, // Object to clip space, applied to positions.
    pub light_direction: Vector3<f64>,       // Unit vector pointing at the light, world space.
    pub light_intensity: f64,                // 0 disables lighting, 1 is full contrast.
}

impl Uniforms {
    /// Uniforms for one object. `light_direction` is normalized, a zero vector is kept as is.
    pub fn new(world: Matrix4<f64>, view_projection: Matrix4<f64>, light_direction: Vector3<f64>, light_intensity: f64) -> Uniforms {
        return Uniforms {
            world,
            world_view_projection: view_projection * world,
            light_direction: light_direction.try_normalize(f64::EPSILON).unwrap_or(light_direction),
            light_intensity,
        };
    }
}

impl Default for Uniforms {
    fn default() -> Self {
        return Uniforms {
            world: Matrix4::identity(),
            world_view_projection: Matrix4::identity(),
            light_direction: Vector3::new(1.0, 1.0, -1.0).normalize(),
            light_intensity: 0.4,
        };
    }
}
