use std::sync::Arc;

use image::RgbImage;
use nalgebra::{Vector2, Vector3};

use crate::error::{RasterError, Result};

/// Color map sampled by pixel shaders, colors are stored with channels in [0.0, 1.0].
#[derive(Debug, Clone, PartialEq)]
pub struct Texture {
    width: usize,
    height: usize,
    colors: Vec<Vector3<f64>>,
}

impl Texture {
    pub fn new(width: usize, height: usize, colors: Vec<Vector3<f64>>) -> Result<Texture> {
        if width == 0 || height == 0 || colors.len() != width * height {
            return Err(RasterError::InvalidTexture {
                width,
                height,
                len: colors.len(),
            });
        }
        return Ok(Texture { width, height, colors });
    }

    /// Converts an already decoded image, first row is the top of the texture.
    pub fn from_image(image: &RgbImage) -> Result<Texture> {
        let colors = image
            .pixels()
            .map(|p| Vector3::new(p[0] as f64, p[1] as f64, p[2] as f64) / 255.0)
            .collect();
        return Texture::new(image.width() as usize, image.height() as usize, colors);
    }

    /// Create a checkerboard test texture with `cell`-sized squares.
    pub fn checkerboard(width: usize, height: usize, cell: usize, color_1: Vector3<f64>, color_2: Vector3<f64>) -> Result<Texture> {
        let cell = cell.max(1);
        let mut colors = Vec::with_capacity(width * height);
        for y in 0..height {
            for x in 0..width {
                let checker = ((x / cell) + (y / cell)) % 2 == 0;
                colors.push(if checker { color_1 } else { color_2 });
            }
        }
        return Texture::new(width, height, colors);
    }

    pub fn width(&self) -> usize {
        return self.width;
    }

    pub fn height(&self) -> usize {
        return self.height;
    }

    /// Color at a texel, coordinates wrap around in both directions.
    pub fn texel(&self, x: i64, y: i64) -> Vector3<f64> {
        let x = x.rem_euclid(self.width as i64) as usize;
        let y = y.rem_euclid(self.height as i64) as usize;
        return self.colors[y * self.width + x];
    }

    /// Nearest texel lookup. v = 0 is the bottom row, uv outside of [0, 1) wraps.
    pub fn sample(&self, uv: Vector2<f64>) -> Vector3<f64> {
        let x = (uv.x * self.width as f64).floor();
        let y = ((1.0 - uv.y) * self.height as f64).floor();
        if !x.is_finite() || !y.is_finite() {
            return self.colors[0];
        }
        return self.texel(x as i64, y as i64);
    }
}

/// Surface description handed to pixel shaders. Never modified by the rasterizer.
#[derive(Debug, Clone, PartialEq)]
pub struct Material {
    pub name: String,
    pub specular_exponent: f64,
    pub ambient_color: Vector3<f64>,
    pub diffuse_color: Vector3<f64>,
    pub specular_color: Vector3<f64>,
    pub ambient_texture: Option<Arc<Texture>>,
    pub diffuse_texture: Option<Arc<Texture>>,
}

impl Material {
    /// Untextured material with a single diffuse color.
    pub fn diffuse(name: &str, diffuse_color: Vector3<f64>) -> Material {
        return Material {
            name: name.to_string(),
            diffuse_color,
            ..Default::default()
        };
    }
}

impl Default for Material {
    fn default() -> Self {
        return Material {
            name: String::from("default"),
            specular_exponent: 0.0,
            ambient_color: Vector3::zeros(),
            diffuse_color: Vector3::new(1.0, 1.0, 1.0),
            specular_color: Vector3::zeros(),
            ambient_texture: None,
            diffuse_texture: None,
        };
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgb;

    fn gradient() -> Texture {
        // 4x2 texture, texel (x, y) has red = x and green = y.
        let mut colors = Vec::new();
        for y in 0..2 {
            for x in 0..4 {
                colors.push(Vector3::new(x as f64, y as f64, 0.0));
            }
        }
        Texture::new(4, 2, colors).unwrap()
    }

    #[test]
    fn test_size_mismatch_is_rejected() {
        let result = Texture::new(2, 2, vec![Vector3::zeros(); 3]);
        assert!(matches!(
            result,
            Err(RasterError::InvalidTexture { width: 2, height: 2, len: 3 })
        ));
        assert!(Texture::new(0, 0, Vec::new()).is_err());
    }

    #[test]
    fn test_texel_wraps() {
        let texture = gradient();
        assert_eq!(texture.texel(5, 0), Vector3::new(1.0, 0.0, 0.0));
        assert_eq!(texture.texel(-1, -1), Vector3::new(3.0, 1.0, 0.0));
    }

    #[test]
    fn test_sample_flips_v() {
        let texture = gradient();
        // v close to 1 is the top row.
        assert_eq!(texture.sample(Vector2::new(0.0, 0.99)), Vector3::new(0.0, 0.0, 0.0));
        // v close to 0 is the bottom row.
        assert_eq!(texture.sample(Vector2::new(0.6, 0.01)), Vector3::new(2.0, 1.0, 0.0));
        // Wrapping.
        assert_eq!(texture.sample(Vector2::new(1.3, 0.01)), Vector3::new(1.0, 1.0, 0.0));
        assert_eq!(texture.sample(Vector2::new(-0.1, 0.99)), Vector3::new(3.0, 0.0, 0.0));
    }

    #[test]
    fn test_from_image() {
        let mut image = RgbImage::new(2, 1);
        image.put_pixel(1, 0, Rgb([255, 0, 51]));
        let texture = Texture::from_image(&image).unwrap();
        assert_eq!(texture.width(), 2);
        assert_eq!(texture.texel(1, 0), Vector3::new(1.0, 0.0, 0.2));
        assert_eq!(texture.texel(0, 0), Vector3::zeros());
    }

    #[test]
    fn test_checkerboard() {
        let white = Vector3::new(1.0, 1.0, 1.0);
        let texture = Texture::checkerboard(4, 4, 2, white, Vector3::zeros()).unwrap();
        assert_eq!(texture.texel(1, 1), white);
        assert_eq!(texture.texel(2, 0), Vector3::zeros());
        assert_eq!(texture.texel(3, 3), white);
    }
}
