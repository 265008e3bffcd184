use std::sync::atomic::{AtomicU32, AtomicU64, Ordering};

use image::{GrayImage, Luma, Rgb, RgbImage};
use nalgebra::{Vector2, Vector3, Vector4};

use crate::error::{RasterError, Result};
use crate::util::Point;
use crate::Interpolate;

/// Struct, representing raw rgb8 pixel data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Interpolate)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Color {
    pub const BLACK: Color = Color { r: 0, g: 0, b: 0 };
    pub const WHITE: Color = Color { r: 255, g: 255, b: 255 };
    pub const RED: Color = Color { r: 255, g: 0, b: 0 };
    pub const GREEN: Color = Color { r: 0, g: 255, b: 0 };
    pub const BLUE: Color = Color { r: 0, g: 0, b: 255 };
    pub const CORNFLOWER_BLUE: Color = Color { r: 0x64, g: 0x95, b: 0xed };

    pub const fn new(r: u8, g: u8, b: u8) -> Color {
        return Color { r, g, b };
    }

    /// Get convex combination of two colors: t * c_1 + (1 - t) * c_2.
    /// t is unrestricted, channels saturate.
    pub fn blend(color_1: Color, color_2: Color, t: f64) -> Color {
        let mix = |a: u8, b: u8| (t * a as f64 + (1.0 - t) * b as f64).round() as u8;
        return Color {
            r: mix(color_1.r, color_2.r),
            g: mix(color_1.g, color_2.g),
            b: mix(color_1.b, color_2.b),
        };
    }

    /// Converts a color with channels in [0.0, 1.0] to rgb8. Out of range channels are clamped.
    pub fn from_unit(color: Vector3<f64>) -> Color {
        let channel = |c: f64| (c.clamp(0.0, 1.0) * 255.0).round() as u8;
        return Color {
            r: channel(color.x),
            g: channel(color.y),
            b: channel(color.z),
        };
    }

    /// Channels scaled to [0.0, 1.0].
    pub fn to_unit(self) -> Vector3<f64> {
        return Vector3::new(self.r as f64, self.g as f64, self.b as f64) / 255.0;
    }

    /// Packs the color as 0x00RRGGBB.
    pub const fn to_packed(self) -> u32 {
        return (self.r as u32) << 16 | (self.g as u32) << 8 | self.b as u32;
    }

    pub const fn from_packed(packed: u32) -> Color {
        return Color {
            r: (packed >> 16) as u8,
            g: (packed >> 8) as u8,
            b: packed as u8,
        };
    }
}

/// Color and depth targets of a frame.
///
/// Both buffers are flat arrays indexed with `y * width + x`, (0, 0) is the top left pixel.
/// Cells are atomics, so any number of threads may draw through a shared reference; only
/// [`Framebuffer::resize`] needs exclusive access.
pub struct Framebuffer {
    width: usize,
    height: usize,
    color: Vec<AtomicU32>, // Packed 0x00RRGGBB.
    depth: Vec<AtomicU64>, // f64 bits, lower is nearer.
}

impl Framebuffer {
    /// Generates a framebuffer of the given size, filled with black and infinitely far depth.
    pub fn new(width: i32, height: i32) -> Result<Framebuffer> {
        let mut framebuffer = Framebuffer {
            width: 0,
            height: 0,
            color: Vec::new(),
            depth: Vec::new(),
        };
        framebuffer.resize(width, height)?;
        return Ok(framebuffer);
    }

    pub fn width(&self) -> usize {
        return self.width;
    }

    pub fn height(&self) -> usize {
        return self.height;
    }

    /// Number of pixels the backing storage can hold without reallocating.
    pub fn capacity(&self) -> usize {
        return self.color.capacity().min(self.depth.capacity());
    }

    /// Changes the logical size of the buffers.
    ///
    /// Storage is only reallocated when the new pixel count exceeds the current capacity,
    /// shrinking keeps the allocation. Contents are unspecified afterwards, clear before drawing.
    pub fn resize(&mut self, width: i32, height: i32) -> Result<()> {
        if width < 0 || height < 0 {
            return Err(RasterError::InvalidViewport { width, height });
        }
        let (width, height) = (width as usize, height as usize);
        if width == self.width && height == self.height {
            return Ok(());
        }

        let n_pixels = width * height;
        if n_pixels > self.color.len() {
            self.color.resize_with(n_pixels, || AtomicU32::new(Color::BLACK.to_packed()));
            self.depth.resize_with(n_pixels, || AtomicU64::new(f64::INFINITY.to_bits()));
        } else {
            self.color.truncate(n_pixels);
            self.depth.truncate(n_pixels);
        }
        self.width = width;
        self.height = height;
        log::debug!("framebuffer resized to {}x{}", width, height);
        return Ok(());
    }

    /// Sets every pixel to `color` and every depth cell to `depth`.
    pub fn clear(&self, color: Color, depth: f64) {
        let packed = color.to_packed();
        let depth_bits = depth.to_bits();
        for cell in &self.color {
            cell.store(packed, Ordering::Relaxed);
        }
        for cell in &self.depth {
            cell.store(depth_bits, Ordering::Relaxed);
        }
    }

    /// Index of a pixel in the flat buffers, None outside of the framebuffer.
    fn index(&self, x: i64, y: i64) -> Option<usize> {
        if x < 0 || y < 0 || x as usize >= self.width || y as usize >= self.height {
            return None;
        }
        return Some(y as usize * self.width + x as usize);
    }

    /// Sets pixel to a color at specified coordinate, ignoring depth.
    /// Coordinates outside of the framebuffer are ignored.
    pub fn set_pixel(&self, x: i64, y: i64, color: Color) {
        if let Some(index) = self.index(x, y) {
            self.color[index].store(color.to_packed(), Ordering::Relaxed);
        }
    }

    pub fn pixel_at(&self, x: i64, y: i64) -> Option<Color> {
        let index = self.index(x, y)?;
        return Some(Color::from_packed(self.color[index].load(Ordering::Relaxed)));
    }

    pub fn depth_at(&self, x: i64, y: i64) -> Option<f64> {
        let index = self.index(x, y)?;
        return Some(f64::from_bits(self.depth[index].load(Ordering::Relaxed)));
    }

    /// Depth currently stored at a flat index. The index must be in range.
    pub(crate) fn depth_at_index(&self, index: usize) -> f64 {
        return f64::from_bits(self.depth[index].load(Ordering::Relaxed));
    }

    /// Stores `depth` and `color` at a flat index if `depth` is strictly nearer than the
    /// stored depth at the moment of the write. Returns false when the fragment lost.
    ///
    /// The depth cell is updated with a compare-and-swap loop, so of two racing fragments
    /// the nearer one always ends up in the depth buffer. The color store happens after the
    /// swap and may interleave with a competing writer's color.
    pub(crate) fn write_if_nearer(&self, index: usize, depth: f64, color: Color) -> bool {
        let cell = &self.depth[index];
        let mut current = cell.load(Ordering::Relaxed);
        loop {
            if !(depth < f64::from_bits(current)) {
                return false;
            }
            match cell.compare_exchange_weak(current, depth.to_bits(), Ordering::Relaxed, Ordering::Relaxed) {
                Ok(_) => {
                    self.color[index].store(color.to_packed(), Ordering::Relaxed);
                    return true;
                }
                Err(actual) => current = actual,
            }
        }
    }

    /// Transformation of a clip space position to pixel coordinates.
    /// x, y in [-1.0, 1.0] after the perspective divide cover the whole framebuffer, y points up.
    pub fn to_screen(&self, clip: &Vector4<f64>) -> Vector2<f64> {
        let ndc_x = clip.x / clip.w;
        let ndc_y = clip.y / clip.w;
        return Vector2::new(
            (ndc_x + 1.0) * 0.5 * self.width as f64,
            (1.0 - ndc_y) * 0.5 * self.height as f64,
        );
    }

    /// Draws a line between p_0 and p_1 with specified color
    /// via Bresenham's algorithm as presented in https://en.wikipedia.org/wiki/Bresenham%27s_line_algorithm
    /// Pixels outside of the framebuffer are skipped, the depth buffer is neither tested nor updated.
    pub fn draw_line(&self, p_0: Point, p_1: Point, color: Color) {
        let dx = (p_1.x - p_0.x).abs();
        let sx = if p_0.x < p_1.x { 1 } else { -1 };
        let dy = -(p_1.y - p_0.y).abs();
        let sy = if p_0.y < p_1.y { 1 } else { -1 };
        let mut error = dx + dy;

        let mut x = p_0.x;
        let mut y = p_0.y;
        loop {
            self.set_pixel(x, y, color);
            if x == p_1.x && y == p_1.y {
                break;
            }
            let e2 = 2 * error;
            if e2 >= dy {
                error += dy;
                x += sx;
            }
            if e2 <= dx {
                error += dx;
                y += sy;
            }
        }
    }

    /// Iterates over the colors of the frame in row-major order.
    pub fn colors(&self) -> impl Iterator<Item = Color> + '_ {
        return self
            .color
            .iter()
            .map(|cell| Color::from_packed(cell.load(Ordering::Relaxed)));
    }

    /// Iterates over the depth values of the frame in row-major order.
    pub fn depths(&self) -> impl Iterator<Item = f64> + '_ {
        return self
            .depth
            .iter()
            .map(|cell| f64::from_bits(cell.load(Ordering::Relaxed)));
    }

    /// Get rendered frame as rgb8 data of size 3 * (number of pixels), ready to be blitted.
    pub fn to_rgb_bytes(&self) -> Vec<u8> {
        let mut bytes = Vec::with_capacity(3 * self.color.len());
        for color in self.colors() {
            bytes.extend_from_slice(&[color.r, color.g, color.b]);
        }
        return bytes;
    }

    pub fn to_image(&self) -> RgbImage {
        return RgbImage::from_fn(self.width as u32, self.height as u32, |x, y| {
            let color = Color::from_packed(self.color[y as usize * self.width + x as usize].load(Ordering::Relaxed));
            Rgb([color.r, color.g, color.b])
        });
    }

    /// Get image, representing depth buffer values.
    /// Finite depths are normalized to [0, 255] with the nearest pixel being the brightest,
    /// pixels that were never written (infinite depth) stay black.
    pub fn depth_image(&self) -> GrayImage {
        let (z_min, z_max) = self
            .depths()
            .filter(|z| z.is_finite())
            .fold((f64::MAX, f64::MIN), |(min, max), z| (min.min(z), max.max(z)));
        let scale = if z_max > z_min { z_max - z_min } else { 1.0 };
        return GrayImage::from_fn(self.width as u32, self.height as u32, |x, y| {
            let z = self.depth_at_index(y as usize * self.width + x as usize);
            if !z.is_finite() {
                return Luma([0]);
            }
            let scaled = 255.0 - (z - z_min) / scale * 255.0;
            Luma([scaled.round().clamp(0.0, 255.0) as u8])
        });
    }
}
