//! Scan conversion of a single triangle.
//!
//! Vertices are snapped to integer pixel positions, coverage is decided with integer edge
//! functions and the barycentric weights of every covered pixel are corrected for perspective
//! with the clip space `w` of the vertices before depth and attributes are interpolated.

use nalgebra::Vector4;

use crate::framebuffer::Framebuffer;
use crate::interpolate::{Barycentric, Interpolate};
use crate::material::Material;
use crate::shader::PixelShader;
use crate::util::{convex_polygons_intersect, signed_area, Point};

/// Which screen space winding survives rasterization.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CullMode {
    /// Every non-degenerate triangle is drawn.
    #[default]
    None,
    /// Keep triangles whose vertices run clockwise on the screen (y pointing down).
    Clockwise,
    /// Keep triangles whose vertices run counterclockwise on the screen.
    CounterClockwise,
}

impl CullMode {
    /// Returns true if a triangle with doubled signed screen area `det` is culled.
    fn culls(self, det: i128) -> bool {
        return match self {
            CullMode::None => false,
            CullMode::Clockwise => det < 0,
            CullMode::CounterClockwise => det > 0,
        };
    }
}

/// Outcome of rasterizing one triangle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Coverage {
    /// Rejected by the cull mode.
    Culled,
    /// Zero area after snapping to pixels.
    Degenerate,
    /// Behind the eye or entirely outside of the viewport.
    Clipped,
    /// Scanned; `fragments` pixels were written.
    Drawn { fragments: usize },
}

impl Coverage {
    pub fn fragments(&self) -> usize {
        return match self {
            Coverage::Drawn { fragments } => *fragments,
            _ => 0,
        };
    }
}

/// Rasterizes one triangle into `target`.
///
/// `positions` are clip space positions, `attributes` the bundles produced by the vertex stage
/// for the same corners. Every covered pixel that passes the depth test gets the color returned
/// by `pixel_shader` for the interpolated attributes. Depth is the interpolated clip space z,
/// fragments with negative depth are in front of the near plane and skipped.
///
/// Only needs a shared reference to the framebuffer; concurrent calls on the same target are
/// resolved per pixel by the depth test.
pub fn rasterize<T, P>(
    target: &Framebuffer,
    positions: &[Vector4<f64>; 3],
    attributes: [&T; 3],
    material: Option<&Material>,
    cull: CullMode,
    pixel_shader: &P,
) -> Coverage
where
    T: Interpolate,
    P: PixelShader<T> + ?Sized,
{
    if positions.iter().any(|p| !(p.w > 0.0) || !p.w.is_finite()) {
        return Coverage::Clipped;
    }

    let corners = positions.map(|p| {
        let screen = target.to_screen(&p);
        Point::round(screen.x, screen.y)
    });
    let [i0, i1, i2] = corners;

    let det = signed_area(i0, i1, i2);
    if det == 0 {
        return Coverage::Degenerate;
    }
    if cull.culls(det) {
        return Coverage::Culled;
    }

    let width = target.width() as i64;
    let height = target.height() as i64;
    if width == 0 || height == 0 {
        return Coverage::Clipped;
    }

    // Bounding box of the snapped triangle, both ends inclusive.
    let x_min = i0.x.min(i1.x).min(i2.x);
    let x_max = i0.x.max(i1.x).max(i2.x);
    let y_min = i0.y.min(i1.y).min(i2.y);
    let y_max = i0.y.max(i1.y).max(i2.y);
    if x_max < 0 || y_max < 0 || x_min > width - 1 || y_min > height - 1 {
        return Coverage::Clipped;
    }
    let viewport = [
        Point::new(0, 0),
        Point::new(width - 1, 0),
        Point::new(width - 1, height - 1),
        Point::new(0, height - 1),
    ];
    if !convex_polygons_intersect(&corners, &viewport) {
        return Coverage::Clipped;
    }
    let (x_min, x_max) = (x_min.max(0), x_max.min(width - 1));
    let (y_min, y_max) = (y_min.max(0), y_max.min(height - 1));

    // Edge function coefficients, relative to the third vertex. Corners may lie far
    // outside the viewport, so the products are taken in i128.
    let dy23 = (i1.y - i2.y) as i128;
    let dy13 = (i0.y - i2.y) as i128;
    let dx32 = (i2.x - i1.x) as i128;
    let dx13 = (i0.x - i2.x) as i128;
    let sign = det.signum();

    let inv_w = positions.map(|p| 1.0 / p.w);
    let det_f = det as f64;
    let [a0, a1, a2] = attributes;

    let mut fragments = 0;
    for y in y_min..=y_max {
        let dy = (y - i2.y) as i128;
        let row = y as usize * target.width();
        for x in x_min..=x_max {
            let dx = (x - i2.x) as i128;
            let alpha = dy23 * dx + dx32 * dy;
            let beta = dx13 * dy - dy13 * dx;
            let gamma = det - alpha - beta;
            if alpha * sign < 0 || beta * sign < 0 || gamma * sign < 0 {
                continue;
            }

            let weights = match Barycentric::normalized(
                alpha as f64 * inv_w[0] / det_f,
                beta as f64 * inv_w[1] / det_f,
                gamma as f64 * inv_w[2] / det_f,
            ) {
                Some(weights) => weights,
                None => continue,
            };

            let index = row + x as usize;
            let depth = f64::interpolate(&positions[0].z, &positions[1].z, &positions[2].z, &weights);
            if depth < 0.0 || !(depth < target.depth_at_index(index)) {
                continue;
            }

            let interpolated = T::interpolate(a0, a1, a2, &weights);
            let color = pixel_shader.pixel(material, &interpolated);
            if target.write_if_nearer(index, depth, color) {
                fragments += 1;
            }
        }
    }

    return Coverage::Drawn { fragments };
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::framebuffer::Color;

    /// Clip position with the given `w` that lands on pixel (x, y) of `target`.
    fn clip_at(target: &Framebuffer, x: f64, y: f64, z: f64, w: f64) -> Vector4<f64> {
        let ndc_x = 2.0 * x / target.width() as f64 - 1.0;
        let ndc_y = 1.0 - 2.0 * y / target.height() as f64;
        return Vector4::new(ndc_x * w, ndc_y * w, z * w, w);
    }

    fn solid(color: Color) -> impl Fn(Option<&Material>, &()) -> Color + Send + Sync {
        move |_: Option<&Material>, _: &()| color
    }

    fn draw(target: &Framebuffer, corners: [(f64, f64); 3], z: f64, cull: CullMode, color: Color) -> Coverage {
        let positions = corners.map(|(x, y)| clip_at(target, x, y, z, 1.0));
        return rasterize(target, &positions, [&(), &(), &()], None, cull, &solid(color));
    }

    fn count(target: &Framebuffer, color: Color) -> usize {
        target.colors().filter(|&c| c == color).count()
    }

    #[test]
    fn test_small_triangle_covers_expected_pixels() {
        let target = Framebuffer::new(8, 8).unwrap();
        target.clear(Color::BLACK, f64::INFINITY);
        let coverage = draw(&target, [(1.0, 1.0), (5.0, 1.0), (1.0, 5.0)], 0.5, CullMode::None, Color::WHITE);
        // Right isosceles triangle with legs of 4 pixels, edges included: 5 + 4 + 3 + 2 + 1.
        assert_eq!(coverage, Coverage::Drawn { fragments: 15 });
        assert_eq!(count(&target, Color::WHITE), 15);
        assert_eq!(target.pixel_at(1, 1), Some(Color::WHITE));
        assert_eq!(target.pixel_at(5, 1), Some(Color::WHITE));
        assert_eq!(target.pixel_at(3, 3), Some(Color::WHITE));
        assert_eq!(target.pixel_at(4, 3), Some(Color::BLACK));
        assert_eq!(target.depth_at(2, 2), Some(0.5));
    }

    #[test]
    fn test_winding_and_cull_modes() {
        let clockwise = [(1.0, 1.0), (6.0, 1.0), (1.0, 6.0)];
        let counter_clockwise = [(1.0, 1.0), (1.0, 6.0), (6.0, 1.0)];
        let target = Framebuffer::new(8, 8).unwrap();

        let cases = [
            (clockwise, CullMode::Clockwise, false),
            (clockwise, CullMode::CounterClockwise, true),
            (counter_clockwise, CullMode::Clockwise, true),
            (counter_clockwise, CullMode::CounterClockwise, false),
            (clockwise, CullMode::None, false),
            (counter_clockwise, CullMode::None, false),
        ];
        for (corners, cull, culled) in cases {
            target.clear(Color::BLACK, f64::INFINITY);
            let coverage = draw(&target, corners, 0.5, cull, Color::WHITE);
            if culled {
                assert_eq!(coverage, Coverage::Culled);
                assert_eq!(count(&target, Color::WHITE), 0);
            } else {
                assert_eq!(coverage.fragments(), 21);
                assert_eq!(count(&target, Color::WHITE), 21);
            }
        }
    }

    #[test]
    fn test_single_point_triangle_is_degenerate() {
        let target = Framebuffer::new(4, 4).unwrap();
        target.clear(Color::BLACK, 1.0);
        for cull in [CullMode::None, CullMode::Clockwise, CullMode::CounterClockwise] {
            let coverage = draw(&target, [(2.0, 2.0); 3], 0.5, cull, Color::WHITE);
            assert_eq!(coverage, Coverage::Degenerate);
        }
        // Collinear corners.
        let coverage = draw(&target, [(0.0, 0.0), (1.0, 1.0), (3.0, 3.0)], 0.5, CullMode::None, Color::WHITE);
        assert_eq!(coverage, Coverage::Degenerate);
        assert_eq!(count(&target, Color::WHITE), 0);
        assert!(target.depths().all(|z| z == 1.0));
    }

    #[test]
    fn test_vertex_behind_eye_is_clipped() {
        let target = Framebuffer::new(4, 4).unwrap();
        let mut positions = [(0.0, 0.0), (3.0, 0.0), (0.0, 3.0)].map(|(x, y)| clip_at(&target, x, y, 0.5, 1.0));
        let pixel = solid(Color::WHITE);
        for w in [0.0, -1.0, f64::NAN, f64::INFINITY] {
            positions[1].w = w;
            assert_eq!(
                rasterize(&target, &positions, [&(), &(), &()], None, CullMode::None, &pixel),
                Coverage::Clipped
            );
        }
    }

    #[test]
    fn test_triangle_outside_viewport_is_clipped() {
        let target = Framebuffer::new(10, 10).unwrap();
        target.clear(Color::BLACK, f64::INFINITY);
        // Entirely to the right.
        let coverage = draw(&target, [(12.0, 0.0), (20.0, 0.0), (12.0, 8.0)], 0.5, CullMode::None, Color::WHITE);
        assert_eq!(coverage, Coverage::Clipped);
        // Bounding box overlaps the viewport, but the hypotenuse passes beyond the corner.
        let coverage = draw(&target, [(20.0, 8.0), (20.0, 20.0), (8.0, 20.0)], 0.5, CullMode::None, Color::WHITE);
        assert_eq!(coverage, Coverage::Clipped);
        assert_eq!(count(&target, Color::WHITE), 0);
    }

    #[test]
    fn test_large_triangle_is_clamped_to_viewport() {
        let target = Framebuffer::new(6, 4).unwrap();
        target.clear(Color::BLACK, f64::INFINITY);
        let coverage = draw(&target, [(-100.0, -100.0), (300.0, -100.0), (-100.0, 300.0)], 0.5, CullMode::None, Color::WHITE);
        assert_eq!(coverage, Coverage::Drawn { fragments: 24 });
        assert_eq!(count(&target, Color::WHITE), 24);
    }

    #[test]
    fn test_far_corner_keeps_edge_slopes() {
        let target = Framebuffer::new(100, 100).unwrap();
        target.clear(Color::BLACK, f64::INFINITY);
        let corners = [(0_i64, 0_i64), (4_000_000, 2_000_000), (0, 99)];
        let coverage = draw(&target, corners.map(|(x, y)| (x as f64, y as f64)), 0.5, CullMode::None, Color::WHITE);
        assert_eq!(target.pixel_at(60, 40), Some(Color::WHITE));

        let edge = |(ax, ay): (i64, i64), (bx, by): (i64, i64), (px, py): (i64, i64)| (bx - ax) * (py - ay) - (by - ay) * (px - ax);
        let mut inside_count = 0;
        for y in 0..100 {
            for x in 0..100 {
                let p = (x, y);
                let e = [
                    edge(corners[0], corners[1], p),
                    edge(corners[1], corners[2], p),
                    edge(corners[2], corners[0], p),
                ];
                let inside = e.iter().all(|&v| v >= 0) || e.iter().all(|&v| v <= 0);
                let expected = if inside { Color::WHITE } else { Color::BLACK };
                assert_eq!(target.pixel_at(x, y), Some(expected), "pixel ({}, {})", x, y);
                inside_count += inside as usize;
            }
        }
        assert_eq!(coverage, Coverage::Drawn { fragments: inside_count });
    }

    #[test]
    fn test_empty_framebuffer_rejects_everything() {
        let target = Framebuffer::new(0, 0).unwrap();
        let positions = [
            Vector4::new(-1.0, -1.0, 0.5, 1.0),
            Vector4::new(1.0, -1.0, 0.5, 1.0),
            Vector4::new(0.0, 1.0, 0.5, 1.0),
        ];
        let coverage = rasterize(&target, &positions, [&(), &(), &()], None, CullMode::None, &solid(Color::WHITE));
        assert!(matches!(coverage, Coverage::Clipped | Coverage::Degenerate));
        assert_eq!(coverage.fragments(), 0);
    }

    #[test]
    fn test_nearer_triangle_wins_in_both_orders() {
        let target = Framebuffer::new(16, 16).unwrap();
        let corners = [(0.0, 0.0), (15.0, 0.0), (0.0, 15.0)];
        for near_first in [true, false] {
            target.clear(Color::BLACK, f64::INFINITY);
            let mut layers = [(0.2, Color::RED), (0.8, Color::GREEN)];
            if !near_first {
                layers.reverse();
            }
            for (z, color) in layers {
                draw(&target, corners, z, CullMode::None, color);
            }
            assert_eq!(count(&target, Color::GREEN), 0);
            assert_eq!(count(&target, Color::RED), 136);
            assert_eq!(target.depth_at(3, 3), Some(0.2));
        }
    }

    #[test]
    fn test_negative_depth_is_skipped() {
        let target = Framebuffer::new(8, 8).unwrap();
        target.clear(Color::BLACK, f64::INFINITY);
        let coverage = draw(&target, [(1.0, 1.0), (5.0, 1.0), (1.0, 5.0)], -0.1, CullMode::None, Color::WHITE);
        assert_eq!(coverage, Coverage::Drawn { fragments: 0 });
        assert_eq!(count(&target, Color::WHITE), 0);
    }

    #[test]
    fn test_redrawing_is_a_no_op() {
        let target = Framebuffer::new(8, 8).unwrap();
        target.clear(Color::BLACK, f64::INFINITY);
        let positions = [
            clip_at(&target, 0.0, 0.0, 0.1, 1.0),
            clip_at(&target, 7.0, 0.0, 0.4, 2.0),
            clip_at(&target, 0.0, 7.0, 0.9, 1.5),
        ];
        let pixel = solid(Color::WHITE);
        let first = rasterize(&target, &positions, [&(), &(), &()], None, CullMode::None, &pixel);
        assert!(first.fragments() > 0);
        let depths: Vec<f64> = target.depths().collect();
        let second = rasterize(&target, &positions, [&(), &(), &()], None, CullMode::None, &solid(Color::RED));
        assert_eq!(second, Coverage::Drawn { fragments: 0 });
        assert_eq!(target.depths().collect::<Vec<f64>>(), depths);
        assert_eq!(count(&target, Color::RED), 0);
    }

    #[test]
    fn test_weights_are_perspective_correct() {
        let target = Framebuffer::new(101, 101).unwrap();
        target.clear(Color::BLACK, f64::INFINITY);
        let positions = [
            clip_at(&target, 0.0, 50.0, 0.5, 1.0),
            clip_at(&target, 100.0, 50.0, 0.5, 3.0),
            clip_at(&target, 50.0, 0.0, 0.5, 3.0),
        ];
        let pixel = |_: Option<&Material>, value: &f64| Color::new((value * 200.0).round() as u8, 0, 0);
        rasterize(&target, &positions, [&0.0, &1.0, &7.0], None, CullMode::None, &pixel);
        // Halfway between the first two corners on screen, but the far corner weighs a third.
        assert_eq!(target.pixel_at(50, 50), Some(Color::new(50, 0, 0)));
        assert_eq!(target.pixel_at(0, 50), Some(Color::new(0, 0, 0)));
    }

    #[test]
    fn test_material_reaches_pixel_shader() {
        let target = Framebuffer::new(4, 4).unwrap();
        target.clear(Color::BLACK, f64::INFINITY);
        let material = Material::diffuse("red", nalgebra::Vector3::new(1.0, 0.0, 0.0));
        let positions = [(0.0, 0.0), (3.0, 0.0), (0.0, 3.0)].map(|(x, y)| clip_at(&target, x, y, 0.5, 1.0));
        let pixel = |material: Option<&Material>, _: &()| match material {
            Some(material) => Color::from_unit(material.diffuse_color),
            None => Color::WHITE,
        };
        rasterize(&target, &positions, [&(), &(), &()], Some(&material), CullMode::None, &pixel);
        assert_eq!(target.pixel_at(0, 0), Some(Color::RED));
    }
}
