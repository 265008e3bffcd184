use std::ops;

use nalgebra::Vector2;

/// Screen coordinates are clamped to this many pixels around the origin. Within the band every
/// integer is exactly representable as f64 and edge function terms fit into i128, so clamping
/// only affects positions that are already out of reach of f64 precision.
pub const GUARD_BAND: i64 = 1 << 60;

/// 2D coordinate of a framebuffer pixel.
/// i64 to allow coordinates far outside of the framebuffer and to remove a lot of casts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Point {
    pub x: i64,
    pub y: i64,
}

impl Point {
    pub fn new(x: i64, y: i64) -> Point {
        return Point { x, y };
    }

    /// Rounds a screen position to the nearest pixel, `floor(v + 0.5)`, clamped to the guard band.
    /// NaN maps to 0.
    pub fn round(x: f64, y: f64) -> Point {
        fn to_pixel(v: f64) -> i64 {
            let v = (v + 0.5).floor();
            if v.is_nan() {
                return 0;
            }
            return v.clamp(-(GUARD_BAND as f64), GUARD_BAND as f64) as i64;
        }
        return Point {
            x: to_pixel(x),
            y: to_pixel(y),
        };
    }

    /// z component of the cross product of 2 points taken as vectors.
    /// Computed in i128, any two differences of guard band points are safe.
    pub fn cross(a: Point, b: Point) -> i128 {
        return a.x as i128 * b.y as i128 - a.y as i128 * b.x as i128;
    }
}

impl ops::Sub<Point> for Point {
    type Output = Point;

    fn sub(self, rhs: Point) -> Point {
        return Point {
            x: self.x - rhs.x,
            y: self.y - rhs.y,
        };
    }
}

impl ops::Add<Point> for Point {
    type Output = Point;

    fn add(self, rhs: Point) -> Point {
        return Point {
            x: self.x + rhs.x,
            y: self.y + rhs.y,
        };
    }
}

/// Doubled signed area of a triangle. Positive when a, b, c run clockwise on a Y-down screen.
pub fn signed_area(a: Point, b: Point, c: Point) -> i128 {
    return Point::cross(b - a, c - a);
}

/// Orientation of a convex polygon as the sign of its doubled area.
fn orientation(polygon: &[Point]) -> i128 {
    let mut area: i128 = 0;
    for i in 0..polygon.len() {
        let a = polygon[i];
        let b = polygon[(i + 1) % polygon.len()];
        area += Point::cross(a, b);
    }
    return area.signum();
}

/// Returns true if one of `polygon`'s edges has every point of `other` strictly on its outer side.
fn has_separating_edge(polygon: &[Point], other: &[Point]) -> bool {
    let sign = orientation(polygon);
    if sign == 0 {
        // Zero-area polygons provide no usable edge normals.
        return false;
    }
    for i in 0..polygon.len() {
        let a = polygon[i];
        let edge = polygon[(i + 1) % polygon.len()] - a;
        if other.iter().all(|&p| Point::cross(edge, p - a) * sign < 0) {
            return true;
        }
    }
    return false;
}

/// Separating axis test between two convex polygons given by their corners in order.
///
/// Exact when both polygons have a non-zero area. When one of them is degenerate the
/// test may report an intersection that does not exist, never the other way around.
pub fn convex_polygons_intersect(a: &[Point], b: &[Point]) -> bool {
    if a.is_empty() || b.is_empty() {
        return false;
    }
    return !has_separating_edge(a, b) && !has_separating_edge(b, a);
}

/// Liang-Barsky clipping of the segment p_0 p_1 against the rectangle [min, max].
/// Returns the part of the segment inside the rectangle, None if there is none.
pub fn clip_segment(
    p_0: Vector2<f64>,
    p_1: Vector2<f64>,
    min: Vector2<f64>,
    max: Vector2<f64>,
) -> Option<(Vector2<f64>, Vector2<f64>)> {
    if !(min.x <= max.x && min.y <= max.y) {
        return None;
    }
    let d = p_1 - p_0;
    let mut t_0: f64 = 0.0;
    let mut t_1: f64 = 1.0;
    // (p, q) pairs: the segment is inside an edge where t * p <= q.
    let boundaries = [
        (-d.x, p_0.x - min.x),
        (d.x, max.x - p_0.x),
        (-d.y, p_0.y - min.y),
        (d.y, max.y - p_0.y),
    ];
    for (p, q) in boundaries {
        if !q.is_finite() || !p.is_finite() {
            return None;
        }
        if p == 0.0 {
            if q < 0.0 {
                return None;
            }
            continue;
        }
        let t = q / p;
        if p < 0.0 {
            t_0 = t_0.max(t);
        } else {
            t_1 = t_1.min(t);
        }
        if t_0 > t_1 {
            return None;
        }
    }
    return Some((p_0 + d * t_0, p_0 + d * t_1));
}
