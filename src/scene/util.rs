use nalgebra as na;
use na::{vector, Matrix4, Vector3, Vector4};

use crate::error::{RasterError, Result};

/// Transformation of a point to homogenous coordinates.
pub fn to_hom_point(v: Vector3<f64>) -> Vector4<f64> {
    return vector![v.x, v.y, v.z, 1.0];
}

/// Transformation of a vector to homogenous coordinates.
pub fn to_hom_vector(v: Vector3<f64>) -> Vector4<f64> {
    return vector![v.x, v.y, v.z, 0.0];
}

/// Transformation of a point from homogenous coordinates.
pub fn from_hom_point(v: Vector4<f64>) -> Vector3<f64> {
    return vector![v.x / v.w, v.y / v.w, v.z / v.w];
}

/// Transformation of a vector from homogenous coordinates.
pub fn from_hom_vector(v: Vector4<f64>) -> Vector3<f64> {
    return vector![v.x, v.y, v.z];
}

/// Left-handed perspective projection for column vectors, camera looking down +z.
///
/// View space depth `near` maps to clip z = 0 and `far` to z = w, clip w is the view space depth.
/// `fov_y` is the vertical field of view in radians, `aspect` is width / height.
pub fn perspective(fov_y: f64, aspect: f64, near: f64, far: f64) -> Result<Matrix4<f64>> {
    if !(fov_y > 0.0 && fov_y < std::f64::consts::PI) {
        return Err(RasterError::InvalidProjection(format!("field of view {}", fov_y)));
    }
    if !(aspect > 0.0) || !aspect.is_finite() {
        return Err(RasterError::InvalidProjection(format!("aspect ratio {}", aspect)));
    }
    if !(near > 0.0) || !(far > near) || !far.is_finite() {
        return Err(RasterError::InvalidProjection(format!("depth range {}..{}", near, far)));
    }

    let y_scale = 1.0 / (fov_y / 2.0).tan();
    let x_scale = y_scale / aspect;
    let q = far / (far - near);
    #[rustfmt::skip]
    let projection = Matrix4::new(
        x_scale, 0.0,     0.0, 0.0,
        0.0,     y_scale, 0.0, 0.0,
        0.0,     0.0,     q,   -q * near,
        0.0,     0.0,     1.0, 0.0,
    );
    return Ok(projection);
}

/// Parallel projection scaling every axis by `scale`, clip w is always 1.
pub fn orthographic(scale: f64) -> Matrix4<f64> {
    return Matrix4::new_nonuniform_scaling(&Vector3::new(scale, scale, scale));
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_homogeneous_round_trip() {
        let p = Vector3::new(1.0, -2.0, 3.0);
        assert_eq!(from_hom_point(to_hom_point(p) * 2.0), p);
        assert_eq!(to_hom_vector(p).w, 0.0);
        assert_eq!(from_hom_vector(to_hom_vector(p)), p);
    }

    #[test]
    fn test_perspective_depth_range() {
        let projection = perspective(std::f64::consts::FRAC_PI_2, 2.0, 0.5, 10.0).unwrap();
        let near = projection * vector![0.0, 0.0, 0.5, 1.0];
        let far = projection * vector![0.0, 0.0, 10.0, 1.0];
        assert_relative_eq!(near.z, 0.0);
        assert_relative_eq!(near.w, 0.5);
        assert_relative_eq!(far.z / far.w, 1.0, epsilon = 1e-12);

        // 90 degrees: the top edge of the view at depth d is at height d.
        let top = projection * vector![0.0, 4.0, 4.0, 1.0];
        assert_relative_eq!(top.y / top.w, 1.0, epsilon = 1e-12);
        let right = projection * vector![8.0, 0.0, 4.0, 1.0];
        assert_relative_eq!(right.x / right.w, 1.0, epsilon = 1e-12);
    }

    #[test]
    fn test_perspective_rejects_bad_parameters() {
        let fov = 1.0;
        assert!(perspective(0.0, 1.0, 0.1, 10.0).is_err());
        assert!(perspective(4.0, 1.0, 0.1, 10.0).is_err());
        assert!(perspective(fov, 0.0, 0.1, 10.0).is_err());
        assert!(perspective(fov, 1.0, 0.0, 10.0).is_err());
        assert!(perspective(fov, 1.0, 1.0, 1.0).is_err());
        assert!(matches!(
            perspective(fov, 1.0, f64::NAN, 10.0),
            Err(RasterError::InvalidProjection(_))
        ));
    }

    #[test]
    fn test_orthographic_keeps_w() {
        let p = orthographic(0.5) * to_hom_point(Vector3::new(2.0, 4.0, -6.0));
        assert_eq!(p, vector![1.0, 2.0, -3.0, 1.0]);
    }
}
