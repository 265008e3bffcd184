//! Barycentric interpolation of arbitrary vertex attribute types.
//!
//! An attribute type is anything implementing [`Interpolate`]. Numeric primitives are the
//! leaves; arrays, tuples, nalgebra vectors and structs deriving `Interpolate` recurse into
//! their fields. The whole plan is resolved at compile time, once per attribute type, and
//! inlined into the rasterizer.

use nalgebra::{Vector2, Vector3, Vector4};

/// Weights of the three triangle vertices for one fragment. They sum to 1.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Barycentric {
    pub alpha: f64,
    pub beta: f64,
    pub gamma: f64,
}

impl Barycentric {
    pub fn new(alpha: f64, beta: f64, gamma: f64) -> Barycentric {
        return Barycentric { alpha, beta, gamma };
    }

    /// Weights normalized to sum to 1. Returns None if the sum is zero or not finite.
    pub fn normalized(alpha: f64, beta: f64, gamma: f64) -> Option<Barycentric> {
        let sum = alpha + beta + gamma;
        if sum == 0.0 || !sum.is_finite() {
            return None;
        }
        return Some(Barycentric {
            alpha: alpha / sum,
            beta: beta / sum,
            gamma: gamma / sum,
        });
    }

    /// Weighted sum of three scalars. The summation order is always alpha, beta, gamma.
    #[inline]
    pub fn weigh(&self, v0: f64, v1: f64, v2: f64) -> f64 {
        return (v0 * self.alpha + v1 * self.beta) + v2 * self.gamma;
    }

    /// The vertex value carrying all the weight, if one weight is 1 and the other two are 0.
    #[inline]
    pub fn pick<'a, T>(&self, v0: &'a T, v1: &'a T, v2: &'a T) -> Option<&'a T> {
        let (a, b, c) = (self.alpha, self.beta, self.gamma);
        if a == 1.0 && b == 0.0 && c == 0.0 {
            return Some(v0);
        }
        if a == 0.0 && b == 1.0 && c == 0.0 {
            return Some(v1);
        }
        if a == 0.0 && b == 0.0 && c == 1.0 {
            return Some(v2);
        }
        return None;
    }
}

/// Types whose values can be blended from three triangle vertices.
///
/// Implementations must combine corresponding numeric leaves with [`Barycentric::weigh`]
/// and leave the structure untouched. Integer leaves are blended in f64, so 64-bit values
/// beyond 2^53 come back exactly only when the three inputs are equal or a single vertex
/// carries all the weight. Derive it for attribute structs:
///
/// ```
/// use nalgebra::{Vector2, Vector3};
/// use tiny_rasterizer::{Barycentric, Interpolate};
///
/// #[derive(Clone, Copy, Interpolate)]
/// struct Varyings {
///     normal: Vector3<f64>,
///     uv: Vector2<f64>,
/// }
///
/// let a = Varyings { normal: Vector3::x(), uv: Vector2::new(0.0, 0.0) };
/// let b = Varyings { normal: Vector3::y(), uv: Vector2::new(1.0, 0.0) };
/// let c = Varyings { normal: Vector3::z(), uv: Vector2::new(0.0, 1.0) };
/// let v = Varyings::interpolate(&a, &b, &c, &Barycentric::new(0.5, 0.25, 0.25));
/// assert_eq!(v.uv, Vector2::new(0.25, 0.25));
/// ```
pub trait Interpolate: Sized {
    fn interpolate(v0: &Self, v1: &Self, v2: &Self, weights: &Barycentric) -> Self;
}

// Equal inputs and one-hot weights return the vertex value as is, so interpolating a
// constant attribute is exact even though the weighted sum of three equal floats can be
// off by an ulp.
macro_rules! impl_float_leaf {
    ($($t:ty),*) => {
        $(
            impl Interpolate for $t {
                #[inline]
                fn interpolate(v0: &Self, v1: &Self, v2: &Self, weights: &Barycentric) -> Self {
                    if v0 == v1 && v1 == v2 {
                        return *v0;
                    }
                    if let Some(v) = weights.pick(v0, v1, v2) {
                        return *v;
                    }
                    return weights.weigh(*v0 as f64, *v1 as f64, *v2 as f64) as $t;
                }
            }
        )*
    };
}

// Integers round to the nearest value and saturate at the type bounds. Equal inputs and
// one-hot weights skip the f64 round trip.
macro_rules! impl_int_leaf {
    ($($t:ty),*) => {
        $(
            impl Interpolate for $t {
                #[inline]
                fn interpolate(v0: &Self, v1: &Self, v2: &Self, weights: &Barycentric) -> Self {
                    if v0 == v1 && v1 == v2 {
                        return *v0;
                    }
                    if let Some(v) = weights.pick(v0, v1, v2) {
                        return *v;
                    }
                    return weights.weigh(*v0 as f64, *v1 as f64, *v2 as f64).round() as $t;
                }
            }
        )*
    };
}

impl_float_leaf!(f32, f64);
impl_int_leaf!(i8, i16, i32, i64, isize, u8, u16, u32, u64, usize);

impl Interpolate for () {
    #[inline]
    fn interpolate(_: &Self, _: &Self, _: &Self, _: &Barycentric) -> Self {}
}

impl<T: Interpolate, const N: usize> Interpolate for [T; N] {
    #[inline]
    fn interpolate(v0: &Self, v1: &Self, v2: &Self, weights: &Barycentric) -> Self {
        return std::array::from_fn(|i| T::interpolate(&v0[i], &v1[i], &v2[i], weights));
    }
}

macro_rules! impl_tuple {
    ($($name:ident : $index:tt),+) => {
        impl<$($name: Interpolate),+> Interpolate for ($($name,)+) {
            #[inline]
            fn interpolate(v0: &Self, v1: &Self, v2: &Self, weights: &Barycentric) -> Self {
                return ($($name::interpolate(&v0.$index, &v1.$index, &v2.$index, weights),)+);
            }
        }
    };
}

impl_tuple!(A: 0);
impl_tuple!(A: 0, B: 1);
impl_tuple!(A: 0, B: 1, C: 2);
impl_tuple!(A: 0, B: 1, C: 2, D: 3);

macro_rules! impl_vector {
    ($($v:ident<$t:ty>),*) => {
        $(
            impl Interpolate for $v<$t> {
                #[inline]
                fn interpolate(v0: &Self, v1: &Self, v2: &Self, weights: &Barycentric) -> Self {
                    return $v::from_fn(|i, _| <$t>::interpolate(&v0[i], &v1[i], &v2[i], weights));
                }
            }
        )*
    };
}

impl_vector!(
    Vector2<f32>, Vector3<f32>, Vector4<f32>,
    Vector2<f64>, Vector3<f64>, Vector4<f64>
);
