//! Square matrix types (2×2, 3×3, 4×4), stored **column-major**.
//!
//! `spec.md` §3: "all matrix-vector multiplications treat memory as
//! column-major; any transposition for display is explicit." Element access
//! is `m.col(c)[r]`; the flat storage order is `[col0, col1, ...]`.

use super::approx_eq::{float_eq, EPSILON};
use super::vector::{Vec2, Vec3, Vec4};
use std::ops::{Index, IndexMut, Mul};

macro_rules! impl_matrix {
    ($name:ident, $n:expr) => {
        #[derive(Debug, Clone, Copy)]
        pub struct $name {
            /// Column-major flat storage: `cols[col * $n + row]`.
            cols: [f32; $n * $n],
        }

        impl $name {
            pub fn zero() -> Self {
                $name { cols: [0.0; $n * $n] }
            }

            pub fn identity() -> Self {
                let mut m = Self::zero();
                for i in 0..$n {
                    m.set(i, i, 1.0);
                }
                m
            }

            #[inline]
            pub fn get(&self, row: usize, col: usize) -> f32 {
                self.cols[col * $n + row]
            }

            #[inline]
            pub fn set(&mut self, row: usize, col: usize, v: f32) {
                self.cols[col * $n + row] = v;
            }

            pub fn equals(&self, other: &Self) -> bool {
                self.cols.iter().zip(other.cols.iter()).all(|(a, b)| float_eq(*a, *b))
            }

            pub fn transpose(&self) -> Self {
                let mut out = Self::zero();
                for r in 0..$n {
                    for c in 0..$n {
                        out.set(c, r, self.get(r, c));
                    }
                }
                out
            }

            pub fn multiply(&self, other: &Self) -> Self {
                let mut out = Self::zero();
                for c in 0..$n {
                    for r in 0..$n {
                        let mut sum = 0.0;
                        for k in 0..$n {
                            sum += self.get(r, k) * other.get(k, c);
                        }
                        out.set(r, c, sum);
                    }
                }
                out
            }
        }

        impl Mul for $name {
            type Output = Self;
            fn mul(self, rhs: Self) -> Self {
                self.multiply(&rhs)
            }
        }

        impl Index<(usize, usize)> for $name {
            type Output = f32;
            fn index(&self, (row, col): (usize, usize)) -> &f32 {
                &self.cols[col * $n + row]
            }
        }

        impl IndexMut<(usize, usize)> for $name {
            fn index_mut(&mut self, (row, col): (usize, usize)) -> &mut f32 {
                &mut self.cols[col * $n + row]
            }
        }
    };
}

impl_matrix!(Mat2, 2);
impl_matrix!(Mat3, 3);
impl_matrix!(Mat4, 4);

impl Mat2 {
    pub fn determinant(&self) -> f32 {
        self.get(0, 0) * self.get(1, 1) - self.get(0, 1) * self.get(1, 0)
    }

    /// Cofactor-expansion inverse. No-op (returns a copy) when `|det| < EPSILON`.
    pub fn inverse(&self) -> Self {
        let det = self.determinant();
        if det.abs() < EPSILON {
            return *self;
        }
        let inv_det = 1.0 / det;
        let mut out = Mat2::zero();
        out.set(0, 0, self.get(1, 1) * inv_det);
        out.set(0, 1, -self.get(0, 1) * inv_det);
        out.set(1, 0, -self.get(1, 0) * inv_det);
        out.set(1, 1, self.get(0, 0) * inv_det);
        out
    }

    pub fn mul_vec2(&self, v: &Vec2) -> Vec2 {
        Vec2::new(
            self.get(0, 0) * v.x + self.get(0, 1) * v.y,
            self.get(1, 0) * v.x + self.get(1, 1) * v.y,
        )
    }
}

impl Mat3 {
    fn minor(&self, skip_row: usize, skip_col: usize) -> Mat2 {
        let mut out = Mat2::zero();
        let mut oc = 0;
        for c in 0..3 {
            if c == skip_col {
                continue;
            }
            let mut or = 0;
            for r in 0..3 {
                if r == skip_row {
                    continue;
                }
                out.set(or, oc, self.get(r, c));
                or += 1;
            }
            oc += 1;
        }
        out
    }

    pub fn cofactor(&self, row: usize, col: usize) -> f32 {
        let sign = if (row + col) % 2 == 0 { 1.0 } else { -1.0 };
        sign * self.minor(row, col).determinant()
    }

    pub fn determinant(&self) -> f32 {
        (0..3).map(|c| self.get(0, c) * self.cofactor(0, c)).sum()
    }

    /// Cofactor-expansion inverse. No-op (returns a copy) when `|det| < EPSILON`.
    pub fn inverse(&self) -> Self {
        let det = self.determinant();
        if det.abs() < EPSILON {
            return *self;
        }
        let inv_det = 1.0 / det;
        let mut adjugate = Mat3::zero();
        for r in 0..3 {
            for c in 0..3 {
                // adjugate is the transpose of the cofactor matrix
                adjugate.set(c, r, self.cofactor(r, c));
            }
        }
        for v in adjugate.cols.iter_mut() {
            *v *= inv_det;
        }
        adjugate
    }

    pub fn mul_vec3(&self, v: &Vec3) -> Vec3 {
        Vec3::new(
            self.get(0, 0) * v.x + self.get(0, 1) * v.y + self.get(0, 2) * v.z,
            self.get(1, 0) * v.x + self.get(1, 1) * v.y + self.get(1, 2) * v.z,
            self.get(2, 0) * v.x + self.get(2, 1) * v.y + self.get(2, 2) * v.z,
        )
    }

    pub fn from_mat4_upper(m: &Mat4) -> Self {
        let mut out = Mat3::zero();
        for r in 0..3 {
            for c in 0..3 {
                out.set(r, c, m.get(r, c));
            }
        }
        out
    }
}

impl Mat4 {
    fn minor(&self, skip_row: usize, skip_col: usize) -> Mat3 {
        let mut out = Mat3::zero();
        let mut oc = 0;
        for c in 0..4 {
            if c == skip_col {
                continue;
            }
            let mut or = 0;
            for r in 0..4 {
                if r == skip_row {
                    continue;
                }
                out.set(or, oc, self.get(r, c));
                or += 1;
            }
            oc += 1;
        }
        out
    }

    pub fn cofactor(&self, row: usize, col: usize) -> f32 {
        let sign = if (row + col) % 2 == 0 { 1.0 } else { -1.0 };
        sign * self.minor(row, col).determinant()
    }

    pub fn determinant(&self) -> f32 {
        (0..4).map(|c| self.get(0, c) * self.cofactor(0, c)).sum()
    }

    /// Cofactor-expansion inverse. No-op (returns a copy, per `spec.md` §4.1 /
    /// §7(e)) when `|det| < EPSILON` — the matrix remains usable rather than
    /// raising an error.
    pub fn inverse(&self) -> Self {
        let det = self.determinant();
        if det.abs() < EPSILON {
            return *self;
        }
        let inv_det = 1.0 / det;
        let mut adjugate = Mat4::zero();
        for r in 0..4 {
            for c in 0..4 {
                adjugate.set(c, r, self.cofactor(r, c));
            }
        }
        for v in adjugate.cols.iter_mut() {
            *v *= inv_det;
        }
        adjugate
    }

    pub fn mul_vec4(&self, v: &Vec4) -> Vec4 {
        Vec4::new(
            self.get(0, 0) * v.x + self.get(0, 1) * v.y + self.get(0, 2) * v.z + self.get(0, 3) * v.w,
            self.get(1, 0) * v.x + self.get(1, 1) * v.y + self.get(1, 2) * v.z + self.get(1, 3) * v.w,
            self.get(2, 0) * v.x + self.get(2, 1) * v.y + self.get(2, 2) * v.z + self.get(2, 3) * v.w,
            self.get(3, 0) * v.x + self.get(3, 1) * v.y + self.get(3, 2) * v.z + self.get(3, 3) * v.w,
        )
    }

    /// Transforms a point (implicit `w = 1`) and returns the `xyz` part.
    pub fn transform_point(&self, v: &Vec3) -> Vec3 {
        self.mul_vec4(&v.to_vec4(1.0)).xyz()
    }

    /// Transforms a direction (implicit `w = 0`) and returns the `xyz` part.
    pub fn transform_direction(&self, v: &Vec3) -> Vec3 {
        self.mul_vec4(&v.to_vec4(0.0)).xyz()
    }

    pub fn translation(t: &Vec3) -> Self {
        let mut m = Mat4::identity();
        m.set(0, 3, t.x);
        m.set(1, 3, t.y);
        m.set(2, 3, t.z);
        m
    }

    pub fn scale(s: &Vec3) -> Self {
        let mut m = Mat4::identity();
        m.set(0, 0, s.x);
        m.set(1, 1, s.y);
        m.set(2, 2, s.z);
        m
    }

    /// Rodrigues' rotation matrix about `axis` (need not be unit; zero-length
    /// axis yields identity) by `angle_rad` radians.
    pub fn rotation(axis: &Vec3, angle_rad: f32) -> Self {
        let axis = axis.normalize();
        if axis.length_squared() <= EPSILON {
            return Mat4::identity();
        }
        let (s, c) = angle_rad.sin_cos();
        let t = 1.0 - c;
        let (x, y, z) = (axis.x, axis.y, axis.z);

        let mut m = Mat4::identity();
        m.set(0, 0, t * x * x + c);
        m.set(0, 1, t * x * y - s * z);
        m.set(0, 2, t * x * z + s * y);

        m.set(1, 0, t * x * y + s * z);
        m.set(1, 1, t * y * y + c);
        m.set(1, 2, t * y * z - s * x);

        m.set(2, 0, t * x * z - s * y);
        m.set(2, 1, t * y * z + s * x);
        m.set(2, 2, t * z * z + c);
        m
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identity_times_inverse_is_identity() {
        let m = Mat4::translation(&Vec3::new(1.0, 2.0, 3.0));
        let inv = m.inverse();
        let product = m.multiply(&inv);
        assert!(product.equals(&Mat4::identity()));
    }

    #[test]
    fn rotation_is_orthonormal() {
        let r = Mat4::rotation(&Vec3::new(0.0, 1.0, 0.0), 0.7);
        let rt = r.transpose();
        assert!(r.multiply(&rt).equals(&Mat4::identity()));
        assert!(float_eq(r.determinant(), 1.0));
    }

    #[test]
    fn singular_inverse_is_noop() {
        let singular = Mat4::zero();
        let inv = singular.inverse();
        assert!(inv.equals(&singular));
    }

    #[test]
    fn translation_transforms_point() {
        let m = Mat4::translation(&Vec3::new(1.0, 2.0, 3.0));
        let p = m.transform_point(&Vec3::new(0.0, 0.0, 0.0));
        assert!(p.equals(&Vec3::new(1.0, 2.0, 3.0)));
        let d = m.transform_direction(&Vec3::new(1.0, 0.0, 0.0));
        assert!(d.equals(&Vec3::new(1.0, 0.0, 0.0)));
    }
}
