//! Quaternion algebra, stored as `(w, x, y, z)`.
//!
//! `spec.md` §3: "Unit-length invariant is not enforced at construction;
//! normalization is an explicit operation." §4.1 requires construction from
//! axis-angle, conjugate, and multiplication; we add `normalize`/`magnitude`/
//! `to_mat4` because `rotate()`'s normal-matrix regeneration and general
//! usability need them (see `DESIGN.md` for the Open Question resolution on
//! what else from `original_source/src/quat.h` was left out).

use super::approx_eq::EPSILON;
use super::matrix::Mat4;
use super::vector::Vec3;
use std::ops::Mul;

#[derive(Debug, Clone, Copy)]
pub struct Quaternion {
    pub w: f32,
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl Quaternion {
    pub fn identity() -> Self {
        Quaternion { w: 1.0, x: 0.0, y: 0.0, z: 0.0 }
    }

    pub fn from_axis_angle(axis: &Vec3, angle_rad: f32) -> Self {
        let axis = axis.normalize();
        if axis.length_squared() <= EPSILON {
            return Self::identity();
        }
        let half = angle_rad * 0.5;
        let (s, c) = half.sin_cos();
        Quaternion { w: c, x: axis.x * s, y: axis.y * s, z: axis.z * s }
    }

    pub fn conjugate(&self) -> Self {
        Quaternion { w: self.w, x: -self.x, y: -self.y, z: -self.z }
    }

    pub fn magnitude(&self) -> f32 {
        (self.w * self.w + self.x * self.x + self.y * self.y + self.z * self.z).sqrt()
    }

    /// No-op on (near) zero magnitude.
    pub fn normalize(&self) -> Self {
        let mag = self.magnitude();
        if mag <= EPSILON {
            return *self;
        }
        let inv = 1.0 / mag;
        Quaternion { w: self.w * inv, x: self.x * inv, y: self.y * inv, z: self.z * inv }
    }

    pub fn multiply(&self, rhs: &Self) -> Self {
        Quaternion {
            w: self.w * rhs.w - self.x * rhs.x - self.y * rhs.y - self.z * rhs.z,
            x: self.w * rhs.x + self.x * rhs.w + self.y * rhs.z - self.z * rhs.y,
            y: self.w * rhs.y - self.x * rhs.z + self.y * rhs.w + self.z * rhs.x,
            z: self.w * rhs.z + self.x * rhs.y - self.y * rhs.x + self.z * rhs.w,
        }
    }

    /// Converts to the equivalent rotation matrix. `self` is normalized first.
    pub fn to_mat4(&self) -> Mat4 {
        let q = self.normalize();
        let (w, x, y, z) = (q.w, q.x, q.y, q.z);

        let xx = 2.0 * x * x;
        let yy = 2.0 * y * y;
        let zz = 2.0 * z * z;
        let xy = 2.0 * x * y;
        let xz = 2.0 * x * z;
        let yz = 2.0 * y * z;
        let wx = 2.0 * w * x;
        let wy = 2.0 * w * y;
        let wz = 2.0 * w * z;

        let mut m = Mat4::identity();
        m.set(0, 0, 1.0 - yy - zz);
        m.set(0, 1, xy - wz);
        m.set(0, 2, xz + wy);

        m.set(1, 0, xy + wz);
        m.set(1, 1, 1.0 - xx - zz);
        m.set(1, 2, yz - wx);

        m.set(2, 0, xz - wy);
        m.set(2, 1, yz + wx);
        m.set(2, 2, 1.0 - xx - yy);
        m
    }
}

impl Mul for Quaternion {
    type Output = Quaternion;
    fn mul(self, rhs: Self) -> Self {
        self.multiply(&rhs)
    }
}
