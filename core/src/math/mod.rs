//! The math kernel (`spec.md` component A): vectors, matrices, quaternions,
//! and epsilon-float comparison.

pub mod approx_eq;
pub mod matrix;
pub mod quaternion;
pub mod vector;

pub use approx_eq::{float_eq, within, EPSILON};
pub use matrix::{Mat2, Mat3, Mat4};
pub use quaternion::Quaternion;
pub use vector::{Vec2, Vec3, Vec4};
