//! VAO configuration and the per-vertex attribute record.
//!
//! `spec.md` §9 REDESIGN FLAGS: "VAO configuration as enum-plus-position-
//! based attribute slots is brittle. Re-architect as a tagged per-vertex
//! record (a variant whose arms enumerate exactly the supported attribute
//! combinations); the rasterizer matches on the tag once and dispatches to a
//! specialized inner loop." [`VertexAttrs`] is that record; [`VaoConfig`] is
//! the tag a caller declares once per draw call and is checked against the
//! shape of the vertices it submits.

use crate::math::{Vec2, Vec3, Vec4};

/// The closed set of attribute combinations a submitted vertex may carry
/// beyond position (`spec.md` §3).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VaoConfig {
    Position,
    PositionColor,
    PositionNormal,
    PositionTexCoord,
    PositionColorNormal,
    PositionColorTexCoord,
    PositionNormalTexCoord,
    PositionColorNormalTexCoord,
}

impl VaoConfig {
    /// Texcoord-bearing configurations are reserved (`spec.md` §3: texturing
    /// is a Non-goal) and produce an info-level message when used.
    pub fn is_texcoord_reserved(&self) -> bool {
        matches!(
            self,
            VaoConfig::PositionTexCoord
                | VaoConfig::PositionColorTexCoord
                | VaoConfig::PositionNormalTexCoord
                | VaoConfig::PositionColorNormalTexCoord
        )
    }
}

/// Per-vertex attributes beyond position, tagged by exactly which
/// combination is present.
#[derive(Debug, Clone, Copy)]
pub enum VertexAttrs {
    Position,
    PositionColor { color: Vec4 },
    PositionNormal { normal: Vec3 },
    PositionTexCoord { texcoord: Vec2 },
    PositionColorNormal { color: Vec4, normal: Vec3 },
    PositionColorTexCoord { color: Vec4, texcoord: Vec2 },
    PositionNormalTexCoord { normal: Vec3, texcoord: Vec2 },
    PositionColorNormalTexCoord { color: Vec4, normal: Vec3, texcoord: Vec2 },
}

impl VertexAttrs {
    pub fn config(&self) -> VaoConfig {
        match self {
            VertexAttrs::Position => VaoConfig::Position,
            VertexAttrs::PositionColor { .. } => VaoConfig::PositionColor,
            VertexAttrs::PositionNormal { .. } => VaoConfig::PositionNormal,
            VertexAttrs::PositionTexCoord { .. } => VaoConfig::PositionTexCoord,
            VertexAttrs::PositionColorNormal { .. } => VaoConfig::PositionColorNormal,
            VertexAttrs::PositionColorTexCoord { .. } => VaoConfig::PositionColorTexCoord,
            VertexAttrs::PositionNormalTexCoord { .. } => VaoConfig::PositionNormalTexCoord,
            VertexAttrs::PositionColorNormalTexCoord { .. } => VaoConfig::PositionColorNormalTexCoord,
        }
    }

    pub fn color(&self) -> Option<Vec4> {
        match self {
            VertexAttrs::PositionColor { color }
            | VertexAttrs::PositionColorNormal { color, .. }
            | VertexAttrs::PositionColorTexCoord { color, .. }
            | VertexAttrs::PositionColorNormalTexCoord { color, .. } => Some(*color),
            _ => None,
        }
    }

    pub fn normal(&self) -> Option<Vec3> {
        match self {
            VertexAttrs::PositionNormal { normal }
            | VertexAttrs::PositionColorNormal { normal, .. }
            | VertexAttrs::PositionNormalTexCoord { normal, .. }
            | VertexAttrs::PositionColorNormalTexCoord { normal, .. } => Some(*normal),
            _ => None,
        }
    }

    pub fn texcoord(&self) -> Option<Vec2> {
        match self {
            VertexAttrs::PositionTexCoord { texcoord }
            | VertexAttrs::PositionColorTexCoord { texcoord, .. }
            | VertexAttrs::PositionNormalTexCoord { texcoord, .. }
            | VertexAttrs::PositionColorNormalTexCoord { texcoord, .. } => Some(*texcoord),
            _ => None,
        }
    }

    fn rebuild(color: Option<Vec4>, normal: Option<Vec3>, texcoord: Option<Vec2>) -> Self {
        match (color, normal, texcoord) {
            (None, None, None) => VertexAttrs::Position,
            (Some(color), None, None) => VertexAttrs::PositionColor { color },
            (None, Some(normal), None) => VertexAttrs::PositionNormal { normal },
            (None, None, Some(texcoord)) => VertexAttrs::PositionTexCoord { texcoord },
            (Some(color), Some(normal), None) => VertexAttrs::PositionColorNormal { color, normal },
            (Some(color), None, Some(texcoord)) => VertexAttrs::PositionColorTexCoord { color, texcoord },
            (None, Some(normal), Some(texcoord)) => VertexAttrs::PositionNormalTexCoord { normal, texcoord },
            (Some(color), Some(normal), Some(texcoord)) => {
                VertexAttrs::PositionColorNormalTexCoord { color, normal, texcoord }
            }
        }
    }

    /// Linear interpolation, used by the clipper (`spec.md` §4.4) to build the
    /// attributes of a plane-intersection vertex. Both inputs must share a
    /// configuration; mismatched inputs fall back to `a`'s shape.
    pub fn lerp(a: &Self, b: &Self, t: f32) -> Self {
        let color = a.color().map(|ac| Vec4::lerp(&ac, &b.color().unwrap_or(ac), t));
        let normal = a.normal().map(|an| Vec3::lerp(&an, &b.normal().unwrap_or(an), t));
        let texcoord = a.texcoord().map(|at| Vec2::lerp(&at, &b.texcoord().unwrap_or(at), t));
        Self::rebuild(color, normal, texcoord)
    }

    /// Unweighted arithmetic mean of three vertex attribute sets, used for
    /// flat shading (`spec.md` §4.6, §9: centroid-barycentric mean).
    pub fn average(a: &Self, b: &Self, c: &Self) -> Self {
        let color = a.color().map(|ac| (ac + b.color().unwrap_or(ac) + c.color().unwrap_or(ac)) / 3.0);
        let normal = a.normal().map(|an| (an + b.normal().unwrap_or(an) + c.normal().unwrap_or(an)) / 3.0);
        let texcoord =
            a.texcoord().map(|at| (at + b.texcoord().unwrap_or(at) + c.texcoord().unwrap_or(at)) / 3.0);
        Self::rebuild(color, normal, texcoord)
    }

    /// Perspective-correct weighted combination: `sum(w_k * A_k) / sum(w_k)`
    /// where `w_k` already folds in the reciprocal-w term (`spec.md` §4.5).
    pub fn weighted(parts: [(&Self, f32); 3]) -> Self {
        let wsum: f32 = parts.iter().map(|(_, w)| *w).sum();
        let wsum = if wsum.abs() <= crate::math::EPSILON { 1.0 } else { wsum };

        let color = parts[0].0.color().map(|base| {
            let sum: Vec4 = parts.iter().fold(Vec4::zero(), |acc, (a, w)| acc + a.color().unwrap_or(base) * *w);
            sum / wsum
        });
        let normal = parts[0].0.normal().map(|base| {
            let sum: Vec3 = parts.iter().fold(Vec3::zero(), |acc, (a, w)| acc + a.normal().unwrap_or(base) * *w);
            sum / wsum
        });
        let texcoord = parts[0].0.texcoord().map(|base| {
            let sum: Vec2 = parts.iter().fold(Vec2::zero(), |acc, (a, w)| acc + a.texcoord().unwrap_or(base) * *w);
            sum / wsum
        });
        Self::rebuild(color, normal, texcoord)
    }
}

/// A vertex as submitted by the caller: world-space position plus whichever
/// attributes its `VaoConfig` carries.
#[derive(Debug, Clone, Copy)]
pub struct Vertex {
    pub position: Vec3,
    pub attrs: VertexAttrs,
}

impl Vertex {
    pub fn new(position: Vec3, attrs: VertexAttrs) -> Self {
        Vertex { position, attrs }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lerp_endpoints_recover_inputs() {
        let a = VertexAttrs::PositionColor { color: Vec4::new(1.0, 0.0, 0.0, 1.0) };
        let b = VertexAttrs::PositionColor { color: Vec4::new(0.0, 1.0, 0.0, 1.0) };
        let mid = VertexAttrs::lerp(&a, &b, 0.5);
        assert_eq!(mid.color().unwrap(), Vec4::new(0.5, 0.5, 0.0, 1.0));
    }

    #[test]
    fn average_of_identical_normals_is_identical() {
        let n = Vec3::new(0.0, 1.0, 0.0);
        let a = VertexAttrs::PositionNormal { normal: n };
        let avg = VertexAttrs::average(&a, &a, &a);
        assert!(avg.normal().unwrap().equals(&n));
    }
}
