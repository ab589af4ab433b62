//! Rasterization (`spec.md` component F, §4.5): window-space transform,
//! edge-function coverage testing, perspective-correct attribute
//! interpolation, and face culling.

use crate::math::{within, Mat4, Vec2, Vec3};
use crate::vao::{Vertex, VertexAttrs};

/// Tolerance (in pixels) for the line rasterizer's point-to-segment test
/// (`spec.md` §4.5).
pub const LINE_BIAS: f32 = 0.5;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Winding {
    Clockwise,
    CounterClockwise,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CullFace {
    Front,
    Back,
}

/// A vertex after the model-view-projection transform and perspective
/// divide: window-space `x, y`, depth in `[0, 1]`, and `1/w_clip` retained
/// for perspective-correct interpolation.
#[derive(Debug, Clone, Copy)]
pub struct WindowVertex {
    pub x: f32,
    pub y: f32,
    pub depth: f32,
    pub inv_w: f32,
    pub eye_position: Vec3,
    pub attrs: VertexAttrs,
}

/// Transforms a vertex through `mvp`, performs the perspective divide, and
/// maps NDC to window coordinates. `y` is flipped so NDC `+1` lands on the
/// topmost row (`spec.md` §4.5: "window-space `y` is flipped relative to
/// NDC"). `depth` is remapped from `[-1, 1]` to `[0, 1]`. `vertex.position`
/// is expected to already be in eye space (the caller applies `mvp` as the
/// projection matrix alone); the untransformed position is carried through
/// as `eye_position` for per-fragment lighting.
pub fn to_window(vertex: &Vertex, mvp: &Mat4, width: u32, height: u32) -> WindowVertex {
    let clip = *mvp * vertex.position.to_vec4(1.0);
    let inv_w = if clip.w.abs() > crate::math::EPSILON { -1.0 / clip.w } else { 0.0 };
    let ndc = clip.perspective_divide();
    let x = (ndc.x * 0.5 + 0.5) * width as f32;
    let y = (1.0 - (ndc.y * 0.5 + 0.5)) * height as f32;
    let depth = ndc.z * 0.5 + 0.5;
    WindowVertex { x, y, depth, inv_w, eye_position: vertex.position, attrs: vertex.attrs }
}

fn edge_function(a: Vec2, b: Vec2, c: Vec2) -> f32 {
    (c.x - a.x) * (b.y - a.y) - (c.y - a.y) * (b.x - a.x)
}

/// The signed area of the triangle in window space; its sign gives the
/// winding order. Degenerate (near-zero area) triangles report `None`
/// (`spec.md` §4.5 edge case: zero-area triangles are skipped).
pub fn winding(v0: &WindowVertex, v1: &WindowVertex, v2: &WindowVertex) -> Option<Winding> {
    let area = edge_function(Vec2::new(v0.x, v0.y), Vec2::new(v1.x, v1.y), Vec2::new(v2.x, v2.y));
    if area.abs() <= crate::math::EPSILON {
        None
    } else if area > 0.0 {
        Some(Winding::CounterClockwise)
    } else {
        Some(Winding::Clockwise)
    }
}

/// Whether a triangle of the given winding should be discarded under the
/// active cull face (`spec.md` §4.5: front faces wind counter-clockwise).
pub fn is_culled(w: Winding, cull_face: CullFace) -> bool {
    match (w, cull_face) {
        (Winding::CounterClockwise, CullFace::Front) => true,
        (Winding::Clockwise, CullFace::Back) => true,
        _ => false,
    }
}

/// A single rasterized fragment: its pixel coordinates, interpolated depth,
/// and interpolated vertex attributes.
pub struct Fragment {
    pub row: u32,
    pub col: u32,
    pub depth: f32,
    pub eye_position: Vec3,
    pub attrs: VertexAttrs,
}

/// Rasterizes one triangle, invoking `emit` for every covered pixel
/// (`spec.md` §4.5). Uses edge functions for the coverage test and
/// perspective-correct barycentric weights (`z^-1_k = -1/w_clip_k`) for
/// attribute interpolation.
pub fn rasterize_triangle(
    v0: &WindowVertex,
    v1: &WindowVertex,
    v2: &WindowVertex,
    width: u32,
    height: u32,
    mut emit: impl FnMut(Fragment),
) {
    let p0 = Vec2::new(v0.x, v0.y);
    let p1 = Vec2::new(v1.x, v1.y);
    let p2 = Vec2::new(v2.x, v2.y);
    let area = edge_function(p0, p1, p2);
    if area.abs() <= crate::math::EPSILON {
        return;
    }

    let min_x = p0.x.min(p1.x).min(p2.x).floor().max(0.0) as u32;
    let max_x = p0.x.max(p1.x).max(p2.x).ceil().min(width as f32) as u32;
    let min_y = p0.y.min(p1.y).min(p2.y).floor().max(0.0) as u32;
    let max_y = p0.y.max(p1.y).max(p2.y).ceil().min(height as f32) as u32;

    for row in min_y..max_y {
        for col in min_x..max_x {
            let p = Vec2::new(col as f32 + 0.5, row as f32 + 0.5);
            let w0 = edge_function(p1, p2, p) / area;
            let w1 = edge_function(p2, p0, p) / area;
            let w2 = edge_function(p0, p1, p) / area;
            if w0 < 0.0 || w1 < 0.0 || w2 < 0.0 {
                continue;
            }

            let depth = w0 * v0.depth + w1 * v1.depth + w2 * v2.depth;

            // Perspective-correct weights: barycentric * (1/w_clip), renormalized.
            let iw0 = w0 * v0.inv_w;
            let iw1 = w1 * v1.inv_w;
            let iw2 = w2 * v2.inv_w;
            let attrs = VertexAttrs::weighted([(&v0.attrs, iw0), (&v1.attrs, iw1), (&v2.attrs, iw2)]);

            let wsum = iw0 + iw1 + iw2;
            let wsum = if wsum.abs() <= crate::math::EPSILON { 1.0 } else { wsum };
            let eye_position = (v0.eye_position * iw0 + v1.eye_position * iw1 + v2.eye_position * iw2) / wsum;

            emit(Fragment { row, col, depth, eye_position, attrs });
        }
    }
}

/// Rasterizes a line segment as the set of pixels within `LINE_BIAS` of the
/// segment, clamped to its endpoints (`spec.md` §4.5).
pub fn rasterize_line(v0: &WindowVertex, v1: &WindowVertex, width: u32, height: u32, mut emit: impl FnMut(Fragment)) {
    let p0 = Vec2::new(v0.x, v0.y);
    let p1 = Vec2::new(v1.x, v1.y);
    let dir = p1 - p0;
    let len_sq = dir.length_squared();

    let min_x = p0.x.min(p1.x).floor().max(0.0) as i64 - 1;
    let max_x = p0.x.max(p1.x).ceil().min(width as f32) as i64 + 1;
    let min_y = p0.y.min(p1.y).floor().max(0.0) as i64 - 1;
    let max_y = p0.y.max(p1.y).ceil().min(height as f32) as i64 + 1;

    for row in min_y.max(0)..max_y.min(height as i64) {
        for col in min_x.max(0)..max_x.min(width as i64) {
            let p = Vec2::new(col as f32 + 0.5, row as f32 + 0.5);
            let t = if len_sq <= crate::math::EPSILON { 0.0 } else { ((p - p0).dot(&dir) / len_sq).clamp(0.0, 1.0) };
            let closest = p0 + dir * t;
            let dist = (p - closest).length();
            if within(dist, 0.0, LINE_BIAS) {
                let depth = v0.depth + (v1.depth - v0.depth) * t;
                let attrs = VertexAttrs::lerp(&v0.attrs, &v1.attrs, t);
                let eye_position = Vec3::lerp(&v0.eye_position, &v1.eye_position, t);
                emit(Fragment { row: row as u32, col: col as u32, depth, eye_position, attrs });
            }
        }
    }
}

/// A single point, expanded to the nearest covered pixel (`spec.md` §4.5).
pub fn rasterize_point(v: &WindowVertex, width: u32, height: u32) -> Option<Fragment> {
    if v.x < 0.0 || v.y < 0.0 || v.x >= width as f32 || v.y >= height as f32 {
        return None;
    }
    Some(Fragment { row: v.y as u32, col: v.x as u32, depth: v.depth, eye_position: v.eye_position, attrs: v.attrs })
}
