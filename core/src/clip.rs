//! Triangle-vs-plane clipping (`spec.md` component E, §4.4): the near/far
//! passes that keep the rasterizer from having to reason about vertices
//! behind the eye or beyond the far plane.

use crate::math::Vec3;
use crate::vao::{Vertex, VertexAttrs};

/// Signed distance from `p` to the plane through `point` with outward normal
/// `normal`. Positive means `p` is on the side the normal points to (inside).
fn signed_distance(p: Vec3, point: Vec3, normal: Vec3) -> f32 {
    (p - point).dot(&normal)
}

fn intersect(a: &Vertex, b: &Vertex, point: Vec3, normal: Vec3) -> Vertex {
    let da = signed_distance(a.position, point, normal);
    let db = signed_distance(b.position, point, normal);
    let t = da / (da - db);
    let position = Vec3::lerp(&a.position, &b.position, t);
    let attrs = VertexAttrs::lerp(&a.attrs, &b.attrs, t);
    Vertex::new(position, attrs)
}

fn zero_vertex() -> Vertex {
    Vertex::new(Vec3::zero(), VertexAttrs::Position)
}

/// Up to two output triangles from clipping one input triangle against one
/// plane (`spec.md` §4.4 edge cases: 0, 1, or 2 triangles survive).
pub struct ClippedTriangles {
    pub triangles: [[Vertex; 3]; 2],
    pub count: usize,
}

impl ClippedTriangles {
    fn none() -> Self {
        ClippedTriangles { triangles: [[zero_vertex(); 3]; 2], count: 0 }
    }
    fn one(tri: [Vertex; 3]) -> Self {
        let mut triangles = [[zero_vertex(); 3]; 2];
        triangles[0] = tri;
        ClippedTriangles { triangles, count: 1 }
    }
    fn two(a: [Vertex; 3], b: [Vertex; 3]) -> Self {
        ClippedTriangles { triangles: [a, b], count: 2 }
    }

    pub fn as_slice(&self) -> &[[Vertex; 3]] {
        &self.triangles[..self.count]
    }
}

/// Clips a single triangle against one plane, producing 0, 1, or 2 triangles.
pub fn clip_against_plane(tri: [Vertex; 3], point_on_plane: Vec3, plane_normal: Vec3) -> ClippedTriangles {
    let dist = tri.map(|v| signed_distance(v.position, point_on_plane, plane_normal));
    let inside: [bool; 3] = [dist[0] >= 0.0, dist[1] >= 0.0, dist[2] >= 0.0];
    let inside_count = inside.iter().filter(|i| **i).count();

    match inside_count {
        0 => ClippedTriangles::none(),
        3 => ClippedTriangles::one(tri),
        1 => {
            let i = inside.iter().position(|i| *i).unwrap();
            let a = tri[i];
            let b = tri[(i + 1) % 3];
            let c = tri[(i + 2) % 3];
            let ab = intersect(&a, &b, point_on_plane, plane_normal);
            let ac = intersect(&a, &c, point_on_plane, plane_normal);
            ClippedTriangles::one([a, ab, ac])
        }
        2 => {
            let i = inside.iter().position(|i| !*i).unwrap();
            let outside = tri[i];
            let a = tri[(i + 1) % 3];
            let b = tri[(i + 2) % 3];
            let ao = intersect(&a, &outside, point_on_plane, plane_normal);
            let bo = intersect(&b, &outside, point_on_plane, plane_normal);
            ClippedTriangles::two([a, b, bo], [a, bo, ao])
        }
        _ => unreachable!(),
    }
}

/// Clips a triangle against the near plane and then the far plane, in
/// sequence. Up to four triangles result (`spec.md` §4.4: near and far
/// passes compose).
pub fn clip_near_far(
    tri: [Vertex; 3],
    near_point: Vec3,
    near_normal: Vec3,
    far_point: Vec3,
    far_normal: Vec3,
) -> Vec<[Vertex; 3]> {
    let mut out = Vec::with_capacity(4);
    let after_near = clip_against_plane(tri, near_point, near_normal);
    for t in after_near.as_slice() {
        let after_far = clip_against_plane(*t, far_point, far_normal);
        out.extend_from_slice(after_far.as_slice());
    }
    out
}

/// Clips a line segment against one plane. `None` if fully outside;
/// otherwise the (possibly shortened) segment.
fn clip_segment_against_plane(a: Vertex, b: Vertex, point: Vec3, normal: Vec3) -> Option<(Vertex, Vertex)> {
    let da = signed_distance(a.position, point, normal);
    let db = signed_distance(b.position, point, normal);
    match (da >= 0.0, db >= 0.0) {
        (true, true) => Some((a, b)),
        (false, false) => None,
        (true, false) => Some((a, intersect(&a, &b, point, normal))),
        (false, true) => Some((intersect(&a, &b, point, normal), b)),
    }
}

/// Clips a line segment against the near plane and then the far plane.
pub fn clip_segment_near_far(
    a: Vertex,
    b: Vertex,
    near_point: Vec3,
    near_normal: Vec3,
    far_point: Vec3,
    far_normal: Vec3,
) -> Option<(Vertex, Vertex)> {
    let (a, b) = clip_segment_against_plane(a, b, near_point, near_normal)?;
    clip_segment_against_plane(a, b, far_point, far_normal)
}

/// A point's near/far visibility test (`spec.md` §4.4): points aren't
/// clipped, only trivially accepted or rejected.
pub fn point_visible(p: Vec3, near_point: Vec3, near_normal: Vec3, far_point: Vec3, far_normal: Vec3) -> bool {
    signed_distance(p, near_point, near_normal) >= 0.0 && signed_distance(p, far_point, far_normal) >= 0.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::math::Vec4;

    fn v(x: f32, y: f32, z: f32) -> Vertex {
        Vertex::new(Vec3::new(x, y, z), VertexAttrs::PositionColor { color: Vec4::new(1.0, 1.0, 1.0, 1.0) })
    }

    #[test]
    fn all_inside_is_unchanged() {
        let tri = [v(0.0, 0.0, -2.0), v(1.0, 0.0, -2.0), v(0.0, 1.0, -2.0)];
        let out = clip_against_plane(tri, Vec3::new(0.0, 0.0, -1.0), Vec3::new(0.0, 0.0, -1.0));
        assert_eq!(out.count, 1);
    }

    #[test]
    fn all_outside_is_empty() {
        let tri = [v(0.0, 0.0, -0.5), v(1.0, 0.0, -0.5), v(0.0, 1.0, -0.5)];
        let out = clip_against_plane(tri, Vec3::new(0.0, 0.0, -1.0), Vec3::new(0.0, 0.0, -1.0));
        assert_eq!(out.count, 0);
    }

    #[test]
    fn one_inside_produces_one_triangle() {
        let tri = [v(0.0, 0.0, -2.0), v(3.0, 0.0, 0.5), v(0.0, 3.0, 0.5)];
        let out = clip_against_plane(tri, Vec3::new(0.0, 0.0, -1.0), Vec3::new(0.0, 0.0, -1.0));
        assert_eq!(out.count, 1);
    }

    #[test]
    fn two_inside_produces_two_triangles() {
        let tri = [v(0.0, 0.0, -2.0), v(1.0, 0.0, -2.0), v(0.0, 1.0, 0.5)];
        let out = clip_against_plane(tri, Vec3::new(0.0, 0.0, -1.0), Vec3::new(0.0, 0.0, -1.0));
        assert_eq!(out.count, 2);
    }

    #[test]
    fn near_far_compose_to_at_most_four() {
        let tri = [v(-5.0, 0.0, -0.5), v(5.0, 0.0, -0.5), v(0.0, 5.0, -200.0)];
        let out = clip_near_far(
            tri,
            Vec3::new(0.0, 0.0, -1.0),
            Vec3::new(0.0, 0.0, -1.0),
            Vec3::new(0.0, 0.0, -100.0),
            Vec3::new(0.0, 0.0, 1.0),
        );
        assert!(out.len() <= 4);
    }

    #[test]
    fn segment_straddling_near_plane_is_shortened() {
        let a = v(0.0, 0.0, -0.5);
        let b = v(0.0, 0.0, -2.0);
        let (a2, b2) = clip_segment_against_plane(a, b, Vec3::new(0.0, 0.0, -1.0), Vec3::new(0.0, 0.0, -1.0)).unwrap();
        assert!((a2.position.z - (-1.0)).abs() < 1e-5);
        assert!((b2.position.z - (-2.0)).abs() < 1e-5);
    }

    #[test]
    fn segment_fully_outside_is_none() {
        let a = v(0.0, 0.0, -0.1);
        let b = v(0.0, 0.0, -0.5);
        assert!(clip_segment_against_plane(a, b, Vec3::new(0.0, 0.0, -1.0), Vec3::new(0.0, 0.0, -1.0)).is_none());
    }

    #[test]
    fn point_visible_checks_both_planes() {
        let near = (Vec3::new(0.0, 0.0, -1.0), Vec3::new(0.0, 0.0, -1.0));
        let far = (Vec3::new(0.0, 0.0, -100.0), Vec3::new(0.0, 0.0, 1.0));
        assert!(point_visible(Vec3::new(0.0, 0.0, -5.0), near.0, near.1, far.0, far.1));
        assert!(!point_visible(Vec3::new(0.0, 0.0, -0.5), near.0, near.1, far.0, far.1));
        assert!(!point_visible(Vec3::new(0.0, 0.0, -200.0), near.0, near.1, far.0, far.1));
    }
}
