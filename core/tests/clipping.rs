//! End-to-end clipping scenario: a triangle straddling the near plane must
//! still rasterize the portion that survives, not vanish or panic.

use std::sync::{Arc, Mutex};

use cursedgl::config::{Config, GlyphTileMode};
use cursedgl::framebuffer::{FramebufferSide, COLOR_BIT, DEPTH_BIT};
use cursedgl::math::{Vec3, Vec4};
use cursedgl::shade::ShadeModel;
use cursedgl::terminal::TerminalPlane;
use cursedgl::transform::MatrixMode;
use cursedgl::vao::{Vertex, VertexAttrs};
use cursedgl::Context;

struct NullPlane {
    dims: (u32, u32),
}

impl TerminalPlane for NullPlane {
    fn dims(&self) -> (u32, u32) {
        self.dims
    }
    fn blit_rgba(&mut self, _: &[u8], _: usize, _: GlyphTileMode, _: u32, _: u32) {}
    fn render(&mut self) {}
    fn refresh(&mut self) {}
}

fn new_context() -> Context {
    let mut ctx = Context::new(Config::default());
    let plane = Arc::new(Mutex::new(NullPlane { dims: (16, 16) }));
    ctx.init(plane).unwrap();
    ctx.viewport(16, 16);
    ctx.swap().unwrap();
    ctx
}

#[test]
fn triangle_straddling_near_plane_still_draws() {
    let mut ctx = new_context();
    ctx.shade_model(ShadeModel::Unlit);
    ctx.set_near_far(1.0, 100.0);
    ctx.matrix_mode(MatrixMode::Projection);
    ctx.ortho(4.0, 4.0, 1.0, 100.0);
    ctx.matrix_mode(MatrixMode::ModelView);
    ctx.load_identity();
    ctx.clear_color(0.0, 0.0, 0.0, 1.0);
    ctx.clear(COLOR_BIT | DEPTH_BIT);

    // One vertex sits in front of the near plane (z = -0.5, near = 1.0), the
    // other two are comfortably behind it — the clipper must produce the
    // surviving two-triangle fan rather than drop the primitive entirely.
    let blue = VertexAttrs::PositionColor { color: Vec4::new(0.0, 0.0, 1.0, 1.0) };
    ctx.draw_triangle(
        Vertex::new(Vec3::new(0.0, 0.0, -0.5), blue),
        Vertex::new(Vec3::new(-2.0, -2.0, -4.0), blue),
        Vertex::new(Vec3::new(2.0, -2.0, -4.0), blue),
    );

    let (w, h) = ctx.framebuffer.effective_dims();
    let mut any_lit = false;
    for row in 0..h {
        for col in 0..w {
            let pixel = ctx.framebuffer.get_pixel(row, col, FramebufferSide::Back, &ctx.messages).unwrap();
            if pixel.color.z > 0.5 {
                any_lit = true;
            }
        }
    }
    assert!(any_lit, "clipped remainder of the straddling triangle should still rasterize");
    ctx.free().unwrap();
}

#[test]
fn triangle_entirely_behind_near_plane_is_dropped() {
    let mut ctx = new_context();
    ctx.shade_model(ShadeModel::Unlit);
    ctx.set_near_far(1.0, 100.0);
    ctx.matrix_mode(MatrixMode::Projection);
    ctx.ortho(4.0, 4.0, 1.0, 100.0);
    ctx.matrix_mode(MatrixMode::ModelView);
    ctx.load_identity();
    ctx.clear_color(0.0, 0.0, 0.0, 1.0);
    ctx.clear(COLOR_BIT | DEPTH_BIT);

    let blue = VertexAttrs::PositionColor { color: Vec4::new(0.0, 0.0, 1.0, 1.0) };
    ctx.draw_triangle(
        Vertex::new(Vec3::new(0.0, 0.0, -0.2), blue),
        Vertex::new(Vec3::new(-1.0, -1.0, -0.2), blue),
        Vertex::new(Vec3::new(1.0, -1.0, -0.2), blue),
    );

    let (w, h) = ctx.framebuffer.effective_dims();
    let center = ctx.framebuffer.get_pixel(h / 2, w / 2, FramebufferSide::Back, &ctx.messages).unwrap();
    assert!(center.color.z < 0.5, "triangle entirely nearer than the near plane must not draw");
    ctx.free().unwrap();
}
