//! The opaque pipeline context (`spec.md` §9 Design Notes: "a single struct
//! owns the transform state, the light/material registry, and the
//! framebuffer; the public API is a set of methods on it, mirroring
//! OpenGL-1.x immediate mode"). This is the crate's main entry point.

use std::sync::{Arc, Mutex};

use crate::clip;
use crate::config::Config;
use crate::error::Result;
use crate::framebuffer::{DepthFunc, Framebuffer, FramebufferSide, Pixel};
use crate::material::{DirectionalLight, LightKind, LightRegistry, Material, PointLight, SpotLight};
use crate::math::{Mat4, Vec3, Vec4};
use crate::message::MessageBus;
use crate::raster::{self, CullFace, WindowVertex};
use crate::shade::{self, ShadeModel};
use crate::terminal::TerminalPlane;
use crate::transform::{MatrixMode, TransformState};
use crate::vao::{Vertex, VertexAttrs};

pub struct Context {
    pub transform: TransformState,
    pub lights: LightRegistry,
    pub material: Material,
    pub framebuffer: Framebuffer,
    pub messages: MessageBus,
    shade_model: ShadeModel,
    cull_face: CullFace,
    near: f32,
    far: f32,
    raster_color: Vec4,
}

impl Context {
    pub fn new(config: Config) -> Self {
        Context {
            transform: TransformState::new(config.width_multiplier),
            lights: LightRegistry::new(),
            material: Material::default(),
            framebuffer: Framebuffer::new(config.tile_mode),
            messages: MessageBus::new(),
            shade_model: ShadeModel::Smooth,
            cull_face: CullFace::Back,
            near: 0.1,
            far: 100.0,
            raster_color: Vec4::new(1.0, 1.0, 1.0, 1.0),
        }
    }

    pub fn init(&mut self, plane: Arc<Mutex<dyn TerminalPlane + Send>>) -> Result<()> {
        self.framebuffer.init(plane, &self.messages)
    }

    pub fn free(&mut self) -> Result<()> {
        self.framebuffer.free(&self.messages)
    }

    pub fn viewport(&mut self, width: u32, height: u32) {
        self.framebuffer.viewport(width, height);
    }

    pub fn swap(&mut self) -> Result<()> {
        self.framebuffer.swap(&self.messages)
    }

    pub fn set_near_far(&mut self, near: f32, far: f32) {
        self.near = near;
        self.far = far;
    }

    pub fn shade_model(&mut self, model: ShadeModel) {
        self.shade_model = model;
    }

    pub fn cull_face(&mut self, face: CullFace) {
        self.cull_face = face;
    }

    // --- Matrix stack API (spec.md §4.2) -----------------------------------

    pub fn matrix_mode(&mut self, mode: MatrixMode) {
        self.transform.matrix_mode(mode);
    }
    pub fn push_matrix(&mut self) -> bool {
        self.transform.push(&self.messages)
    }
    pub fn pop_matrix(&mut self) -> bool {
        self.transform.pop(&self.messages)
    }
    pub fn load_identity(&mut self) {
        self.transform.load_identity();
    }
    pub fn translate(&mut self, t: Vec3) {
        self.transform.translate(t);
    }
    pub fn rotate(&mut self, angle_rad: f32, axis: Vec3) {
        self.transform.rotate(angle_rad, axis);
    }
    pub fn scale(&mut self, s: Vec3) {
        self.transform.scale(s);
    }
    pub fn perspective(&mut self, fovy_rad: f32, aspect: f32, near: f32, far: f32) {
        self.transform.perspective(fovy_rad, aspect, near, far);
    }
    pub fn ortho(&mut self, width: f32, height: f32, near: f32, far: f32) {
        self.transform.ortho(width, height, near, far);
    }
    pub fn look_at(&mut self, eye: Vec3, target: Vec3, up: Vec3) {
        let m = TransformState::look_at(eye, target, up);
        self.transform.modelview.set_top(m);
    }

    // --- Lights & material (spec.md §4.3, §4.6) ----------------------------

    pub fn set_directional_light(&mut self, idx: usize, light: DirectionalLight) {
        if idx < self.lights.directional.len() {
            self.lights.directional[idx] = light;
        } else {
            self.messages.warning(format!("directional light index {idx} out of range"));
        }
    }
    pub fn set_point_light(&mut self, idx: usize, light: PointLight) {
        if idx < self.lights.point.len() {
            self.lights.point[idx] = light;
        } else {
            self.messages.warning(format!("point light index {idx} out of range"));
        }
    }
    pub fn set_spot_light(&mut self, idx: usize, light: SpotLight) {
        if idx < self.lights.spot.len() {
            self.lights.spot[idx] = light;
        } else {
            self.messages.warning(format!("spot light index {idx} out of range"));
        }
    }
    pub fn compute_attenuation(&mut self, kind: LightKind, idx: usize, constant: f32) {
        self.lights.compute_attenuation(kind, idx, constant, &self.messages);
    }
    pub fn set_material(&mut self, material: Material) {
        self.material = material;
    }

    /// Sets the current raster color (`spec.md` §4.5/§4.6/§9 Design Notes):
    /// the fallback color for points, colorless lines, and unlit triangles
    /// whose vertices carry no per-vertex color.
    pub fn set_raster_color(&mut self, color: Vec4) {
        self.raster_color = color;
    }

    // --- Framebuffer state (spec.md §4.1) ----------------------------------

    pub fn clear_color(&mut self, r: f32, g: f32, b: f32, a: f32) {
        self.framebuffer.clear_color(r, g, b, a);
    }
    pub fn clear_depth_value(&mut self, d: f32) {
        self.framebuffer.clear_depth_value(d);
    }
    pub fn enable(&mut self, flags: u32) {
        self.framebuffer.enable(flags);
    }
    pub fn disable(&mut self, flags: u32) {
        self.framebuffer.disable(flags);
    }
    pub fn clear(&mut self, mask: u32) {
        self.framebuffer.clear(mask);
    }
    pub fn depth_func(&mut self, f: DepthFunc) {
        self.framebuffer.depth_func(f);
    }
    pub fn depth_mask(&mut self, enabled: bool) {
        self.framebuffer.depth_mask(enabled);
    }

    // --- Drawing (spec.md §4.4, §4.5, §4.6) --------------------------------

    fn mvp_inputs(&self) -> (Mat4, Mat4, Mat4) {
        (*self.transform.modelview.top(), *self.transform.normal.top(), *self.transform.projection.top())
    }

    fn to_eye_space(&self, v: &Vertex, modelview: &Mat4, normal_matrix: &Mat4) -> Vertex {
        let eye_position = modelview.transform_point(&v.position);
        let eye_normal = v.attrs.normal().map(|n| normal_matrix.transform_direction(&n));
        let attrs = match (v.attrs, eye_normal) {
            (VertexAttrs::Position, _) => VertexAttrs::Position,
            (VertexAttrs::PositionColor { color }, _) => VertexAttrs::PositionColor { color },
            (VertexAttrs::PositionNormal { .. }, Some(normal)) => VertexAttrs::PositionNormal { normal },
            (VertexAttrs::PositionTexCoord { texcoord }, _) => VertexAttrs::PositionTexCoord { texcoord },
            (VertexAttrs::PositionColorNormal { color, .. }, Some(normal)) => {
                VertexAttrs::PositionColorNormal { color, normal }
            }
            (VertexAttrs::PositionColorTexCoord { color, texcoord }, _) => {
                VertexAttrs::PositionColorTexCoord { color, texcoord }
            }
            (VertexAttrs::PositionNormalTexCoord { texcoord, .. }, Some(normal)) => {
                VertexAttrs::PositionNormalTexCoord { normal, texcoord }
            }
            (VertexAttrs::PositionColorNormalTexCoord { color, texcoord, .. }, Some(normal)) => {
                VertexAttrs::PositionColorNormalTexCoord { color, normal, texcoord }
            }
            (other, None) => other,
        };
        Vertex::new(eye_position, attrs)
    }

    fn warn_if_texcoord_reserved(&self, v: &Vertex) {
        if v.attrs.config().is_texcoord_reserved() {
            self.messages.info("texture-coordinate attributes are reserved and have no effect");
        }
    }

    fn near_far_planes(&self) -> (Vec3, Vec3, Vec3, Vec3) {
        (
            Vec3::new(0.0, 0.0, -self.near),
            Vec3::new(0.0, 0.0, -1.0),
            Vec3::new(0.0, 0.0, -self.far),
            Vec3::new(0.0, 0.0, 1.0),
        )
    }

    fn shade_color(&self, eye_position: Vec3, attrs: &VertexAttrs) -> Vec4 {
        let vertex_color = attrs.color().unwrap_or(self.raster_color);
        match self.shade_model {
            ShadeModel::Unlit => vertex_color,
            ShadeModel::Flat | ShadeModel::Smooth => {
                let normal = attrs.normal().unwrap_or(Vec3::new(0.0, 0.0, 1.0));
                let view_dir = -eye_position.normalize();
                let light_matrix = *self.transform.light.top();
                let lit = shade::shade_fragment(&self.lights, &self.material, eye_position, normal, view_dir, &light_matrix);
                (lit * vertex_color.xyz()).to_vec4(vertex_color.w)
            }
        }
    }

    fn emit_fragment(&mut self, row: u32, col: u32, depth: f32, eye_position: Vec3, attrs: &VertexAttrs) {
        let depth_test_enabled = self.framebuffer.is_enabled(crate::framebuffer::DEPTH_TEST);
        if depth_test_enabled {
            let Some(existing) = self.framebuffer.get_pixel(row, col, FramebufferSide::Back, &self.messages) else {
                return;
            };
            if !self.framebuffer.compare_depth(depth, existing.depth) {
                return;
            }
        }
        let color = self.shade_color(eye_position, attrs);
        let written_depth =
            if depth_test_enabled && self.framebuffer.depth_mask_enabled() {
                depth
            } else if let Some(existing) = self.framebuffer.get_pixel(row, col, FramebufferSide::Back, &self.messages) {
                existing.depth
            } else {
                depth
            };
        self.framebuffer.set_pixel(row, col, Pixel::new(color, written_depth), FramebufferSide::Back, &self.messages);
    }

    /// Submits a triangle (`spec.md` §4.4-§4.6): transforms to eye space,
    /// clips against near/far, projects, culls, rasterizes, and shades.
    pub fn draw_triangle(&mut self, v0: Vertex, v1: Vertex, v2: Vertex) {
        self.warn_if_texcoord_reserved(&v0);
        let (modelview, normal_matrix, projection) = self.mvp_inputs();

        let mut e0 = self.to_eye_space(&v0, &modelview, &normal_matrix);
        let mut e1 = self.to_eye_space(&v1, &modelview, &normal_matrix);
        let mut e2 = self.to_eye_space(&v2, &modelview, &normal_matrix);

        if self.shade_model == ShadeModel::Flat {
            let averaged = VertexAttrs::average(&e0.attrs, &e1.attrs, &e2.attrs);
            e0.attrs = averaged;
            e1.attrs = averaged;
            e2.attrs = averaged;
        }

        let (near_point, near_normal, far_point, far_normal) = self.near_far_planes();
        let clipped = clip::clip_near_far([e0, e1, e2], near_point, near_normal, far_point, far_normal);

        let (width, height) = self.framebuffer.effective_dims();
        let cull_enabled = self.framebuffer.is_enabled(crate::framebuffer::CULL_FACE);
        let cull_face = self.cull_face;

        for tri in clipped {
            let w0 = raster::to_window(&tri[0], &projection, width, height);
            let w1 = raster::to_window(&tri[1], &projection, width, height);
            let w2 = raster::to_window(&tri[2], &projection, width, height);

            let Some(wind) = raster::winding(&w0, &w1, &w2) else { continue };
            if cull_enabled && raster::is_culled(wind, cull_face) {
                continue;
            }

            let mut fragments = Vec::new();
            raster::rasterize_triangle(&w0, &w1, &w2, width, height, |f| fragments.push(f));
            for f in fragments {
                self.emit_fragment(f.row, f.col, f.depth, f.eye_position, &f.attrs);
            }
        }
    }

    /// Submits a line segment (`spec.md` §4.5).
    pub fn draw_line(&mut self, v0: Vertex, v1: Vertex) {
        let (modelview, normal_matrix, projection) = self.mvp_inputs();
        let e0 = self.to_eye_space(&v0, &modelview, &normal_matrix);
        let e1 = self.to_eye_space(&v1, &modelview, &normal_matrix);

        let (near_point, near_normal, far_point, far_normal) = self.near_far_planes();
        let Some((c0, c1)) = clip::clip_segment_near_far(e0, e1, near_point, near_normal, far_point, far_normal) else {
            return;
        };

        let (width, height) = self.framebuffer.effective_dims();
        let w0 = raster::to_window(&c0, &projection, width, height);
        let w1 = raster::to_window(&c1, &projection, width, height);

        let mut fragments = Vec::new();
        raster::rasterize_line(&w0, &w1, width, height, |f| fragments.push(f));
        for f in fragments {
            self.emit_fragment(f.row, f.col, f.depth, f.eye_position, &f.attrs);
        }
    }

    /// Submits a single point (`spec.md` §4.5).
    pub fn draw_point(&mut self, v: Vertex) {
        let (modelview, normal_matrix, projection) = self.mvp_inputs();
        let e = self.to_eye_space(&v, &modelview, &normal_matrix);

        let (near_point, near_normal, far_point, far_normal) = self.near_far_planes();
        if !clip::point_visible(e.position, near_point, near_normal, far_point, far_normal) {
            return;
        }

        let (width, height) = self.framebuffer.effective_dims();
        let w: WindowVertex = raster::to_window(&e, &projection, width, height);
        if let Some(f) = raster::rasterize_point(&w, width, height) {
            self.emit_fragment(f.row, f.col, f.depth, f.eye_position, &f.attrs);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::framebuffer::{COLOR_BIT, DEPTH_BIT};

    struct NullPlane {
        dims: (u32, u32),
    }

    impl TerminalPlane for NullPlane {
        fn dims(&self) -> (u32, u32) {
            self.dims
        }
        fn blit_rgba(&mut self, _: &[u8], _: usize, _: crate::config::GlyphTileMode, _: u32, _: u32) {}
        fn render(&mut self) {}
        fn refresh(&mut self) {}
    }

    fn new_context() -> Context {
        let mut ctx = Context::new(Config::default());
        let plane = Arc::new(Mutex::new(NullPlane { dims: (20, 20) }));
        ctx.init(plane).unwrap();
        ctx.viewport(8, 8);
        ctx.swap().unwrap();
        ctx
    }

    #[test]
    fn unlit_ortho_triangle_writes_vertex_color() {
        let mut ctx = new_context();
        ctx.shade_model(ShadeModel::Unlit);
        ctx.matrix_mode(MatrixMode::Projection);
        ctx.ortho(2.0, 2.0, 0.1, 10.0);
        ctx.matrix_mode(MatrixMode::ModelView);
        ctx.load_identity();
        ctx.clear_color(0.0, 0.0, 0.0, 1.0);
        ctx.clear(COLOR_BIT | DEPTH_BIT);

        let red = VertexAttrs::PositionColor { color: Vec4::new(1.0, 0.0, 0.0, 1.0) };
        ctx.draw_triangle(
            Vertex::new(Vec3::new(-0.5, -0.5, -1.0), red),
            Vertex::new(Vec3::new(0.5, -0.5, -1.0), red),
            Vertex::new(Vec3::new(0.0, 0.5, -1.0), red),
        );

        let (w, h) = ctx.framebuffer.effective_dims();
        let center = ctx.framebuffer.get_pixel(h / 2, w / 2, FramebufferSide::Back, &ctx.messages).unwrap();
        assert!(center.color.x > 0.5);
        ctx.free().unwrap();
    }

    #[test]
    fn depth_test_rejects_farther_fragment() {
        let mut ctx = new_context();
        ctx.enable(crate::framebuffer::DEPTH_TEST);
        ctx.depth_func(DepthFunc::Less);
        ctx.shade_model(ShadeModel::Unlit);
        ctx.matrix_mode(MatrixMode::Projection);
        ctx.ortho(2.0, 2.0, 0.1, 10.0);
        ctx.matrix_mode(MatrixMode::ModelView);
        ctx.load_identity();
        ctx.clear_depth_value(1.0);
        ctx.clear(COLOR_BIT | DEPTH_BIT);

        let near_color = VertexAttrs::PositionColor { color: Vec4::new(1.0, 0.0, 0.0, 1.0) };
        let far_color = VertexAttrs::PositionColor { color: Vec4::new(0.0, 1.0, 0.0, 1.0) };

        ctx.draw_triangle(
            Vertex::new(Vec3::new(-1.0, -1.0, -1.0), near_color),
            Vertex::new(Vec3::new(1.0, -1.0, -1.0), near_color),
            Vertex::new(Vec3::new(0.0, 1.0, -1.0), near_color),
        );
        ctx.draw_triangle(
            Vertex::new(Vec3::new(-1.0, -1.0, -5.0), far_color),
            Vertex::new(Vec3::new(1.0, -1.0, -5.0), far_color),
            Vertex::new(Vec3::new(0.0, 1.0, -5.0), far_color),
        );

        let (w, h) = ctx.framebuffer.effective_dims();
        let pixel = ctx.framebuffer.get_pixel(h / 2, w / 2, FramebufferSide::Back, &ctx.messages).unwrap();
        assert!(pixel.color.x > 0.5, "nearer red triangle should have won the depth test");
        ctx.free().unwrap();
    }

    #[test]
    fn back_face_cull_discards_clockwise_triangle() {
        let mut ctx = new_context();
        ctx.enable(crate::framebuffer::CULL_FACE);
        ctx.cull_face(CullFace::Back);
        ctx.shade_model(ShadeModel::Unlit);
        ctx.matrix_mode(MatrixMode::Projection);
        ctx.ortho(2.0, 2.0, 0.1, 10.0);
        ctx.matrix_mode(MatrixMode::ModelView);
        ctx.load_identity();
        ctx.clear_color(0.0, 0.0, 0.0, 1.0);
        ctx.clear(COLOR_BIT | DEPTH_BIT);

        // Clockwise in window space (since y flips, counter-clockwise in
        // world/eye space with a right-handed camera): should be culled.
        let red = VertexAttrs::PositionColor { color: Vec4::new(1.0, 0.0, 0.0, 1.0) };
        ctx.draw_triangle(
            Vertex::new(Vec3::new(-0.5, 0.5, -1.0), red),
            Vertex::new(Vec3::new(0.5, 0.5, -1.0), red),
            Vertex::new(Vec3::new(0.0, -0.5, -1.0), red),
        );

        let (w, h) = ctx.framebuffer.effective_dims();
        let center = ctx.framebuffer.get_pixel(h / 2, w / 2, FramebufferSide::Back, &ctx.messages).unwrap();
        assert!(center.color.x < 0.5, "clockwise-in-eye-space triangle should be culled");
        ctx.free().unwrap();
    }

    #[test]
    fn smooth_directional_light_brightens_facing_quad() {
        let mut ctx = new_context();
        ctx.shade_model(ShadeModel::Smooth);
        ctx.set_directional_light(
            0,
            DirectionalLight { ambient: Vec3::zero(), diffuse: Vec3::new(1.0, 1.0, 1.0), specular: Vec3::zero(), direction: Vec3::new(0.0, 0.0, -1.0), intensity: 1.0 },
        );
        ctx.matrix_mode(MatrixMode::Projection);
        ctx.ortho(2.0, 2.0, 0.1, 10.0);
        ctx.matrix_mode(MatrixMode::ModelView);
        ctx.load_identity();
        ctx.clear_color(0.0, 0.0, 0.0, 1.0);
        ctx.clear(COLOR_BIT | DEPTH_BIT);

        let facing = VertexAttrs::PositionNormal { normal: Vec3::new(0.0, 0.0, 1.0) };
        ctx.draw_triangle(
            Vertex::new(Vec3::new(-0.5, -0.5, -1.0), facing),
            Vertex::new(Vec3::new(0.5, -0.5, -1.0), facing),
            Vertex::new(Vec3::new(0.0, 0.5, -1.0), facing),
        );

        let (w, h) = ctx.framebuffer.effective_dims();
        let center = ctx.framebuffer.get_pixel(h / 2, w / 2, FramebufferSide::Back, &ctx.messages).unwrap();
        assert!(center.color.x > 0.0);
        ctx.free().unwrap();
    }

    #[test]
    fn matrix_stack_round_trip_leaves_modelview_unchanged() {
        let mut ctx = new_context();
        ctx.matrix_mode(MatrixMode::ModelView);
        let before = *ctx.transform.modelview.top();
        ctx.push_matrix();
        ctx.translate(Vec3::new(1.0, 2.0, 3.0));
        ctx.pop_matrix();
        assert!(ctx.transform.modelview.top().equals(&before));
        ctx.free().unwrap();
    }
}
