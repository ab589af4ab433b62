//! Transform state (`spec.md` component B): five named matrix stacks, a
//! current-mode selector, and the OpenGL-1.x-flavored convenience ops.

use crate::math::{Mat3, Mat4, Vec3};
use crate::message::MessageBus;

/// Which of the five stacks `matrix_mode` selects.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatrixMode {
    Projection,
    ModelView,
    Normal,
    Texture,
    Light,
}

/// A fixed-capacity ordered sequence of 4×4 matrices with a top index
/// (`spec.md` §3). Starts with a single identity matrix.
pub struct MatrixStack {
    stack: Vec<Mat4>,
    capacity: usize,
    name: &'static str,
}

impl MatrixStack {
    pub fn new(capacity: usize, name: &'static str) -> Self {
        MatrixStack { stack: vec![Mat4::identity()], capacity, name }
    }

    pub fn top(&self) -> &Mat4 {
        self.stack.last().expect("matrix stack is never empty")
    }

    pub fn top_mut(&mut self) -> &mut Mat4 {
        self.stack.last_mut().expect("matrix stack is never empty")
    }

    pub fn set_top(&mut self, m: Mat4) {
        *self.top_mut() = m;
    }

    /// Duplicates the top. Overflow at capacity is a warning and a no-op;
    /// returns whether it succeeded.
    pub fn push(&mut self, messages: &MessageBus) -> bool {
        if self.stack.len() >= self.capacity {
            messages.warning(format!("{} stack overflow: capacity {} reached", self.name, self.capacity));
            return false;
        }
        let top = *self.top();
        self.stack.push(top);
        true
    }

    /// Discards the top. Underflow (size 1) is a warning and a no-op;
    /// returns whether it succeeded.
    pub fn pop(&mut self, messages: &MessageBus) -> bool {
        if self.stack.len() <= 1 {
            messages.warning(format!("{} stack underflow: pop below the initial identity", self.name));
            return false;
        }
        self.stack.pop();
        true
    }
}

/// Owns the five stacks and the current-mode selector, and implements the
/// convenience ops of `spec.md` §4.2.
pub struct TransformState {
    pub mode: MatrixMode,
    pub projection: MatrixStack,
    pub modelview: MatrixStack,
    pub normal: MatrixStack,
    pub texture: MatrixStack,
    pub light: MatrixStack,
    /// Multiplies `ortho`'s width / divides `perspective`'s aspect to correct
    /// for the non-square character cell (`spec.md` §4.2, §9).
    pub width_multiplier: f32,
}

impl TransformState {
    pub fn new(width_multiplier: f32) -> Self {
        TransformState {
            mode: MatrixMode::ModelView,
            projection: MatrixStack::new(4, "projection"),
            modelview: MatrixStack::new(32, "modelview"),
            normal: MatrixStack::new(32, "normal"),
            texture: MatrixStack::new(4, "texture"),
            light: MatrixStack::new(4, "light"),
            width_multiplier,
        }
    }

    fn stack_mut(&mut self, mode: MatrixMode) -> &mut MatrixStack {
        match mode {
            MatrixMode::Projection => &mut self.projection,
            MatrixMode::ModelView => &mut self.modelview,
            MatrixMode::Normal => &mut self.normal,
            MatrixMode::Texture => &mut self.texture,
            MatrixMode::Light => &mut self.light,
        }
    }

    fn stack(&self, mode: MatrixMode) -> &MatrixStack {
        match mode {
            MatrixMode::Projection => &self.projection,
            MatrixMode::ModelView => &self.modelview,
            MatrixMode::Normal => &self.normal,
            MatrixMode::Texture => &self.texture,
            MatrixMode::Light => &self.light,
        }
    }

    pub fn matrix_mode(&mut self, mode: MatrixMode) {
        self.mode = mode;
    }

    pub fn push(&mut self, messages: &MessageBus) -> bool {
        let mode = self.mode;
        self.stack_mut(mode).push(messages)
    }

    pub fn pop(&mut self, messages: &MessageBus) -> bool {
        let mode = self.mode;
        self.stack_mut(mode).pop(messages)
    }

    pub fn load_identity(&mut self) {
        let mode = self.mode;
        self.stack_mut(mode).set_top(Mat4::identity());
    }

    fn refresh_normal_matrix(&mut self) {
        let mv = *self.modelview.top();
        let upper3 = Mat3::from_mat4_upper(&mv);
        let normal3 = upper3.inverse().transpose();
        let mut normal4 = Mat4::identity();
        for r in 0..3 {
            for c in 0..3 {
                normal4.set(r, c, normal3.get(r, c));
            }
        }
        self.normal.set_top(normal4);
    }

    pub fn translate(&mut self, t: Vec3) {
        let mode = self.mode;
        let m = *self.stack(mode).top();
        self.stack_mut(mode).set_top(m * Mat4::translation(&t));
    }

    pub fn rotate(&mut self, angle_rad: f32, axis: Vec3) {
        let mode = self.mode;
        let m = *self.stack(mode).top();
        self.stack_mut(mode).set_top(m * Mat4::rotation(&axis, angle_rad));
        if mode == MatrixMode::ModelView {
            self.refresh_normal_matrix();
        }
    }

    pub fn scale(&mut self, s: Vec3) {
        let mode = self.mode;
        let m = *self.stack(mode).top();
        self.stack_mut(mode).set_top(m * Mat4::scale(&s));
        if mode == MatrixMode::ModelView {
            self.refresh_normal_matrix();
        }
    }

    pub fn copy_transform(&mut self, dst: MatrixMode, src: MatrixMode) {
        let value = *self.stack(src).top();
        self.stack_mut(dst).set_top(value);
    }

    /// Overwrites the projection top with a perspective projection.
    /// `aspect` is divided by the width multiplier (`spec.md` §4.2, §9).
    pub fn perspective(&mut self, fovy_rad: f32, aspect: f32, near: f32, far: f32) {
        let corrected_aspect = aspect / self.width_multiplier;
        let f = 1.0 / (fovy_rad * 0.5).tan();
        let mut m = Mat4::zero();
        m.set(0, 0, f / corrected_aspect);
        m.set(1, 1, f);
        m.set(2, 2, (far + near) / (near - far));
        m.set(2, 3, (2.0 * far * near) / (near - far));
        m.set(3, 2, -1.0);
        self.projection.set_top(m);
    }

    /// Overwrites the projection top with an orthographic projection. Width
    /// is multiplied by the width multiplier (`spec.md` §4.2, §9).
    pub fn ortho(&mut self, width: f32, height: f32, near: f32, far: f32) {
        let corrected_width = width * self.width_multiplier;
        let mut m = Mat4::identity();
        m.set(0, 0, 2.0 / corrected_width);
        m.set(1, 1, 2.0 / height);
        m.set(2, 2, -2.0 / (far - near));
        m.set(2, 3, -(far + near) / (far - near));
        self.projection.set_top(m);
    }

    /// Right-handed look-at view matrix.
    pub fn look_at(eye: Vec3, target: Vec3, up: Vec3) -> Mat4 {
        let f = (target - eye).normalize();
        let s = f.cross(&up).normalize();
        let u = s.cross(&f);

        let mut m = Mat4::identity();
        m.set(0, 0, s.x);
        m.set(0, 1, s.y);
        m.set(0, 2, s.z);
        m.set(1, 0, u.x);
        m.set(1, 1, u.y);
        m.set(1, 2, u.z);
        m.set(2, 0, -f.x);
        m.set(2, 1, -f.y);
        m.set(2, 2, -f.z);
        m.set(0, 3, -s.dot(&eye));
        m.set(1, 3, -u.dot(&eye));
        m.set(2, 3, f.dot(&eye));
        m
    }
}
