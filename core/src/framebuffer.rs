//! The double-buffered framebuffer, depth testing, and the swap/present
//! protocol (`spec.md` component D, §5).
//!
//! `spec.md` §9 REDESIGN FLAG: the busy-wait handshake (`start_rendering`,
//! `currently_rendering`, `stop_rendering` booleans) is replaced by a
//! one-slot `crossbeam_channel` rendezvous. The submitter deposits a
//! finished frame (or a resize notice); the presenter consumes it on its own
//! thread. Backpressure — "busy-wait while a present is in flight" — falls
//! out of the channel's bounded(1) capacity instead of a poll loop.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::thread::JoinHandle;
use std::time::{Duration, Instant};

use crossbeam_channel::{Receiver, RecvTimeoutError, Sender};

use crate::config::GlyphTileMode;
use crate::error::{PipelineError, Result};
use crate::math::Vec4;
use crate::message::MessageBus;
use crate::terminal::{pack_rgba, TerminalPlane};

pub const COLOR_BIT: u32 = 1 << 0;
pub const DEPTH_BIT: u32 = 1 << 1;
pub const DEPTH_TEST: u32 = 1 << 2;
pub const CULL_FACE: u32 = 1 << 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FramebufferSide {
    Front,
    Back,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DepthFunc {
    Less,
    LEqual,
    Equal,
    GEqual,
    Greater,
    NotEqual,
}

/// A color (RGBA, each component in `[0,1]` after write) plus a window-space
/// depth in `[0,1]` (0 = near, 1 = far).
#[derive(Debug, Clone, Copy)]
pub struct Pixel {
    pub color: Vec4,
    pub depth: f32,
}

impl Pixel {
    pub fn new(color: Vec4, depth: f32) -> Self {
        Pixel { color, depth }
    }
}

impl Default for Pixel {
    fn default() -> Self {
        Pixel { color: Vec4::new(0.0, 0.0, 0.0, 1.0), depth: 1.0 }
    }
}

enum PresentCommand {
    Frame { bytes: Vec<u8>, width: u32, height: u32 },
    Resize,
    Stop,
}

/// Default swap-thread budget, ~58 Hz (`spec.md` §5).
pub const DEFAULT_WAIT_MILLISECONDS: u64 = 17;
/// Default `swap_to_render_ratio`: bounds the presenter's poll latency.
pub const DEFAULT_SWAP_TO_RENDER_RATIO: u64 = 10;

pub struct Framebuffer {
    logical_width: u32,
    logical_height: u32,
    effective_width: u32,
    effective_height: u32,
    tile_mode: GlyphTileMode,
    pending_resize: Option<(u32, u32)>,

    front: Vec<Pixel>,
    back: Vec<Pixel>,

    clear_color: Vec4,
    clear_depth: f32,
    flags: u32,
    depth_func: DepthFunc,
    depth_mask: bool,

    swap_thread_wait: Duration,
    render_thread_wait: Duration,

    plane: Option<Arc<Mutex<dyn TerminalPlane + Send>>>,
    command_tx: Option<Sender<PresentCommand>>,
    presenter: Option<JoinHandle<()>>,
    stop_flag: Arc<AtomicBool>,
}

impl Framebuffer {
    pub fn new(tile_mode: GlyphTileMode) -> Self {
        Framebuffer {
            logical_width: 0,
            logical_height: 0,
            effective_width: 0,
            effective_height: 0,
            tile_mode,
            pending_resize: None,
            front: Vec::new(),
            back: Vec::new(),
            clear_color: Vec4::new(0.0, 0.0, 0.0, 1.0),
            clear_depth: 1.0,
            flags: 0,
            depth_func: DepthFunc::Less,
            depth_mask: true,
            swap_thread_wait: Duration::from_millis(DEFAULT_WAIT_MILLISECONDS),
            render_thread_wait: Duration::from_millis(DEFAULT_WAIT_MILLISECONDS / DEFAULT_SWAP_TO_RENDER_RATIO),
            plane: None,
            command_tx: None,
            presenter: None,
            stop_flag: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Binds to the terminal collaborator's render surface and spawns the
    /// present thread. Fails if already initialized.
    pub fn init(&mut self, plane: Arc<Mutex<dyn TerminalPlane + Send>>, messages: &MessageBus) -> Result<()> {
        if self.plane.is_some() {
            messages.error("framebuffer already initialized");
            return Err(PipelineError::AlreadyInitialized);
        }
        let (tx, rx): (Sender<PresentCommand>, Receiver<PresentCommand>) = crossbeam_channel::bounded(1);
        let render_wait = self.render_thread_wait;
        let plane_for_thread = plane.clone();
        let stop_flag = self.stop_flag.clone();
        let tile_mode = self.tile_mode;

        let handle = std::thread::Builder::new()
            .name("cursedgl-present".into())
            .spawn(move || present_loop(rx, plane_for_thread, render_wait, stop_flag, tile_mode))
            .map_err(|_| PipelineError::Allocation { width: 0, height: 0 })?;

        self.plane = Some(plane);
        self.command_tx = Some(tx);
        self.presenter = Some(handle);
        messages.info("framebuffer initialized");
        Ok(())
    }

    pub fn viewport(&mut self, logical_width: u32, logical_height: u32) {
        if logical_width != self.logical_width || logical_height != self.logical_height {
            self.pending_resize = Some((logical_width, logical_height));
        }
    }

    pub fn clear_color(&mut self, r: f32, g: f32, b: f32, a: f32) {
        self.clear_color = Vec4::new(r, g, b, a);
    }

    pub fn clear_depth_value(&mut self, d: f32) {
        self.clear_depth = d;
    }

    pub fn enable(&mut self, flags: u32) {
        self.flags |= flags;
    }

    pub fn disable(&mut self, flags: u32) {
        self.flags &= !flags;
    }

    pub fn is_enabled(&self, flag: u32) -> bool {
        self.flags & flag != 0
    }

    pub fn clear(&mut self, mask: u32) {
        if mask & COLOR_BIT != 0 {
            for p in self.back.iter_mut() {
                p.color = self.clear_color;
            }
        }
        if mask & DEPTH_BIT != 0 && self.is_enabled(DEPTH_TEST) {
            for p in self.back.iter_mut() {
                p.depth = self.clear_depth;
            }
        }
    }

    pub fn depth_func(&mut self, f: DepthFunc) {
        self.depth_func = f;
    }

    pub fn depth_mask(&mut self, enabled: bool) {
        self.depth_mask = enabled;
    }

    pub fn depth_mask_enabled(&self) -> bool {
        self.depth_mask
    }

    /// `new` is the fragment's depth, `old` is the currently stored depth.
    pub fn compare_depth(&self, new: f32, old: f32) -> bool {
        match self.depth_func {
            DepthFunc::Less => new < old,
            DepthFunc::LEqual => new <= old || crate::math::float_eq(new, old),
            DepthFunc::Equal => crate::math::float_eq(new, old),
            DepthFunc::GEqual => new >= old || crate::math::float_eq(new, old),
            DepthFunc::Greater => new > old,
            DepthFunc::NotEqual => !crate::math::float_eq(new, old),
        }
    }

    fn index(&self, row: u32, col: u32) -> Option<usize> {
        if row >= self.effective_height || col >= self.effective_width {
            None
        } else {
            Some((row * self.effective_width + col) as usize)
        }
    }

    pub fn get_pixel(&self, row: u32, col: u32, which: FramebufferSide, messages: &MessageBus) -> Option<Pixel> {
        match self.index(row, col) {
            Some(i) => Some(match which {
                FramebufferSide::Front => self.front[i],
                FramebufferSide::Back => self.back[i],
            }),
            None => {
                messages.error(format!("get_pixel({row},{col}) out of range"));
                None
            }
        }
    }

    pub fn set_pixel(&mut self, row: u32, col: u32, p: Pixel, which: FramebufferSide, messages: &MessageBus) {
        match self.index(row, col) {
            Some(i) => {
                let target = match which {
                    FramebufferSide::Front => &mut self.front[i],
                    FramebufferSide::Back => &mut self.back[i],
                };
                *target = p;
            }
            None => messages.error(format!("set_pixel({row},{col}) out of range")),
        }
    }

    pub fn effective_dims(&self) -> (u32, u32) {
        (self.effective_width, self.effective_height)
    }

    pub fn aspect_ratio(&self) -> f32 {
        if self.effective_height == 0 {
            1.0
        } else {
            self.effective_width as f32 / self.effective_height as f32
        }
    }

    /// The presentation protocol (`spec.md` §5).
    pub fn swap(&mut self, messages: &MessageBus) -> Result<()> {
        let start = Instant::now();
        let Some(tx) = &self.command_tx else {
            messages.error("swap() called before init()");
            return Err(PipelineError::NotInitialized);
        };

        if let Some((lw, lh)) = self.pending_resize.take() {
            let (cols, rows) = self.tile_mode.cell_dims();
            let ew = lw * cols;
            let eh = lh * rows;
            let len = (ew as usize) * (eh as usize);
            self.front = vec![Pixel::default(); len];
            self.back = vec![Pixel::default(); len];
            self.logical_width = lw;
            self.logical_height = lh;
            self.effective_width = ew;
            self.effective_height = eh;
            if tx.send(PresentCommand::Resize).is_err() {
                messages.error("present thread is gone; resize not delivered");
            }
            return Ok(());
        }

        self.front.clone_from(&self.back);
        let bytes = pack_rgba(
            &self.front.iter().map(|p| p.color).collect::<Vec<_>>(),
            self.effective_width,
            self.effective_height,
        );
        let frame = PresentCommand::Frame { bytes, width: self.effective_width, height: self.effective_height };
        if tx.send(frame).is_err() {
            messages.error("present thread is gone; frame dropped");
        }

        let elapsed = start.elapsed();
        if elapsed < self.swap_thread_wait {
            std::thread::sleep(self.swap_thread_wait - elapsed);
        }
        Ok(())
    }

    /// Tears down the presenter and releases both grids. Blocks until any
    /// in-flight present completes.
    pub fn free(&mut self, messages: &MessageBus) -> Result<()> {
        if let Some(tx) = self.command_tx.take() {
            let _ = tx.send(PresentCommand::Stop);
        }
        self.stop_flag.store(true, Ordering::SeqCst);
        if let Some(handle) = self.presenter.take() {
            handle.join().map_err(|_| PipelineError::PresenterJoin)?;
        }
        self.front.clear();
        self.back.clear();
        self.plane = None;
        messages.info("framebuffer freed");
        Ok(())
    }
}

fn present_loop(
    rx: Receiver<PresentCommand>,
    plane: Arc<Mutex<dyn TerminalPlane + Send>>,
    poll_wait: Duration,
    stop_flag: Arc<AtomicBool>,
    tile_mode: GlyphTileMode,
) {
    loop {
        if stop_flag.load(Ordering::SeqCst) {
            return;
        }
        match rx.recv_timeout(poll_wait) {
            Ok(PresentCommand::Stop) => return,
            Ok(PresentCommand::Resize) => {
                let mut plane = plane.lock().expect("terminal plane mutex poisoned");
                plane.refresh();
            }
            Ok(PresentCommand::Frame { bytes, width, height }) => {
                let mut plane = plane.lock().expect("terminal plane mutex poisoned");
                plane.blit_rgba(&bytes, (width as usize) * 4, tile_mode, width, height);
                plane.render();
            }
            Err(RecvTimeoutError::Timeout) => continue,
            Err(RecvTimeoutError::Disconnected) => return,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    struct NullPlane {
        dims: (u32, u32),
        renders: usize,
    }

    impl TerminalPlane for NullPlane {
        fn dims(&self) -> (u32, u32) {
            self.dims
        }
        fn blit_rgba(&mut self, _: &[u8], _: usize, _: GlyphTileMode, _: u32, _: u32) {}
        fn render(&mut self) {
            self.renders += 1;
        }
        fn refresh(&mut self) {}
    }

    fn init_fb(fb: &mut Framebuffer, messages: &MessageBus) -> Arc<Mutex<NullPlane>> {
        let plane = Arc::new(Mutex::new(NullPlane { dims: (24, 80), renders: 0 }));
        fb.init(plane.clone(), messages).unwrap();
        plane
    }

    #[test]
    fn viewport_resize_applies_at_swap() {
        let messages = MessageBus::new();
        let mut fb = Framebuffer::new(GlyphTileMode::Block1x1);
        let _plane = init_fb(&mut fb, &messages);
        fb.viewport(10, 5);
        assert_eq!(fb.effective_dims(), (0, 0));
        fb.swap(&messages).unwrap();
        assert_eq!(fb.effective_dims(), (10, 5));
        fb.free(&messages).unwrap();
    }

    #[test]
    fn swap_idempotence_without_intervening_draw() {
        let messages = MessageBus::new();
        let mut fb = Framebuffer::new(GlyphTileMode::Block1x1);
        let _plane = init_fb(&mut fb, &messages);
        fb.viewport(4, 4);
        fb.swap(&messages).unwrap();
        fb.swap(&messages).unwrap();
        for i in 0..fb.front.len() {
            assert!(fb.front[i].color.equals(&fb.back[i].color));
        }
        fb.free(&messages).unwrap();
    }

    #[test]
    fn clear_respects_color_and_depth_bits() {
        let messages = MessageBus::new();
        let mut fb = Framebuffer::new(GlyphTileMode::Block1x1);
        let _plane = init_fb(&mut fb, &messages);
        fb.viewport(2, 2);
        fb.swap(&messages).unwrap();
        fb.enable(DEPTH_TEST);
        fb.clear_color(1.0, 0.0, 0.0, 1.0);
        fb.clear_depth_value(0.5);
        fb.clear(COLOR_BIT | DEPTH_BIT);
        let p = fb.get_pixel(0, 0, FramebufferSide::Back, &messages).unwrap();
        assert!(p.color.equals(&Vec4::new(1.0, 0.0, 0.0, 1.0)));
        assert!((p.depth - 0.5).abs() < 1e-6);
        fb.free(&messages).unwrap();
    }

    #[test]
    fn out_of_range_access_is_none() {
        let messages = MessageBus::new();
        let mut fb = Framebuffer::new(GlyphTileMode::Block1x1);
        let _plane = init_fb(&mut fb, &messages);
        fb.viewport(2, 2);
        fb.swap(&messages).unwrap();
        assert!(fb.get_pixel(100, 100, FramebufferSide::Front, &messages).is_none());
        fb.free(&messages).unwrap();
    }

    #[test]
    fn depth_compare_less() {
        let messages = MessageBus::new();
        let fb = Framebuffer::new(GlyphTileMode::Block1x1);
        let _ = messages;
        assert!(fb.compare_depth(0.2, 0.5));
        assert!(!fb.compare_depth(0.5, 0.2));
    }
}
