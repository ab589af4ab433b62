//! Demo harness: drives `cursedgl::Context` through a bounded number of
//! frames of a lit, spinning cube, with a stdout stand-in for the terminal
//! collaborator.

use std::sync::{Arc, Mutex};

use anyhow::Result;
use clap::{Parser, ValueEnum};
use cursedgl::config::{Config, GlyphTileMode};
use cursedgl::material::DirectionalLight;
use cursedgl::math::Vec3;
use cursedgl::message::Severity;
use cursedgl::shade::ShadeModel;
use cursedgl::terminal::TerminalPlane;
use cursedgl::transform::MatrixMode;
use cursedgl::vao::{Vertex, VertexAttrs};
use cursedgl::Context;
use log::{debug, error, info, warn};

#[derive(Debug, Clone, Copy, ValueEnum)]
enum TileArg {
    Block,
    Half,
    Quadrant,
    Sextant,
    Braille,
}

impl From<TileArg> for GlyphTileMode {
    fn from(v: TileArg) -> Self {
        match v {
            TileArg::Block => GlyphTileMode::Block1x1,
            TileArg::Half => GlyphTileMode::Half2x1,
            TileArg::Quadrant => GlyphTileMode::Quadrant2x2,
            TileArg::Sextant => GlyphTileMode::Sextant3x2,
            TileArg::Braille => GlyphTileMode::Braille2x4,
        }
    }
}

/// CLI arguments.
#[derive(Parser, Debug)]
#[command(name = "viewer", version, about = "cursedgl demo: a spinning lit cube")]
struct Args {
    /// Glyph tiling mode for the (fake) terminal grid.
    #[arg(long, value_enum, default_value_t = TileArg::Quadrant)]
    tile_mode: TileArg,

    /// Character columns of the terminal grid.
    #[arg(long, default_value_t = 48)]
    cols: u32,

    /// Character rows of the terminal grid.
    #[arg(long, default_value_t = 24)]
    rows: u32,

    /// Number of frames to render before exiting.
    #[arg(long, default_value_t = 60)]
    frames: u32,
}

/// A stand-in `TerminalPlane` that prints a one-line coverage summary per
/// frame instead of actually drawing glyphs — a real collaborator (e.g. a
/// notcurses binding) would blit into an actual character grid here.
struct StdoutPlane {
    cols: u32,
    rows: u32,
    frame: u32,
}

impl StdoutPlane {
    fn new(cols: u32, rows: u32) -> Self {
        StdoutPlane { cols, rows, frame: 0 }
    }
}

impl TerminalPlane for StdoutPlane {
    fn dims(&self) -> (u32, u32) {
        (self.rows, self.cols)
    }

    fn blit_rgba(&mut self, bytes: &[u8], row_stride: usize, _tile_mode: GlyphTileMode, len_x: u32, len_y: u32) {
        let mut lit_pixels = 0usize;
        for row in 0..len_y as usize {
            let base = row * row_stride;
            for col in 0..len_x as usize {
                let i = base + col * 4;
                if bytes[i] > 0 || bytes[i + 1] > 0 || bytes[i + 2] > 0 {
                    lit_pixels += 1;
                }
            }
        }
        self.frame += 1;
        println!("frame {:>4}: {len_x}x{len_y} effective, {lit_pixels} lit pixels", self.frame);
    }

    fn render(&mut self) {}

    fn refresh(&mut self) {
        debug!("terminal refreshed at {}x{}", self.cols, self.rows);
    }
}

/// Eight corners and twelve triangles (two per face) of an axis-aligned
/// cube centered on the origin.
fn cube_triangles() -> Vec<(Vertex, Vertex, Vertex)> {
    let p = [
        Vec3::new(-0.5, -0.5, -0.5),
        Vec3::new(0.5, -0.5, -0.5),
        Vec3::new(0.5, 0.5, -0.5),
        Vec3::new(-0.5, 0.5, -0.5),
        Vec3::new(-0.5, -0.5, 0.5),
        Vec3::new(0.5, -0.5, 0.5),
        Vec3::new(0.5, 0.5, 0.5),
        Vec3::new(-0.5, 0.5, 0.5),
    ];
    let faces: [([usize; 4], Vec3); 6] = [
        ([0, 1, 2, 3], Vec3::new(0.0, 0.0, -1.0)),
        ([5, 4, 7, 6], Vec3::new(0.0, 0.0, 1.0)),
        ([4, 0, 3, 7], Vec3::new(-1.0, 0.0, 0.0)),
        ([1, 5, 6, 2], Vec3::new(1.0, 0.0, 0.0)),
        ([3, 2, 6, 7], Vec3::new(0.0, 1.0, 0.0)),
        ([4, 5, 1, 0], Vec3::new(0.0, -1.0, 0.0)),
    ];

    let mut out = Vec::with_capacity(12);
    for (indices, normal) in faces {
        let attrs = VertexAttrs::PositionNormal { normal };
        let v0 = Vertex::new(p[indices[0]], attrs);
        let v1 = Vertex::new(p[indices[1]], attrs);
        let v2 = Vertex::new(p[indices[2]], attrs);
        let v3 = Vertex::new(p[indices[3]], attrs);
        out.push((v0, v1, v2));
        out.push((v0, v2, v3));
    }
    out
}

fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();
    info!("starting viewer: {args:?}");

    let config = Config { tile_mode: args.tile_mode.into(), ..Config::default() };
    let mut ctx = Context::new(config);
    ctx.messages.set_sink(Some(Box::new(|severity, message| match severity {
        Severity::Info => info!("{message}"),
        Severity::Warning => warn!("{message}"),
        Severity::Error => error!("{message}"),
    })));

    let plane = Arc::new(Mutex::new(StdoutPlane::new(args.cols, args.rows)));
    ctx.init(plane)?;
    ctx.viewport(args.cols, args.rows);

    ctx.shade_model(ShadeModel::Smooth);
    ctx.cull_face(cursedgl::raster::CullFace::Back);
    ctx.enable(cursedgl::framebuffer::DEPTH_TEST | cursedgl::framebuffer::CULL_FACE);
    ctx.depth_func(cursedgl::framebuffer::DepthFunc::Less);
    ctx.set_directional_light(
        0,
        DirectionalLight {
            ambient: Vec3::splat(0.1),
            diffuse: Vec3::splat(0.9),
            specular: Vec3::splat(0.4),
            direction: Vec3::new(-0.4, -0.6, -0.7),
            intensity: 1.0,
        },
    );

    ctx.matrix_mode(MatrixMode::Projection);
    ctx.ortho(3.0, 3.0, 0.1, 10.0);

    let triangles = cube_triangles();

    for frame in 0..args.frames {
        let angle = frame as f32 * 0.05;

        ctx.matrix_mode(MatrixMode::ModelView);
        ctx.load_identity();
        ctx.translate(Vec3::new(0.0, 0.0, -3.0));
        ctx.rotate(angle, Vec3::new(0.3, 1.0, 0.0).normalize());

        ctx.clear_color(0.05, 0.05, 0.08, 1.0);
        ctx.clear_depth_value(1.0);
        ctx.clear(cursedgl::framebuffer::COLOR_BIT | cursedgl::framebuffer::DEPTH_BIT);

        for (v0, v1, v2) in &triangles {
            ctx.draw_triangle(*v0, *v1, *v2);
        }

        ctx.swap()?;
    }

    ctx.free()?;
    Ok(())
}
