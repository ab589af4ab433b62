//! The thin, non-contractual configuration surface (`spec.md` §1, §6): glyph
//! tiling mode, a pass-through log level, banner suppression, and the width
//! multiplier that corrects for non-square character cells.

/// Glyph tiling mode: how many character-cell columns/rows one logical pixel
/// covers. Determines the effective-to-logical resolution ratio
/// (`spec.md` §4.3, §6).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GlyphTileMode {
    Block1x1,
    Half2x1,
    Quadrant2x2,
    Sextant3x2,
    Braille2x4,
    Half4x1,
    Octant8x1,
}

impl GlyphTileMode {
    /// `(cellCols, cellRows)` — the logical-to-effective resolution ratio.
    pub fn cell_dims(&self) -> (u32, u32) {
        match self {
            GlyphTileMode::Block1x1 => (1, 1),
            GlyphTileMode::Half2x1 => (2, 1),
            GlyphTileMode::Quadrant2x2 => (2, 2),
            GlyphTileMode::Sextant3x2 => (3, 2),
            GlyphTileMode::Braille2x4 => (2, 4),
            GlyphTileMode::Half4x1 => (4, 1),
            GlyphTileMode::Octant8x1 => (8, 1),
        }
    }
}

/// Log level passed through to the terminal collaborator; the core never
/// interprets it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    Off,
    Error,
    Warning,
    Info,
    Debug,
}

/// Caller-visible configuration, set before `Framebuffer::init` (`spec.md` §6).
#[derive(Debug, Clone, Copy)]
pub struct Config {
    pub tile_mode: GlyphTileMode,
    pub log_level: LogLevel,
    pub suppress_banner: bool,
    /// Correction factor for the non-square character cell; divides aspect
    /// in `perspective()`, multiplies width in `ortho()` (`spec.md` §4.2).
    pub width_multiplier: f32,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            tile_mode: GlyphTileMode::Quadrant2x2,
            log_level: LogLevel::Warning,
            suppress_banner: false,
            width_multiplier: 2.0,
        }
    }
}
