//! The terminal collaborator contract (`spec.md` §6) — the only external
//! surface the core depends on. The core never implements this trait; a
//! real backend (e.g. notcurses bindings) or the `viewer` demo's stdout
//! stand-in does.

use crate::config::GlyphTileMode;

/// A handle to a character grid the collaborator renders into.
pub trait TerminalPlane {
    /// `(rows, cols)` of the underlying character grid.
    fn dims(&self) -> (u32, u32);

    /// Displays a contiguous RGBA byte buffer (`spec.md` §6 packed pixel
    /// format: 4 bytes per pixel, `R,G,B,A` order, `row_stride = width*4`).
    fn blit_rgba(&mut self, bytes: &[u8], row_stride: usize, tile_mode: GlyphTileMode, len_x: u32, len_y: u32);

    /// Flushes the collaborator's internal scene to the terminal.
    fn render(&mut self);

    /// Called after a resize, before the next `blit_rgba`.
    fn refresh(&mut self);
}

/// Packs a front-buffer pixel grid into the row-major RGBA byte layout
/// `blit_rgba` expects. `spec.md` §5: "alpha = 255, channel order RGB-in-low-
/// bytes followed by alpha in the high byte" — i.e. memory order R, G, B, A.
pub fn pack_rgba(colors: &[crate::math::Vec4], width: u32, height: u32) -> Vec<u8> {
    let mut out = Vec::with_capacity(colors.len() * 4);
    debug_assert_eq!(colors.len(), (width * height) as usize);
    for c in colors {
        out.push((c.x.clamp(0.0, 1.0) * 255.0).round() as u8);
        out.push((c.y.clamp(0.0, 1.0) * 255.0).round() as u8);
        out.push((c.z.clamp(0.0, 1.0) * 255.0).round() as u8);
        out.push(255u8);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::math::Vec4;

    #[test]
    fn pack_rgba_layout() {
        let colors = vec![Vec4::new(1.0, 0.5, 0.0, 1.0)];
        let bytes = pack_rgba(&colors, 1, 1);
        assert_eq!(bytes, vec![255, 128, 0, 255]);
    }
}
