//! MC6847 Video Display Generator
//!
//! Produces one 256×192 8-bpp frame per refresh tick by expanding video
//! RAM according to `current_mode`, which is derived from
//! `sam.video_mode` and the VDG-relevant bits of PIA1 port B via the
//! MC6847 mode matrix.
//!
//! Frame bytes are indices into the 16-entry host palette
//! ([`crate::host::PaletteIndex`]); the host maps them to real colors when
//! it blits.

use crate::host::PaletteIndex;

pub const FRAME_WIDTH: usize = 256;
pub const FRAME_HEIGHT: usize = 192;

const CELL_WIDTH: usize = 8;
const CELL_HEIGHT: usize = 12;
const TEXT_COLS: usize = FRAME_WIDTH / CELL_WIDTH;
const TEXT_ROWS: usize = FRAME_HEIGHT / CELL_HEIGHT;

const BLACK: u8 = PaletteIndex::Black as u8;

/// The VDG's 8-color set, as host palette indices:
/// green, yellow, blue, red, buff, cyan, magenta, orange.
const VDG_COLORS: [u8; 8] = [
    PaletteIndex::Green as u8,
    PaletteIndex::Yellow as u8,
    PaletteIndex::Blue as u8,
    PaletteIndex::Red as u8,
    PaletteIndex::White as u8,
    PaletteIndex::Cyan as u8,
    PaletteIndex::Magenta as u8,
    PaletteIndex::Brown as u8,
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    AlphaInt,
    AlphaExt,
    /// Per-byte escapes inside the alpha modes; never returned by
    /// [`Vdg::current_mode`] since the selection is bit 7 of each cell.
    Sg4,
    Sg6,
    Sg8,
    Sg12,
    Sg24,
    G1C,
    G1R,
    G2C,
    G2R,
    G3C,
    G3R,
    G6C,
    G6R,
    Dma,
}

/// Source geometry of the full-graphics modes: bits per pixel and the
/// horizontal/vertical replication that stretches the source resolution
/// to 256×192.
fn graphics_geometry(mode: Mode) -> (usize, usize, usize) {
    match mode {
        Mode::G1C => (2, 4, 3), // 64×64, 4 colors
        Mode::G1R => (1, 2, 3), // 128×64
        Mode::G2C => (2, 2, 3), // 128×64
        Mode::G2R => (1, 2, 2), // 128×96
        Mode::G3C => (2, 2, 2), // 128×96
        Mode::G3R => (1, 2, 1), // 128×192
        Mode::G6C => (2, 2, 1), // 128×192
        Mode::G6R => (1, 1, 1), // 256×192
        _ => unreachable!("not a full-graphics mode"),
    }
}

pub struct Vdg {
    sam_mode: u8,
    video_ram_offset: u8,
    /// PIA1 port B bits [7:3], shifted down: GM2 GM1 GM0 ^A/G CSS.
    pia_mode: u8,
    last_frame: [u8; FRAME_WIDTH * FRAME_HEIGHT],
}

impl Vdg {
    pub fn new() -> Self {
        Self {
            sam_mode: 0,
            video_ram_offset: 0,
            pia_mode: 0,
            last_frame: [BLACK; FRAME_WIDTH * FRAME_HEIGHT],
        }
    }

    pub fn reset(&mut self) {
        self.sam_mode = 0;
        self.video_ram_offset = 0;
        self.pia_mode = 0;
    }

    pub fn set_sam_mode(&mut self, mode: u8) {
        self.sam_mode = mode & 0x07;
    }

    pub fn set_video_ram_offset(&mut self, offset: u8) {
        self.video_ram_offset = offset & 0x3F;
    }

    /// `bits` is PIA1 port B shifted right by 3 (GM2 GM1 GM0 ^A/G CSS in
    /// the low 5 bits).
    pub fn set_pia_mode(&mut self, bits: u8) {
        self.pia_mode = bits & 0x1F;
    }

    fn ag(&self) -> bool {
        self.pia_mode & 0x02 != 0
    }

    fn css(&self) -> bool {
        self.pia_mode & 0x01 != 0
    }

    fn gm(&self) -> u8 {
        (self.pia_mode >> 2) & 0x07
    }

    /// GM0 doubles as the ^INT/EXT selector in the alpha modes.
    fn ext(&self) -> bool {
        self.pia_mode & 0x04 != 0
    }

    /// Derive the frame's mode from `sam.video_mode` and the PIA bits.
    /// SAM mode 4 hosts SG12 and mode 6 the taller SG24
    /// (the byte-count-selected pair).
    pub fn current_mode(&self) -> Mode {
        if self.sam_mode == 7 {
            return Mode::Dma;
        }
        if self.ag() {
            return match self.gm() {
                0 => Mode::G1C,
                1 => Mode::G1R,
                2 => Mode::G2C,
                3 => Mode::G2R,
                4 => Mode::G3C,
                5 => Mode::G3R,
                6 => Mode::G6C,
                _ => Mode::G6R,
            };
        }
        match self.sam_mode {
            2 => Mode::Sg8,
            4 => Mode::Sg12,
            6 => Mode::Sg24,
            _ if self.ext() => Mode::AlphaExt,
            _ => Mode::AlphaInt,
        }
    }

    fn video_base(&self) -> u16 {
        (self.video_ram_offset as u16) << 9
    }

    /// Render one frame (256×192 palette indices, row-major) from the raw
    /// 64 KiB bus image. Video RAM is always plain RAM-tagged, so indexing
    /// the array is equivalent to a bus read with no side effects; a pure
    /// function of (RAM, mode bits), so back-to-back calls with no bus
    /// mutation produce identical frames.
    pub fn render(&mut self, ram: &[u8; 0x10000]) -> &[u8; FRAME_WIDTH * FRAME_HEIGHT] {
        let base = self.video_base();
        let mode = self.current_mode();
        match mode {
            Mode::AlphaInt | Mode::AlphaExt => self.render_alpha(ram, base, mode),
            Mode::Sg8 => self.render_sg_stacked(ram, base, 2),
            Mode::Sg12 => self.render_sg_stacked(ram, base, 3),
            Mode::Sg24 => self.render_sg_stacked(ram, base, 6),
            Mode::Dma => self.last_frame.fill(BLACK),
            _ => self.render_graphics(ram, base, mode),
        }
        &self.last_frame
    }

    /// The last frame rendered, without forcing a re-render.
    pub fn last_frame_ref(&self) -> &[u8; FRAME_WIDTH * FRAME_HEIGHT] {
        &self.last_frame
    }

    #[inline]
    fn put(&mut self, x: usize, y: usize, color: u8) {
        self.last_frame[y * FRAME_WIDTH + x] = color;
    }

    fn text_fg(&self) -> u8 {
        if self.css() {
            VDG_COLORS[7] // orange
        } else {
            VDG_COLORS[0] // green
        }
    }

    fn css_subset(&self) -> [u8; 4] {
        if self.css() {
            [VDG_COLORS[4], VDG_COLORS[5], VDG_COLORS[6], VDG_COLORS[7]]
        } else {
            [VDG_COLORS[0], VDG_COLORS[1], VDG_COLORS[2], VDG_COLORS[3]]
        }
    }

    /// ALPHA_INT/ALPHA_EXT, with the per-byte SG4/SG6 escape when bit 7
    /// of the cell is set.
    fn render_alpha(&mut self, ram: &[u8; 0x10000], base: u16, mode: Mode) {
        for row in 0..TEXT_ROWS {
            for col in 0..TEXT_COLS {
                let addr = base.wrapping_add((row * TEXT_COLS + col) as u16);
                let byte = ram[addr as usize];
                let (px, py) = (col * CELL_WIDTH, row * CELL_HEIGHT);
                if byte & 0x80 != 0 {
                    if mode == Mode::AlphaExt {
                        self.draw_sg6_cell(px, py, byte);
                    } else {
                        self.draw_sg4_cell(px, py, byte, CELL_HEIGHT);
                    }
                } else {
                    self.draw_glyph_cell(px, py, byte);
                }
            }
        }
    }

    /// One 8×12 text cell: 6-bit character code, bit 6 inverts video.
    fn draw_glyph_cell(&mut self, px: usize, py: usize, byte: u8) {
        let glyph = &FONT[(byte & 0x3F) as usize];
        let inverted = byte & 0x40 != 0;
        let fg = self.text_fg();
        for fy in 0..CELL_HEIGHT {
            for fx in 0..CELL_WIDTH {
                // 5×7 glyph inset in the 8×12 cell.
                let on = fx >= GLYPH_X && fx < GLYPH_X + 5 && fy >= GLYPH_Y && fy < GLYPH_Y + 7
                    && glyph[fy - GLYPH_Y] & (0x10 >> (fx - GLYPH_X)) != 0;
                let color = if on != inverted { fg } else { BLACK };
                self.put(px + fx, py + fy, color);
            }
        }
    }

    /// SG4 element: color in bits [6:4], luminance bits L3..L0 covering
    /// the cell's upper-left/upper-right/lower-left/lower-right quarters.
    fn draw_sg4_cell(&mut self, px: usize, py: usize, byte: u8, height: usize) {
        let color = VDG_COLORS[((byte >> 4) & 0x07) as usize];
        let half_h = height / 2;
        for fy in 0..height {
            for fx in 0..CELL_WIDTH {
                let quadrant = match (fy >= half_h, fx >= CELL_WIDTH / 2) {
                    (false, false) => 3,
                    (false, true) => 2,
                    (true, false) => 1,
                    (true, true) => 0,
                };
                let on = byte & (1 << quadrant) != 0;
                self.put(px + fx, py + fy, if on { color } else { BLACK });
            }
        }
    }

    /// SG6 element: 2-bit color (bits [7:6]) into the CSS-selected 4-color
    /// subset, luminance bits L5..L0 covering a 2×3 grid of quarters.
    fn draw_sg6_cell(&mut self, px: usize, py: usize, byte: u8) {
        let color = self.css_subset()[((byte >> 6) & 0x03) as usize];
        let third_h = CELL_HEIGHT / 3;
        for fy in 0..CELL_HEIGHT {
            for fx in 0..CELL_WIDTH {
                let grid_row = fy / third_h;
                let grid_col = fx / (CELL_WIDTH / 2);
                let bit = 5 - (grid_row * 2 + grid_col);
                let on = byte & (1 << bit) != 0;
                self.put(px + fx, py + fy, if on { color } else { BLACK });
            }
        }
    }

    /// SG8/SG12/SG24: each 8×12 cell splits vertically into `subcells`
    /// SG4-style elements, one byte each, laid out in successive 32-byte
    /// rows.
    fn render_sg_stacked(&mut self, ram: &[u8; 0x10000], base: u16, subcells: usize) {
        let sub_height = CELL_HEIGHT / subcells;
        for row in 0..TEXT_ROWS {
            for sub in 0..subcells {
                for col in 0..TEXT_COLS {
                    let addr =
                        base.wrapping_add(((row * subcells + sub) * TEXT_COLS + col) as u16);
                    let byte = ram[addr as usize];
                    let (px, py) = (col * CELL_WIDTH, row * CELL_HEIGHT + sub * sub_height);
                    self.draw_sg4_cell(px, py, byte, sub_height);
                }
            }
        }
    }

    /// Full-graphics modes: 1 bpp resolution (pixel on = CSS color) or
    /// 2 bpp color (4 colors from the CSS subset), MSB-first within each
    /// byte, replicated per the mode's ratio to fill 256×192.
    fn render_graphics(&mut self, ram: &[u8; 0x10000], base: u16, mode: Mode) {
        let (bpp, xr, yr) = graphics_geometry(mode);
        let src_cols = FRAME_WIDTH / xr;
        let src_rows = FRAME_HEIGHT / yr;
        let bytes_per_row = src_cols * bpp / 8;
        let subset = self.css_subset();
        let fg = self.text_fg();
        for sy in 0..src_rows {
            for bx in 0..bytes_per_row {
                let addr = base.wrapping_add((sy * bytes_per_row + bx) as u16);
                let byte = ram[addr as usize];
                let pixels_per_byte = 8 / bpp;
                for p in 0..pixels_per_byte {
                    let color = if bpp == 1 {
                        if byte & (0x80 >> p) != 0 {
                            fg
                        } else {
                            BLACK
                        }
                    } else {
                        let idx = (byte >> (6 - p * 2)) & 0x03;
                        subset[idx as usize]
                    };
                    let sx = bx * pixels_per_byte + p;
                    for ry in 0..yr {
                        for rx in 0..xr {
                            self.put(sx * xr + rx, sy * yr + ry, color);
                        }
                    }
                }
            }
        }
    }
}

impl Default for Vdg {
    fn default() -> Self {
        Self::new()
    }
}

/// Glyph inset within the 8×12 cell.
const GLYPH_X: usize = 2;
const GLYPH_Y: usize = 3;

/// The VDG's 64-character internal font, 5×7 pixels per glyph (bit 4 is
/// the leftmost column). Codes 0x00-0x1F are `@`, A-Z and the four
/// specials; 0x20-0x3F are space, punctuation and digits.
const FONT: [[u8; 7]; 64] = [
    [0x0E, 0x11, 0x15, 0x17, 0x16, 0x10, 0x0E], // @
    [0x0E, 0x11, 0x11, 0x1F, 0x11, 0x11, 0x11], // A
    [0x1E, 0x11, 0x11, 0x1E, 0x11, 0x11, 0x1E], // B
    [0x0E, 0x11, 0x10, 0x10, 0x10, 0x11, 0x0E], // C
    [0x1E, 0x11, 0x11, 0x11, 0x11, 0x11, 0x1E], // D
    [0x1F, 0x10, 0x10, 0x1E, 0x10, 0x10, 0x1F], // E
    [0x1F, 0x10, 0x10, 0x1E, 0x10, 0x10, 0x10], // F
    [0x0E, 0x11, 0x10, 0x13, 0x11, 0x11, 0x0F], // G
    [0x11, 0x11, 0x11, 0x1F, 0x11, 0x11, 0x11], // H
    [0x0E, 0x04, 0x04, 0x04, 0x04, 0x04, 0x0E], // I
    [0x01, 0x01, 0x01, 0x01, 0x01, 0x11, 0x0E], // J
    [0x11, 0x12, 0x14, 0x18, 0x14, 0x12, 0x11], // K
    [0x10, 0x10, 0x10, 0x10, 0x10, 0x10, 0x1F], // L
    [0x11, 0x1B, 0x15, 0x15, 0x11, 0x11, 0x11], // M
    [0x11, 0x11, 0x19, 0x15, 0x13, 0x11, 0x11], // N
    [0x0E, 0x11, 0x11, 0x11, 0x11, 0x11, 0x0E], // O
    [0x1E, 0x11, 0x11, 0x1E, 0x10, 0x10, 0x10], // P
    [0x0E, 0x11, 0x11, 0x11, 0x15, 0x12, 0x0D], // Q
    [0x1E, 0x11, 0x11, 0x1E, 0x14, 0x12, 0x11], // R
    [0x0E, 0x11, 0x10, 0x0E, 0x01, 0x11, 0x0E], // S
    [0x1F, 0x04, 0x04, 0x04, 0x04, 0x04, 0x04], // T
    [0x11, 0x11, 0x11, 0x11, 0x11, 0x11, 0x0E], // U
    [0x11, 0x11, 0x11, 0x11, 0x11, 0x0A, 0x04], // V
    [0x11, 0x11, 0x11, 0x15, 0x15, 0x15, 0x0A], // W
    [0x11, 0x11, 0x0A, 0x04, 0x0A, 0x11, 0x11], // X
    [0x11, 0x11, 0x0A, 0x04, 0x04, 0x04, 0x04], // Y
    [0x1F, 0x01, 0x02, 0x04, 0x08, 0x10, 0x1F], // Z
    [0x0E, 0x08, 0x08, 0x08, 0x08, 0x08, 0x0E], // [
    [0x00, 0x10, 0x08, 0x04, 0x02, 0x01, 0x00], // backslash
    [0x0E, 0x02, 0x02, 0x02, 0x02, 0x02, 0x0E], // ]
    [0x04, 0x0E, 0x15, 0x04, 0x04, 0x04, 0x04], // up arrow
    [0x00, 0x04, 0x08, 0x1F, 0x08, 0x04, 0x00], // left arrow
    [0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00], // space
    [0x04, 0x04, 0x04, 0x04, 0x04, 0x00, 0x04], // !
    [0x0A, 0x0A, 0x0A, 0x00, 0x00, 0x00, 0x00], // "
    [0x0A, 0x0A, 0x1F, 0x0A, 0x1F, 0x0A, 0x0A], // #
    [0x04, 0x0F, 0x14, 0x0E, 0x05, 0x1E, 0x04], // $
    [0x18, 0x19, 0x02, 0x04, 0x08, 0x13, 0x03], // %
    [0x08, 0x14, 0x14, 0x08, 0x15, 0x12, 0x0D], // &
    [0x0C, 0x04, 0x08, 0x00, 0x00, 0x00, 0x00], // '
    [0x02, 0x04, 0x08, 0x08, 0x08, 0x04, 0x02], // (
    [0x08, 0x04, 0x02, 0x02, 0x02, 0x04, 0x08], // )
    [0x00, 0x04, 0x15, 0x0E, 0x15, 0x04, 0x00], // *
    [0x00, 0x04, 0x04, 0x1F, 0x04, 0x04, 0x00], // +
    [0x00, 0x00, 0x00, 0x00, 0x0C, 0x04, 0x08], // ,
    [0x00, 0x00, 0x00, 0x1F, 0x00, 0x00, 0x00], // -
    [0x00, 0x00, 0x00, 0x00, 0x00, 0x0C, 0x0C], // .
    [0x00, 0x01, 0x02, 0x04, 0x08, 0x10, 0x00], // /
    [0x0E, 0x11, 0x13, 0x15, 0x19, 0x11, 0x0E], // 0
    [0x04, 0x0C, 0x04, 0x04, 0x04, 0x04, 0x0E], // 1
    [0x0E, 0x11, 0x01, 0x02, 0x04, 0x08, 0x1F], // 2
    [0x1F, 0x02, 0x04, 0x02, 0x01, 0x11, 0x0E], // 3
    [0x02, 0x06, 0x0A, 0x12, 0x1F, 0x02, 0x02], // 4
    [0x1F, 0x10, 0x1E, 0x01, 0x01, 0x11, 0x0E], // 5
    [0x06, 0x08, 0x10, 0x1E, 0x11, 0x11, 0x0E], // 6
    [0x1F, 0x01, 0x02, 0x04, 0x08, 0x08, 0x08], // 7
    [0x0E, 0x11, 0x11, 0x0E, 0x11, 0x11, 0x0E], // 8
    [0x0E, 0x11, 0x11, 0x0F, 0x01, 0x02, 0x0C], // 9
    [0x00, 0x0C, 0x0C, 0x00, 0x0C, 0x0C, 0x00], // :
    [0x00, 0x0C, 0x0C, 0x00, 0x0C, 0x04, 0x08], // ;
    [0x02, 0x04, 0x08, 0x10, 0x08, 0x04, 0x02], // <
    [0x00, 0x00, 0x1F, 0x00, 0x1F, 0x00, 0x00], // =
    [0x08, 0x04, 0x02, 0x01, 0x02, 0x04, 0x08], // >
    [0x0E, 0x11, 0x01, 0x02, 0x04, 0x00, 0x04], // ?
];

#[cfg(test)]
mod tests {
    use super::*;

    fn frame_ram() -> Box<[u8; 0x10000]> {
        Box::new([0u8; 0x10000])
    }

    #[test]
    fn mode_matrix_alpha_and_semigraphics_rows() {
        let mut vdg = Vdg::new();
        for (sam, ext, expected) in [
            (0, false, Mode::AlphaInt),
            (0, true, Mode::AlphaExt),
            (2, false, Mode::Sg8),
            (4, false, Mode::Sg12),
            (6, false, Mode::Sg24),
        ] {
            vdg.set_sam_mode(sam);
            vdg.set_pia_mode(if ext { 0b00100 } else { 0 });
            assert_eq!(vdg.current_mode(), expected, "sam={sam} ext={ext}");
        }
    }

    #[test]
    fn mode_matrix_graphics_rows_follow_gm() {
        let mut vdg = Vdg::new();
        let expected = [
            Mode::G1C,
            Mode::G1R,
            Mode::G2C,
            Mode::G2R,
            Mode::G3C,
            Mode::G3R,
            Mode::G6C,
            Mode::G6R,
        ];
        for sam in 1..=6u8 {
            for (gm, &mode) in expected.iter().enumerate() {
                vdg.set_sam_mode(sam);
                vdg.set_pia_mode(((gm as u8) << 2) | 0x02);
                assert_eq!(vdg.current_mode(), mode, "sam={sam} gm={gm}");
            }
        }
        vdg.set_sam_mode(7);
        assert_eq!(vdg.current_mode(), Mode::Dma);
    }

    #[test]
    fn render_is_idempotent_without_ram_mutation() {
        let ram = frame_ram();
        let mut vdg = Vdg::new();
        let a = *vdg.render(&ram);
        let b = *vdg.render(&ram);
        assert_eq!(a.as_slice(), b.as_slice());
    }

    #[test]
    fn alpha_cell_renders_glyph_rows_in_green() {
        let mut ram = frame_ram();
        ram[0] = 0x01; // 'A', normal video
        let mut vdg = Vdg::new();
        vdg.render(&ram);
        let frame = vdg.last_frame_ref();
        // Glyph row 0 of 'A' is 0b01110: pixels at cell x = 3,4,5.
        let y = GLYPH_Y;
        assert_eq!(frame[y * FRAME_WIDTH + GLYPH_X], PaletteIndex::Black as u8);
        for x in 3..6 {
            assert_eq!(frame[y * FRAME_WIDTH + x], PaletteIndex::Green as u8);
        }
        // CSS selects orange foreground instead.
        vdg.set_pia_mode(0b00001);
        vdg.render(&ram);
        assert_eq!(
            vdg.last_frame_ref()[y * FRAME_WIDTH + 4],
            PaletteIndex::Brown as u8
        );
    }

    #[test]
    fn inverse_video_swaps_foreground_and_background() {
        let mut ram = frame_ram();
        ram[0] = 0x41; // 'A' with bit 6 set
        let mut vdg = Vdg::new();
        vdg.render(&ram);
        let frame = vdg.last_frame_ref();
        let y = GLYPH_Y;
        assert_eq!(frame[y * FRAME_WIDTH + 4], PaletteIndex::Black as u8);
        assert_eq!(frame[y * FRAME_WIDTH + GLYPH_X], PaletteIndex::Green as u8);
    }

    #[test]
    fn sg4_cell_lights_quadrants_with_its_own_color() {
        let mut ram = frame_ram();
        ram[0] = 0x80 | (0x02 << 4) | 0b1000; // blue, upper-left quadrant on
        let mut vdg = Vdg::new();
        vdg.render(&ram);
        let frame = vdg.last_frame_ref();
        assert_eq!(frame[0], PaletteIndex::Blue as u8, "upper-left lit");
        assert_eq!(frame[4], PaletteIndex::Black as u8, "upper-right dark");
        assert_eq!(frame[6 * FRAME_WIDTH], PaletteIndex::Black as u8, "lower-left dark");
    }

    #[test]
    fn g6r_pixels_map_one_to_one_msb_first() {
        let mut ram = frame_ram();
        ram[0] = 0b1010_0000;
        let mut vdg = Vdg::new();
        vdg.set_pia_mode(0b11110); // GM=7 (G6R), ^A/G=1, CSS=0
        vdg.set_sam_mode(6);
        vdg.render(&ram);
        let frame = vdg.last_frame_ref();
        assert_eq!(frame[0], PaletteIndex::Green as u8);
        assert_eq!(frame[1], PaletteIndex::Black as u8);
        assert_eq!(frame[2], PaletteIndex::Green as u8);
    }

    #[test]
    fn g1c_replicates_each_source_pixel_4x3() {
        let mut ram = frame_ram();
        ram[0] = 0b01_00_00_00; // first source pixel = color 1 (yellow)
        let mut vdg = Vdg::new();
        vdg.set_pia_mode(0b00010); // GM=0 (G1C), ^A/G=1
        vdg.set_sam_mode(1);
        vdg.render(&ram);
        let frame = vdg.last_frame_ref();
        for y in 0..3 {
            for x in 0..4 {
                assert_eq!(frame[y * FRAME_WIDTH + x], PaletteIndex::Yellow as u8);
            }
        }
        assert_eq!(frame[4], PaletteIndex::Green as u8, "next source pixel is color 0");
    }

    #[test]
    fn css_selects_the_second_color_subset() {
        let mut ram = frame_ram();
        ram[0] = 0b11_00_00_00;
        let mut vdg = Vdg::new();
        vdg.set_pia_mode(0b00011); // G1C with CSS=1
        vdg.set_sam_mode(1);
        vdg.render(&ram);
        assert_eq!(vdg.last_frame_ref()[0], PaletteIndex::Brown as u8); // orange
    }
}
