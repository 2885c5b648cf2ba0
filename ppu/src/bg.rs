use crate::bitwise::sign_extend;
use crate::cgram::Cgram;
use crate::color::SnesColor;
use crate::registers::Registers;
use crate::tile::{self, parse_opt, parse_standard};
use crate::vram::Vram;

pub const SCREEN_WIDTH: usize = 256;

/// One pixel produced by a BG's scanline unit: a resolved color, whether it
/// is transparent, and the tile's own high/low priority bit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct BgPixel {
    pub color: SnesColor,
    pub opaque: bool,
    pub priority_high: bool,
}

/// Bit depth in bits-per-pixel of BG `bg` (0-indexed) under `mode`, or `None`
/// if that BG does not exist in the mode. Mirrors the hardware's mode table.
pub fn bg_depth(mode: u8, bg: u8) -> Option<u8> {
    match (mode, bg) {
        (0, 0..=3) => Some(2),
        (1, 0 | 1) => Some(4),
        (1, 2) => Some(2),
        (2, 0 | 1) => Some(4),
        (3, 0) => Some(8),
        (3, 1) => Some(4),
        (4, 0) => Some(8),
        (4, 1) => Some(2),
        (5, 0) => Some(4),
        (5, 1) => Some(2),
        (6, 0) => Some(4),
        (7, 0) => Some(8),
        _ => None,
    }
}

/// Per-column Offset-Per-Tile deltas read from BG3, applied to BG1/BG2 in
/// modes 2, 4 and 6. Column 0 is never offset.
#[derive(Debug, Clone)]
pub struct OptTable {
    pub h_offset: [i32; SCREEN_WIDTH],
    pub v_offset: [i32; SCREEN_WIDTH],
    /// `(applies_to_bg1, applies_to_bg2)` for the horizontal-offset read.
    pub h_applies: [(bool, bool); SCREEN_WIDTH],
    pub v_applies: [(bool, bool); SCREEN_WIDTH],
}

impl Default for OptTable {
    fn default() -> Self {
        Self {
            h_offset: [0; SCREEN_WIDTH],
            v_offset: [0; SCREEN_WIDTH],
            h_applies: [(false, false); SCREEN_WIDTH],
            v_applies: [(false, false); SCREEN_WIDTH],
        }
    }
}

const BG3: u8 = 2;

/// Reads BG3's tilemap at a fixed tile row (`0` for the horizontal-offset
/// plane, `16` for the vertical one), at the tile column that screen column
/// `screen_x` falls into after BG3's own horizontal scroll.
fn opt_raw_entry(vram: &Vram, registers: &Registers, screen_x: i32, tile_row: i32) -> u16 {
    let w = if registers.bg_size_x_large(BG3) { 512 } else { 256 };
    let scroll_x = registers.bg_scroll_x(BG3, false);
    let effective_x = (screen_x + scroll_x).rem_euclid(w);
    let tx = (effective_x / 8) as u32;

    let block_x = tx / 32;
    let local_tx = tx % 32;
    let base_word = registers.bg_tilemap_base_word(BG3) + block_x * 0x400;
    vram.tile_entry(base_word, local_tx, tile_row as u32 % 32)
}

pub fn compute_opt(mode: u8, vram: &Vram, registers: &Registers) -> OptTable {
    let mut table = OptTable::default();
    if !matches!(mode, 2 | 4 | 6) {
        return table;
    }

    for c in 1..SCREEN_WIDTH {
        let screen_x = c as i32 - 1;
        if mode == 4 {
            let raw = opt_raw_entry(vram, registers, screen_x, 0);
            let opt = parse_opt(raw);
            let offset = sign_extend(u32::from(opt.offset), 10) & !0b111;
            if opt.apply_to_vertical {
                table.v_offset[c] = offset;
                table.v_applies[c] = (opt.apply_to_bg1, opt.apply_to_bg2);
            } else {
                table.h_offset[c] = offset;
                table.h_applies[c] = (opt.apply_to_bg1, opt.apply_to_bg2);
            }
        } else {
            let h = parse_opt(opt_raw_entry(vram, registers, screen_x, 0));
            let v = parse_opt(opt_raw_entry(vram, registers, screen_x, 16));
            table.h_offset[c] = sign_extend(u32::from(h.offset), 10) & !0b111;
            table.h_applies[c] = (h.apply_to_bg1, h.apply_to_bg2);
            table.v_offset[c] = sign_extend(u32::from(v.offset), 10) & !0b111;
            table.v_applies[c] = (v.apply_to_bg1, v.apply_to_bg2);
        }
    }
    table
}

/// Screen-block arrangement for a tile position beyond a single 32x32
/// tilemap: TL, TR, BL, BR in ascending VRAM order.
fn screen_block_index(tx: u32, ty: u32, size_x_large: bool, size_y_large: bool) -> (u32, u32, u32) {
    let block_x = if size_x_large { tx / 32 } else { 0 };
    let block_y = if size_y_large { ty / 32 } else { 0 };
    let block = match (size_x_large, size_y_large) {
        (false, false) => 0,
        (true, false) => block_x,
        (false, true) => block_y,
        (true, true) => block_y * 2 + block_x,
    };
    (block, tx % 32, ty % 32)
}

/// Renders one scanline of BG `bg` (0-indexed) under the given mode into 256
/// palette-resolved pixels, honoring mosaic, scroll, tilemap size, 8x8/16x16
/// tiles and Offset-Per-Tile.
pub fn render_bg_scanline(
    bg: u8,
    mode: u8,
    y: u16,
    vram: &Vram,
    cgram: &Cgram,
    registers: &Registers,
    opt: Option<&OptTable>,
) -> Vec<BgPixel> {
    let depth = bg_depth(mode, bg).unwrap_or(2);
    let large_tile = registers.bg_tile_size_large(bg);
    let tile_px = if large_tile { 16 } else { 8 };

    let w = if registers.bg_size_x_large(bg) { 512 } else { 256 };
    let h = if registers.bg_size_y_large(bg) { 512 } else { 256 };

    let mosaic_on = registers.mosaic_enabled(bg) && registers.mosaic_size() > 0;
    let grid = i32::from(registers.mosaic_size()) + 1;

    let scroll_x = registers.bg_scroll_x(bg, false);
    let scroll_y = registers.bg_scroll_y(bg, false);

    let mut out = Vec::with_capacity(SCREEN_WIDTH);
    for x in 0..SCREEN_WIDTH {
        let (src_x, src_y) = if mosaic_on {
            (
                (x as i32 / grid) * grid,
                (i32::from(y) / grid) * grid,
            )
        } else {
            (x as i32, i32::from(y))
        };

        let mut effective_x = (src_x + scroll_x).rem_euclid(w);
        let mut effective_y = (src_y + scroll_y).rem_euclid(h);

        if let Some(table) = opt.filter(|_| bg == 0 || bg == 1) {
            let (h_bg1, h_bg2) = table.h_applies[x];
            let applies_h = if bg == 0 { h_bg1 } else { h_bg2 };
            if applies_h {
                effective_x = (effective_x + table.h_offset[x]).rem_euclid(w);
            }
            let (v_bg1, v_bg2) = table.v_applies[x];
            let applies_v = if bg == 0 { v_bg1 } else { v_bg2 };
            if applies_v {
                effective_y = (effective_y + table.v_offset[x]).rem_euclid(h);
            }
        }

        let tx = (effective_x / tile_px) as u32;
        let ty = (effective_y / tile_px) as u32;
        let (block, local_tx, local_ty) = screen_block_index(
            tx,
            ty,
            registers.bg_size_x_large(bg),
            registers.bg_size_y_large(bg),
        );
        let base_word = registers.bg_tilemap_base_word(bg) + block * 0x400;
        let raw = vram.tile_entry(base_word, local_tx, local_ty);
        let tile = parse_standard(raw);

        let px = (effective_x % tile_px) as u8;
        let py = (effective_y % tile_px) as u8;

        let (char_offset, sub_row, sub_col) = if large_tile {
            let qx = px / 8;
            let qy = py / 8;
            let eff_qx = if tile.flip_x { 1 - qx } else { qx };
            let eff_qy = if tile.flip_y { 1 - qy } else { qy };
            (u16::from(eff_qy) * 16 + u16::from(eff_qx), py % 8, px % 8)
        } else {
            (0, py, px)
        };

        let char_index = tile.character.wrapping_add(char_offset);
        let char_base = registers.bg_char_base_word(bg);
        let palette_index = tile::fetch_pixel(
            vram, char_base, char_index, depth, sub_row, sub_col, tile.flip_x, tile.flip_y,
        );

        let color = if palette_index == 0 {
            SnesColor::default()
        } else if registers.direct_color_mode() && depth == 8 {
            tile::direct_color(palette_index, tile.palette)
        } else {
            match (mode, depth) {
                (0, _) => cgram.mode0_bg_palette4(bg, tile.palette, palette_index),
                (_, 2) => cgram.bg_palette4(tile.palette, palette_index),
                (_, 4) => cgram.bg_palette16(tile.palette, palette_index),
                (_, 8) => cgram.color(palette_index),
                _ => cgram.backdrop(),
            }
        };

        out.push(BgPixel {
            color,
            opaque: palette_index != 0,
            priority_high: tile.priority,
        });
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::color::SnesColor;
    use pretty_assertions::assert_eq;

    fn char16_with_plane0_row0_bit7(vram: &mut Vram, char_base: u32, char_index: u16) {
        let addr = char_base + u32::from(char_index) * 32;
        vram.raw_mut()[addr as usize] = 0b1000_0000;
        vram.raw_mut()[addr as usize + 1] = 0b1000_0000;
    }

    #[test]
    fn scenario_s3_bg1_4bpp_white_pixel() {
        let mut vram = Vram::default();
        let mut registers = Registers {
            bg_mode: 1,
            bg_char_base: [4, 0],
            ..Default::default()
        };
        registers.bg_size_and_tile_base[0] = 0; // base word 0, 32x32
        char16_with_plane0_row0_bit7(&mut vram, 0x8000, 0);

        let mut cgram = Cgram::default();
        cgram.set_color(3, SnesColor::new(31, 31, 31));

        let scan = render_bg_scanline(0, 1, 0, &vram, &cgram, &registers, None);
        assert_eq!(scan[0].color, SnesColor::new(31, 31, 31));
        assert!(scan[0].opaque);
        assert!(!scan[1].opaque);
    }

    #[test]
    fn scenario_s5_mosaic_quantizes_a_2x2_block_to_the_top_left_pixel() {
        let mut vram = Vram::default();
        let mut registers = Registers {
            bg_mode: 1,
            bg_char_base: [4, 0],
            mosaic: 0b0000_0001 | (1 << 4), // enable bg1, size=1 (grid 2)
            ..Default::default()
        };
        registers.bg_size_and_tile_base[0] = 0;
        char16_with_plane0_row0_bit7(&mut vram, 0x8000, 0);
        let mut cgram = Cgram::default();
        cgram.set_color(3, SnesColor::new(31, 31, 31));

        let row0 = render_bg_scanline(0, 1, 0, &vram, &cgram, &registers, None);
        let row1 = render_bg_scanline(0, 1, 1, &vram, &cgram, &registers, None);
        assert_eq!(row0[0].color, row0[1].color);
        assert_eq!(row0[0].color, row1[0].color);
        assert_eq!(row0[0].color, row1[1].color);
    }

    #[test]
    fn opt_table_leaves_column_zero_unoffset() {
        let vram = Vram::default();
        let registers = Registers {
            bg_mode: 2,
            ..Default::default()
        };
        let opt = compute_opt(2, &vram, &registers);
        assert_eq!(opt.h_offset[0], 0);
        assert_eq!(opt.h_applies[0], (false, false));
    }
}
