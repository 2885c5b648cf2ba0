use crate::cgram::Cgram;
use crate::color::SnesColor;
use crate::oam::Oam;
use crate::registers::Registers;
use crate::tile;
use crate::vram::Vram;

pub const SCREEN_WIDTH: usize = 256;

/// `(small_w, small_h, large_w, large_h)` indexed by `objSizeAndBase.objSize`.
const OBJ_SIZE_TABLE: [(u8, u8, u8, u8); 8] = [
    (8, 8, 16, 16),
    (8, 8, 32, 32),
    (8, 8, 64, 64),
    (16, 16, 32, 32),
    (16, 16, 64, 64),
    (32, 32, 64, 64),
    (16, 32, 32, 64),
    (16, 32, 32, 32),
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ObjPixel {
    pub color: SnesColor,
    pub priority: u8,
    pub palette: u8,
}

/// Resolves which sprite, if any, wins each of the 256 columns on scanline
/// `y`. Only one winner can exist per column: the lowest-index sprite that
/// writes an opaque pixel there.
pub fn render_obj_scanline(
    y: u16,
    vram: &Vram,
    cgram: &Cgram,
    registers: &Registers,
    oam: &Oam,
) -> [Option<ObjPixel>; SCREEN_WIDTH] {
    let mut scanline: [Option<ObjPixel>; SCREEN_WIDTH] = [None; SCREEN_WIDTH];
    let (small_w, small_h, large_w, large_h) = OBJ_SIZE_TABLE[registers.obj_size() as usize % 8];

    for idx in 0..128u8 {
        let sprite = oam.sprite(idx);
        let (width, height) = if sprite.large {
            (large_w, large_h)
        } else {
            (small_w, small_h)
        };

        let dy = (i32::from(y) - i32::from(sprite.y)).rem_euclid(256);
        if dy >= i32::from(height) {
            continue;
        }
        let mut row_in_sprite = dy as u8;
        if sprite.flip_y {
            row_in_sprite = height - 1 - row_in_sprite;
        }

        let base_char_addr =
            registers.obj_base_addr() + u32::from(sprite.name_table) * registers.obj_base_gap();

        for x_in_sprite in 0..width {
            let sx = i32::from(sprite.x) + i32::from(x_in_sprite);
            if !(0..SCREEN_WIDTH as i32).contains(&sx) {
                continue;
            }
            if scanline[sx as usize].is_some() {
                continue;
            }

            let col_in_sprite = if sprite.flip_x {
                width - 1 - x_in_sprite
            } else {
                x_in_sprite
            };

            let char_row = u16::from(row_in_sprite / 8);
            let char_col = u16::from(col_in_sprite / 8);
            let char_index = (u16::from(sprite.character) + char_row * 16 + char_col) % 256;

            let palette_index = tile::fetch_pixel(
                vram,
                base_char_addr,
                char_index,
                4,
                row_in_sprite % 8,
                col_in_sprite % 8,
                false,
                false,
            );
            if palette_index == 0 {
                continue;
            }

            scanline[sx as usize] = Some(ObjPixel {
                color: cgram.obj_palette16(sprite.palette, palette_index),
                priority: sprite.priority,
                palette: sprite.palette,
            });
        }
    }
    scanline
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn setup_green_small_sprite() -> (Vram, Cgram, Registers, Oam) {
        let mut vram = Vram::default();
        // char 0, plane0 row0 bit7 set -> column 0 palette index bit0=1
        vram.raw_mut()[0] = 0b1000_0000;

        let mut cgram = Cgram::default();
        cgram.set_color(128 + 1, SnesColor::new(0, 31, 0));

        let registers = Registers::default();
        let mut oam = Oam::default();
        // name=0, palette=0, priority=3, no flip
        let attrs = 0 | (0 << 1) | (0b11 << 4);
        oam.set_sprite_raw(0, 10, 20, 0, attrs);
        (vram, cgram, registers, oam)
    }

    #[test]
    fn scenario_s2_single_obj_renders_green_line_at_its_row() {
        let (vram, cgram, registers, oam) = setup_green_small_sprite();
        let scan = render_obj_scanline(20, &vram, &cgram, &registers, &oam);
        assert_eq!(scan[10].unwrap().color, SnesColor::new(0, 31, 0));
        assert!(scan[9].is_none());
        assert!(scan[18].is_none());
    }

    #[test]
    fn scenario_s4_flip_y_moves_the_opaque_row_within_the_sprite() {
        let mut vram = Vram::default();
        vram.raw_mut()[7 * 2] = 0b1000_0000; // plane0 row7
        let mut cgram = Cgram::default();
        cgram.set_color(128 + 1, SnesColor::new(0, 31, 0));
        let registers = Registers::default();
        let mut oam = Oam::default();
        let attrs = 0b1000_0000; // flipY=1
        oam.set_sprite_raw(0, 10, 20, 0, attrs);

        let scan_at_27 = render_obj_scanline(27, &vram, &cgram, &registers, &oam);
        let scan_at_20 = render_obj_scanline(20, &vram, &cgram, &registers, &oam);
        assert!(scan_at_20[10].is_some());
        assert!(scan_at_27[10].is_none());
    }

    #[test]
    fn lower_index_sprite_wins_overlap() {
        let mut vram = Vram::default();
        vram.raw_mut()[0] = 0b1000_0000;
        let mut cgram = Cgram::default();
        cgram.set_color(128, SnesColor::new(10, 10, 10));
        cgram.set_color(128 + 16, SnesColor::new(20, 20, 20));
        let registers = Registers::default();
        let mut oam = Oam::default();
        oam.set_sprite_raw(0, 5, 0, 0, 0); // palette 0
        oam.set_sprite_raw(1, 5, 0, 0, 1 << 1); // palette 1, same position

        let scan = render_obj_scanline(0, &vram, &cgram, &registers, &oam);
        assert_eq!(scan[5].unwrap().color, SnesColor::new(10, 10, 10));
    }
}
