use crate::bg::{self, BgPixel, SCREEN_WIDTH};
use crate::cgram::Cgram;
use crate::color::{Rgba8888, SnesColor};
use crate::colormath;
use crate::mode7;
use crate::obj::{self, ObjPixel};
use crate::priority::{self, LayerSlot};
use crate::registers::Registers;
use crate::window::{self, LAYER_OBJ};
use crate::{PpuState, RenderFlags};

pub const OUTPUT_WIDTH: usize = 512;
pub const OUTPUT_HEIGHT: usize = 168;
const BYTES_PER_PIXEL: usize = 4;

fn sub_screen_is_fixed_color(registers: &Registers) -> bool {
    !(0..=4).any(|layer| registers.sub_screen_enabled(layer))
}

/// Walks the mode's front-to-back priority order and returns the first
/// opaque, enabled, unmasked contribution at column `x` on the requested
/// screen, falling back to the backdrop (or, for an empty sub screen, the
/// fixed color).
fn resolve_screen(
    order: &[LayerSlot],
    bgs: &[Option<Vec<BgPixel>>; 4],
    objs: &[Option<ObjPixel>; SCREEN_WIDTH],
    registers: &Registers,
    cgram: &Cgram,
    x: u8,
    sub: bool,
) -> (SnesColor, u8, Option<u8>) {
    for slot in order {
        match *slot {
            LayerSlot::Obj { priority } => {
                let Some(pixel) = objs[x as usize] else { continue };
                if pixel.priority != priority {
                    continue;
                }
                let enabled = if sub {
                    registers.sub_screen_enabled(LAYER_OBJ)
                } else {
                    registers.main_screen_enabled(LAYER_OBJ)
                };
                let masked = if sub {
                    window::masked_on_sub(registers, LAYER_OBJ, x)
                } else {
                    window::masked_on_main(registers, LAYER_OBJ, x)
                };
                if enabled && !masked {
                    return (pixel.color, LAYER_OBJ, Some(pixel.palette));
                }
            }
            LayerSlot::Bg { bg, tile_priority_high } => {
                let Some(line) = &bgs[bg as usize] else { continue };
                let pixel = &line[x as usize];
                if !pixel.opaque || pixel.priority_high != tile_priority_high {
                    continue;
                }
                let enabled = if sub {
                    registers.sub_screen_enabled(bg)
                } else {
                    registers.main_screen_enabled(bg)
                };
                let masked = if sub {
                    window::masked_on_sub(registers, bg, x)
                } else {
                    window::masked_on_main(registers, bg, x)
                };
                if enabled && !masked {
                    return (pixel.color, bg, None);
                }
            }
        }
    }
    if sub && sub_screen_is_fixed_color(registers) {
        (registers.fixed_color_data, 5, None)
    } else {
        (cgram.backdrop(), 5, None)
    }
}

fn write_pixel(out: &mut [u8], offset: usize, color: Rgba8888) {
    out[offset] = color.r;
    out[offset + 1] = color.g;
    out[offset + 2] = color.b;
    out[offset + 3] = color.a;
}

/// Renders one frame: `512 x 168` RGBA8888, row-major, row stride
/// `OUTPUT_WIDTH * 4` bytes. A pure function of `state`; `out` must be at
/// least `OUTPUT_WIDTH * OUTPUT_HEIGHT * 4` bytes.
pub fn render(state: &PpuState, flags: RenderFlags, out: &mut [u8]) {
    if flags.contains(RenderFlags::DEBUG_WHITE) {
        out.fill(0xFF);
        return;
    }

    let registers = &state.registers;
    let vram = &state.vram;
    let cgram = &state.cgram;
    let oam = &state.oam;
    let mode = registers.mode();
    let order = priority::priority_order(mode, registers.mode1_bg3_priority(), registers.mode7_extbg());
    let hi_res = registers.is_hi_res();
    let stride = OUTPUT_WIDTH * BYTES_PER_PIXEL;

    for y in 0..OUTPUT_HEIGHT as u16 {
        let opt = bg::compute_opt(mode, vram, registers);
        let mut bgs: [Option<Vec<BgPixel>>; 4] = [None, None, None, None];
        if mode == 7 {
            bgs[0] = Some(mode7::render_mode7_scanline(false, y, vram, cgram, registers));
            if registers.mode7_extbg() {
                bgs[1] = Some(mode7::render_mode7_scanline(true, y, vram, cgram, registers));
            }
        } else {
            for bg_index in 0..4u8 {
                if bg::bg_depth(mode, bg_index).is_some() {
                    bgs[bg_index as usize] = Some(bg::render_bg_scanline(
                        bg_index, mode, y, vram, cgram, registers, Some(&opt),
                    ));
                }
            }
        }
        let objs = obj::render_obj_scanline(y, vram, cgram, registers, oam);
        let row_start = y as usize * stride;

        for x in 0..SCREEN_WIDTH {
            let (main_color, main_layer, main_obj_palette) =
                resolve_screen(&order, &bgs, &objs, registers, cgram, x as u8, false);
            let (sub_color, _, _) = resolve_screen(&order, &bgs, &objs, registers, cgram, x as u8, true);

            let col_even = row_start + 2 * x * BYTES_PER_PIXEL;
            let col_odd = col_even + BYTES_PER_PIXEL;

            if hi_res {
                write_pixel(out, col_odd, main_color.to_rgba8());
                write_pixel(out, col_even, sub_color.to_rgba8());
            } else {
                let result = colormath::composite(
                    registers,
                    x as u8,
                    main_layer,
                    main_obj_palette,
                    main_color,
                    sub_color,
                    sub_screen_is_fixed_color(registers),
                );
                let rgba = result.to_rgba8();
                write_pixel(out, col_even, rgba);
                write_pixel(out, col_odd, rgba);
            }
        }
    }
}
