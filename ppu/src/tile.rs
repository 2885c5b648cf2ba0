use crate::bitwise::Bits;
use crate::color::SnesColor;
use crate::vram::Vram;

/// Encodes one pixel into a bit-planed character, the inverse of
/// [`fetch_pixel`]. `value` is a palette index `0..2^depth`; bits beyond
/// `depth` are ignored. Always writes the canonical (unflipped) cell.
pub fn store_pixel(
    vram: &mut Vram,
    char_base: u32,
    char_index: u16,
    depth: u8,
    row: u8,
    col: u8,
    value: u8,
) {
    let bytes = bytes_per_char(depth);
    for plane in 0..depth {
        let offset = plane_byte_offset(plane, row);
        let mut byte = vram.char_plane_byte(char_base, char_index, bytes, offset);
        let bit = (value >> plane) & 1;
        if bit == 1 {
            byte |= 1 << (7 - col);
        } else {
            byte &= !(1 << (7 - col));
        }
        vram.write_plane_byte(char_base, char_index, bytes, offset, byte);
    }
}

/// The "standard" interpretation of a 2-byte tilemap entry, used by every BG
/// outside the Offset-Per-Tile row/column that BG3 dedicates to OPT in modes
/// 2/4/6.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct StandardTile {
    pub character: u16,
    pub palette: u8,
    pub priority: bool,
    pub flip_x: bool,
    pub flip_y: bool,
}

/// Offset-Per-Tile interpretation of the same 2-byte entry, used when reading
/// BG3's tilemap on behalf of BG1/BG2 scroll adjustment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct OptEntry {
    pub offset: u16,
    pub apply_to_bg1: bool,
    pub apply_to_bg2: bool,
    pub apply_to_vertical: bool,
}

pub fn parse_standard(raw: u16) -> StandardTile {
    StandardTile {
        character: raw.get_bits(0..=9),
        palette: raw.get_bits(10..=12) as u8,
        priority: raw.get_bit(13),
        flip_x: raw.get_bit(14),
        flip_y: raw.get_bit(15),
    }
}

pub fn parse_opt(raw: u16) -> OptEntry {
    OptEntry {
        offset: raw.get_bits(0..=9),
        apply_to_bg1: raw.get_bit(10),
        apply_to_bg2: raw.get_bit(11),
        apply_to_vertical: raw.get_bit(12),
    }
}

/// Bytes occupied by one bit-planed character at the given color depth.
pub fn bytes_per_char(depth: u8) -> u16 {
    match depth {
        2 => 16,
        4 => 32,
        8 => 64,
        _ => 16,
    }
}

/// Offset, within a character, of the plane byte for `plane` at `row`. Plane
/// pairs (0,1), (2,3), (4,5), (6,7) each occupy a 16-byte half of the
/// character; within a pair the even plane is the low byte of the row.
fn plane_byte_offset(plane: u8, row: u8) -> u16 {
    16 * (u16::from(plane) / 2) + 2 * u16::from(row) + (u16::from(plane) % 2)
}

/// Decodes one pixel of a bit-planed character into a palette index
/// `0..2^depth`; index 0 always denotes transparency. `row`/`col` are the
/// *source* (post-flip) tile-relative coordinates in 0..8.
#[allow(clippy::too_many_arguments)]
pub fn fetch_pixel(
    vram: &Vram,
    char_base: u32,
    char_index: u16,
    depth: u8,
    row: u8,
    col: u8,
    flip_x: bool,
    flip_y: bool,
) -> u8 {
    let row = if flip_y { 7 - row } else { row };
    let col = if flip_x { 7 - col } else { col };
    let bytes = bytes_per_char(depth);

    let mut index = 0u8;
    for plane in 0..depth {
        let offset = plane_byte_offset(plane, row);
        let byte = vram.char_plane_byte(char_base, char_index, bytes, offset);
        let bit = (byte >> (7 - col)) & 1;
        index |= bit << plane;
    }
    index
}

/// Direct Color Mode: a 256-color BG tile's 8-bit pixel value supplies the
/// low bits of each 5-bit channel, and the tilemap entry's 3-bit palette
/// field supplies one extra low bit per channel (R, G get bit 1; B gets
/// bit 2), per the SNES's documented direct-color expansion.
pub fn direct_color(pixel: u8, tile_palette: u8) -> SnesColor {
    let r3 = pixel.get_bits(0..=2);
    let g3 = pixel.get_bits(3..=5);
    let b2 = pixel.get_bits(6..=7);

    let pr = u8::from(tile_palette.get_bit(0));
    let pg = u8::from(tile_palette.get_bit(1));
    let pb = u8::from(tile_palette.get_bit(2));

    let r5 = (r3 << 2) | (pr << 1);
    let g5 = (g3 << 2) | (pg << 1);
    let b5 = (b2 << 3) | (pb << 2);
    SnesColor::new(r5, g5, b5)
}
