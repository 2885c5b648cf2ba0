use crate::color::SnesColor;
use serde::{Deserialize, Serialize};
use serde_with::serde_as;

pub const CGRAM_SIZE: usize = 0x200;
pub const CGRAM_COLORS: usize = 256;

/// Color Generator RAM: 512 bytes, read through several overlapping logical
/// views depending on the active background mode. All views alias the same
/// backing bytes; none of them owns a separate copy.
#[serde_as]
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Cgram {
    #[serde_as(as = "Box<[_; CGRAM_SIZE]>")]
    bytes: Box<[u8; CGRAM_SIZE]>,
}

impl Default for Cgram {
    fn default() -> Self {
        Self {
            bytes: Box::new([0; CGRAM_SIZE]),
        }
    }
}

impl Cgram {
    pub fn raw(&self) -> &[u8; CGRAM_SIZE] {
        &self.bytes
    }

    pub fn raw_mut(&mut self) -> &mut [u8; CGRAM_SIZE] {
        &mut self.bytes
    }

    /// Flat view: color at absolute index 0..256, used by Mode 7's 256-color BG1.
    pub fn color(&self, index: u8) -> SnesColor {
        let i = index as usize * 2;
        SnesColor(u16::from_le_bytes([self.bytes[i], self.bytes[i + 1]]))
    }

    pub fn set_color(&mut self, index: u8, color: SnesColor) {
        let i = index as usize * 2;
        let [lo, hi] = color.0.to_le_bytes();
        self.bytes[i] = lo;
        self.bytes[i + 1] = hi;
    }

    pub fn backdrop(&self) -> SnesColor {
        self.color(0)
    }

    /// Eight BG palettes of 16 colors, occupying the first 128 entries.
    pub fn bg_palette16(&self, palette: u8, index: u8) -> SnesColor {
        debug_assert!(palette < 8 && index < 16);
        self.color(palette * 16 + index)
    }

    /// Eight BG palettes of 4 colors, occupying the first 32 entries; used
    /// outside Mode 0 by 4-color BGs.
    pub fn bg_palette4(&self, palette: u8, index: u8) -> SnesColor {
        debug_assert!(palette < 8 && index < 4);
        self.color(palette * 4 + index)
    }

    /// Mode 0's four per-BG sets of eight 4-color palettes: BG `bg` (0..4)
    /// owns palettes `bg*8 .. bg*8+8`, each 4 colors, all within entries 0..128.
    pub fn mode0_bg_palette4(&self, bg: u8, palette: u8, index: u8) -> SnesColor {
        debug_assert!(bg < 4 && palette < 8 && index < 4);
        self.color(bg * 32 + palette * 4 + index)
    }

    /// OBJ palettes: eight 16-color palettes fixed in entries 128..256.
    pub fn obj_palette16(&self, palette: u8, index: u8) -> SnesColor {
        debug_assert!(palette < 8 && index < 16);
        self.color(128 + palette * 16 + index)
    }
}
