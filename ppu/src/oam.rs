use crate::bitwise::{sign_extend, Bits};
use serde::{Deserialize, Serialize};
use serde_with::serde_as;

pub const OAM_PRIMARY_COUNT: usize = 128;
pub const OAM_PRIMARY_SIZE: usize = OAM_PRIMARY_COUNT * 4;
pub const OAM_SECONDARY_SIZE: usize = 32;
pub const OAM_SIZE: usize = OAM_PRIMARY_SIZE + OAM_SECONDARY_SIZE;

/// Object Attribute Memory: 128 primary 4-byte sprite entries followed by 32
/// secondary bytes, each packing the extra X9/size bit pair for four
/// sprites.
#[serde_as]
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Oam {
    #[serde_as(as = "Box<[_; OAM_SIZE]>")]
    bytes: Box<[u8; OAM_SIZE]>,
}

impl Default for Oam {
    fn default() -> Self {
        Self {
            bytes: Box::new([0; OAM_SIZE]),
        }
    }
}

/// A primary sprite entry decoded from its 4 raw bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Sprite {
    pub x: i16,
    pub y: u8,
    pub character: u8,
    pub name_table: u8,
    pub palette: u8,
    pub priority: u8,
    pub flip_x: bool,
    pub flip_y: bool,
    pub large: bool,
}

impl Oam {
    pub fn raw(&self) -> &[u8; OAM_SIZE] {
        &self.bytes
    }

    pub fn raw_mut(&mut self) -> &mut [u8; OAM_SIZE] {
        &mut self.bytes
    }

    fn primary(&self, idx: u8) -> [u8; 4] {
        let base = idx as usize * 4;
        [
            self.bytes[base],
            self.bytes[base + 1],
            self.bytes[base + 2],
            self.bytes[base + 3],
        ]
    }

    /// The secondary table packs 4 sprites per byte, 2 bits each: bit 0 is
    /// X9, bit 1 is the size-select bit. The sprite's own index modulo 4
    /// (not the index of whichever small sprite last wrote it) selects the
    /// bit pair.
    fn secondary_bits(&self, idx: u8) -> (bool, bool) {
        let byte = self.bytes[OAM_PRIMARY_SIZE + idx as usize / 4];
        let shift = (idx % 4) * 2;
        (byte.get_bit(shift), byte.get_bit(shift + 1))
    }

    /// Decodes sprite `idx` (0..128), resolving its 9-bit signed X and
    /// large/small size selection from the secondary table.
    pub fn sprite(&self, idx: u8) -> Sprite {
        let [x_lo, y, character, attrs] = self.primary(idx);
        let (x9, large) = self.secondary_bits(idx);
        let x9_val: u32 = u32::from(x_lo) | (u32::from(x9) << 8);

        Sprite {
            x: sign_extend(x9_val, 9) as i16,
            y,
            character,
            name_table: u8::from(attrs.get_bit(0)),
            palette: attrs.get_bits(1..=3),
            priority: attrs.get_bits(4..=5),
            flip_x: attrs.get_bit(6),
            flip_y: attrs.get_bit(7),
            large,
        }
    }

    pub fn set_sprite_raw(&mut self, idx: u8, x: u8, y: u8, character: u8, attrs: u8) {
        let base = idx as usize * 4;
        self.bytes[base] = x;
        self.bytes[base + 1] = y;
        self.bytes[base + 2] = character;
        self.bytes[base + 3] = attrs;
    }

    pub fn set_secondary_bits(&mut self, idx: u8, x9: bool, large: bool) {
        let byte_idx = OAM_PRIMARY_SIZE + idx as usize / 4;
        let shift = (idx % 4) * 2;
        let mut byte = self.bytes[byte_idx];
        byte.set_bit(shift, x9);
        byte.set_bit(shift + 1, large);
        self.bytes[byte_idx] = byte;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn sprite_decodes_attribute_byte_fields() {
        let mut oam = Oam::default();
        // name=1, palette=5 (0b101), priority=2 (0b10), flipX=1, flipY=0
        let attrs = 1 | (0b101 << 1) | (0b10 << 4) | (1 << 6);
        oam.set_sprite_raw(3, 10, 20, 7, attrs);
        let s = oam.sprite(3);
        assert_eq!(s.x, 10);
        assert_eq!(s.y, 20);
        assert_eq!(s.character, 7);
        assert_eq!(s.name_table, 1);
        assert_eq!(s.palette, 5);
        assert_eq!(s.priority, 2);
        assert!(s.flip_x);
        assert!(!s.flip_y);
    }

    #[test]
    fn negative_x9_wraps_to_negative_coordinate() {
        let mut oam = Oam::default();
        oam.set_sprite_raw(0, 0xF0, 0, 0, 0);
        oam.set_secondary_bits(0, true, false);
        let s = oam.sprite(0);
        assert_eq!(s.x, -16);
    }

    #[test]
    fn secondary_bits_are_selected_by_sprite_index_modulo_4_consistently() {
        let mut oam = Oam::default();
        oam.set_secondary_bits(4, true, false); // byte 1, bit pair 0 (idx 4 % 4 == 0)
        oam.set_secondary_bits(7, false, true); // byte 1, bit pair 3 (idx 7 % 4 == 3)
        assert_eq!(oam.sprite(4).x, -256);
        assert!(!oam.sprite(4).large);
        assert_eq!(oam.sprite(7).x, 0);
        assert!(oam.sprite(7).large);
    }
}
