use serde::{Deserialize, Serialize};

/// A 15-bit BGR color as stored in CGRAM: `0bbbbbgg gggrrrrr` little-endian.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SnesColor(pub u16);

/// 24-bit RGBA, the renderer's single output pixel format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Rgba8888 {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Rgba8888 {
    pub const WHITE: Self = Self {
        r: 255,
        g: 255,
        b: 255,
        a: 255,
    };

    pub const BLACK: Self = Self {
        r: 0,
        g: 0,
        b: 0,
        a: 255,
    };

    pub fn to_bytes(self) -> [u8; 4] {
        [self.r, self.g, self.b, self.a]
    }
}

/// Stretches a 5-bit channel into an 8-bit one by replicating its top 3 bits
/// into the low bits, so that `0x1F` maps to `0xFF` and `0x00` stays `0x00`.
fn stretch_5_to_8(c5: u8) -> u8 {
    debug_assert!(c5 <= 0b1_1111);
    (c5 << 3) | (c5 >> 2)
}

/// Discards the low 3 bits of an 8-bit channel back to 5 bits.
fn compress_8_to_5(c8: u8) -> u8 {
    c8 >> 3
}

impl SnesColor {
    pub fn new(r5: u8, g5: u8, b5: u8) -> Self {
        let r = (r5 & 0x1F) as u16;
        let g = (g5 & 0x1F) as u16;
        let b = (b5 & 0x1F) as u16;
        Self(r | (g << 5) | (b << 10))
    }

    pub fn r5(self) -> u8 {
        (self.0 & 0x1F) as u8
    }

    pub fn g5(self) -> u8 {
        ((self.0 >> 5) & 0x1F) as u8
    }

    pub fn b5(self) -> u8 {
        ((self.0 >> 10) & 0x1F) as u8
    }

    pub fn to_rgba8(self) -> Rgba8888 {
        Rgba8888 {
            r: stretch_5_to_8(self.r5()),
            g: stretch_5_to_8(self.g5()),
            b: stretch_5_to_8(self.b5()),
            a: 255,
        }
    }

    pub fn from_rgba8(rgba: Rgba8888) -> Self {
        Self::new(
            compress_8_to_5(rgba.r),
            compress_8_to_5(rgba.g),
            compress_8_to_5(rgba.b),
        )
    }

    /// Per-channel clamped add or subtract used by color math, operating
    /// directly in 5-bit space.
    pub fn combine(self, other: Self, subtract: bool) -> Self {
        let comb = |a: u8, b: u8| -> u8 {
            if subtract {
                a.saturating_sub(b)
            } else {
                (a + b).min(31)
            }
        };
        Self::new(
            comb(self.r5(), other.r5()),
            comb(self.g5(), other.g5()),
            comb(self.b5(), other.b5()),
        )
    }

    pub fn halved(self) -> Self {
        Self::new(self.r5() >> 1, self.g5() >> 1, self.b5() >> 1)
    }
}
