//! A software reimplementation of the SNES Picture Processing Unit: given a
//! faithful model of its memories (CGRAM, VRAM, OAM) and register bank, the
//! crate rasterizes one frame exactly as the hardware's scanline renderer
//! would, plus a standalone sub-allocator for VRAM's character-tile space.
//!
//! The renderer is a pure function, [`render`], of a [`PpuState`] snapshot
//! and a set of [`RenderFlags`]; it owns no state of its own and performs no
//! I/O. [`cmap::CMap`] is the separate VRAM character-table allocator used
//! by callers that need to pack arbitrary tile graphics into VRAM before a
//! frame is rendered.

pub mod bg;
pub mod bitwise;
pub mod cgram;
pub mod cmap;
pub mod color;
pub mod colormath;
pub mod error;
pub mod mode7;
pub mod oam;
pub mod obj;
pub mod priority;
pub mod registers;
mod render;
pub mod tile;
pub mod vram;
pub mod window;

use serde::{Deserialize, Serialize};

pub use cgram::Cgram;
pub use cmap::{BlockHandle, CMap};
pub use error::CMapError;
pub use oam::Oam;
pub use registers::Registers;
pub use render::{render, OUTPUT_HEIGHT, OUTPUT_WIDTH};
pub use vram::Vram;

bitflags::bitflags! {
    /// Flags accepted by [`render`]. `DEBUG_WHITE` overrides the entire
    /// frame to opaque white, a fast way to confirm the renderer is wired
    /// up at all before trusting any pixel it produces.
    #[derive(Default)]
    pub struct RenderFlags: u32 {
        const DEBUG_WHITE = 1 << 0;
    }
}

/// Everything [`render`] reads: the caller owns this, mutates it between
/// frames, and the renderer only ever borrows it immutably.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PpuState {
    pub cgram: Cgram,
    pub vram: Vram,
    pub oam: Oam,
    pub registers: Registers,
}
