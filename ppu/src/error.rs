use thiserror::Error;

/// Errors the CMap allocator reports by return value; the renderer itself
/// has no recoverable error path (malformed state is masked, never panicked
/// on).
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CMapError {
    #[error("no free space for a {width}x{height} block even after defragmentation")]
    AllocExhausted { width: u16, height: u16 },

    #[error("color depth {0} is not one of 2, 4, 8, or is incompatible with the tile dimensions")]
    InvalidDepth(u8),

    #[error("region [{row_offset}, {row_offset_plus_count}) escapes VRAM's character table")]
    OutOfBounds {
        row_offset: u16,
        row_offset_plus_count: u16,
    },

    #[error("block id {0} is unknown to this CMap")]
    NoSuchBlock(u32),
}
