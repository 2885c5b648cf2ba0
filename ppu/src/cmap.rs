use std::collections::HashMap;

use logger::log;

use crate::error::CMapError;
use crate::tile;
use crate::vram::{Vram, VRAM_SIZE};

/// A four-color character slot: 16 bytes, the allocator's native unit of
/// space. A depth-`d` 8x8 character costs `d / 2` of these.
const SLOT_BYTES: u32 = 16;
const SLOTS_PER_ROW: u32 = 32;

/// Handle to a block owned by a [`CMap`]. Opaque outside this module; once
/// [`CMap::free`] drops the block, further lookups return
/// [`CMapError::NoSuchBlock`] rather than reading stale state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BlockHandle(u32);

/// One contiguous physical run backing some prefix of a block's flat,
/// row-major tile sequence. The allocator only ever produces a single run
/// per block (defragmentation always yields one contiguous home before a
/// request is retried), but the field stays a `Vec` so a block's placement
/// can be inspected generically regardless of how it got there.
#[derive(Debug, Clone, Copy)]
struct PlacementRun {
    start_tile: u32,
    tile_count: u32,
    physical_slot: u32,
}

#[derive(Debug)]
struct Block {
    depth: u8,
    w: u16,
    h: u16,
    tw: u16,
    th: u16,
    tile_slots: u32,
    placement: Vec<PlacementRun>,
    pixels: Option<Vec<u8>>,
}

impl Block {
    fn total_tiles(&self) -> u32 {
        u32::from(self.w) * u32::from(self.h)
    }

    fn total_slots(&self) -> u32 {
        self.total_tiles() * self.tile_slots
    }

    fn physical_slot_for_tile(&self, flat_tile: u32) -> Option<u32> {
        self.placement.iter().find_map(|run| {
            (flat_tile >= run.start_tile && flat_tile < run.start_tile + run.tile_count)
                .then(|| run.physical_slot + (flat_tile - run.start_tile) * self.tile_slots)
        })
    }
}

/// A sub-allocator over a region of VRAM's character table, handing out
/// rectangular blocks of tiles at a caller-chosen color depth and tile size.
///
/// The region is `row_count` rows of 32 four-color characters (512 bytes
/// each) starting `row_offset` rows into `base_addr`. Allocation is
/// first-fit over a row-major free list; a request that doesn't fit
/// triggers one defragmentation pass (repacking every live block to the low
/// side, in allocation order) before it's retried and finally failed.
#[derive(Debug)]
pub struct CMap {
    base_addr: u32,
    region_slots: u32,
    free_ranges: Vec<(u32, u32)>,
    blocks: HashMap<u32, Block>,
    insertion_order: Vec<u32>,
    next_id: u32,
}

impl CMap {
    pub fn create(base_addr: u32, row_offset: u16, row_count: u16) -> Result<Self, CMapError> {
        let region_slots = u32::from(row_count) * SLOTS_PER_ROW;
        let region_bytes = u64::from(row_offset) * u64::from(SLOTS_PER_ROW) * u64::from(SLOT_BYTES)
            + u64::from(region_slots) * u64::from(SLOT_BYTES);
        if u64::from(base_addr) + region_bytes > VRAM_SIZE as u64 {
            log(format!(
                "CMap region [{row_offset}, {}) at base 0x{base_addr:X} escapes VRAM",
                row_offset + row_count
            ));
            return Err(CMapError::OutOfBounds {
                row_offset,
                row_offset_plus_count: row_offset + row_count,
            });
        }
        let region_start = base_addr + u32::from(row_offset) * SLOTS_PER_ROW * SLOT_BYTES;
        Ok(Self {
            base_addr: region_start,
            region_slots,
            free_ranges: vec![(0, region_slots)],
            blocks: HashMap::new(),
            insertion_order: Vec::new(),
            next_id: 0,
        })
    }

    fn find_fit(&self, slots: u32) -> Option<usize> {
        self.free_ranges
            .iter()
            .position(|&(_, len)| len >= slots)
    }

    fn take_range(&mut self, idx: usize, slots: u32) -> u32 {
        let (start, len) = self.free_ranges[idx];
        if len == slots {
            self.free_ranges.remove(idx);
        } else {
            self.free_ranges[idx] = (start + slots, len - slots);
        }
        start
    }

    fn release_range(&mut self, start: u32, len: u32) {
        self.free_ranges.push((start, len));
        self.free_ranges.sort_unstable_by_key(|&(s, _)| s);
        let mut merged: Vec<(u32, u32)> = Vec::with_capacity(self.free_ranges.len());
        for &(s, l) in &self.free_ranges {
            if let Some(last) = merged.last_mut() {
                let (ls, ll): &mut (u32, u32) = last;
                if *ls + *ll == s {
                    *ll += l;
                    continue;
                }
            }
            merged.push((s, l));
        }
        self.free_ranges = merged;
    }

    /// Packs every live block to the low side of the region, in the order
    /// each was allocated, leaving one contiguous free range at the end.
    fn defragment(&mut self) {
        let mut cursor = 0u32;
        for id in self.insertion_order.clone() {
            let block = self.blocks.get_mut(&id).expect("insertion_order tracks live blocks");
            let tiles = block.total_tiles();
            let slots = block.total_slots();
            block.placement = vec![PlacementRun {
                start_tile: 0,
                tile_count: tiles,
                physical_slot: cursor,
            }];
            cursor += slots;
        }
        self.free_ranges = if cursor < self.region_slots {
            vec![(cursor, self.region_slots - cursor)]
        } else {
            Vec::new()
        };
    }

    pub fn alloc(&mut self, depth: u8, w: u16, h: u16, tw: u16, th: u16) -> Result<BlockHandle, CMapError> {
        if !matches!(depth, 2 | 4 | 8) {
            log(format!("CMap alloc rejected: color depth {depth} is not 2, 4, or 8"));
            return Err(CMapError::InvalidDepth(depth));
        }
        if tw == 0 || th == 0 || tw % 8 != 0 || th % 8 != 0 {
            log(format!("CMap alloc rejected: tile size {tw}x{th} is not a multiple of 8x8"));
            return Err(CMapError::InvalidDepth(depth));
        }
        let tile_slots = u32::from(tw / 8) * u32::from(th / 8) * (u32::from(depth) / 2);
        let total_slots = u32::from(w) * u32::from(h) * tile_slots;

        let start = match self.find_fit(total_slots) {
            Some(idx) => self.take_range(idx, total_slots),
            None => {
                self.defragment();
                match self.find_fit(total_slots) {
                    Some(idx) => self.take_range(idx, total_slots),
                    None => {
                        log(format!(
                            "CMap alloc exhausted: no room for a {w}x{h} block even after defragmentation"
                        ));
                        return Err(CMapError::AllocExhausted { width: w, height: h });
                    }
                }
            }
        };

        let id = self.next_id;
        self.next_id += 1;
        self.blocks.insert(
            id,
            Block {
                depth,
                w,
                h,
                tw,
                th,
                tile_slots,
                placement: vec![PlacementRun {
                    start_tile: 0,
                    tile_count: u32::from(w) * u32::from(h),
                    physical_slot: start,
                }],
                pixels: None,
            },
        );
        self.insertion_order.push(id);
        Ok(BlockHandle(id))
    }

    pub fn free(&mut self, handle: BlockHandle) -> Result<(), CMapError> {
        let block = self.blocks.remove(&handle.0).ok_or_else(|| {
            log(format!("CMap free on unknown block id {}", handle.0));
            CMapError::NoSuchBlock(handle.0)
        })?;
        self.insertion_order.retain(|&id| id != handle.0);
        for run in block.placement {
            self.release_range(run.physical_slot, run.tile_count * block.tile_slots);
        }
        Ok(())
    }

    /// Physical VRAM character index (at the block's own color depth) for
    /// logical tile coordinate `(x, y)`.
    pub fn get_character(&self, handle: BlockHandle, x: u16, y: u16) -> Result<u16, CMapError> {
        let block = self.blocks.get(&handle.0).ok_or_else(|| {
            log(format!("CMap get_character on unknown block id {}", handle.0));
            CMapError::NoSuchBlock(handle.0)
        })?;
        if x >= block.w || y >= block.h {
            log(format!(
                "CMap get_character({x}, {y}) out of the block's {}x{} tile range",
                block.w, block.h
            ));
            return Err(CMapError::OutOfBounds {
                row_offset: x,
                row_offset_plus_count: y,
            });
        }
        let flat = u32::from(y) * u32::from(block.w) + u32::from(x);
        let slot = block.physical_slot_for_tile(flat).ok_or_else(|| {
            log(format!(
                "CMap get_character: tile {flat} has no placement run on block id {}",
                handle.0
            ));
            CMapError::NoSuchBlock(handle.0)
        })?;
        Ok((slot / (u32::from(block.depth) / 2)) as u16)
    }

    /// Stores a pointer to the block's source pixel data: `w * tw` by
    /// `h * th` palette indices, row-major, one byte per pixel. Takes effect
    /// on the next [`CMap::commit`].
    pub fn set_characters(&mut self, handle: BlockHandle, pixels: Vec<u8>) -> Result<(), CMapError> {
        let block = self.blocks.get_mut(&handle.0).ok_or_else(|| {
            log(format!("CMap set_characters on unknown block id {}", handle.0));
            CMapError::NoSuchBlock(handle.0)
        })?;
        block.pixels = Some(pixels);
        Ok(())
    }

    /// Bit-planes every live block's source pixels into VRAM at their
    /// current physical position.
    pub fn commit(&self, vram: &mut Vram) {
        for id in &self.insertion_order {
            let block = &self.blocks[id];
            let Some(pixels) = &block.pixels else { continue };
            let image_w = u32::from(block.w) * u32::from(block.tw);
            let sub_w = u32::from(block.tw / 8);
            let sub_h = u32::from(block.th / 8);

            for ty in 0..u32::from(block.h) {
                for tx in 0..u32::from(block.w) {
                    let Some(base_slot) = block.physical_slot_for_tile(ty * u32::from(block.w) + tx) else {
                        continue;
                    };
                    let base_char = base_slot / (u32::from(block.depth) / 2);
                    for scy in 0..sub_h {
                        for scx in 0..sub_w {
                            let char_index = base_char + scy * sub_w + scx;
                            for row in 0..8u32 {
                                for col in 0..8u32 {
                                    let px = tx * u32::from(block.tw) + scx * 8 + col;
                                    let py = ty * u32::from(block.th) + scy * 8 + row;
                                    let value = pixels[(py * image_w + px) as usize];
                                    tile::store_pixel(
                                        vram,
                                        self.base_addr,
                                        char_index as u16,
                                        block.depth,
                                        row as u8,
                                        col as u8,
                                        value,
                                    );
                                }
                            }
                        }
                    }
                }
            }
        }
    }
}
