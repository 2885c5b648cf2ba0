/// One step of a mode's front-to-back compositing order: either a sprite
/// priority tier (0..=3, where 3 is OAM attribute `priority` value 3) or one
/// BG's high/low tile-priority tier.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LayerSlot {
    Obj { priority: u8 },
    Bg { bg: u8, tile_priority_high: bool },
}

/// The front-to-back layer order for each `bgMode`, transcribed from the
/// hardware's documented priority table (modes 0..7, plus the `m1bg3pri`
/// variant of mode 1 and the EXTBG variant of mode 7). Index 0 is drawn
/// topmost.
pub fn priority_order(mode: u8, m1bg3pri: bool, extbg: bool) -> Vec<LayerSlot> {
    use LayerSlot::{Bg, Obj};

    let bg = |n: u8, hi: bool| Bg {
        bg: n,
        tile_priority_high: hi,
    };

    match mode {
        0 => vec![
            Obj { priority: 3 },
            bg(0, true),
            bg(1, true),
            Obj { priority: 2 },
            bg(0, false),
            bg(1, false),
            Obj { priority: 1 },
            bg(2, true),
            bg(3, true),
            Obj { priority: 0 },
            bg(2, false),
            bg(3, false),
        ],
        1 if m1bg3pri => vec![
            bg(2, true),
            Obj { priority: 3 },
            bg(0, true),
            bg(1, true),
            Obj { priority: 2 },
            bg(0, false),
            bg(1, false),
            Obj { priority: 1 },
            Obj { priority: 0 },
            bg(2, false),
        ],
        1 => vec![
            Obj { priority: 3 },
            bg(0, true),
            bg(1, true),
            Obj { priority: 2 },
            bg(0, false),
            bg(1, false),
            Obj { priority: 1 },
            bg(2, true),
            Obj { priority: 0 },
            bg(2, false),
        ],
        2 | 3 | 4 | 5 => vec![
            Obj { priority: 3 },
            bg(0, true),
            Obj { priority: 2 },
            bg(1, true),
            Obj { priority: 1 },
            bg(0, false),
            Obj { priority: 0 },
            bg(1, false),
        ],
        6 => vec![
            Obj { priority: 3 },
            bg(0, true),
            Obj { priority: 2 },
            Obj { priority: 1 },
            bg(0, false),
            Obj { priority: 0 },
        ],
        _ if extbg => vec![
            Obj { priority: 3 },
            Obj { priority: 2 },
            bg(1, true),
            Obj { priority: 1 },
            bg(0, false),
            Obj { priority: 0 },
            bg(1, false),
        ],
        _ => vec![
            Obj { priority: 3 },
            Obj { priority: 2 },
            Obj { priority: 1 },
            bg(0, false),
            Obj { priority: 0 },
        ],
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn mode0_has_twelve_slots_covering_four_bgs_and_four_obj_tiers() {
        let order = priority_order(0, false, false);
        assert_eq!(order.len(), 12);
        assert_eq!(order[0], LayerSlot::Obj { priority: 3 });
    }

    #[test]
    fn mode1_bg3_priority_flag_moves_bg3_high_to_the_front() {
        let normal = priority_order(1, false, false);
        let elevated = priority_order(1, true, false);
        assert_eq!(
            normal[7],
            LayerSlot::Bg {
                bg: 2,
                tile_priority_high: true
            }
        );
        assert_eq!(
            elevated[0],
            LayerSlot::Bg {
                bg: 2,
                tile_priority_high: true
            }
        );
    }

    #[test]
    fn mode7_extbg_splits_bg2_around_bg1() {
        let order = priority_order(7, false, true);
        assert!(order.contains(&LayerSlot::Bg {
            bg: 1,
            tile_priority_high: true
        }));
        assert!(order.contains(&LayerSlot::Bg {
            bg: 1,
            tile_priority_high: false
        }));
    }

    #[test]
    fn mode7_without_extbg_has_a_single_bg1_tier() {
        let order = priority_order(7, false, false);
        let bg_slots: Vec<_> = order.iter().filter(|s| matches!(s, LayerSlot::Bg { .. })).collect();
        assert_eq!(bg_slots.len(), 1);
    }
}
