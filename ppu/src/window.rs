use crate::registers::{Registers, WindowCombine};

/// BG1-4 occupy layer indices 0-3, OBJ is 4, the color-math window is 5;
/// this numbering matches `windowMaskSettings`/`windowMaskLogic`'s layout.
pub const LAYER_OBJ: u8 = 4;
pub const LAYER_COLOR: u8 = 5;

fn inside_single_window(registers: &Registers, window: u8, layer: u8, x: u8) -> bool {
    let left = registers.window_left(window);
    let right = registers.window_right(window);
    let raw = if left > right {
        false // empty-window convention: never inside
    } else {
        x >= left && x <= right
    };
    let invert = if window == 0 {
        registers.window1_invert(layer)
    } else {
        registers.window2_invert(layer)
    };
    raw ^ invert
}

fn combine(logic: WindowCombine, a: bool, b: bool) -> bool {
    match logic {
        WindowCombine::Or => a || b,
        WindowCombine::And => a && b,
        WindowCombine::Xor => a ^ b,
        WindowCombine::Xnor => !(a ^ b),
    }
}

/// Whether pixel column `x` is considered "inside" `layer`'s combined
/// window. For BG/OBJ layers this drives exclusion (masking); for the
/// color-math window it drives `colorMathEnable`/`forceScreenBlack` gating.
/// Returns `false` (never inside) if neither window is enabled for the layer.
pub fn in_combined_window(registers: &Registers, layer: u8, x: u8) -> bool {
    let w1 = registers.window1_enabled(layer);
    let w2 = registers.window2_enabled(layer);
    match (w1, w2) {
        (false, false) => false,
        (true, false) => inside_single_window(registers, 0, layer, x),
        (false, true) => inside_single_window(registers, 1, layer, x),
        (true, true) => combine(
            registers.window_mask_logic(layer),
            inside_single_window(registers, 0, layer, x),
            inside_single_window(registers, 1, layer, x),
        ),
    }
}

/// Whether `layer` should be masked (forced transparent) on the main screen
/// at column `x`.
pub fn masked_on_main(registers: &Registers, layer: u8, x: u8) -> bool {
    registers.main_screen_masked(layer) && in_combined_window(registers, layer, x)
}

pub fn masked_on_sub(registers: &Registers, layer: u8, x: u8) -> bool {
    registers.sub_screen_masked(layer) && in_combined_window(registers, layer, x)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn registers_with_window1(left: u8, right: u8, enabled_layer: u8, invert: bool) -> Registers {
        let mut regs = Registers {
            window_position: [(left, right), (0, 0)],
            ..Default::default()
        };
        let nibble = u8::from(invert) | (1 << 1); // invert bit0, enable bit1
        let byte_idx = (enabled_layer / 2) as usize;
        if enabled_layer % 2 == 0 {
            regs.window_mask_settings[byte_idx] |= nibble;
        } else {
            regs.window_mask_settings[byte_idx] |= nibble << 4;
        }
        regs
    }

    #[test]
    fn disabled_windows_never_mask() {
        let regs = Registers::default();
        assert!(!in_combined_window(&regs, 0, 5));
    }

    #[test]
    fn inside_range_is_true_without_invert() {
        let regs = registers_with_window1(4, 10, 0, false);
        assert!(in_combined_window(&regs, 0, 7));
        assert!(!in_combined_window(&regs, 0, 11));
    }

    #[test]
    fn invert_flips_the_result() {
        let regs = registers_with_window1(4, 10, 0, true);
        assert!(!in_combined_window(&regs, 0, 7));
        assert!(in_combined_window(&regs, 0, 11));
    }

    #[test]
    fn empty_window_left_greater_than_right_is_never_inside() {
        let regs = registers_with_window1(10, 4, 0, false);
        for x in 0..=255u8 {
            assert!(!in_combined_window(&regs, 0, x));
        }
    }

    #[test]
    fn masking_only_applies_when_screen_masking_bit_is_set() {
        let mut regs = registers_with_window1(0, 255, 0, false);
        assert!(!masked_on_main(&regs, 0, 0));
        regs.main_screen_masking = 0b1;
        assert!(masked_on_main(&regs, 0, 0));
        assert!(!masked_on_sub(&regs, 0, 0));
    }
}
