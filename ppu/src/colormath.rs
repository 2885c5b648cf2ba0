use crate::color::SnesColor;
use crate::registers::{ColorWindowGate, Registers};
use crate::window::{self, LAYER_COLOR};

fn gate_open(gate: ColorWindowGate, registers: &Registers, x: u8) -> bool {
    match gate {
        ColorWindowGate::Always => true,
        ColorWindowGate::InsideColorWindow => window::in_combined_window(registers, LAYER_COLOR, x),
        ColorWindowGate::OutsideColorWindow => !window::in_combined_window(registers, LAYER_COLOR, x),
        ColorWindowGate::Never => false,
    }
}

/// Combines a resolved main-screen pixel with the sub-screen pixel behind
/// it, applying add/subtract, halving and `forceScreenBlack`.
///
/// `main_layer` is the color-math participation index of whichever layer
/// won the main screen (0-3 = bg1-4, 4 = obj, 5 = backdrop). `obj_palette`
/// is `Some(palette)` when the main pixel came from an OBJ layer; OBJ
/// palettes 0-3 never participate in color math regardless of the control
/// bits. `sub_is_fixed_color` disables halving per the hardware rule that a
/// fixed-color subscreen is never halved.
pub fn composite(
    registers: &Registers,
    x: u8,
    main_layer: u8,
    obj_palette: Option<u8>,
    main: SnesColor,
    sub: SnesColor,
    sub_is_fixed_color: bool,
) -> SnesColor {
    let obj_excluded = matches!(obj_palette, Some(p) if p < 4);
    let math_applies = !obj_excluded
        && registers.color_math_participates(main_layer)
        && gate_open(registers.color_math_enable(), registers, x);

    let mut result = if math_applies {
        let combined = main.combine(sub, registers.color_math_subtract());
        if registers.color_math_halve() && !sub_is_fixed_color {
            combined.halved()
        } else {
            combined
        }
    } else {
        main
    };

    if gate_open(registers.force_screen_black(), registers, x) {
        result = SnesColor::new(0, 0, 0);
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn always_on_registers() -> Registers {
        Registers {
            // colorMathEnable=Always and forceScreenBlack=Never both decode
            // from raw 0, so byte 0 is left zeroed. Byte 1 turns on
            // participation for every layer but leaves halve/subtract off.
            color_math_control: [0, 0b0011_1111],
            ..Default::default()
        }
    }

    #[test]
    fn add_mode_sums_and_clamps_channels() {
        let regs = always_on_registers();
        let main = SnesColor::new(20, 0, 0);
        let sub = SnesColor::new(20, 0, 0);
        let out = composite(&regs, 0, 0, None, main, sub, false);
        assert_eq!(out.r5(), 31);
    }

    #[test]
    fn halve_divides_the_combined_result() {
        let mut regs = always_on_registers();
        regs.color_math_control[1] |= 1 << 6; // halve
        let main = SnesColor::new(10, 10, 10);
        let sub = SnesColor::new(10, 10, 10);
        let out = composite(&regs, 0, 0, None, main, sub, false);
        assert_eq!(out.r5(), 10);
    }

    #[test]
    fn halve_is_skipped_when_subscreen_is_the_fixed_color() {
        let mut regs = always_on_registers();
        regs.color_math_control[1] |= 1 << 6;
        let main = SnesColor::new(10, 10, 10);
        let sub = SnesColor::new(10, 10, 10);
        let out = composite(&regs, 0, 0, None, main, sub, true);
        assert_eq!(out.r5(), 20);
    }

    #[test]
    fn obj_palettes_below_4_never_participate() {
        let regs = always_on_registers();
        let main = SnesColor::new(20, 0, 0);
        let sub = SnesColor::new(20, 0, 0);
        let out = composite(&regs, 0, 4, Some(2), main, sub, false);
        assert_eq!(out.r5(), 20);
    }

    #[test]
    fn force_screen_black_overrides_everything() {
        let mut regs = always_on_registers();
        regs.color_math_control[0] |= 0b1100_0000; // forceScreenBlack = Always(3)
        let out = composite(&regs, 0, 0, None, SnesColor::new(31, 31, 31), SnesColor::default(), false);
        assert_eq!(out, SnesColor::new(0, 0, 0));
    }
}
