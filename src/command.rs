//! HD44780 instruction encoding
//!
//! This module defines the instruction bytes used to drive the HD44780
//! controller, plus small pure helpers that assemble the parameterized
//! instructions. Instructions are sent with RS low; character codes are
//! sent with RS high.
//!
//! ## Example
//!
//! ```
//! use hd44780_nibble::command;
//! use hd44780_nibble::{Font, Lines};
//!
//! // Column 3 of the second line
//! assert_eq!(command::set_cursor(3, 1), 0xC3);
//!
//! // 4-bit bus, two lines, 5x8 font
//! assert_eq!(command::function_set(Lines::Two, Font::Dots5x8), 0x28);
//! ```

use crate::config::{Font, Lines};

// Instructions

/// Clear display command (0x01)
///
/// Writes spaces into all of DDRAM and homes the cursor. This is one of the
/// slow instructions (up to 1.52ms).
pub const CLEAR_DISPLAY: u8 = 0x01;

/// Display on/off control command base (0x08)
///
/// With no flag bits set this turns the display off.
pub const DISPLAY_CONTROL: u8 = 0x08;

/// Display on bit for [`DISPLAY_CONTROL`]
pub const DISPLAY_ON: u8 = 0x04;

/// Cursor visible bit for [`DISPLAY_CONTROL`]
pub const CURSOR_ON: u8 = 0x02;

/// Cursor blink bit for [`DISPLAY_CONTROL`]
pub const BLINK_ON: u8 = 0x01;

/// Cursor/display shift command base (0x10)
///
/// Moves the cursor one position to the left when no flag bits are set.
pub const CURSOR_SHIFT: u8 = 0x10;

/// Shift to the right bit for [`CURSOR_SHIFT`]
pub const SHIFT_RIGHT: u8 = 0x04;

/// Function set command base (0x20)
///
/// The DL bit (0x10) is never set by this driver: the bus is always 4 bits wide.
pub const FUNCTION_SET: u8 = 0x20;

/// Two display lines bit for [`FUNCTION_SET`]
pub const TWO_LINES: u8 = 0x08;

/// 5x10 dot font bit for [`FUNCTION_SET`]
pub const FONT_5X10: u8 = 0x04;

/// Set DDRAM address command base (0x80)
pub const SET_DDRAM_ADDRESS: u8 = 0x80;

/// Bit position of the row within a DDRAM address
///
/// The second line starts at DDRAM address 0x40.
pub const ROW_SHIFT: u8 = 6;

// Cold-start nibbles, sent as a single transfer while the controller may
// still be in 8-bit mode.

/// Upper nibble of an 8-bit function set, used as the reset probe
pub const RESET_NIBBLE: u8 = 0x3;

/// Upper nibble of a 4-bit function set, switches the bus to 4-bit mode
pub const FOUR_BIT_NIBBLE: u8 = 0x2;

/// Busy flag mask within the high status nibble (DB7 on line D7)
pub const BUSY_FLAG: u8 = 0x08;

/// Direction of a cursor shift
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ShiftDirection {
    /// Move the cursor one position to the left
    Left,
    /// Move the cursor one position to the right
    Right,
}

/// Encode a set-cursor instruction
///
/// Produces `0x80 | (row << 6) | col`. Values are not validated: out of range
/// rows and columns are handed to the controller as-is and it interprets them
/// with its own DDRAM addressing rules.
pub fn set_cursor(col: u8, row: u8) -> u8 {
    SET_DDRAM_ADDRESS | (row << ROW_SHIFT) | col
}

/// Encode a display on/off control instruction
pub fn display_control(display: bool, cursor: bool, blink: bool) -> u8 {
    let mut command = DISPLAY_CONTROL;
    if display {
        command |= DISPLAY_ON;
    }
    if cursor {
        command |= CURSOR_ON;
    }
    if blink {
        command |= BLINK_ON;
    }
    command
}

/// Encode a 4-bit function set instruction
pub fn function_set(lines: Lines, font: Font) -> u8 {
    let mut command = FUNCTION_SET;
    if lines == Lines::Two {
        command |= TWO_LINES;
    }
    if font == Font::Dots5x10 {
        command |= FONT_5X10;
    }
    command
}

/// Encode a cursor shift instruction
pub fn cursor_shift(direction: ShiftDirection) -> u8 {
    match direction {
        ShiftDirection::Left => CURSOR_SHIFT,
        ShiftDirection::Right => CURSOR_SHIFT | SHIFT_RIGHT,
    }
}
