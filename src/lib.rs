#![no_std]
//! Driver to write characters to LCD displays with a LM1602 (HD44780 controller) wired directly
//! to GPIO pins in 4-bit mode, with 16x2 characters. It requires six pins implementing
//! [`embedded_hal::digital::OutputPin`] (RS, E, D4..D7; RW tied to ground) and an instance to
//! delay execution with [`embedded_hal::delay::DelayNs`].
//!
//! The controller is never read back. Every instruction is followed by a fixed delay that exceeds
//! its worst case execution time, so the driver works without the busy flag.
//!
//! Usage:
//! ```ignore
//! use lcd_lcm1602_gpio::{bus::GpioBus, sync_lcd::Lcd};
//!
//! // Pins come from the HAL of your board, they only need to implement OutputPin.
//! let mut bus = GpioBus::new(rs, en, d4, d5, d6, d7);
//! let mut delay = arduino_hal::Delay::new();
//!
//! let mut lcd = Lcd::new(&mut bus, &mut delay)
//!     .with_cursor_on(false) // no visible cursor
//!     .init()?;
//! lcd.set_cursor(1, 3)?;
//! lcd.write_str("Hello")?;
//! ```
//!
//! If your board has no delay implementation but a free running timer ticking at 1 MHz, wrap it
//! in a [`delay::CounterDelay`].

pub mod bus;
pub mod delay;
pub mod sync_lcd;

#[cfg(test)]
mod testing;

/// Flags of the display control instruction.
pub enum DisplayControl {
    Off = 0x00,
    CursorBlink = 0x01,
    CursorOn = 0x02,
    DisplayOn = 0x04,
}

/// Register select level of a transfer.
#[repr(u8)]
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Mode {
    /// RS low, the byte is an instruction code.
    Cmd = 0x00,
    /// RS high, the byte is a character code.
    Data = 0x01,
}

#[repr(u8)]
#[derive(Copy, Clone)]
enum Instruction {
    EntrySet = 0x04,
    DisplayControl = 0x08,
    Shift = 0x10,
    FunctionSet = 0x20,
    CGRAMAddr = 0x40,
    DDRAMAddr = 0x80,
}

enum Commands {
    Clear = 0x01,
    ReturnHome = 0x02,
}

enum BitMode {
    Bit4 = 0x0 << 4,
    Bit8 = 0x1 << 4,
}

enum Lines {
    Two = 0x08,
}

#[repr(u8)]
#[derive(Copy, Clone)]
enum CursorMoveDir {
    Increment = 0x02,
}

#[repr(u8)]
#[derive(Copy, Clone)]
enum DisplayShift {
    Off = 0x00,
}

#[repr(u8)]
#[derive(Copy, Clone)]
enum ShiftTarget {
    Cursor = 0x00,
    Display = 0x08,
}

#[repr(u8)]
#[derive(Copy, Clone)]
enum ShiftDir {
    Left = 0x00,
    Right = 0x04,
}

/// DDRAM address of the first column of each row.
const ROW_OFFSETS: [u8; 2] = [0x00, 0x40];

/// Character code sent for chars outside of the controller's 8 bit character set.
const UNKNOWN_CHAR: u8 = 0xff;
