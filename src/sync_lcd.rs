use core::convert::TryFrom;
use core::fmt;

use embedded_hal::delay::DelayNs;
use embedded_hal::digital::PinState;
use log::{debug, trace};
use ufmt_write::uWrite;

use crate::bus::{LcdBus, Line};
use crate::{
    BitMode, Commands, CursorMoveDir, DisplayControl, DisplayShift, Instruction, Lines, Mode,
    ShiftDir, ShiftTarget, ROW_OFFSETS, UNKNOWN_CHAR,
};

/// Time E is held high, and the time waited after it fell, in microseconds.
///
/// The datasheet minimum is 450 ns, 20 us leaves plenty of margin for slow controllers.
pub const DEFAULT_PULSE_US: u32 = 20;

const MIN_PULSE_US: u32 = 1;

/// API to write to the LCD.
pub struct Lcd<'a, B, D>
where
    B: LcdBus,
    D: DelayNs,
{
    bus: &'a mut B,
    delay: &'a mut D,
    pulse_us: u32,
    display_on: bool,
    cursor_on: bool,
    cursor_blink: bool,
}

impl<'a, B, D> Lcd<'a, B, D>
where
    B: LcdBus,
    D: DelayNs,
{
    /// Create new instance with only the bus and delay instance.
    pub fn new(bus: &'a mut B, delay: &'a mut D) -> Self {
        Self {
            bus,
            delay,
            pulse_us: DEFAULT_PULSE_US,
            display_on: false,
            cursor_on: false,
            cursor_blink: false,
        }
    }

    pub fn with_cursor_on(mut self, on: bool) -> Self {
        self.cursor_on = on;
        self
    }

    pub fn with_cursor_blink(mut self, blink: bool) -> Self {
        self.cursor_blink = blink;
        self
    }

    /// Width of the enable pulse and of the pause after it, in microseconds. Values below 1 us
    /// are raised to 1 us.
    pub fn with_pulse_width_us(mut self, us: u32) -> Self {
        self.pulse_us = us.max(MIN_PULSE_US);
        self
    }

    /// Initializes the hardware.
    ///
    /// Follows the "initializing by instruction" procedure of the HD44780 datasheet, which brings
    /// the controller into 4 bit mode from whatever state it powered up in.
    pub fn init(mut self) -> Result<Self, B::Error> {
        self.reset()?;
        Ok(self)
    }

    /// Runs the initialization sequence again. The sequence forces a known state, so repeating
    /// it is harmless.
    pub fn reset(&mut self) -> Result<(), B::Error> {
        debug!("initializing display");

        // Wait time > 40 ms after VDD rises to 2.7 V.
        self.delay.delay_ms(50);

        // Three times 8 bit mode, whatever the controller was doing before.
        let mode_8bit = Instruction::FunctionSet as u8 | BitMode::Bit8 as u8;
        self.command_and_wait(mode_8bit, 5)?;
        self.command_and_wait(mode_8bit, 1)?;
        self.command_and_wait(mode_8bit, 10)?;

        // Switch to 4 bit mode
        let mode_4bit = Instruction::FunctionSet as u8 | BitMode::Bit4 as u8;
        self.command_and_wait(mode_4bit, 10)?;

        // 4 bit, two lines, 5x8 font
        self.command_and_wait(mode_4bit | Lines::Two as u8, 1)?;

        self.command_and_wait(Instruction::DisplayControl as u8 | DisplayControl::Off as u8, 1)?;
        self.command_and_wait(Commands::Clear as u8, 2)?;

        // Entry right: cursor moves to the right, display does not shift
        self.command_and_wait(
            Instruction::EntrySet as u8 | CursorMoveDir::Increment as u8 | DisplayShift::Off as u8,
            1,
        )?;

        self.display_on = true;
        self.update_display_control()?;
        self.delay.delay_ms(1);

        debug!("display ready");
        Ok(())
    }

    /// Put one nibble on D7..D4 and latch it with a pulse on E.
    fn write4bits(&mut self, nibble: u8, mode: Mode) -> Result<(), B::Error> {
        trace!("nibble {:04b} {:?}", nibble, mode);
        self.bus
            .set_line(Line::RegisterSelect, PinState::from(mode == Mode::Data))?;
        for &line in Line::DATA.iter() {
            if let Some(bit) = line.nibble_bit() {
                self.bus
                    .set_line(line, PinState::from((nibble >> bit) & 0x01 == 0x01))?;
            }
        }

        self.bus.set_line(Line::Enable, PinState::High)?;
        self.delay.delay_us(self.pulse_us);
        self.bus.set_line(Line::Enable, PinState::Low)?;
        self.delay.delay_us(self.pulse_us);
        Ok(())
    }

    fn send(&mut self, data: u8, mode: Mode) -> Result<(), B::Error> {
        let high_bits: u8 = (data >> 4) & 0x0f;
        let low_bits: u8 = data & 0x0f;
        self.write4bits(high_bits, mode)?;
        self.write4bits(low_bits, mode)?;
        Ok(())
    }

    /// Send an instruction code.
    pub fn send_command(&mut self, command: u8) -> Result<(), B::Error> {
        self.send(command, Mode::Cmd)
    }

    /// Send a character code to the current cursor position.
    pub fn send_data(&mut self, data: u8) -> Result<(), B::Error> {
        self.send(data, Mode::Data)
    }

    fn command_and_wait(&mut self, command: u8, ms: u32) -> Result<(), B::Error> {
        self.send_command(command)?;
        self.delay.delay_ms(ms);
        Ok(())
    }

    /// Write string to display.
    ///
    /// Chars outside of the controller's 8 bit character set show up as a full block.
    pub fn write_str(&mut self, data: &str) -> Result<(), B::Error> {
        for c in data.chars() {
            self.send_data(u8::try_from(c).unwrap_or(UNKNOWN_CHAR))?;
        }
        Ok(())
    }

    /// Write raw character codes, up to the first NUL byte.
    pub fn write_bytes(&mut self, data: &[u8]) -> Result<(), B::Error> {
        for &b in data.iter().take_while(|&&b| b != 0) {
            self.send_data(b)?;
        }
        Ok(())
    }

    /// Clear the display
    pub fn clear(&mut self) -> Result<(), B::Error> {
        self.command_and_wait(Commands::Clear as u8, 2)
    }

    /// Return cursor to upper left corner, i.e. (0,0).
    pub fn return_home(&mut self) -> Result<(), B::Error> {
        self.command_and_wait(Commands::ReturnHome as u8, 2)
    }

    /// Set the cursor to (row, col). Coordinates are zero-based.
    ///
    /// Nothing is validated: a row other than 0 or 1 sends `col` as is, a column past 15 lands
    /// wherever the controller maps it.
    pub fn set_cursor(&mut self, row: u8, col: u8) -> Result<(), B::Error> {
        let address = match row {
            0 | 1 => Instruction::DDRAMAddr as u8 | ROW_OFFSETS[row as usize] | col,
            _ => col,
        };
        self.send_command(address)
    }

    /// Recomputes display_ctrl and updates the lcd
    fn update_display_control(&mut self) -> Result<(), B::Error> {
        let mut display_ctrl = DisplayControl::Off as u8;
        if self.display_on {
            display_ctrl |= DisplayControl::DisplayOn as u8;
        }
        if self.cursor_on {
            display_ctrl |= DisplayControl::CursorOn as u8;
        }
        if self.cursor_blink {
            display_ctrl |= DisplayControl::CursorBlink as u8;
        }
        self.send_command(Instruction::DisplayControl as u8 | display_ctrl)
    }

    /// Switch the display on or off, DDRAM content is kept.
    pub fn display_on(&mut self, on: bool) -> Result<(), B::Error> {
        self.display_on = on;
        self.update_display_control()
    }

    // Set if the cursor is blinking
    pub fn cursor_blink(&mut self, blink: bool) -> Result<(), B::Error> {
        self.cursor_blink = blink;
        self.update_display_control()
    }

    // Set the cursor visibility
    pub fn cursor_on(&mut self, on: bool) -> Result<(), B::Error> {
        self.cursor_on = on;
        self.update_display_control()
    }

    fn shift(&mut self, target: ShiftTarget, dir: ShiftDir) -> Result<(), B::Error> {
        self.send_command(Instruction::Shift as u8 | target as u8 | dir as u8)
    }

    /// Scrolls the display one char to the left
    pub fn scroll_display_left(&mut self) -> Result<(), B::Error> {
        self.shift(ShiftTarget::Display, ShiftDir::Left)
    }

    /// Scrolls the display one char to the right
    pub fn scroll_display_right(&mut self) -> Result<(), B::Error> {
        self.shift(ShiftTarget::Display, ShiftDir::Right)
    }

    /// Moves the cursor one char to the left
    pub fn move_cursor_left(&mut self) -> Result<(), B::Error> {
        self.shift(ShiftTarget::Cursor, ShiftDir::Left)
    }

    /// Moves the cursor one char to the right
    pub fn move_cursor_right(&mut self) -> Result<(), B::Error> {
        self.shift(ShiftTarget::Cursor, ShiftDir::Right)
    }

    /// Store a 5x8 glyph in one of the eight CGRAM slots. Each byte is one row, top first, the
    /// lower five bits are the pixels.
    ///
    /// Afterwards the address counter points into CGRAM, call [`Lcd::set_cursor`] before
    /// writing text again. The glyph is displayed by writing its slot number as character code.
    pub fn create_char(&mut self, location: u8, bitmap: &[u8; 8]) -> Result<(), B::Error> {
        let slot = location & 0x07;
        self.send_command(Instruction::CGRAMAddr as u8 | (slot << 3))?;
        for &row in bitmap.iter() {
            self.send_data(row & 0x1f)?;
        }
        Ok(())
    }
}

impl<'a, B, D> uWrite for Lcd<'a, B, D>
where
    B: LcdBus,
    D: DelayNs,
{
    type Error = B::Error;

    fn write_str(&mut self, s: &str) -> Result<(), Self::Error> {
        self.write_str(s)
    }
}

impl<'a, B, D> fmt::Write for Lcd<'a, B, D>
where
    B: LcdBus,
    D: DelayNs,
{
    fn write_str(&mut self, s: &str) -> fmt::Result {
        Lcd::write_str(self, s).map_err(|_| fmt::Error)
    }
}
