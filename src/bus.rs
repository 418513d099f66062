//! The physical side of the display: five output lines in 4-bit mode.
//!
//! [`LcdBus`] is the only way the driver touches hardware. [`GpioBus`] implements it on top of
//! embedded-hal pins, other implementations may drive a port expander or a shift register.

use embedded_hal::digital::{OutputPin, PinState};

/// A line of the LCD the driver drives.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Line {
    /// RS, low for instructions, high for character data.
    RegisterSelect,
    /// E, the strobe that latches the data lines on its falling edge.
    Enable,
    D4,
    D5,
    D6,
    D7,
}

impl Line {
    /// Data lines in the order they are written, most significant bit first.
    pub const DATA: [Line; 4] = [Line::D7, Line::D6, Line::D5, Line::D4];

    /// Bit of a nibble carried by this line, `None` for control lines.
    pub fn nibble_bit(self) -> Option<u8> {
        match self {
            Line::D4 => Some(0),
            Line::D5 => Some(1),
            Line::D6 => Some(2),
            Line::D7 => Some(3),
            Line::RegisterSelect | Line::Enable => None,
        }
    }
}

pub trait LcdBus {
    type Error;

    /// Set a single line to `level`.
    fn set_line(&mut self, line: Line, level: PinState) -> Result<(), Self::Error>;
}

/// Bus made of six independent GPIO pins sharing one error type.
///
/// RW is expected to be tied to ground, the driver only writes.
pub struct GpioBus<RS, EN, D4, D5, D6, D7> {
    rs: RS,
    en: EN,
    d4: D4,
    d5: D5,
    d6: D6,
    d7: D7,
}

impl<RS, EN, D4, D5, D6, D7, ERR> GpioBus<RS, EN, D4, D5, D6, D7>
where
    RS: OutputPin<Error = ERR>,
    EN: OutputPin<Error = ERR>,
    D4: OutputPin<Error = ERR>,
    D5: OutputPin<Error = ERR>,
    D6: OutputPin<Error = ERR>,
    D7: OutputPin<Error = ERR>,
{
    pub fn new(rs: RS, en: EN, d4: D4, d5: D5, d6: D6, d7: D7) -> Self {
        GpioBus {
            rs,
            en,
            d4,
            d5,
            d6,
            d7,
        }
    }

    /// Give the pins back.
    pub fn release(self) -> (RS, EN, D4, D5, D6, D7) {
        (self.rs, self.en, self.d4, self.d5, self.d6, self.d7)
    }
}

impl<RS, EN, D4, D5, D6, D7, ERR> LcdBus for GpioBus<RS, EN, D4, D5, D6, D7>
where
    RS: OutputPin<Error = ERR>,
    EN: OutputPin<Error = ERR>,
    D4: OutputPin<Error = ERR>,
    D5: OutputPin<Error = ERR>,
    D6: OutputPin<Error = ERR>,
    D7: OutputPin<Error = ERR>,
{
    type Error = ERR;

    fn set_line(&mut self, line: Line, level: PinState) -> Result<(), ERR> {
        match line {
            Line::RegisterSelect => self.rs.set_state(level),
            Line::Enable => self.en.set_state(level),
            Line::D4 => self.d4.set_state(level),
            Line::D5 => self.d5.set_state(level),
            Line::D6 => self.d6.set_state(level),
            Line::D7 => self.d7.set_state(level),
        }
    }
}
