//! Test double recording line changes and delays into one shared log, so tests can check the
//! order of bus activity against the waits in between.

extern crate std;

use std::cell::RefCell;
use std::rc::Rc;
use std::vec::Vec;

use embedded_hal::delay::DelayNs;
use embedded_hal::digital::PinState;

use crate::bus::{LcdBus, Line};
use crate::Mode;

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Event {
    Set(Line, PinState),
    /// Requested delay in nanoseconds.
    Delay(u64),
}

/// One strobe of the enable line.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Nibble {
    pub mode: Mode,
    pub value: u8,
    /// Time E stayed high.
    pub pulse_ns: u64,
    /// First wait after E went low.
    pub settle_ns: u64,
    /// RS and data lines did not move while E was high.
    pub stable: bool,
}

/// Bus activity folded back into bytes.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Op {
    Cmd(u8),
    Data(u8),
    /// Waits outside of nibble transfers, in nanoseconds.
    Wait(u64),
}

pub const MS: u64 = 1_000_000;

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct BusError;

#[derive(Clone, Default)]
pub struct Recorder {
    events: Rc<RefCell<Vec<Event>>>,
}

pub struct RecordingBus {
    events: Rc<RefCell<Vec<Event>>>,
    writes_left: Option<usize>,
}

pub struct RecordingDelay {
    events: Rc<RefCell<Vec<Event>>>,
}

impl Recorder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn bus(&self) -> RecordingBus {
        RecordingBus {
            events: self.events.clone(),
            writes_left: None,
        }
    }

    /// Bus failing every write after the first `writes` ones.
    pub fn failing_bus(&self, writes: usize) -> RecordingBus {
        RecordingBus {
            events: self.events.clone(),
            writes_left: Some(writes),
        }
    }

    pub fn delay(&self) -> RecordingDelay {
        RecordingDelay {
            events: self.events.clone(),
        }
    }

    pub fn events(&self) -> Vec<Event> {
        self.events.borrow().clone()
    }

    pub fn clear(&self) {
        self.events.borrow_mut().clear();
    }

    /// Decode the log into strobes, paired with the waits between them.
    fn decode(&self) -> Vec<Result<Nibble, u64>> {
        let mut out: Vec<Result<Nibble, u64>> = Vec::new();
        let mut rs = PinState::Low;
        let mut data = 0u8;
        let mut enable = PinState::Low;
        // E went low and its settle delay has not been seen yet
        let mut settling = false;

        for event in self.events() {
            match event {
                Event::Set(Line::Enable, PinState::High) => {
                    enable = PinState::High;
                    settling = false;
                    out.push(Ok(Nibble {
                        mode: if rs == PinState::High { Mode::Data } else { Mode::Cmd },
                        value: data,
                        pulse_ns: 0,
                        settle_ns: 0,
                        stable: true,
                    }));
                }
                Event::Set(Line::Enable, PinState::Low) => {
                    if enable == PinState::High {
                        settling = true;
                    }
                    enable = PinState::Low;
                }
                Event::Set(line, level) => {
                    if line == Line::RegisterSelect {
                        rs = level;
                    } else if let Some(bit) = line.nibble_bit() {
                        match level {
                            PinState::High => data |= 1 << bit,
                            PinState::Low => data &= !(1 << bit),
                        }
                    }
                    settling = false;
                    if enable == PinState::High {
                        if let Some(Ok(nibble)) = out.last_mut() {
                            nibble.stable = false;
                        }
                    }
                }
                Event::Delay(ns) => {
                    if enable == PinState::High {
                        if let Some(Ok(nibble)) = out.last_mut() {
                            nibble.pulse_ns += ns;
                        }
                    } else if settling {
                        settling = false;
                        if let Some(Ok(nibble)) = out.last_mut() {
                            nibble.settle_ns += ns;
                        }
                    } else if let Some(Err(wait)) = out.last_mut() {
                        *wait += ns;
                    } else {
                        out.push(Err(ns));
                    }
                }
            }
        }
        out
    }

    pub fn nibbles(&self) -> Vec<Nibble> {
        self.decode().into_iter().filter_map(Result::ok).collect()
    }

    /// Pairs consecutive strobes into bytes, high nibble first.
    ///
    /// Panics if a byte is split by a wait or changes mode halfway.
    pub fn ops(&self) -> Vec<Op> {
        let mut ops = Vec::new();
        let mut high: Option<Nibble> = None;
        for step in self.decode() {
            match (step, high.take()) {
                (Ok(nibble), None) => high = Some(nibble),
                (Ok(low), Some(hi)) => {
                    assert_eq!(hi.mode, low.mode, "mode changed within a byte");
                    let byte = hi.value << 4 | low.value;
                    ops.push(match low.mode {
                        Mode::Cmd => Op::Cmd(byte),
                        Mode::Data => Op::Data(byte),
                    });
                }
                (Err(ns), None) => ops.push(Op::Wait(ns)),
                (Err(_), Some(hi)) => panic!("wait between the nibbles of {:?}", hi),
            }
        }
        assert!(high.is_none(), "dangling nibble {:?}", high);
        ops
    }
}

impl LcdBus for RecordingBus {
    type Error = BusError;

    fn set_line(&mut self, line: Line, level: PinState) -> Result<(), BusError> {
        if let Some(left) = self.writes_left.as_mut() {
            if *left == 0 {
                return Err(BusError);
            }
            *left -= 1;
        }
        self.events.borrow_mut().push(Event::Set(line, level));
        Ok(())
    }
}

impl DelayNs for RecordingDelay {
    fn delay_ns(&mut self, ns: u32) {
        self.events.borrow_mut().push(Event::Delay(ns as u64));
    }

    fn delay_us(&mut self, us: u32) {
        self.events.borrow_mut().push(Event::Delay(us as u64 * 1_000));
    }

    fn delay_ms(&mut self, ms: u32) {
        self.events.borrow_mut().push(Event::Delay(ms as u64 * MS));
    }
}
