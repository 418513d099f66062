//! Microsecond delays on top of a free running hardware counter.
//!
//! Most HALs ship a [`DelayNs`] implementation already. For boards that only offer a timer
//! counting at 1 MHz, implement [`Counter`] for it and hand a [`CounterDelay`] to the driver.

use embedded_hal::delay::DelayNs;

/// A hardware counter incrementing once per microsecond.
///
/// The clock configuration that makes one tick equal one microsecond is up to the caller.
pub trait Counter {
    /// Highest value the counter reaches before it wraps to zero, e.g. `0xffff` for a 16 bit
    /// timer.
    const MAX_TICKS: u32;

    /// Set the counter to zero.
    fn reset(&mut self);

    /// Current counter value.
    fn ticks(&mut self) -> u32;
}

/// [`DelayNs`] implementation that resets a [`Counter`] and busy waits until it reaches the
/// requested number of ticks.
///
/// Requests longer than half of the counter range are split into several waits, the counter is
/// never polled close to its wrap around.
pub struct CounterDelay<C> {
    counter: C,
}

impl<C: Counter> CounterDelay<C> {
    pub fn new(counter: C) -> Self {
        CounterDelay { counter }
    }

    /// Give the counter back.
    pub fn release(self) -> C {
        self.counter
    }

    fn window() -> u32 {
        (C::MAX_TICKS / 2).max(1)
    }

    /// Reset the counter and spin until it reads at least `ticks`.
    ///
    /// `ticks` has to stay below the counter's full scale, otherwise the counter wraps and the
    /// wait never ends or ends early.
    fn wait_ticks(&mut self, ticks: u32) {
        self.counter.reset();
        while self.counter.ticks() < ticks {}
    }
}

impl<C: Counter> DelayNs for CounterDelay<C> {
    fn delay_ns(&mut self, ns: u32) {
        let us = ns / 1_000 + (ns % 1_000 != 0) as u32;
        self.delay_us(us);
    }

    fn delay_us(&mut self, mut us: u32) {
        let window = Self::window();
        while us > window {
            self.wait_ticks(window);
            us -= window;
        }
        self.wait_ticks(us);
    }

    fn delay_ms(&mut self, ms: u32) {
        for _ in 0..ms {
            self.delay_us(1_000);
        }
    }
}
