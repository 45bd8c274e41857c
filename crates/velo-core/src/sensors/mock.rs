//! Host-side stand-ins for the hall line and the clock

use core::cell::Cell;
use embedded_hal::digital::{ErrorKind, ErrorType, InputPin};

use super::Clock;

/// Input line whose level is driven by the test through a shared cell.
pub(crate) struct MockPin<'a> {
    pub(crate) high: &'a Cell<bool>,
    pub(crate) fail: &'a Cell<bool>,
}

impl ErrorType for MockPin<'_> {
    type Error = ErrorKind;
}

impl InputPin for MockPin<'_> {
    fn is_high(&mut self) -> Result<bool, Self::Error> {
        if self.fail.get() {
            return Err(ErrorKind::Other);
        }
        Ok(self.high.get())
    }

    fn is_low(&mut self) -> Result<bool, Self::Error> {
        self.is_high().map(|high| !high)
    }
}

#[derive(Default)]
pub(crate) struct MockClock {
    pub(crate) now: Cell<u32>,
}

impl MockClock {
    pub(crate) fn set(&self, ms: u32) {
        self.now.set(ms);
    }

    pub(crate) fn advance(&self, ms: u32) {
        self.now.set(self.now.get() + ms);
    }
}

impl Clock for MockClock {
    fn now_ms(&self) -> u32 {
        self.now.get()
    }
}
