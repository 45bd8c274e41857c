/// Monotonic millisecond counter.
///
/// Must never go backwards within a session. Wraparound is not handled, a
/// `u32` of milliseconds lasts for about 49 days of uptime.
pub trait Clock {
    /// Milliseconds elapsed since an arbitrary, fixed origin (usually boot)
    fn now_ms(&self) -> u32;
}

impl<C: Clock + ?Sized> Clock for &C {
    fn now_ms(&self) -> u32 {
        (**self).now_ms()
    }
}

/// Clock backed by the embassy time driver of the target.
#[cfg(feature = "embassy-time")]
#[derive(Debug, Clone, Copy, Default)]
pub struct EmbassyClock;

#[cfg(feature = "embassy-time")]
impl Clock for EmbassyClock {
    fn now_ms(&self) -> u32 {
        embassy_time::Instant::now().as_millis() as u32
    }
}
