//! Sensor inputs of the speedometer: the hall switch on the fork and the
//! monotonic clock it is sampled against.

mod clock;
mod hall;

pub use clock::Clock;
#[cfg(feature = "embassy-time")]
pub use clock::EmbassyClock;
pub use hall::{HallSensor, SensorError};

#[cfg(test)]
pub(crate) mod mock;
