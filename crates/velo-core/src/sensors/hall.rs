use embedded_hal::digital::InputPin;
use log::error;
use thiserror_no_std::Error;

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum SensorError {
    #[error("Failed to read hall sensor on input {sensor_id}")]
    ReadFailed { sensor_id: u8 },
}

/// Hall-effect switch mounted next to the wheel.
///
/// The switch pulls the line low while the spoke magnet is in front of it,
/// so the line is active-low. No debouncing happens here; the tracker
/// derives rotations from the raw level.
pub struct HallSensor<P> {
    pin: P,
    sensor_id: u8,
}

impl<P: InputPin> HallSensor<P> {
    pub const fn new(pin: P, sensor_id: u8) -> Self {
        Self { pin, sensor_id }
    }

    /// Returns `true` while the magnet is in front of the sensor.
    pub fn magnet_present(&mut self) -> Result<bool, SensorError> {
        self.pin.is_low().map_err(|e| {
            error!("Hall sensor {} read failed: {:?}", self.sensor_id, e);
            SensorError::ReadFailed {
                sensor_id: self.sensor_id,
            }
        })
    }

    /// Release the underlying pin
    pub fn into_inner(self) -> P {
        self.pin
    }
}
