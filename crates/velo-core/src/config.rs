use serde::{Deserialize, Serialize};

/// Number of completed rotations that make up one speed measurement window.
///
/// Five rotations bound four inter-rotation gaps, which are averaged.
pub const ROTATIONS_PER_WINDOW: u8 = 5;

/// Inter-rotation gaps covered by a single measurement window
pub const GAPS_PER_WINDOW: u32 = ROTATIONS_PER_WINDOW as u32 - 1;

/// Highest wheel RPM considered physically real. Anything at or above this
/// is treated as contact bounce and discarded.
pub const MAX_PLAUSIBLE_RPM: u32 = 600;

/// Time without a completed rotation after which the wheel is considered stopped
pub const IDLE_TIMEOUT_MS: u32 = 4000;

/// Pending distance (km) that triggers a write of the odometer
pub const FLUSH_THRESHOLD_KM: f32 = 1.0;

/// Number of speed samples averaged by the speed averager
pub const SPEED_SAMPLE_COUNT: usize = 4;

/// Milliseconds per minute, used for RPM derivation
pub const MS_PER_MINUTE: u32 = 60_000;

/// Static configuration of one wheel tracker
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq)]
pub struct TrackerConfig {
    /// Identifier of the hall sensor input, used in logs and errors
    pub sensor_id: u8,
    /// Distance travelled per wheel revolution, in kilometers
    pub wheel_circumference_km: f32,
    /// Address of the cumulative distance in persistent storage
    pub storage_address: u16,
}

impl TrackerConfig {
    pub const fn new(sensor_id: u8, wheel_circumference_km: f32, storage_address: u16) -> Self {
        Self {
            sensor_id,
            wheel_circumference_km,
            storage_address,
        }
    }

    /// Build a configuration from a wheel circumference in millimeters, the
    /// unit printed on tyre sidewall charts (e.g. 2105 for 700x25C).
    pub fn from_wheel_circumference_mm(
        sensor_id: u8,
        circumference_mm: u32,
        storage_address: u16,
    ) -> Self {
        Self::new(
            sensor_id,
            circumference_mm as f32 / 1_000_000.0,
            storage_address,
        )
    }
}

impl Default for TrackerConfig {
    /// 28" road wheel on the first input, odometer at the start of storage
    fn default() -> Self {
        Self::from_wheel_circumference_mm(0, 2105, 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_circumference_from_mm() {
        let config = TrackerConfig::from_wheel_circumference_mm(2, 2000, 16);
        assert_eq!(config.sensor_id, 2);
        assert_eq!(config.storage_address, 16);
        assert!(
            (config.wheel_circumference_km - 0.002).abs() < 1e-9,
            "2000 mm should be 0.002 km"
        );
    }

    #[test]
    fn test_default_is_road_wheel() {
        let config = TrackerConfig::default();
        assert_eq!(config.sensor_id, 0);
        assert_eq!(config.storage_address, 0);
        assert!((config.wheel_circumference_km - 0.002105).abs() < 1e-9);
    }
}
