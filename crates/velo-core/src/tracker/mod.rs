//! Wheel rotation tracking
//!
//! [`RotationTracker`] turns the raw level of the hall switch into completed
//! wheel rotations and derives everything the head unit shows from them:
//! current and average speed, max speed, RPM, trip distance and the lifetime
//! odometer.
//!
//! ## Polling contract
//!
//! The tracker never blocks and never waits for an edge. The owner calls
//! [`RotationTracker::sample`] and [`RotationTracker::idle`] from its main
//! loop, faster than the shortest time the magnet can spend in front of the
//! sensor (a few milliseconds at top speed). Slower polling misses
//! rotations; this is not detected.
//!
//! ## Measurement windows
//!
//! Speed is not derived from every rotation. Five completed rotations form a
//! window whose four gaps are averaged into one RPM sample. Samples at or
//! above [`MAX_PLAUSIBLE_RPM`] are contact bounce and are dropped.
//!
//! ## Odometer writes
//!
//! Distance is flushed to storage once at least [`FLUSH_THRESHOLD_KM`] is
//! pending, so storage sees one write per kilometer regardless of cadence.
//! Pending distance is only folded into the odometer after the write went
//! through; a failed flush is retried on the next rotation.

mod averager;

pub use averager::SpeedAverager;

use embedded_hal::digital::InputPin;
use log::{debug, error, info, warn};
use thiserror_no_std::Error;

use crate::config::{
    FLUSH_THRESHOLD_KM, GAPS_PER_WINDOW, IDLE_TIMEOUT_MS, MAX_PLAUSIBLE_RPM, MS_PER_MINUTE,
    ROTATIONS_PER_WINDOW, TrackerConfig,
};
use crate::sensors::{Clock, HallSensor, SensorError};
use crate::storage::{ByteStore, DistanceStore, PersistError};

/// Minutes per hour, turns revolutions per minute into km/h
const MINUTES_PER_HOUR: f32 = 60.0;

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrackerError {
    #[error("Sensor error: {0}")]
    Sensor(SensorError),
    #[error("Storage error: {0}")]
    Persist(PersistError),
}

impl From<SensorError> for TrackerError {
    fn from(e: SensorError) -> Self {
        Self::Sensor(e)
    }
}

impl From<PersistError> for TrackerError {
    fn from(e: PersistError) -> Self {
        Self::Persist(e)
    }
}

/// A completed wheel rotation, as reported by [`RotationTracker::sample`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rotation {
    /// Clock time at which the magnet left the sensor
    pub timestamp_ms: u32,
    /// This rotation closed a measurement window and a speed sample was accepted
    pub speed_updated: bool,
    /// This rotation wrote the odometer to storage
    pub flushed: bool,
    /// The odometer write due on this rotation failed; the distance stays
    /// pending
    pub flush_error: Option<PersistError>,
}

/// Outcome of a measurement window
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum WindowOutcome {
    Accepted,
    Implausible,
    Degenerate,
}

/// Speed, distance and odometer tracking for one wheel.
pub struct RotationTracker<P, C, B> {
    config: TrackerConfig,
    sensor: HallSensor<P>,
    clock: C,
    odometer: DistanceStore<B>,

    speed: f32,
    max_speed: f32,
    distance: f32,
    total_distance: f32,
    wheel_rpm: u16,
    averager: SpeedAverager,

    /// Magnet seen, waiting for it to leave the sensor
    rotation_started: bool,
    /// Rotations completed in the current window
    window_rotations: u8,
    window_start_ms: Option<u32>,
    last_rotation_ms: u32,
    /// Distance not yet added to the odometer
    pending_distance: f32,
}

impl<P, C, B> RotationTracker<P, C, B>
where
    P: InputPin,
    C: Clock,
    B: ByteStore,
{
    /// Create a tracker and load the odometer from `store`.
    ///
    /// A blank or corrupted odometer is reset to zero in storage; this is
    /// the only write done here. A failed read is returned as an error and
    /// leaves storage untouched.
    pub fn new(config: TrackerConfig, pin: P, clock: C, store: B) -> Result<Self, TrackerError> {
        let mut odometer = DistanceStore::new(store, config.storage_address);

        let total_distance = match odometer.load()? {
            Some(total) => {
                info!(
                    "Odometer at {} holds {} km",
                    config.storage_address, total
                );
                total
            }
            None => {
                info!(
                    "No valid odometer at {}, starting from zero",
                    config.storage_address
                );
                odometer.save(0.0)?;
                0.0
            }
        };

        let last_rotation_ms = clock.now_ms();

        Ok(Self {
            sensor: HallSensor::new(pin, config.sensor_id),
            config,
            clock,
            odometer,
            speed: 0.0,
            max_speed: 0.0,
            distance: 0.0,
            total_distance,
            wheel_rpm: 0,
            averager: SpeedAverager::new(),
            rotation_started: false,
            window_rotations: 0,
            window_start_ms: None,
            last_rotation_ms,
            pending_distance: 0.0,
        })
    }

    /// Sample the hall sensor once.
    ///
    /// A rotation starts when the magnet is first seen and completes when it
    /// leaves the sensor. All derived state changes at completion, which is
    /// reported as `Some(Rotation)`. Only a sensor fault is an error; a failed
    /// odometer flush is carried in [`Rotation::flush_error`].
    pub fn sample(&mut self) -> Result<Option<Rotation>, TrackerError> {
        let now = self.clock.now_ms();
        let magnet_present = self.sensor.magnet_present()?;

        if magnet_present {
            self.rotation_started = true;
            return Ok(None);
        }
        if !self.rotation_started {
            return Ok(None);
        }

        self.rotation_started = false;
        self.last_rotation_ms = now;
        let window_start = *self.window_start_ms.get_or_insert(now);

        self.window_rotations += 1;
        let mut speed_updated = false;
        if self.window_rotations >= ROTATIONS_PER_WINDOW {
            speed_updated = self.close_window(window_start, now) == WindowOutcome::Accepted;
            self.window_rotations = 0;
            self.window_start_ms = None;
        }

        let circumference = self.config.wheel_circumference_km;
        self.distance += circumference;
        self.pending_distance += circumference;

        let mut flushed = false;
        let mut flush_error = None;
        if self.pending_distance >= FLUSH_THRESHOLD_KM {
            match self.save_total_distance() {
                Ok(()) => flushed = true,
                Err(e) => flush_error = Some(e),
            }
        }

        debug!(
            "Rotation at {} ms ({} in window), trip {} km",
            now, self.window_rotations, self.distance
        );

        Ok(Some(Rotation {
            timestamp_ms: now,
            speed_updated,
            flushed,
            flush_error,
        }))
    }

    /// Derive RPM and speed from the window spanning `start`..`end`.
    fn close_window(&mut self, start: u32, end: u32) -> WindowOutcome {
        let average_gap = end.wrapping_sub(start) / GAPS_PER_WINDOW;
        if average_gap == 0 {
            warn!("Rotation window closed with no elapsed time, skipping");
            return WindowOutcome::Degenerate;
        }

        let rpm = MS_PER_MINUTE / average_gap;
        if rpm >= MAX_PLAUSIBLE_RPM {
            warn!("Discarding implausible wheel speed of {} rpm", rpm);
            return WindowOutcome::Implausible;
        }

        // Bounded by MAX_PLAUSIBLE_RPM
        self.wheel_rpm = rpm as u16;
        self.speed = rpm as f32 * MINUTES_PER_HOUR * self.config.wheel_circumference_km;
        if self.speed >= self.max_speed {
            self.max_speed = self.speed;
        }

        if self.speed != 0.0 && self.averager.push(self.speed) {
            debug!("Average speed now {} km/h", self.averager.average());
        }

        debug!("Window: {} rpm, {} km/h", self.wheel_rpm, self.speed);
        WindowOutcome::Accepted
    }

    /// Detect a stopped wheel.
    ///
    /// Once the wheel is moving and no rotation completed for longer than
    /// [`IDLE_TIMEOUT_MS`], speed and RPM drop to zero and the current window
    /// is abandoned. Returns `true` on that transition only.
    pub fn idle(&mut self) -> bool {
        if self.speed == 0.0 {
            return false;
        }

        let since_last = self.clock.now_ms().wrapping_sub(self.last_rotation_ms);
        if since_last <= IDLE_TIMEOUT_MS {
            return false;
        }

        info!("Wheel stopped, no rotation for {} ms", since_last);
        self.speed = 0.0;
        self.wheel_rpm = 0;
        self.window_rotations = 0;
        self.window_start_ms = None;
        true
    }

    /// Add the pending distance to the odometer and write it to storage.
    ///
    /// Called automatically every [`FLUSH_THRESHOLD_KM`]; call it directly
    /// before power-down so the last partial kilometer is kept. On failure
    /// the odometer and the pending distance are left as they were.
    pub fn save_total_distance(&mut self) -> Result<(), PersistError> {
        let total = self.total_distance + self.pending_distance;
        if let Err(e) = self.odometer.save(total) {
            error!(
                "Odometer flush failed, keeping {} km pending",
                self.pending_distance
            );
            return Err(e);
        }

        self.total_distance = total;
        self.pending_distance = 0.0;
        info!("Odometer saved: {} km", self.total_distance);
        Ok(())
    }

    /// Start a new ride.
    ///
    /// Clears trip distance, speeds and the rotation window. The odometer
    /// and its pending distance are kept.
    pub fn reset_session(&mut self) {
        self.speed = 0.0;
        self.max_speed = 0.0;
        self.distance = 0.0;
        self.wheel_rpm = 0;
        self.averager.reset();
        self.window_rotations = 0;
        self.window_start_ms = None;
        self.last_rotation_ms = self.clock.now_ms();
    }

    /// Current speed in km/h
    pub fn speed(&self) -> f32 {
        self.speed
    }

    /// Smoothed speed in km/h
    pub fn avg_speed(&self) -> f32 {
        self.averager.average()
    }

    /// Highest speed of this session in km/h
    pub fn max_speed(&self) -> f32 {
        self.max_speed
    }

    /// Trip distance in km
    pub fn distance(&self) -> f32 {
        self.distance
    }

    /// Lifetime distance in km, as last successfully written to storage
    pub fn total_distance(&self) -> f32 {
        self.total_distance
    }

    pub fn wheel_rpm(&self) -> u16 {
        self.wheel_rpm
    }

    /// Distance travelled since the last odometer write, in km
    pub fn pending_distance(&self) -> f32 {
        self.pending_distance
    }

    pub fn config(&self) -> &TrackerConfig {
        &self.config
    }

    /// The byte store holding the odometer
    pub fn store(&self) -> &B {
        self.odometer.store()
    }

    /// Release the pin, clock and store
    pub fn into_parts(self) -> (P, C, B) {
        (
            self.sensor.into_inner(),
            self.clock,
            self.odometer.into_inner(),
        )
    }
}
