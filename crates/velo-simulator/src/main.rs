//! Desktop simulator for the velo-rs bicycle speedometer.
//!
//! Spins a virtual wheel past a virtual hall sensor and runs velo-core's
//! rotation tracker against it exactly like the head unit does: polling the
//! line every millisecond and checking for a stopped wheel on the same tick.
//! Readings are logged once per second through the integer-only formatter.
//!
//! The EEPROM image is kept in a file, so the odometer carries over between
//! runs just as it does across power cycles on the bike.
//!
//! # Environment
//!
//! Read from the process environment after loading `.env`, if present.
//!
//! | Variable               | Default          | Meaning                        |
//! |------------------------|------------------|--------------------------------|
//! | `VELO_WHEEL_MM`        | 2105             | Wheel circumference in mm      |
//! | `VELO_STORAGE_ADDRESS` | 0                | Odometer address in EEPROM     |
//! | `VELO_EEPROM_PATH`     | velo-eeprom.bin  | File holding the EEPROM image  |
//! | `VELO_RIDE_SECS`       | 60               | Length of the simulated ride   |

use std::cell::Cell;
use std::convert::Infallible;
use std::path::{Path, PathBuf};
use std::rc::Rc;
use std::str::FromStr;
use std::time::{Duration, Instant};

use embedded_hal::digital::{ErrorType, InputPin};
use log::{error, info, warn};

use velo_core::format::{FRACTION_BUF_LEN, format_fraction};
use velo_core::sensors::EmbassyClock;
use velo_core::storage::EepromBuffer;
use velo_core::{RotationTracker, TrackerConfig};

// ---------------------------------------------------------------------------
// Simulation constants
// ---------------------------------------------------------------------------

/// Emulated EEPROM size, matching a small AVR part
const EEPROM_SIZE: usize = 1024;

/// Main loop period; must stay well below the magnet dwell time.
const POLL_INTERVAL: Duration = Duration::from_millis(1);

/// Interval between logged readings.
const REPORT_INTERVAL: Duration = Duration::from_secs(1);

/// Fraction of a revolution during which the magnet holds the line low.
const MAGNET_ARC: f64 = 0.08;

/// Top speed of the ride profile in km/h.
const CRUISE_SPEED_KMH: f64 = 28.0;

/// Time spent standing still at the end so the tracker detects the stop.
const STOP_SECS: f64 = 6.0;

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

struct SimulatorConfig {
    wheel_mm: u32,
    storage_address: u16,
    eeprom_path: PathBuf,
    ride_secs: f64,
}

impl SimulatorConfig {
    fn from_env() -> Self {
        if let Err(e) = dotenvy::dotenv() {
            if !e.not_found() {
                warn!("Ignoring unreadable .env file: {}", e);
            }
        }

        Self {
            wheel_mm: env_or("VELO_WHEEL_MM", 2105),
            storage_address: env_or("VELO_STORAGE_ADDRESS", 0),
            eeprom_path: std::env::var("VELO_EEPROM_PATH")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from("velo-eeprom.bin")),
            ride_secs: env_or::<u32>("VELO_RIDE_SECS", 60) as f64,
        }
    }
}

/// Parse an environment variable, falling back to `default` when it is
/// unset or malformed.
fn env_or<T: FromStr + Copy + std::fmt::Display>(name: &str, default: T) -> T {
    match std::env::var(name) {
        Ok(raw) => raw.trim().parse().unwrap_or_else(|_| {
            warn!("{} = {:?} is not valid, using {}", name, raw, default);
            default
        }),
        Err(_) => default,
    }
}

// ---------------------------------------------------------------------------
// EEPROM image persistence
// ---------------------------------------------------------------------------

fn load_eeprom(path: &Path) -> EepromBuffer<EEPROM_SIZE> {
    match std::fs::read(path) {
        Ok(bytes) => match <[u8; EEPROM_SIZE]>::try_from(bytes.as_slice()) {
            Ok(image) => {
                info!("Loaded EEPROM image from {}", path.display());
                EepromBuffer::from_image(image)
            }
            Err(_) => {
                warn!(
                    "{} holds {} bytes, expected {}; starting erased",
                    path.display(),
                    bytes.len(),
                    EEPROM_SIZE
                );
                EepromBuffer::new()
            }
        },
        Err(_) => {
            info!("No EEPROM image at {}, starting erased", path.display());
            EepromBuffer::new()
        }
    }
}

fn save_eeprom(path: &Path, eeprom: &EepromBuffer<EEPROM_SIZE>) {
    match std::fs::write(path, eeprom.image()) {
        Ok(()) => info!("Saved EEPROM image to {}", path.display()),
        Err(e) => error!("Failed to save EEPROM image to {}: {}", path.display(), e),
    }
}

// ---------------------------------------------------------------------------
// Simulated wheel
// ---------------------------------------------------------------------------

/// Hall sensor line driven by the simulated wheel. High means no magnet.
struct SimulatedHallLine {
    high: Rc<Cell<bool>>,
}

impl ErrorType for SimulatedHallLine {
    type Error = Infallible;
}

impl InputPin for SimulatedHallLine {
    fn is_high(&mut self) -> Result<bool, Infallible> {
        Ok(self.high.get())
    }

    fn is_low(&mut self) -> Result<bool, Infallible> {
        Ok(!self.high.get())
    }
}

/// Integrates a speed profile into wheel revolutions and drives the line.
struct SimulatedWheel {
    circumference_km: f64,
    revolutions: f64,
    line: Rc<Cell<bool>>,
}

impl SimulatedWheel {
    fn new(circumference_km: f64) -> Self {
        Self {
            circumference_km,
            revolutions: 0.0,
            line: Rc::new(Cell::new(true)),
        }
    }

    fn line(&self) -> SimulatedHallLine {
        SimulatedHallLine {
            high: Rc::clone(&self.line),
        }
    }

    /// Advance the wheel by `dt_secs` at `speed_kmh`.
    fn advance(&mut self, dt_secs: f64, speed_kmh: f64) {
        let km = speed_kmh * dt_secs / 3600.0;
        self.revolutions += km / self.circumference_km;
        self.line.set(self.revolutions.fract() >= MAGNET_ARC);
    }
}

/// Speed in km/h at `t` seconds into a ride of `ride_secs`.
///
/// Accelerates for ten seconds, cruises with a gentle surge, brakes over
/// the last ten seconds before the final stop.
fn ride_profile(t: f64, ride_secs: f64) -> f64 {
    let braking_end = (ride_secs - STOP_SECS).max(0.0);
    let braking_start = (braking_end - 10.0).max(0.0);

    if t >= braking_end {
        0.0
    } else if t < 10.0 {
        CRUISE_SPEED_KMH * t / 10.0
    } else if t < braking_start {
        CRUISE_SPEED_KMH + 3.0 * (t / 7.0).sin()
    } else {
        CRUISE_SPEED_KMH * (braking_end - t) / 10.0
    }
}

// ---------------------------------------------------------------------------
// Reporting
// ---------------------------------------------------------------------------

/// Render a reading with the head unit's formatter.
fn fixed(value: f32, precision: u8) -> String {
    let mut buf = [0u8; FRACTION_BUF_LEN];
    match format_fraction(value, precision, &mut buf) {
        Ok(text) => text.to_owned(),
        Err(e) => format!("<{}>", e),
    }
}

// ---------------------------------------------------------------------------
// Entry point
// ---------------------------------------------------------------------------

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    info!("Starting velo-rs simulator");

    let sim_config = SimulatorConfig::from_env();
    let config = TrackerConfig::from_wheel_circumference_mm(
        0,
        sim_config.wheel_mm,
        sim_config.storage_address,
    );
    info!(
        "Wheel {} mm, odometer at {}, ride of {} s",
        sim_config.wheel_mm, sim_config.storage_address, sim_config.ride_secs
    );

    let mut wheel = SimulatedWheel::new(config.wheel_circumference_km as f64);
    let eeprom = load_eeprom(&sim_config.eeprom_path);

    let mut tracker = match RotationTracker::new(config, wheel.line(), EmbassyClock, eeprom) {
        Ok(tracker) => tracker,
        Err(e) => {
            error!("Failed to start tracker: {}", e);
            return;
        }
    };
    info!("Odometer: {} km", fixed(tracker.total_distance(), 2));

    let ride_start = Instant::now();
    let mut last_tick = ride_start;
    let mut last_report = ride_start;

    // -----------------------------------------------------------------------
    // Main loop
    // -----------------------------------------------------------------------
    loop {
        let t = ride_start.elapsed().as_secs_f64();
        if t >= sim_config.ride_secs {
            break;
        }

        // --- Wheel --------------------------------------------------------
        let dt = last_tick.elapsed().as_secs_f64();
        last_tick = Instant::now();
        wheel.advance(dt, ride_profile(t, sim_config.ride_secs));

        // --- Tracker ------------------------------------------------------
        match tracker.sample() {
            Ok(Some(rotation)) => {
                if let Some(e) = rotation.flush_error {
                    warn!("Odometer flush failed, retrying next rotation: {}", e);
                }
            }
            Ok(None) => {}
            Err(e) => error!("Sampling failed: {}", e),
        }
        if tracker.idle() {
            info!("Wheel stopped");
        }

        // --- Report -------------------------------------------------------
        if last_report.elapsed() >= REPORT_INTERVAL {
            info!(
                "{} km/h (avg {}, max {})  {} rpm  trip {} km  total {} km",
                fixed(tracker.speed(), 1),
                fixed(tracker.avg_speed(), 1),
                fixed(tracker.max_speed(), 1),
                tracker.wheel_rpm(),
                fixed(tracker.distance(), 3),
                fixed(tracker.total_distance(), 2),
            );
            last_report = Instant::now();
        }

        std::thread::sleep(POLL_INTERVAL);
    }

    // Power-down: keep the last partial kilometer
    if let Err(e) = tracker.save_total_distance() {
        error!("Final odometer flush failed: {}", e);
    }
    info!(
        "Ride over: {} km, odometer {} km",
        fixed(tracker.distance(), 3),
        fixed(tracker.total_distance(), 2)
    );

    let (_, _, eeprom) = tracker.into_parts();
    save_eeprom(&sim_config.eeprom_path, &eeprom);

    info!("Simulator exiting");
}
