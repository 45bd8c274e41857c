//! Hardware-independent core library for velo-rs
//!
//! This crate contains all platform-agnostic logic for the velo bicycle
//! speedometer: hall-sensor rotation tracking, speed and distance derivation,
//! batched persistence of the odometer, and integer-only number formatting
//! for displays.
//!
//! It is `#![no_std]` and does not allocate, so it compiles on embedded
//! targets and on desktop hosts (for the simulator and tests).

#![cfg_attr(not(test), no_std)]

pub mod config;
pub mod format;
pub mod sensors;
pub mod storage;
pub mod tracker;

pub use config::TrackerConfig;
pub use tracker::{Rotation, RotationTracker, TrackerError};
