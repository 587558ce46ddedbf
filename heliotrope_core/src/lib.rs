#![cfg_attr(not(test), no_std)]

//! Decision and actuation core of the light-following vehicle.
//!
//! Everything in here is hardware independent: actuators are reached through the
//! `embedded-hal` 1.0 traits and time is handed in by the caller as a millisecond
//! [`Instant`](time::Instant), so the same state machines run on the board and in
//! host tests.

pub mod climate;
pub mod command;
pub mod config;
pub mod drive;
pub mod error;
pub mod light;
pub mod ranging;
pub mod safety;
pub mod steering;
pub mod telemetry;
pub mod time;
pub mod vehicle;

#[cfg(test)]
mod test_support;

pub use config::Config;
pub use error::Error;
pub use vehicle::{Actuators, CycleReport, SensorFrame, Vehicle};
