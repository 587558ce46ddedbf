//! Tunables for the whole controller.
//!
//! The defaults are the values the vehicle was calibrated with: 10-bit light
//! readings, a hobby servo on the steering linkage and HC-SR04 rangefinders
//! reporting centimetres.

use crate::{
    drive::DriveTiming,
    light::LightCalibration,
    steering::SteeringAngles,
    time::{dur_from_millis, Duration},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Config {
    pub light: LightCalibration,
    pub steering: SteeringAngles,
    pub drive: DriveTiming,
    /// Obstacles strictly closer than this sound the buzzer, in centimetres.
    pub alarm_distance_cm: u32,
    pub buzzer_pulse: Duration,
    pub climate_interval: Duration,
    /// Software delay between two control cycles.
    pub cycle_period: Duration,
    /// How long the rangefinder driver waits for an echo, in microseconds.
    pub echo_timeout_us: u32,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            light: LightCalibration::default(),
            steering: SteeringAngles::default(),
            drive: DriveTiming::default(),
            alarm_distance_cm: 7,
            buzzer_pulse: dur_from_millis(200),
            climate_interval: dur_from_millis(2_000),
            cycle_period: dur_from_millis(80),
            echo_timeout_us: 38_000,
        }
    }
}
