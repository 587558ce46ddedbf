use log::warn;
use serde::Serialize;

use crate::time::{elapsed_since, Duration, Instant};

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ClimateReading {
    /// Degrees Celsius.
    pub temperature: f32,
    /// Relative humidity, percent.
    pub humidity: f32,
}

impl ClimateReading {
    /// Keeps a sample only if both values are numbers and the humidity is a
    /// percentage. The sensor occasionally reports values like 160 % when the
    /// bus glitches.
    pub fn validated(temperature: f32, humidity: f32) -> Option<Self> {
        if temperature.is_nan() || humidity.is_nan() || !(0.0..=100.0).contains(&humidity) {
            warn!("discarding climate sample: {} C, {} %", temperature, humidity);
            return None;
        }

        Some(Self {
            temperature,
            humidity,
        })
    }

    /// Decodes the five bytes a DHT11 sends: humidity and temperature as integer
    /// and tenth parts, then a checksum. Bit 7 of the temperature tenths marks a
    /// negative value. `None` if the checksum does not match.
    pub fn from_dht11_frame(frame: [u8; 5]) -> Option<Self> {
        let sum = frame[..4].iter().fold(0_u8, |acc, b| acc.wrapping_add(*b));
        if sum != frame[4] {
            return None;
        }

        let humidity = f32::from(frame[0]) + f32::from(frame[1]) / 10.0;
        let magnitude = f32::from(frame[2]) + f32::from(frame[3] & 0x7F) / 10.0;
        let temperature = if frame[3] & 0x80 != 0 {
            -magnitude
        } else {
            magnitude
        };

        Some(Self {
            temperature,
            humidity,
        })
    }
}

/// Rate limits the slow temperature/humidity read independently of the control cycle.
#[derive(Debug, Clone, Copy)]
pub struct ClimateSampler {
    interval: Duration,
    last: Option<Instant>,
}

impl ClimateSampler {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            last: None,
        }
    }

    /// `true` when a sample should be taken now; the first call always is.
    pub fn due(&mut self, now: Instant) -> bool {
        let due = match self.last {
            None => true,
            Some(last) => elapsed_since(now, last) >= self.interval,
        };
        if due {
            self.last = Some(now);
        }

        due
    }
}
