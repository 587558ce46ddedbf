use embedded_hal::digital::OutputPin;
use log::warn;

use crate::{
    ranging::DistanceSample,
    time::{Duration, Instant},
    Error,
};

/// Proximity alarm driving an active buzzer.
///
/// Nothing is latched: every cycle is judged on its own distances, so a standing
/// obstacle re-sounds the buzzer each cycle.
pub struct SafetyMonitor<P> {
    buzzer: P,
    threshold_cm: u32,
    pulse: Duration,
    sounding_until: Option<Instant>,
}

impl<P: OutputPin> SafetyMonitor<P> {
    pub fn new(mut buzzer: P, threshold_cm: u32, pulse: Duration) -> Result<Self, Error> {
        buzzer.set_low().map_err(|_| Error::Buzzer)?;

        Ok(Self {
            buzzer,
            threshold_cm,
            pulse,
            sounding_until: None,
        })
    }

    pub fn is_busy(&self) -> bool {
        self.sounding_until.is_some()
    }

    pub fn next_deadline(&self) -> Option<Instant> {
        self.sounding_until
    }

    /// Starts a buzzer pulse when alarms are on and either side is too close.
    /// Returns whether the alarm fired this time.
    pub fn check_alarm(
        &mut self,
        distances: &DistanceSample,
        alarms_enabled: bool,
        now: Instant,
    ) -> Result<bool, Error> {
        if !alarms_enabled || !distances.any_within(self.threshold_cm) {
            return Ok(false);
        }

        warn!(
            "obstacle inside {} cm: front {:?}, rear {:?}",
            self.threshold_cm, distances.front, distances.rear
        );
        if self.sounding_until.is_none() {
            self.buzzer.set_high().map_err(|_| Error::Buzzer)?;
        }
        self.sounding_until = Some(now + self.pulse);

        Ok(true)
    }

    pub fn poll(&mut self, now: Instant) -> Result<(), Error> {
        match self.sounding_until {
            Some(until) if now >= until => {
                self.buzzer.set_low().map_err(|_| Error::Buzzer)?;
                self.sounding_until = None;
                Ok(())
            }
            _ => Ok(()),
        }
    }
}
