//! Guarded drive relay bank.
//!
//! Three relays move the vehicle: forward, reverse and brake. Forward travel is
//! delivered as a short energising pulse followed by an automatic soft brake so
//! the vehicle advances in bounded steps, reverse is held until braked, and the
//! brake itself is only ever pulsed. The forward and reverse relays are never
//! asserted at the same time: a direction change always goes through BRAKING.
//!
//! Pulses are phases with deadlines. Callers advance them with
//! [`DriveController::poll`]; a sequence that has started always runs to
//! completion and requests arriving meanwhile are dropped.

use core::fmt;

use embedded_hal::digital::{OutputPin, PinState};
use log::{debug, info};
use serde::Serialize;

use crate::{
    time::{dur_from_millis, elapsed_since, Duration, Instant},
    Error,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum DriveState {
    #[serde(rename = "BRAKE")]
    Braking,
    #[serde(rename = "FORWARD")]
    Forward,
    #[serde(rename = "REVERSE")]
    Reversing,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Relay {
    Forward,
    Reverse,
    Brake,
}

impl fmt::Display for Relay {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Relay::Forward => "forward",
            Relay::Reverse => "reverse",
            Relay::Brake => "brake",
        };
        f.write_str(name)
    }
}

/// What became of a drive request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Response {
    Accepted,
    /// The controller is already in the requested state.
    AlreadyActive,
    /// The opposite direction is active and has to be braked first.
    Blocked,
    /// A forward step was accepted less than the guard window ago.
    Debounced,
    /// A pulse sequence is still running.
    Busy,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct DriveTiming {
    pub brake_pulse: Duration,
    /// Gap between releasing the brake and energising forward, lets the contacts open.
    pub settle: Duration,
    pub forward_pulse: Duration,
    pub soft_brake: Duration,
    /// Minimum time between two accepted forward steps.
    pub forward_guard: Duration,
}

impl Default for DriveTiming {
    fn default() -> Self {
        Self {
            brake_pulse: dur_from_millis(200),
            settle: dur_from_millis(20),
            forward_pulse: dur_from_millis(120),
            soft_brake: dur_from_millis(50),
            forward_guard: dur_from_millis(300),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    Idle,
    Brake { until: Instant },
    Settle { until: Instant },
    Energize { until: Instant },
    SoftBrake { until: Instant },
}

impl Phase {
    fn deadline(&self) -> Option<Instant> {
        match *self {
            Phase::Idle => None,
            Phase::Brake { until }
            | Phase::Settle { until }
            | Phase::Energize { until }
            | Phase::SoftBrake { until } => Some(until),
        }
    }
}

pub struct DriveController<F, R, B> {
    forward: F,
    reverse: R,
    brake: B,
    timing: DriveTiming,
    state: DriveState,
    phase: Phase,
    last_forward: Option<Instant>,
}

impl<F: OutputPin, R: OutputPin, B: OutputPin> DriveController<F, R, B> {
    /// Releases every relay. The vehicle starts out BRAKING without pulsing the brake.
    pub fn new(forward: F, reverse: R, brake: B, timing: DriveTiming) -> Result<Self, Error> {
        let mut controller = Self {
            forward,
            reverse,
            brake,
            timing,
            state: DriveState::Braking,
            phase: Phase::Idle,
            last_forward: None,
        };
        controller.set(Relay::Forward, false)?;
        controller.set(Relay::Reverse, false)?;
        controller.set(Relay::Brake, false)?;

        Ok(controller)
    }

    pub fn state(&self) -> DriveState {
        self.state
    }

    pub fn is_busy(&self) -> bool {
        self.phase != Phase::Idle
    }

    /// When the running pulse sequence next needs a [`poll`](Self::poll).
    pub fn next_deadline(&self) -> Option<Instant> {
        self.phase.deadline()
    }

    pub fn request_brake(&mut self, now: Instant) -> Result<Response, Error> {
        if self.state == DriveState::Braking {
            return Ok(Response::AlreadyActive);
        }
        if self.is_busy() {
            debug!("brake dropped, pulse in progress");
            return Ok(Response::Busy);
        }

        self.set(Relay::Forward, false)?;
        self.set(Relay::Reverse, false)?;
        self.set(Relay::Brake, true)?;
        self.state = DriveState::Braking;
        self.phase = Phase::Brake {
            until: now + self.timing.brake_pulse,
        };
        info!("braking");

        Ok(Response::Accepted)
    }

    pub fn request_forward(&mut self, now: Instant) -> Result<Response, Error> {
        match self.state {
            DriveState::Forward => return Ok(Response::AlreadyActive),
            DriveState::Reversing => {
                debug!("forward dropped, still reversing");
                return Ok(Response::Blocked);
            }
            DriveState::Braking => {}
        }
        if self.is_busy() {
            debug!("forward dropped, pulse in progress");
            return Ok(Response::Busy);
        }
        if let Some(last) = self.last_forward {
            if elapsed_since(now, last) < self.timing.forward_guard {
                debug!("forward dropped, inside guard window");
                return Ok(Response::Debounced);
            }
        }

        self.set(Relay::Reverse, false)?;
        self.set(Relay::Brake, false)?;
        self.state = DriveState::Forward;
        self.last_forward = Some(now);
        self.phase = Phase::Settle {
            until: now + self.timing.settle,
        };
        info!("forward step");

        Ok(Response::Accepted)
    }

    pub fn request_reverse(&mut self, _now: Instant) -> Result<Response, Error> {
        match self.state {
            DriveState::Reversing => return Ok(Response::AlreadyActive),
            DriveState::Forward => {
                debug!("reverse dropped, still moving forward");
                return Ok(Response::Blocked);
            }
            DriveState::Braking => {}
        }
        if self.is_busy() {
            debug!("reverse dropped, pulse in progress");
            return Ok(Response::Busy);
        }

        self.set(Relay::Forward, false)?;
        self.set(Relay::Brake, false)?;
        self.set(Relay::Reverse, true)?;
        self.state = DriveState::Reversing;
        info!("reversing");

        Ok(Response::Accepted)
    }

    /// Advances every phase whose deadline has passed. Chained phases are timed
    /// from the previous deadline, so a late poll does not stretch the sequence.
    pub fn poll(&mut self, now: Instant) -> Result<(), Error> {
        loop {
            let next = match self.phase {
                Phase::Brake { until } if now >= until => {
                    self.set(Relay::Brake, false)?;
                    Phase::Idle
                }
                Phase::Settle { until } if now >= until => {
                    self.set(Relay::Forward, true)?;
                    Phase::Energize {
                        until: until + self.timing.forward_pulse,
                    }
                }
                Phase::Energize { until } if now >= until => {
                    self.set(Relay::Forward, false)?;
                    self.set(Relay::Brake, true)?;
                    self.state = DriveState::Braking;
                    Phase::SoftBrake {
                        until: until + self.timing.soft_brake,
                    }
                }
                Phase::SoftBrake { until } if now >= until => {
                    self.set(Relay::Brake, false)?;
                    Phase::Idle
                }
                _ => return Ok(()),
            };
            self.phase = next;
        }
    }

    fn set(&mut self, relay: Relay, on: bool) -> Result<(), Error> {
        let level = PinState::from(on);
        match relay {
            Relay::Forward => self.forward.set_state(level).map_err(|_| Error::Relay(relay)),
            Relay::Reverse => self.reverse.set_state(level).map_err(|_| Error::Relay(relay)),
            Relay::Brake => self.brake.set_state(level).map_err(|_| Error::Relay(relay)),
        }
    }
}
