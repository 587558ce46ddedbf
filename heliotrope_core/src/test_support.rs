//! Test doubles for the `embedded-hal` traits the controllers are generic over.

use std::{cell::RefCell, convert::Infallible, rc::Rc, vec::Vec};

use embedded_hal::{digital, pwm};

use crate::time::{instant_from_millis, Instant};

pub const FORWARD: usize = 0;
pub const REVERSE: usize = 1;
pub const BRAKE: usize = 2;
pub const BUZZER: usize = 3;

pub fn at(millis: u32) -> Instant {
    instant_from_millis(millis)
}

#[derive(Default)]
struct Lines {
    levels: [bool; 4],
    rising: [usize; 4],
    overlaps: usize,
}

/// Shared record of every output line, checking forward/reverse exclusivity on each write.
#[derive(Clone, Default)]
pub struct OutputBank(Rc<RefCell<Lines>>);

impl OutputBank {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn pin(&self, line: usize) -> FakePin {
        FakePin {
            bank: self.clone(),
            line,
        }
    }

    pub fn level(&self, line: usize) -> bool {
        self.0.borrow().levels[line]
    }

    /// Number of low-to-high edges seen on `line`.
    pub fn pulses(&self, line: usize) -> usize {
        self.0.borrow().rising[line]
    }

    /// Writes after which forward and reverse were both high.
    pub fn overlaps(&self) -> usize {
        self.0.borrow().overlaps
    }

    fn write(&self, line: usize, level: bool) {
        let mut lines = self.0.borrow_mut();
        if level && !lines.levels[line] {
            lines.rising[line] += 1;
        }
        lines.levels[line] = level;
        if lines.levels[FORWARD] && lines.levels[REVERSE] {
            lines.overlaps += 1;
        }
    }
}

pub struct FakePin {
    bank: OutputBank,
    line: usize,
}

impl digital::ErrorType for FakePin {
    type Error = Infallible;
}

impl digital::OutputPin for FakePin {
    fn set_low(&mut self) -> Result<(), Self::Error> {
        self.bank.write(self.line, false);
        Ok(())
    }

    fn set_high(&mut self) -> Result<(), Self::Error> {
        self.bank.write(self.line, true);
        Ok(())
    }
}

#[derive(Debug)]
pub struct PinFault;

impl digital::Error for PinFault {
    fn kind(&self) -> digital::ErrorKind {
        digital::ErrorKind::Other
    }
}

/// An output whose driver rejects every write.
pub struct BrokenPin;

impl digital::ErrorType for BrokenPin {
    type Error = PinFault;
}

impl digital::OutputPin for BrokenPin {
    fn set_low(&mut self) -> Result<(), Self::Error> {
        Err(PinFault)
    }

    fn set_high(&mut self) -> Result<(), Self::Error> {
        Err(PinFault)
    }
}

/// PWM channel with a 20 ms period at 1 µs resolution, recording every duty written.
#[derive(Clone, Default)]
pub struct FakeServo(Rc<RefCell<Vec<u16>>>);

impl FakeServo {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn duties(&self) -> Vec<u16> {
        self.0.borrow().clone()
    }
}

impl pwm::ErrorType for FakeServo {
    type Error = Infallible;
}

impl pwm::SetDutyCycle for FakeServo {
    fn max_duty_cycle(&self) -> u16 {
        20_000
    }

    fn set_duty_cycle(&mut self, duty: u16) -> Result<(), Self::Error> {
        self.0.borrow_mut().push(duty);
        Ok(())
    }
}
