use embedded_hal::pwm::SetDutyCycle;
use serde::Serialize;

use crate::{light::Direction, Error};

/// Highest angle a hobby servo accepts.
const SERVO_MAX_DEGREES: u8 = 180;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SteeringPosition {
    Left,
    Right,
    Center,
}

impl SteeringPosition {
    /// A dark verdict has no position, the steering holds wherever it was.
    pub fn from_direction(direction: Direction) -> Option<Self> {
        match direction {
            Direction::Left => Some(Self::Left),
            Direction::Right => Some(Self::Right),
            Direction::Center => Some(Self::Center),
            Direction::None => None,
        }
    }
}

/// Servo angles, in degrees, matching the linkage on the front axle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct SteeringAngles {
    pub left: u8,
    pub center: u8,
    pub right: u8,
}

impl Default for SteeringAngles {
    fn default() -> Self {
        Self {
            left: 0,
            center: 18,
            right: 37,
        }
    }
}

impl SteeringAngles {
    pub fn angle_for(&self, position: SteeringPosition) -> u8 {
        match position {
            SteeringPosition::Left => self.left,
            SteeringPosition::Right => self.right,
            SteeringPosition::Center => self.center,
        }
    }
}

/// 50 Hz hobby servo on a PWM channel: 1 ms pulse at 0 degrees, 2 ms at 180.
pub struct Servo<P: SetDutyCycle> {
    pwm: P,
}

impl<P: SetDutyCycle> Servo<P> {
    pub fn new(pwm: P) -> Self {
        Self { pwm }
    }

    pub fn set_angle(&mut self, degrees: u8) -> Result<(), P::Error> {
        let degrees = degrees.min(SERVO_MAX_DEGREES);
        let min_duty = u32::from(self.pwm.max_duty_cycle() / 20);
        let max_duty = u32::from(self.pwm.max_duty_cycle() / 10);

        let duty = min_duty + ((max_duty - min_duty) * u32::from(degrees)) / u32::from(SERVO_MAX_DEGREES);
        self.pwm.set_duty_cycle(duty as u16)
    }
}

pub struct SteeringController<P: SetDutyCycle> {
    servo: Servo<P>,
    angles: SteeringAngles,
    position: SteeringPosition,
}

impl<P: SetDutyCycle> SteeringController<P> {
    /// Takes over the servo and centres it.
    pub fn new(pwm: P, angles: SteeringAngles) -> Result<Self, Error> {
        let mut controller = Self {
            servo: Servo::new(pwm),
            angles,
            position: SteeringPosition::Center,
        };
        controller.command(SteeringPosition::Center)?;

        Ok(controller)
    }

    pub fn position(&self) -> SteeringPosition {
        self.position
    }

    /// Points the wheels at the light. [`Direction::None`] leaves the last command in place.
    pub fn steer(&mut self, direction: Direction) -> Result<SteeringPosition, Error> {
        if let Some(position) = SteeringPosition::from_direction(direction) {
            self.command(position)?;
        }

        Ok(self.position)
    }

    fn command(&mut self, position: SteeringPosition) -> Result<(), Error> {
        self.servo
            .set_angle(self.angles.angle_for(position))
            .map_err(|_| Error::Steering)?;
        self.position = position;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::FakeServo;

    #[test]
    fn servo_maps_angles_onto_one_to_two_milliseconds() {
        let pwm = FakeServo::new();
        let mut servo = Servo::new(pwm.clone());

        servo.set_angle(0).unwrap();
        servo.set_angle(90).unwrap();
        servo.set_angle(180).unwrap();
        servo.set_angle(200).unwrap();

        assert_eq!(pwm.duties(), vec![1_000, 1_500, 2_000, 2_000]);
    }

    #[test]
    fn starts_centred() {
        let pwm = FakeServo::new();
        let steering = SteeringController::new(pwm.clone(), SteeringAngles::default()).unwrap();

        assert_eq!(steering.position(), SteeringPosition::Center);
        assert_eq!(pwm.duties(), vec![1_100]);
    }

    #[test]
    fn each_verdict_commands_its_angle() {
        let pwm = FakeServo::new();
        let mut steering = SteeringController::new(pwm.clone(), SteeringAngles::default()).unwrap();

        assert_eq!(steering.steer(Direction::Right), Ok(SteeringPosition::Right));
        assert_eq!(steering.steer(Direction::Left), Ok(SteeringPosition::Left));
        assert_eq!(steering.steer(Direction::Center), Ok(SteeringPosition::Center));

        // 37 degrees -> 1000 + 1000 * 37 / 180
        assert_eq!(pwm.duties(), vec![1_100, 1_205, 1_000, 1_100]);
    }

    #[test]
    fn darkness_holds_the_last_position() {
        let pwm = FakeServo::new();
        let mut steering = SteeringController::new(pwm.clone(), SteeringAngles::default()).unwrap();

        steering.steer(Direction::Left).unwrap();
        assert_eq!(steering.steer(Direction::None), Ok(SteeringPosition::Left));
        assert_eq!(pwm.duties().len(), 2);
    }
}
