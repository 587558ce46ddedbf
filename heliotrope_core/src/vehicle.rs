//! One control cycle: sense, decide, actuate, report.

use embedded_hal::{digital::OutputPin, pwm::SetDutyCycle};
use log::error;

use crate::{
    climate::{ClimateReading, ClimateSampler},
    command::{Command, ControlFlags},
    drive::{DriveController, DriveState},
    light::{classify, Classification, Direction, LightCalibration},
    ranging::DistanceSample,
    safety::SafetyMonitor,
    steering::{SteeringController, SteeringPosition},
    telemetry::Telemetry,
    time::Instant,
    Config, Error,
};

/// Everything sampled at the start of a cycle.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct SensorFrame {
    pub light_left: u16,
    pub light_right: u16,
    pub sound_level: u16,
    pub rain_level: u16,
    /// Echo high time of the front rangefinder, `None` on timeout.
    pub front_echo_us: Option<u32>,
    pub rear_echo_us: Option<u32>,
    /// Only present on cycles where the climate sensor was read and answered.
    pub climate: Option<ClimateReading>,
}

/// The outputs the vehicle drives.
pub struct Actuators<F, R, B, S, Z> {
    pub forward: F,
    pub reverse: R,
    pub brake: B,
    pub steering: S,
    pub buzzer: Z,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CycleReport {
    pub light: Classification,
    pub distances: DistanceSample,
    pub sound_level: u16,
    pub rain_level: u16,
    pub climate: Option<ClimateReading>,
    pub steering: SteeringPosition,
    /// The buzzer was started this cycle.
    pub alarm: bool,
    pub flags: ControlFlags,
}

pub struct Vehicle<F, R, B, S: SetDutyCycle, Z> {
    drive: DriveController<F, R, B>,
    steering: SteeringController<S>,
    safety: SafetyMonitor<Z>,
    flags: ControlFlags,
    climate: ClimateSampler,
    light: LightCalibration,
}

impl<F, R, B, S, Z> Vehicle<F, R, B, S, Z>
where
    F: OutputPin,
    R: OutputPin,
    B: OutputPin,
    S: SetDutyCycle,
    Z: OutputPin,
{
    /// Centres the steering and releases every relay.
    pub fn new(actuators: Actuators<F, R, B, S, Z>, config: &Config) -> Result<Self, Error> {
        Ok(Self {
            drive: DriveController::new(
                actuators.forward,
                actuators.reverse,
                actuators.brake,
                config.drive,
            )?,
            steering: SteeringController::new(actuators.steering, config.steering)?,
            safety: SafetyMonitor::new(
                actuators.buzzer,
                config.alarm_distance_cm,
                config.buzzer_pulse,
            )?,
            flags: ControlFlags::default(),
            climate: ClimateSampler::new(config.climate_interval),
            light: config.light,
        })
    }

    pub fn apply(&mut self, command: Command) {
        self.flags.apply(command);
    }

    pub fn flags(&self) -> ControlFlags {
        self.flags
    }

    pub fn drive_state(&self) -> DriveState {
        self.drive.state()
    }

    pub fn steering_position(&self) -> SteeringPosition {
        self.steering.position()
    }

    /// Whether the climate sensor should be read for this cycle.
    pub fn climate_due(&mut self, now: Instant) -> bool {
        self.climate.due(now)
    }

    pub fn step(&mut self, now: Instant, frame: &SensorFrame) -> CycleReport {
        let distances = DistanceSample::from_echoes(frame.front_echo_us, frame.rear_echo_us);
        let climate = frame
            .climate
            .and_then(|c| ClimateReading::validated(c.temperature, c.humidity));

        let alarm = logged(self.safety.check_alarm(&distances, self.flags.alarms, now))
            .unwrap_or(false);

        let light = classify(frame.light_left, frame.light_right, &self.light);
        let drive = if light.direction == Direction::None {
            self.drive.request_brake(now)
        } else {
            logged(self.steering.steer(light.direction));
            if self.flags.follow_light {
                self.drive.request_forward(now)
            } else {
                self.drive.request_brake(now)
            }
        };
        logged(drive);

        CycleReport {
            light,
            distances,
            sound_level: frame.sound_level,
            rain_level: frame.rain_level,
            climate,
            steering: self.steering.position(),
            alarm,
            flags: self.flags,
        }
    }

    /// Advances drive and buzzer pulses.
    pub fn poll(&mut self, now: Instant) {
        logged(self.drive.poll(now));
        logged(self.safety.poll(now));
    }

    pub fn is_busy(&self) -> bool {
        self.drive.is_busy() || self.safety.is_busy()
    }

    /// Earliest moment a pending pulse needs [`poll`](Self::poll).
    pub fn next_deadline(&self) -> Option<Instant> {
        match (self.drive.next_deadline(), self.safety.next_deadline()) {
            (Some(a), Some(b)) => Some(a.min(b)),
            (a, b) => a.or(b),
        }
    }

    /// The records for one cycle, in the order the host reads them. `last_action`
    /// is taken when this is called, so call it once the pulses have settled.
    pub fn telemetry(&self, report: &CycleReport) -> impl Iterator<Item = Telemetry> {
        let levels = [
            Telemetry::SoundLevel {
                sound_level: report.sound_level,
            },
            Telemetry::RainLevel {
                rain_level: report.rain_level,
            },
        ];
        let climate = report.climate.map(|c| Telemetry::Climate {
            temperature: c.temperature,
            humidity: c.humidity,
        });
        let status = [
            Telemetry::Distances {
                distance_front: report.distances.front,
                distance_back: report.distances.rear,
            },
            Telemetry::LightDirection {
                light_direction: report.light.direction,
            },
            Telemetry::SteeringStatus {
                steering_status: report.steering,
            },
            Telemetry::LastAction {
                last_action: self.drive.state(),
            },
            Telemetry::LightIntensity {
                light_intensity: report.light.intensity,
            },
            Telemetry::AlarmStatus {
                alarm_status: report.flags.alarms,
            },
            Telemetry::FollowLight {
                follow_light: report.flags.follow_light,
            },
        ];

        levels.into_iter().chain(climate).chain(status)
    }
}

fn logged<T>(result: Result<T, Error>) -> Option<T> {
    result.inspect_err(|e| error!("{}", e)).ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        ranging::Range,
        test_support::{at, FakePin, FakeServo, OutputBank, BRAKE, BUZZER, FORWARD, REVERSE},
    };

    type TestVehicle = Vehicle<FakePin, FakePin, FakePin, FakeServo, FakePin>;

    fn vehicle() -> (TestVehicle, OutputBank, FakeServo) {
        let bank = OutputBank::new();
        let servo = FakeServo::new();
        let vehicle = Vehicle::new(
            Actuators {
                forward: bank.pin(FORWARD),
                reverse: bank.pin(REVERSE),
                brake: bank.pin(BRAKE),
                steering: servo.clone(),
                buzzer: bank.pin(BUZZER),
            },
            &Config::default(),
        )
        .unwrap();

        (vehicle, bank, servo)
    }

    /// Runs a cycle the way the firmware does: step, wait out the pulses, then the cycle delay.
    fn cycle(vehicle: &mut TestVehicle, now: &mut u32, frame: &SensorFrame) -> CycleReport {
        let report = vehicle.step(at(*now), frame);
        while vehicle.is_busy() {
            *now += 1;
            vehicle.poll(at(*now));
        }
        *now += 80;

        report
    }

    fn light(left: u16, right: u16) -> SensorFrame {
        SensorFrame {
            light_left: left,
            light_right: right,
            ..SensorFrame::default()
        }
    }

    #[test]
    fn starts_centred_and_braking() {
        let (vehicle, bank, servo) = vehicle();

        assert_eq!(vehicle.steering_position(), SteeringPosition::Center);
        assert_eq!(vehicle.drive_state(), DriveState::Braking);
        assert_eq!(servo.duties(), vec![1_100]);
        assert_eq!(bank.pulses(BRAKE), 0);
        assert!(!vehicle.is_busy());
    }

    #[test]
    fn commands_switch_the_control_flags() {
        let (mut vehicle, _, _) = vehicle();

        assert_eq!(
            vehicle.flags(),
            ControlFlags {
                alarms: false,
                follow_light: true,
            }
        );

        vehicle.apply(Command::EnableAlarms);
        vehicle.apply(Command::StopFollowing);
        assert!(vehicle.flags().alarms);
        assert!(!vehicle.flags().follow_light);

        vehicle.apply(Command::DisableAlarms);
        vehicle.apply(Command::FollowLight);
        assert_eq!(vehicle.flags(), ControlFlags::default());
    }

    #[test]
    fn bright_light_steers_and_steps_forward() {
        let (mut vehicle, bank, _) = vehicle();
        let mut now = 0;

        let report = cycle(&mut vehicle, &mut now, &light(300, 700));

        assert_eq!(report.light.direction, Direction::Right);
        assert_eq!(report.steering, SteeringPosition::Right);
        assert_eq!(bank.pulses(FORWARD), 1);
        // the step ends in the automatic soft brake
        assert_eq!(vehicle.drive_state(), DriveState::Braking);
    }

    #[test]
    fn following_at_the_cycle_cadence_steps_each_time_the_guard_allows() {
        let (mut vehicle, bank, _) = vehicle();
        let mut now = 0;

        // a step cycle lasts 270 ms, so every other cycle lands inside the guard window
        for _ in 0..5 {
            cycle(&mut vehicle, &mut now, &light(600, 758));
        }

        assert_eq!(bank.pulses(FORWARD), 3);
        assert_eq!(bank.overlaps(), 0);
    }

    #[test]
    fn not_following_only_steers() {
        let (mut vehicle, bank, servo) = vehicle();
        let mut now = 0;

        vehicle.apply(Command::StopFollowing);
        let report = cycle(&mut vehicle, &mut now, &light(800, 158));

        assert_eq!(report.steering, SteeringPosition::Left);
        assert_eq!(servo.duties(), vec![1_100, 1_000]);
        assert_eq!(bank.pulses(FORWARD), 0);
        assert!(!report.flags.follow_light);
    }

    #[test]
    fn darkness_brakes_and_holds_the_steering() {
        let (mut vehicle, bank, servo) = vehicle();
        let mut now = 0;

        cycle(&mut vehicle, &mut now, &light(900, 158));
        let report = cycle(&mut vehicle, &mut now, &light(10, 10));

        assert_eq!(report.light.direction, Direction::None);
        assert_eq!(report.steering, SteeringPosition::Left);
        assert_eq!(servo.duties().len(), 2);
        assert_eq!(vehicle.drive_state(), DriveState::Braking);
        assert!(!bank.level(FORWARD));
    }

    #[test]
    fn standing_obstacle_beeps_every_cycle() {
        let (mut vehicle, bank, _) = vehicle();
        let mut now = 0;
        vehicle.apply(Command::EnableAlarms);

        let frame = SensorFrame {
            // 300 µs of echo is 5 cm
            front_echo_us: Some(300),
            ..SensorFrame::default()
        };
        for _ in 0..3 {
            assert!(cycle(&mut vehicle, &mut now, &frame).alarm);
        }

        assert_eq!(bank.pulses(BUZZER), 3);
        assert!(!bank.level(BUZZER));
    }

    #[test]
    fn silent_without_alarms_or_echo() {
        let (mut vehicle, bank, _) = vehicle();
        let mut now = 0;

        let near = SensorFrame {
            rear_echo_us: Some(300),
            ..SensorFrame::default()
        };
        assert!(!cycle(&mut vehicle, &mut now, &near).alarm);

        vehicle.apply(Command::EnableAlarms);
        let blind = SensorFrame::default();
        let report = cycle(&mut vehicle, &mut now, &blind);
        assert!(!report.alarm);
        assert_eq!(report.distances.front, Range::NoEcho);

        assert_eq!(bank.pulses(BUZZER), 0);
    }

    #[test]
    fn telemetry_follows_the_host_order() {
        let (mut vehicle, _, _) = vehicle();
        let mut now = 0;

        let frame = SensorFrame {
            light_left: 400,
            light_right: 600,
            sound_level: 12,
            rain_level: 900,
            front_echo_us: Some(1_000),
            rear_echo_us: None,
            climate: Some(ClimateReading {
                temperature: 21.5,
                humidity: 40.0,
            }),
        };
        let report = cycle(&mut vehicle, &mut now, &frame);
        let records: std::vec::Vec<_> = vehicle.telemetry(&report).collect();

        assert_eq!(
            records,
            [
                Telemetry::SoundLevel { sound_level: 12 },
                Telemetry::RainLevel { rain_level: 900 },
                Telemetry::Climate {
                    temperature: 21.5,
                    humidity: 40.0
                },
                Telemetry::Distances {
                    distance_front: Range::Cm(17),
                    distance_back: Range::NoEcho
                },
                Telemetry::LightDirection {
                    light_direction: Direction::Center
                },
                Telemetry::SteeringStatus {
                    steering_status: SteeringPosition::Center
                },
                Telemetry::LastAction {
                    last_action: DriveState::Braking
                },
                Telemetry::LightIntensity {
                    light_intensity: 442
                },
                Telemetry::AlarmStatus {
                    alarm_status: false
                },
                Telemetry::FollowLight { follow_light: true },
            ]
        );
    }

    #[test]
    fn invalid_climate_is_left_out() {
        let (mut vehicle, _, _) = vehicle();
        let mut now = 0;

        let frame = SensorFrame {
            climate: Some(ClimateReading {
                temperature: 20.0,
                humidity: 160.0,
            }),
            ..SensorFrame::default()
        };
        let report = cycle(&mut vehicle, &mut now, &frame);

        assert_eq!(report.climate, None);
        assert_eq!(vehicle.telemetry(&report).count(), 9);
    }

    #[test]
    fn next_deadline_is_the_earliest_pulse_edge() {
        let (mut vehicle, _, _) = vehicle();
        vehicle.apply(Command::EnableAlarms);

        let frame = SensorFrame {
            front_echo_us: Some(100),
            ..light(600, 758)
        };
        vehicle.step(at(0), &frame);

        // settle ends at 20 ms, the buzzer at 200 ms
        assert_eq!(vehicle.next_deadline(), Some(at(20)));
    }
}
