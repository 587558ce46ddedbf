//! Records streamed to the host, one JSON object per line.

use serde::Serialize;

use crate::{
    drive::DriveState, light::Direction, ranging::Range, steering::SteeringPosition,
};

/// Big enough for the longest record, the distance pair.
pub const RECORD_CAPACITY: usize = 64;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Telemetry {
    SoundLevel {
        sound_level: u16,
    },
    RainLevel {
        rain_level: u16,
    },
    Climate {
        temperature: f32,
        humidity: f32,
    },
    Distances {
        distance_front: Range,
        distance_back: Range,
    },
    LightDirection {
        light_direction: Direction,
    },
    SteeringStatus {
        steering_status: SteeringPosition,
    },
    LastAction {
        last_action: DriveState,
    },
    LightIntensity {
        light_intensity: u16,
    },
    AlarmStatus {
        alarm_status: bool,
    },
    FollowLight {
        follow_light: bool,
    },
}

impl Telemetry {
    /// Serialises the record into `buf` followed by a newline and returns the used part.
    pub fn encode<'a>(&self, buf: &'a mut [u8]) -> Result<&'a [u8], serde_json_core::ser::Error> {
        let len = serde_json_core::to_slice(self, buf)?;
        let line = buf
            .get_mut(len)
            .ok_or(serde_json_core::ser::Error::BufferFull)?;
        *line = b'\n';

        Ok(&buf[..=len])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn line(record: Telemetry) -> std::string::String {
        let mut buf = [0_u8; RECORD_CAPACITY];
        let bytes = record.encode(&mut buf).unwrap();
        std::string::String::from_utf8(bytes.to_vec()).unwrap()
    }

    #[test]
    fn single_value_records() {
        assert_eq!(line(Telemetry::SoundLevel { sound_level: 512 }), "{\"sound_level\":512}\n");
        assert_eq!(
            line(Telemetry::AlarmStatus { alarm_status: false }),
            "{\"alarm_status\":false}\n"
        );
    }

    #[test]
    fn labels_are_upper_case() {
        assert_eq!(
            line(Telemetry::LightDirection {
                light_direction: Direction::None
            }),
            "{\"light_direction\":\"NONE\"}\n"
        );
        assert_eq!(
            line(Telemetry::SteeringStatus {
                steering_status: SteeringPosition::Right
            }),
            "{\"steering_status\":\"RIGHT\"}\n"
        );
        assert_eq!(
            line(Telemetry::LastAction {
                last_action: DriveState::Braking
            }),
            "{\"last_action\":\"BRAKE\"}\n"
        );
    }

    #[test]
    fn missing_echo_is_null() {
        assert_eq!(
            line(Telemetry::Distances {
                distance_front: Range::Cm(42),
                distance_back: Range::NoEcho,
            }),
            "{\"distance_front\":42,\"distance_back\":null}\n"
        );
    }

    #[test]
    fn short_buffer_is_an_error() {
        let mut buf = [0_u8; 8];
        assert!(Telemetry::SoundLevel { sound_level: 1 }.encode(&mut buf).is_err());

        // fits the object but not the newline
        let mut buf = [0_u8; 17];
        assert!(Telemetry::SoundLevel { sound_level: 1 }.encode(&mut buf).is_err());
    }
}
