use serde::Serialize;

/// Where the brighter light source sits relative to the vehicle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Direction {
    Left,
    Right,
    Center,
    /// Not bright enough to follow anything.
    None,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct LightCalibration {
    /// Subtracted from the right LDR, which reads consistently hotter than the left.
    pub right_offset: u16,
    /// Intensities at or below this are treated as darkness.
    pub brightness_floor: u16,
    /// Difference the two sides must exceed before the light counts as off-centre.
    pub hysteresis: u16,
}

impl Default for LightCalibration {
    fn default() -> Self {
        Self {
            right_offset: 158,
            brightness_floor: 250,
            hysteresis: 50,
        }
    }
}

/// Both LDR samples of one cycle, with the right side already compensated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LightReading {
    pub left: u16,
    pub right_raw: u16,
    pub right: u16,
}

impl LightReading {
    pub fn new(left: u16, right_raw: u16, calibration: &LightCalibration) -> Self {
        Self {
            left,
            right_raw,
            right: right_raw.saturating_sub(calibration.right_offset),
        }
    }

    pub fn intensity(&self) -> u16 {
        self.right.max(self.left)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Classification {
    pub direction: Direction,
    pub intensity: u16,
}

pub fn classify(left_raw: u16, right_raw: u16, calibration: &LightCalibration) -> Classification {
    let reading = LightReading::new(left_raw, right_raw, calibration);
    let intensity = reading.intensity();

    if intensity <= calibration.brightness_floor {
        return Classification {
            direction: Direction::None,
            intensity,
        };
    }

    let band = i32::from(calibration.hysteresis);
    let diff = i32::from(reading.right) - i32::from(reading.left);
    let direction = if diff > band {
        Direction::Right
    } else if -diff > band {
        Direction::Left
    } else {
        Direction::Center
    };

    Classification {
        direction,
        intensity,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn classify_default(left: u16, right: u16) -> Classification {
        classify(left, right, &LightCalibration::default())
    }

    #[test]
    fn right_reading_is_compensated_and_floored() {
        let cal = LightCalibration::default();
        assert_eq!(LightReading::new(0, 600, &cal).right, 442);
        assert_eq!(LightReading::new(0, 100, &cal).right, 0);
    }

    #[test]
    fn close_readings_are_center() {
        let c = classify_default(400, 600);
        assert_eq!(c.intensity, 442);
        assert_eq!(c.direction, Direction::Center);
    }

    #[test]
    fn dim_equal_readings_are_none() {
        let c = classify_default(100, 100);
        assert_eq!(c.intensity, 100);
        assert_eq!(c.direction, Direction::None);
    }

    #[test]
    fn brightness_floor_wins_over_direction() {
        // corrected right is 242, well ahead of the left side but still too dim
        let c = classify_default(100, 400);
        assert_eq!(c.intensity, 242);
        assert_eq!(c.direction, Direction::None);
    }

    #[test]
    fn floor_is_inclusive() {
        assert_eq!(classify_default(250, 0).direction, Direction::None);
        assert_eq!(classify_default(251, 0).direction, Direction::Left);
    }

    #[test]
    fn brighter_right_side_steers_right() {
        // 700 - 158 = 542 vs 300
        assert_eq!(classify_default(300, 700).direction, Direction::Right);
    }

    #[test]
    fn brighter_left_side_steers_left() {
        assert_eq!(classify_default(800, 458).direction, Direction::Left);
    }

    #[test]
    fn hysteresis_band_edges() {
        // right corrected = 400; a difference of exactly 50 stays centred
        assert_eq!(classify_default(350, 558).direction, Direction::Center);
        assert_eq!(classify_default(349, 558).direction, Direction::Right);
        assert_eq!(classify_default(450, 558).direction, Direction::Center);
        assert_eq!(classify_default(451, 558).direction, Direction::Left);
    }
}
