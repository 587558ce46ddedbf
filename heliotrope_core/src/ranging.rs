use serde::{Serialize, Serializer};

/// Round trip of sound per microsecond of echo, in thousandths of a centimetre
/// (0.034 cm/µs halved).
const HALF_SOUND_MILLI_CM_PER_US: u32 = 17;

/// Longest echo timeout the rangefinder driver accepts; its 16-bit counter runs a little longer.
pub const MAX_ECHO_TIMEOUT_US: u32 = 60_000;

/// Limits a configured echo timeout to what the driver's counter can measure,
/// so a stuck echo line always ends in a timeout.
pub const fn echo_timeout(configured_us: u32) -> u32 {
    if configured_us < MAX_ECHO_TIMEOUT_US {
        configured_us
    } else {
        MAX_ECHO_TIMEOUT_US
    }
}

/// One rangefinder result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Range {
    /// No echo came back in time. Nothing is in range, this is not a zero distance.
    #[default]
    NoEcho,
    Cm(u32),
}

impl Range {
    /// Converts an echo high time into a distance. A missing echo, and one too short
    /// to amount to a whole centimetre, are both reported as [`Range::NoEcho`]: the
    /// sensor cannot see anything that close, so a zero means it saw nothing.
    pub fn from_echo(echo_us: Option<u32>) -> Self {
        match echo_us.map(|us| us.saturating_mul(HALF_SOUND_MILLI_CM_PER_US) / 1_000) {
            None | Some(0) => Range::NoEcho,
            Some(cm) => Range::Cm(cm),
        }
    }

    pub fn centimetres(&self) -> Option<u32> {
        match self {
            Range::NoEcho => None,
            Range::Cm(cm) => Some(*cm),
        }
    }

    /// `true` only for a real measurement strictly closer than `threshold_cm`.
    pub fn is_within(&self, threshold_cm: u32) -> bool {
        matches!(self, Range::Cm(cm) if *cm < threshold_cm)
    }
}

impl Serialize for Range {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Range::NoEcho => serializer.serialize_none(),
            Range::Cm(cm) => serializer.serialize_some(cm),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct DistanceSample {
    pub front: Range,
    pub rear: Range,
}

impl DistanceSample {
    pub fn from_echoes(front_us: Option<u32>, rear_us: Option<u32>) -> Self {
        Self {
            front: Range::from_echo(front_us),
            rear: Range::from_echo(rear_us),
        }
    }

    pub fn any_within(&self, threshold_cm: u32) -> bool {
        self.front.is_within(threshold_cm) || self.rear.is_within(threshold_cm)
    }
}
