use crate::drive::Relay;

/// An actuator write that the hardware rejected.
///
/// Sensors never produce errors, they produce sentinel values instead
/// (see [`Range::NoEcho`](crate::ranging::Range::NoEcho)).
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Error {
    #[error("failed to switch the {0} relay")]
    Relay(Relay),
    #[error("failed to switch the buzzer")]
    Buzzer,
    #[error("failed to command the steering servo")]
    Steering,
}
