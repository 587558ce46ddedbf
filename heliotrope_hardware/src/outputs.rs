use stm32f4xx_hal::gpio::{Output, Pin, PushPull};

// Relay board inputs are active high.
pub type ForwardRelay = Pin<'D', 0, Output<PushPull>>;
pub type ReverseRelay = Pin<'D', 1, Output<PushPull>>;
pub type BrakeRelay = Pin<'D', 2, Output<PushPull>>;

/// Active buzzer, on while the pin is high.
pub type BuzzerPin = Pin<'D', 3, Output<PushPull>>;

pub struct Relays {
    pub forward: ForwardRelay,
    pub reverse: ReverseRelay,
    pub brake: BrakeRelay,
}
