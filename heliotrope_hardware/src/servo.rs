use stm32f4xx_hal::{pac::TIM3, timer::PwmChannel};

/// Steering servo signal, TIM3 channel 1 on PA6 at 50 Hz.
pub type SteeringPwm = PwmChannel<TIM3, 0>;

pub const SERVO_FREQUENCY_HZ: u32 = 50;
