/// The four analog sensors on ADC1: both LDRs, the microphone module and the rain plate.
/// The ADC runs at 10 bits so readings share the 0..=1023 scale the light
/// thresholds were calibrated against.
use stm32f4xx_hal::{
    adc::{
        config::{AdcConfig, Resolution, SampleTime},
        Adc,
    },
    gpio::{Analog, Pin},
    pac::ADC1,
};

use embedded_hal_02::adc::Channel;

pub type DefaultAnalogSensors = AnalogSensors<
    Pin<'A', 1, Analog>,
    Pin<'A', 0, Analog>,
    Pin<'A', 4, Analog>,
    Pin<'A', 5, Analog>,
>;

#[derive(Debug, Clone, Copy, Default, defmt::Format)]
pub struct AnalogLevels {
    pub light_left: u16,
    pub light_right: u16,
    pub sound: u16,
    pub rain: u16,
}

pub struct AnalogSensors<
    L: Channel<ADC1, ID = u8>,
    R: Channel<ADC1, ID = u8>,
    S: Channel<ADC1, ID = u8>,
    W: Channel<ADC1, ID = u8>,
> {
    adc: Adc<ADC1>,
    light_left: L,
    light_right: R,
    sound: S,
    rain: W,
}

impl<
        L: Channel<ADC1, ID = u8>,
        R: Channel<ADC1, ID = u8>,
        S: Channel<ADC1, ID = u8>,
        W: Channel<ADC1, ID = u8>,
    > AnalogSensors<L, R, S, W>
{
    pub fn new(adc: ADC1, light_left: L, light_right: R, sound: S, rain: W) -> Self {
        let config = AdcConfig::default().resolution(Resolution::Ten);
        Self {
            adc: Adc::adc1(adc, true, config),
            light_left,
            light_right,
            sound,
            rain,
        }
    }

    pub fn sample(&mut self) -> AnalogLevels {
        AnalogLevels {
            light_left: self.adc.convert(&self.light_left, SampleTime::Cycles_480),
            light_right: self.adc.convert(&self.light_right, SampleTime::Cycles_480),
            sound: self.adc.convert(&self.sound, SampleTime::Cycles_480),
            rain: self.adc.convert(&self.rain, SampleTime::Cycles_480),
        }
    }
}
