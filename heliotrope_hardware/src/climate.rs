// Driver for the DHT11 temperature/humidity sensor on a single open-drain line.

use embedded_hal::delay::DelayNs;
use stm32f4xx_hal::gpio::{OpenDrain, Output, Pin};

use heliotrope_core::climate::ClimateReading;

pub type Dht11Pin = Pin<'B', 7, Output<OpenDrain>>;

/// Longest any single level lasts in a healthy transfer is 80 µs.
const LEVEL_TIMEOUT_US: u32 = 100;
/// Sampling point inside a data bit: a 0 is high for ~27 µs, a 1 for ~70 µs.
const BIT_SAMPLE_US: u32 = 35;

#[derive(Debug, Clone, Copy, PartialEq, Eq, defmt::Format)]
pub enum Dht11Error {
    NoResponse,
    Timeout,
    Checksum,
}

pub struct Dht11 {
    pin: Dht11Pin,
}

impl Dht11 {
    pub fn new(mut pin: Dht11Pin) -> Self {
        // released line idles high through the pull-up
        pin.set_high();
        Self { pin }
    }

    /// Blocks for roughly 23 ms: the 18 ms start signal plus the transfer.
    /// Values are returned as sent; range checks happen in the controller.
    pub fn read(&mut self, delay: &mut impl DelayNs) -> Result<ClimateReading, Dht11Error> {
        self.pin.set_low();
        delay.delay_ms(18);
        self.pin.set_high();

        // bit timing is measured by polling, an interrupt here corrupts the frame
        let frame = cortex_m::interrupt::free(|_| self.transfer(delay))?;

        ClimateReading::from_dht11_frame(frame).ok_or(Dht11Error::Checksum)
    }

    fn transfer(&mut self, delay: &mut impl DelayNs) -> Result<[u8; 5], Dht11Error> {
        self.wait_for(false, delay)
            .map_err(|_| Dht11Error::NoResponse)?;
        self.wait_for(true, delay)?;
        self.wait_for(false, delay)?;

        let mut frame = [0_u8; 5];
        for bit in 0..40 {
            self.wait_for(true, delay)?;
            delay.delay_us(BIT_SAMPLE_US);
            let one = self.pin.is_high();
            if one {
                self.wait_for(false, delay)?;
            }
            frame[bit / 8] = (frame[bit / 8] << 1) | u8::from(one);
        }

        Ok(frame)
    }

    fn wait_for(&mut self, high: bool, delay: &mut impl DelayNs) -> Result<(), Dht11Error> {
        for _ in 0..LEVEL_TIMEOUT_US {
            if self.pin.is_high() == high {
                return Ok(());
            }
            delay.delay_us(1);
        }

        Err(Dht11Error::Timeout)
    }
}
