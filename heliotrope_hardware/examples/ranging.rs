#![no_std]
#![no_main]

// Prints both rangefinder distances over semihosting twice a second.
use cortex_m_rt::entry;
use cortex_m_semihosting::hprintln;
use defmt_rtt as _;
use embedded_hal::delay::DelayNs;
use panic_halt as _;
use stm32f4xx_hal::{pac::Peripherals, prelude::*};

use heliotrope_core::ranging::Range;
use heliotrope_hardware::ultrasonic::{Hcsr04, Ultrasonics};

const TIMEOUT_US: u32 = 38_000;

#[entry]
fn main() -> ! {
    let pac = Peripherals::take().unwrap();

    let rcc = pac.RCC.constrain();
    let clocks = rcc.cfgr.use_hse(8.MHz()).sysclk(168.MHz()).freeze();

    let mut delay = pac.TIM5.delay_us(&clocks);
    let gpiob = pac.GPIOB.split();

    let mut ultrasonics = Ultrasonics {
        counter: pac.TIM9.counter_us(&clocks),
        front: Hcsr04::new(
            gpiob.pb0.into_push_pull_output(),
            gpiob.pb1.into_pull_down_input(),
        ),
        rear: Hcsr04::new(
            gpiob.pb4.into_push_pull_output(),
            gpiob.pb5.into_pull_down_input(),
        ),
    };

    loop {
        let front = Range::from_echo(ultrasonics.measure_front(&mut delay, TIMEOUT_US));
        let rear = Range::from_echo(ultrasonics.measure_rear(&mut delay, TIMEOUT_US));

        hprintln!(
            "front: {:?} cm, rear: {:?} cm",
            front.centimetres(),
            rear.centimetres()
        );

        delay.delay_ms(500);
    }
}
