#![no_std]
#![no_main]

// Bench check for the relay board: cycles forward, reverse and brake through
// the drive controller so the interlock timing can be watched on a scope.
use cortex_m_rt::entry;
use cortex_m_semihosting::hprintln;
use defmt_rtt as _;
use embedded_hal::delay::DelayNs;
use panic_halt as _;
use stm32f4xx_hal::{pac::Peripherals, prelude::*};

use heliotrope_core::{
    drive::{DriveController, DriveTiming},
    time::{instant_from_millis, Instant},
};

/// Millisecond clock advanced by busy waiting.
struct Clock<D> {
    delay: D,
    ms: u32,
}

impl<D: DelayNs> Clock<D> {
    fn now(&self) -> Instant {
        instant_from_millis(self.ms)
    }

    fn tick(&mut self) -> Instant {
        self.delay.delay_ms(1);
        self.ms += 1;
        self.now()
    }

    fn idle(&mut self, ms: u32) {
        for _ in 0..ms {
            self.tick();
        }
    }
}

#[entry]
fn main() -> ! {
    let pac = Peripherals::take().unwrap();

    let rcc = pac.RCC.constrain();
    let clocks = rcc.cfgr.use_hse(8.MHz()).sysclk(168.MHz()).freeze();

    let mut clock = Clock {
        delay: pac.TIM5.delay_us(&clocks),
        ms: 0,
    };
    let gpiod = pac.GPIOD.split();

    let mut drive = DriveController::new(
        gpiod.pd0.into_push_pull_output(),
        gpiod.pd1.into_push_pull_output(),
        gpiod.pd2.into_push_pull_output(),
        DriveTiming::default(),
    )
    .unwrap();

    loop {
        let response = drive.request_forward(clock.now()).unwrap();
        while drive.is_busy() {
            let now = clock.tick();
            drive.poll(now).unwrap();
        }
        hprintln!("forward: {:?}, now {:?}", response, drive.state());

        drive.request_reverse(clock.now()).unwrap();
        hprintln!("holding reverse");
        clock.idle(1000);

        drive.request_brake(clock.now()).unwrap();
        while drive.is_busy() {
            let now = clock.tick();
            drive.poll(now).unwrap();
        }
        hprintln!("braked, now {:?}", drive.state());

        clock.idle(1000);
    }
}
