use embedded_hal::delay::DelayNs;
use fugit::ExtU32;
use heliotrope_core::ranging::{echo_timeout, MAX_ECHO_TIMEOUT_US};
use stm32f4xx_hal::{
    gpio::{Input, Output, Pin, PushPull},
    pac::TIM9,
    timer::CounterUs,
};

/// Counter period while timing an echo, past the longest timeout so that one always fires.
const ECHO_WINDOW_US: u32 = MAX_ECHO_TIMEOUT_US + 5_000;

pub struct Ultrasonics {
    pub counter: CounterUs<TIM9>,
    pub front: Hcsr04<'B', 0, 'B', 1>,
    pub rear: Hcsr04<'B', 4, 'B', 5>,
}

impl Ultrasonics {
    pub fn measure_front(&mut self, delay: &mut impl DelayNs, timeout_us: u32) -> Option<u32> {
        self.front.ping(&mut self.counter, delay, timeout_us)
    }

    pub fn measure_rear(&mut self, delay: &mut impl DelayNs, timeout_us: u32) -> Option<u32> {
        self.rear.ping(&mut self.counter, delay, timeout_us)
    }
}

pub struct Hcsr04<const TP: char, const TN: u8, const EP: char, const EN: u8> {
    trig_pin: Pin<TP, TN, Output<PushPull>>,
    echo_pin: Pin<EP, EN, Input>,
}

impl<const TP: char, const TN: u8, const EP: char, const EN: u8> Hcsr04<TP, TN, EP, EN> {
    pub fn new(mut trig_pin: Pin<TP, TN, Output<PushPull>>, echo_pin: Pin<EP, EN, Input>) -> Self {
        trig_pin.set_low();
        Self { trig_pin, echo_pin }
    }

    pub fn start_trigger(&mut self) {
        self.trig_pin.set_high();
    }

    pub fn finish_trigger(&mut self) {
        self.trig_pin.set_low();
    }

    /// Fires one burst and returns how long the echo line stayed high, in
    /// microseconds. `None` if the echo did not start and finish within `timeout_us`,
    /// which is capped at the counter period.
    pub fn ping(
        &mut self,
        counter: &mut CounterUs<TIM9>,
        delay: &mut impl DelayNs,
        timeout_us: u32,
    ) -> Option<u32> {
        self.finish_trigger();
        delay.delay_us(2);
        self.start_trigger();
        delay.delay_us(10);
        self.finish_trigger();

        let timeout_us = echo_timeout(timeout_us);
        counter.start(ECHO_WINDOW_US.micros()).ok()?;
        let elapsed = |c: &CounterUs<TIM9>| c.now().duration_since_epoch().ticks();

        while self.echo_pin.is_low() {
            if elapsed(counter) >= timeout_us {
                return None;
            }
        }
        let rise = elapsed(counter);

        while self.echo_pin.is_high() {
            if elapsed(counter) >= timeout_us {
                return None;
            }
        }
        let width = elapsed(counter) - rise;
        counter.cancel().ok();

        Some(width)
    }
}
