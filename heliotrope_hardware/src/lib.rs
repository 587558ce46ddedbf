#![no_std]

use stm32f4xx_hal::{
    otg_fs::{UsbBus, UsbBusType, USB},
    pac::{Peripherals, TIM5},
    prelude::*,
    rcc::Clocks,
    timer::{Channel1, DelayUs, Timer3},
};

use usb_device::{
    bus::UsbBusAllocator,
    device::{StringDescriptors, UsbDeviceBuilder, UsbVidPid},
};
use usbd_serial::SerialPort as UsbSerialPort;

use heliotrope_core::SensorFrame;
use log::warn;

pub mod analog;
pub mod climate;
pub mod outputs;
pub mod serial;
pub mod servo;
pub mod ultrasonic;

use analog::{AnalogSensors, DefaultAnalogSensors};
use climate::Dht11;
use outputs::{BuzzerPin, Relays};
use serial::UsbSerial;
use servo::{SteeringPwm, SERVO_FREQUENCY_HZ};
use ultrasonic::{Hcsr04, Ultrasonics};

pub type UsbBusSlot = Option<UsbBusAllocator<UsbBusType>>;
pub type UsbEndpointMemory = [u32; 1024];

/// Everything the control loop reads each cycle.
pub struct Sensors {
    pub delay: DelayUs<TIM5>,
    pub analog: DefaultAnalogSensors,
    pub ultrasonics: Ultrasonics,
    pub dht: Dht11,
}

impl Sensors {
    /// Takes one frame. The DHT11 is slow and only tolerates a read every
    /// couple of seconds, so it is only touched when `read_climate` is set.
    pub fn sample(&mut self, read_climate: bool, echo_timeout_us: u32) -> SensorFrame {
        let levels = self.analog.sample();

        let climate = if read_climate {
            self.dht
                .read(&mut self.delay)
                .inspect_err(|e| warn!("DHT11 read failed: {:?}", e))
                .ok()
        } else {
            None
        };

        let front_echo_us = self
            .ultrasonics
            .measure_front(&mut self.delay, echo_timeout_us);
        let rear_echo_us = self
            .ultrasonics
            .measure_rear(&mut self.delay, echo_timeout_us);

        SensorFrame {
            light_left: levels.light_left,
            light_right: levels.light_right,
            sound_level: levels.sound,
            rain_level: levels.rain,
            front_echo_us,
            rear_echo_us,
            climate,
        }
    }
}

pub struct HeliotropeHardware {
    pub clocks: Clocks,
    pub sensors: Sensors,
    pub relays: Relays,
    pub buzzer: BuzzerPin,
    pub steering: SteeringPwm,
    pub usb_serial: UsbSerial,
}

impl HeliotropeHardware {
    /// Brings up clocks and every peripheral on the board. The USB bus
    /// allocator has to outlive the device, so the caller hands in
    /// `'static` storage for it and for the endpoint memory.
    pub fn init(
        pac: Peripherals,
        usb_bus: &'static mut UsbBusSlot,
        ep_memory: &'static mut UsbEndpointMemory,
    ) -> Self {
        let rcc = pac.RCC.constrain();
        let clocks = rcc
            .cfgr
            .use_hse(8.MHz())
            .sysclk(168.MHz())
            .require_pll48clk()
            .freeze();

        let delay = pac.TIM5.delay_us(&clocks);

        let gpioa = pac.GPIOA.split();
        let gpiob = pac.GPIOB.split();
        let gpiod = pac.GPIOD.split();

        let analog = AnalogSensors::new(
            pac.ADC1,
            gpioa.pa1.into_analog(),
            gpioa.pa0.into_analog(),
            gpioa.pa4.into_analog(),
            gpioa.pa5.into_analog(),
        );

        let relays = Relays {
            forward: gpiod.pd0.into_push_pull_output(),
            reverse: gpiod.pd1.into_push_pull_output(),
            brake: gpiod.pd2.into_push_pull_output(),
        };
        let buzzer = gpiod.pd3.into_push_pull_output();

        let tim3 = Timer3::new(pac.TIM3, &clocks);
        let mut steering = tim3
            .pwm_hz(Channel1::new(gpioa.pa6), SERVO_FREQUENCY_HZ.Hz())
            .split();
        steering.enable();

        let front = Hcsr04::new(
            gpiob.pb0.into_push_pull_output(),
            gpiob.pb1.into_pull_down_input(),
        );
        let rear = Hcsr04::new(
            gpiob.pb4.into_push_pull_output(),
            gpiob.pb5.into_pull_down_input(),
        );
        let ultrasonics = Ultrasonics {
            counter: pac.TIM9.counter_us(&clocks),
            front,
            rear,
        };

        let dht = Dht11::new(gpiob.pb7.into_open_drain_output());

        let usb = USB::new(
            (pac.OTG_FS_GLOBAL, pac.OTG_FS_DEVICE, pac.OTG_FS_PWRCLK),
            (gpioa.pa11, gpioa.pa12),
            &clocks,
        );
        let usb_bus: &'static UsbBusAllocator<UsbBusType> =
            usb_bus.insert(UsbBus::new(usb, ep_memory));

        let serial = UsbSerialPort::new(usb_bus);

        // 0x0483: STMicroelectronics, 0x5740: Virtual COM Port
        let vid_pid = UsbVidPid(0x0483, 0x5740);
        let device = UsbDeviceBuilder::new(usb_bus, vid_pid)
            .strings(&[StringDescriptors::default()
                .manufacturer("heliotrope")
                .product("Serial port")
                .serial_number("001")])
            .unwrap()
            .device_class(usbd_serial::USB_CLASS_CDC)
            .self_powered(true)
            .build();

        Self {
            clocks,
            sensors: Sensors {
                delay,
                analog,
                ultrasonics,
                dht,
            },
            relays,
            buzzer,
            steering,
            usb_serial: UsbSerial { device, serial },
        }
    }
}
