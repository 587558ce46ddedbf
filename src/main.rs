#![no_std]
#![no_main]

mod link;
mod loggers;

#[cfg(feature = "defmt_logger")]
use {defmt_rtt as _, panic_probe as _};

#[cfg(feature = "null_logger")]
use panic_halt as _;

use rtic_monotonics::systick::prelude::*;

systick_monotonic!(Mono, 1_000);

const NAME: &str = env!("CARGO_PKG_NAME");
const VERSION: &str = env!("CARGO_PKG_VERSION");

#[rtic::app(device = stm32f4xx_hal::pac, dispatchers = [USART1, USART3])]
mod app {
    use super::*;

    use heliotrope_core::{command::LineBuffer, command::Command, Actuators, Config, Vehicle};
    use heliotrope_hardware::{
        outputs::{BrakeRelay, BuzzerPin, ForwardRelay, ReverseRelay},
        serial::UsbSerial,
        servo::SteeringPwm,
        HeliotropeHardware, Sensors, UsbBusSlot, UsbEndpointMemory,
    };
    use log::{info, warn};
    use rtic_sync::{
        channel::{Receiver, Sender},
        make_channel,
    };

    const COMMAND_QUEUE: usize = 8;

    type Controller = Vehicle<ForwardRelay, ReverseRelay, BrakeRelay, SteeringPwm, BuzzerPin>;

    #[shared]
    struct Shared {
        usb_serial: UsbSerial,
    }

    #[local]
    struct Local {
        vehicle: Controller,
        sensors: Sensors,
        line: LineBuffer,
        cmd_tx: Sender<'static, Command, COMMAND_QUEUE>,
    }

    #[init(local = [
        usb_bus: UsbBusSlot = None,
        ep_memory: UsbEndpointMemory = [0; 1024],
    ])]
    fn init(ctx: init::Context) -> (Shared, Local) {
        loggers::init(loggers::Level::Info);
        info!("{} v{}", NAME, VERSION);

        let board = HeliotropeHardware::init(ctx.device, ctx.local.usb_bus, ctx.local.ep_memory);
        Mono::start(ctx.core.SYST, board.clocks.sysclk().to_Hz());

        let config = Config::default();
        let actuators = Actuators {
            forward: board.relays.forward,
            reverse: board.relays.reverse,
            brake: board.relays.brake,
            steering: board.steering,
            buzzer: board.buzzer,
        };
        let vehicle = Vehicle::new(actuators, &config).unwrap();

        let (cmd_tx, cmd_rx) = make_channel!(Command, COMMAND_QUEUE);
        control::spawn(cmd_rx, config).ok();

        (
            Shared {
                usb_serial: board.usb_serial,
            },
            Local {
                vehicle,
                sensors: board.sensors,
                line: LineBuffer::new(),
                cmd_tx,
            },
        )
    }

    #[task(priority = 2, binds = OTG_FS, shared = [usb_serial], local = [line, cmd_tx])]
    fn usb_rx(mut ctx: usb_rx::Context) {
        let mut buf = [0_u8; 64];
        let count = ctx
            .shared
            .usb_serial
            .lock(|usb| usb.read(&mut buf).unwrap_or(0));

        for command in ctx.local.line.extend(&buf[..count]) {
            if ctx.local.cmd_tx.try_send(command).is_err() {
                warn!("command queue full, dropping {:?}", command);
            }
        }
    }

    /// One cycle: drain commands, sample, decide, let pulses run out, report, rest.
    #[task(priority = 1, shared = [usb_serial], local = [vehicle, sensors])]
    async fn control(
        mut ctx: control::Context,
        mut cmd_rx: Receiver<'static, Command, COMMAND_QUEUE>,
        config: Config,
    ) {
        let vehicle = ctx.local.vehicle;
        let sensors = ctx.local.sensors;

        loop {
            while let Ok(command) = cmd_rx.try_recv() {
                vehicle.apply(command);
            }

            let read_climate = vehicle.climate_due(Mono::now());
            let frame = sensors.sample(read_climate, config.echo_timeout_us);
            let report = vehicle.step(Mono::now(), &frame);

            while let Some(deadline) = vehicle.next_deadline() {
                Mono::delay_until(deadline).await;
                vehicle.poll(Mono::now());
            }

            ctx.shared
                .usb_serial
                .lock(|usb| link::send(usb, vehicle.telemetry(&report)));

            Mono::delay(config.cycle_period).await;
        }
    }
}
