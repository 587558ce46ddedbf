use stm32f4xx_hal::otg_fs::UsbBusType;
use usb_device::{device::UsbDevice, UsbError};
use usbd_serial::SerialPort;

/// Host link: USB CDC serial carrying commands in and telemetry out.
pub struct UsbSerial {
    pub device: UsbDevice<'static, UsbBusType>,
    pub serial: SerialPort<'static, UsbBusType>,
}

impl UsbSerial {
    pub fn read(&mut self, buf: &mut [u8]) -> Result<usize, UsbError> {
        if self.poll() {
            self.serial.read(buf)
        } else {
            Err(UsbError::WouldBlock)
        }
    }

    pub fn write(&mut self, buf: &[u8]) -> Result<usize, UsbError> {
        self.serial.write(buf)
    }

    /// Writes the whole buffer, giving up as soon as the host stops draining it.
    pub fn write_all(&mut self, mut buf: &[u8]) -> Result<(), UsbError> {
        while !buf.is_empty() {
            self.poll();
            let written = self.write(buf)?;
            buf = &buf[written..];
        }

        Ok(())
    }

    fn poll(&mut self) -> bool {
        self.device.poll(&mut [&mut self.serial])
    }
}
