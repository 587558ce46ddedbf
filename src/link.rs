//! Telemetry out over the USB serial link.

use heliotrope_core::telemetry::{Telemetry, RECORD_CAPACITY};
use heliotrope_hardware::serial::UsbSerial;
use log::{error, trace};

/// Writes one cycle's records, one JSON object per line. Records the host
/// does not drain in time are dropped rather than stalling the control loop.
pub fn send(usb: &mut UsbSerial, records: impl Iterator<Item = Telemetry>) {
    let mut buf = [0_u8; RECORD_CAPACITY];
    for record in records {
        match record.encode(&mut buf) {
            Ok(line) => {
                if usb.write_all(line).is_err() {
                    trace!("host not reading, dropping telemetry");
                    return;
                }
            }
            Err(e) => error!("telemetry record does not fit: {:?}", e),
        }
    }
}
