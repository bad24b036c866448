//! USB boot keyboard transport.
//!
//! Reports are built by `lard61_matrix` and handed to the
//! `usbd-human-interface-device` boot keyboard every cycle. The class packs
//! modifier usages into its own modifier byte on the wire.

use usb_device::device::{StringDescriptors, UsbDeviceState, UsbVidPid};
use usbd_human_interface_device::page::Keyboard;
use usbd_human_interface_device::UsbHidError;

use lard61_matrix::{Duration, KeyboardReport};

/// pid.codes test VID/PID.
pub const VID_PID: UsbVidPid = UsbVidPid(0x1209, 0x0001);

pub fn strings() -> StringDescriptors<'static> {
    StringDescriptors::default()
        .manufacturer("beulard")
        .product("lard61")
        .serial_number("1")
}

/// Key array of `report` as boot keyboard usages.
pub fn keys(report: &KeyboardReport) -> impl Iterator<Item = Keyboard> + '_ {
    report.keys.iter().map(|&usage| Keyboard::from(usage))
}

/// Swallow the results that only mean "not this time".
pub fn check(result: Result<(), UsbHidError>) {
    match result {
        Ok(()) | Err(UsbHidError::WouldBlock) | Err(UsbHidError::Duplicate) => {}
        Err(e) => defmt::warn!("usb: {}", defmt::Debug2Format(&e)),
    }
}

/// Status LED half period for a given device state.
pub fn blink_period(state: UsbDeviceState) -> Duration {
    match state {
        UsbDeviceState::Configured => Duration::millis(250),
        UsbDeviceState::Suspend => Duration::millis(2500),
        _ => Duration::millis(1000),
    }
}
