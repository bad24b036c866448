use anyhow::{Context, Result};
use indicatif::{ProgressBar, ProgressStyle};
use std::time::{Duration, Instant};

/// RP2040 ROM bootloader (BOOTSEL mass storage + PICOBOOT).
const BOOTSEL_VID: u16 = 0x2E8A;
const BOOTSEL_PID: u16 = 0x0003;

/// Running lard61 firmware (pid.codes test pair).
const KEYBOARD_VID: u16 = 0x1209;
const KEYBOARD_PID: u16 = 0x0001;

/// How often to re-enumerate while waiting.
const POLL_INTERVAL: Duration = Duration::from_millis(100);

/// USB devices of interest currently on the bus.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Presence {
    pub bootsel: bool,
    pub keyboard: bool,
}

impl Presence {
    fn from_ids(ids: impl IntoIterator<Item = (u16, u16)>) -> Self {
        let mut presence = Self::default();
        for id in ids {
            match id {
                (BOOTSEL_VID, BOOTSEL_PID) => presence.bootsel = true,
                (KEYBOARD_VID, KEYBOARD_PID) => presence.keyboard = true,
                _ => {}
            }
        }
        presence
    }
}

/// Enumerate USB devices and look for the bootloader and the keyboard.
pub fn detect() -> Result<Presence> {
    let devices = rusb::devices().context("failed to enumerate USB devices")?;
    let mut ids = Vec::new();
    for device in devices.iter() {
        let desc = device
            .device_descriptor()
            .context("failed to read device descriptor")?;
        ids.push((desc.vendor_id(), desc.product_id()));
    }
    Ok(Presence::from_ids(ids))
}

/// Poll until the RP2040 bootloader shows up or `timeout` passes.
pub fn wait_for_bootsel(timeout: Duration) -> Result<bool> {
    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner} {msg} ({elapsed})")
            .context("bad spinner template")?,
    );
    pb.set_message("Waiting for BOOTSEL (hold Ctrl + Alt + Fn + R)");
    pb.enable_steady_tick(POLL_INTERVAL);

    let start = Instant::now();
    while start.elapsed() < timeout {
        if detect()?.bootsel {
            pb.finish_with_message("BOOTSEL device found");
            return Ok(true);
        }
        std::thread::sleep(POLL_INTERVAL);
    }

    pb.finish_with_message("Timed out");
    Ok(false)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recognises_known_devices() {
        let none = Presence::from_ids([(0x046D, 0xC52B)]);
        assert_eq!(none, Presence::default());

        let both = Presence::from_ids([(0x2E8A, 0x0003), (0x1209, 0x0001), (0x2E8A, 0x000A)]);
        assert!(both.bootsel);
        assert!(both.keyboard);
    }

    #[test]
    fn other_rp2040_products_are_not_bootsel() {
        // 0x000A is the Pico SDK's default for running firmware
        assert!(!Presence::from_ids([(0x2E8A, 0x000A)]).bootsel);
    }
}
