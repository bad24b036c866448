//! Boot keyboard report handed to the USB transport.

use crate::rollover::{Encoded, REPORT_CAPACITY};

/// Standard USB HID boot keyboard report (8 bytes).
/// Byte 0: modifier keys bitmask, always zero here (modifiers travel as
///         usages in the key array)
/// Byte 1: reserved (0x00)
/// Bytes 2-7: up to 6 keycodes, unused slots zero
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct KeyboardReport {
    pub modifiers: u8,
    pub reserved: u8,
    pub keys: [u8; REPORT_CAPACITY],
}

impl KeyboardReport {
    pub const fn empty() -> Self {
        Self {
            modifiers: 0,
            reserved: 0,
            keys: [0; REPORT_CAPACITY],
        }
    }

    /// Number of non-zero key slots.
    pub fn key_count(&self) -> usize {
        self.keys.iter().filter(|&&k| k != 0).count()
    }

    pub fn to_bytes(&self) -> [u8; 8] {
        let mut bytes = [0; 8];
        bytes[0] = self.modifiers;
        bytes[1] = self.reserved;
        bytes[2..].copy_from_slice(&self.keys);
        bytes
    }
}

impl From<&Encoded> for KeyboardReport {
    fn from(encoded: &Encoded) -> Self {
        let mut report = KeyboardReport::empty();
        for (slot, code) in report.keys.iter_mut().zip(encoded.codes.iter()) {
            *slot = code.usage();
        }
        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::keycode::Keycode;

    #[test]
    fn empty_report_is_all_zero() {
        let report = KeyboardReport::from(&Encoded::default());
        assert_eq!(report.to_bytes(), [0; 8]);
        assert_eq!(report.key_count(), 0);
    }

    #[test]
    fn codes_fill_key_slots_in_order() {
        let mut encoded = Encoded::default();
        encoded.codes.extend_from_slice(&[Keycode::LCtrl, Keycode::A]).unwrap();
        let report = KeyboardReport::from(&encoded);
        assert_eq!(report.to_bytes(), [0, 0, 0xE0, 0x04, 0, 0, 0, 0]);
        assert_eq!(report.key_count(), 2);
    }
}
