//! Bounded, ghost-tolerant code list for the keyboard report.
//!
//! Without isolation diodes, keys pressed at the same time can appear and
//! disappear across scan cycles. Reporting every pressed key on every cycle
//! makes the host see fresh key-downs for keys that briefly toggle. The
//! encoder therefore lets the code list grow by at most one entry per cycle,
//! preferring keys that come first in scan order.

use heapless::Vec;

use crate::keycode::Keycode;
use crate::keymap::{self, Layer, RECOVERY_CHORD};
use crate::keyset::KeySet;

/// Maximum number of codes in a boot keyboard report.
pub const REPORT_CAPACITY: usize = 6;

/// Result of encoding one stable state.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Encoded {
    /// Output codes in scan order.
    pub codes: Vec<Keycode, REPORT_CAPACITY>,
    /// The recovery chord is held.
    pub reflash_requested: bool,
}

impl Encoded {
    pub fn count(&self) -> usize {
        self.codes.len()
    }
}

/// Whether every key of the recovery chord is in the stable state.
pub fn chord_held(stable: &KeySet) -> bool {
    RECOVERY_CHORD.iter().all(|&key| stable.contains(key))
}

/// Number of codes allowed given how many were sent on the previous cycle.
pub fn growth_limit(prev_count: usize) -> usize {
    (prev_count + 1).clamp(1, REPORT_CAPACITY)
}

/// Build the code list for `stable` on `layer`.
pub fn encode(stable: &KeySet, layer: Layer, prev_count: usize) -> Encoded {
    let limit = growth_limit(prev_count);
    let mut codes = Vec::new();

    for key in stable.iter() {
        let code = keymap::map(key, layer);
        if code.is_none() {
            continue;
        }
        if codes.len() >= limit || codes.push(code).is_err() {
            break;
        }
    }

    Encoded {
        codes,
        reflash_requested: chord_held(stable),
    }
}

/// Encoder state: the number of codes emitted on the previous cycle.
#[derive(Debug, Default)]
pub struct RolloverEncoder {
    prev_count: usize,
}

impl RolloverEncoder {
    pub const fn new() -> Self {
        Self { prev_count: 0 }
    }

    pub fn prev_count(&self) -> usize {
        self.prev_count
    }

    pub fn encode(&mut self, stable: &KeySet, layer: Layer) -> Encoded {
        let encoded = encode(stable, layer, self.prev_count);
        self.prev_count = encoded.count();
        if encoded.reflash_requested {
            #[cfg(feature = "defmt")]
            defmt::info!("recovery chord held");
        }
        encoded
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::keymap::FN_KEY;
    use crate::layout::KeyIndex;

    fn keys(list: &[(usize, usize)]) -> KeySet {
        list.iter().map(|&(r, c)| KeyIndex::at(r, c)).collect()
    }

    #[test]
    fn empty_state_reports_nothing() {
        let mut enc = RolloverEncoder::new();
        let out = enc.encode(&KeySet::empty(), Layer::Base);
        assert_eq!(out.count(), 0);
        assert!(!out.reflash_requested);
        assert_eq!(enc.prev_count(), 0);
    }

    #[test]
    fn grows_one_key_per_cycle() {
        // Indices 5 and 6: the 5 and 6 keys
        let stable = keys(&[(0, 5), (0, 6)]);
        let mut enc = RolloverEncoder::new();

        let first = enc.encode(&stable, Layer::Base);
        assert_eq!(first.codes.as_slice(), &[Keycode::N5]);

        let second = enc.encode(&stable, Layer::Base);
        assert_eq!(second.codes.as_slice(), &[Keycode::N5, Keycode::N6]);
        assert_eq!(enc.prev_count(), 2);
    }

    #[test]
    fn never_exceeds_capacity() {
        let stable = keys(&[(1, 1), (1, 2), (1, 3), (1, 4), (1, 5), (1, 6), (1, 7), (1, 8)]);
        let mut enc = RolloverEncoder::new();
        let mut counts = std::vec::Vec::new();
        for _ in 0..10 {
            let prev = enc.prev_count();
            let out = enc.encode(&stable, Layer::Base);
            assert!(out.count() <= growth_limit(prev));
            counts.push(out.count());
        }
        assert_eq!(counts, vec![1, 2, 3, 4, 5, 6, 6, 6, 6, 6]);
    }

    #[test]
    fn capacity_keeps_first_keys_in_scan_order() {
        let stable = keys(&[(2, 1), (1, 1), (1, 2), (1, 3), (1, 4), (1, 5), (1, 6)]);
        let out = encode(&stable, Layer::Base, REPORT_CAPACITY);
        assert_eq!(
            out.codes.as_slice(),
            &[Keycode::Q, Keycode::W, Keycode::E, Keycode::R, Keycode::T, Keycode::Y]
        );
    }

    #[test]
    fn shrinking_is_immediate() {
        let mut enc = RolloverEncoder::new();
        let three = keys(&[(0, 1), (0, 2), (0, 3)]);
        for _ in 0..3 {
            enc.encode(&three, Layer::Base);
        }
        assert_eq!(enc.prev_count(), 3);
        let out = enc.encode(&keys(&[(0, 2)]), Layer::Base);
        assert_eq!(out.codes.as_slice(), &[Keycode::N2]);
    }

    #[test]
    fn deterministic_for_same_input() {
        let stable = keys(&[(3, 4), (0, 9), (2, 2)]);
        let a = encode(&stable, Layer::Base, 5);
        let b = encode(&stable, Layer::Base, 5);
        assert_eq!(a, b);
        assert_eq!(a.codes.as_slice(), &[Keycode::N9, Keycode::S, Keycode::V]);
    }

    #[test]
    fn skips_positions_without_code() {
        // Fn and an unwired slot are pressed, neither produces a code
        let stable = keys(&[(4, 10), (4, 5), (0, 1)]);
        let out = encode(&stable, Layer::Function, 0);
        assert_eq!(out.codes.as_slice(), &[Keycode::F1]);
    }

    #[test]
    fn chord_requests_reflash() {
        let mut stable: KeySet = RECOVERY_CHORD.into_iter().collect();
        assert!(encode(&stable, Layer::Function, 0).reflash_requested);

        // Extra keys do not matter
        stable.insert(KeyIndex::at(0, 0));
        stable.insert(KeyIndex::at(3, 3));
        let out = encode(&stable, Layer::Function, 3);
        assert!(out.reflash_requested);
        assert!(out.count() > 0);

        stable.remove(FN_KEY);
        assert!(!encode(&stable, Layer::Base, 3).reflash_requested);
    }
}
