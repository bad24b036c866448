//! One scan cycle: debounce → layer → encode → report.

use core::fmt;

use crate::config::ScanConfig;
use crate::debounce::{Debounce, Debouncer, Instant};
use crate::keymap::Layer;
use crate::keyset::KeySet;
use crate::report::KeyboardReport;
use crate::rollover::{Encoded, RolloverEncoder};

/// Everything produced by a single cycle.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Cycle {
    pub stable: KeySet,
    pub layer: Layer,
    pub encoded: Encoded,
    pub report: KeyboardReport,
    /// The stable state differs from the previous cycle's.
    pub stable_changed: bool,
}

impl Cycle {
    /// The caller should hand off to the bootloader instead of (or after)
    /// sending the report.
    pub fn reflash_requested(&self) -> bool {
        self.encoded.reflash_requested
    }
}

pub struct Pipeline {
    debouncer: Debouncer,
    encoder: RolloverEncoder,
}

impl Pipeline {
    pub fn new(config: &ScanConfig) -> Self {
        Self {
            debouncer: Debouncer::new(config),
            encoder: RolloverEncoder::new(),
        }
    }

    /// Run one cycle on a complete raw sample taken at `now`.
    pub fn process(&mut self, raw: KeySet, now: Instant) -> Cycle {
        let before = self.debouncer.stable();
        let stable = self.debouncer.filter(raw, now);
        let layer = Layer::resolve(&stable);
        let encoded = self.encoder.encode(&stable, layer);
        let report = KeyboardReport::from(&encoded);

        Cycle {
            stable,
            layer,
            encoded,
            report,
            stable_changed: stable != before,
        }
    }

    pub fn stable(&self) -> KeySet {
        self.debouncer.stable()
    }
}

/// Human-readable listing of the keys in a stable state, one line per key.
pub struct PressedKeys<'a>(pub &'a KeySet);

impl fmt::Display for PressedKeys<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for key in self.0.iter() {
            writeln!(f, "pressed row={} col={}", key.row().index(), key.col().index())?;
        }
        Ok(())
    }
}

#[cfg(feature = "defmt")]
impl defmt::Format for PressedKeys<'_> {
    fn format(&self, fmt: defmt::Formatter) {
        for key in self.0.iter() {
            defmt::write!(fmt, "({=usize}, {=usize}) ", key.row().index(), key.col().index());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::KeyIndex;
    use std::string::ToString;

    #[test]
    fn listing_is_row_major() {
        let set: KeySet = [KeyIndex::at(2, 3), KeyIndex::at(0, 12)].into_iter().collect();
        assert_eq!(
            PressedKeys(&set).to_string(),
            "pressed row=0 col=12\npressed row=2 col=3\n"
        );
        assert_eq!(PressedKeys(&KeySet::empty()).to_string(), "");
    }

    #[test]
    fn stable_change_is_flagged_once() {
        let mut pipeline = Pipeline::new(&ScanConfig::default());
        let pressed: KeySet = [KeyIndex::at(0, 1)].into_iter().collect();
        let changes = (10..30)
            .map(|t| pipeline.process(pressed, Instant::from_ticks(t * 1000)))
            .filter(|c| c.stable_changed)
            .count();
        assert_eq!(changes, 1);
        assert_eq!(pipeline.stable(), pressed);
    }
}
