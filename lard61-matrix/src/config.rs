//! Static configuration for the scan pipeline.

use crate::debounce::{Duration, DEBOUNCE_THRESHOLD};
use crate::layout::Board;

/// How the scanner learns which rows are high for the asserted column.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ScanMode {
    /// Rising-edge interrupts on the row lines set the bits.
    #[default]
    Interrupt,
    /// Row lines are read directly once the column has settled.
    Polled,
}

/// Whether the debounce quiet timer is shared by the whole matrix or kept
/// per key.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum DebounceStrategy {
    /// Any change anywhere restarts the quiet timer for every key.
    #[default]
    WholeMatrix,
    /// Each key settles on its own.
    PerKey,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ScanConfig {
    pub board: Board,
    pub mode: ScanMode,
    /// Time between asserting a column and sampling the rows.
    pub settle_us: u32,
    /// Upper bound on waiting for all rows to read low between columns.
    pub row_idle_timeout_us: u32,
    pub debounce: DebounceStrategy,
    pub debounce_threshold: Duration,
}

impl ScanConfig {
    pub const fn new(board: Board) -> Self {
        Self {
            board,
            mode: ScanMode::Interrupt,
            settle_us: 10,
            row_idle_timeout_us: 100,
            debounce: DebounceStrategy::WholeMatrix,
            debounce_threshold: DEBOUNCE_THRESHOLD,
        }
    }
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self::new(Board::Lard61)
    }
}
