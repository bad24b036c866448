//! Key matrix pipeline for the lard61 keyboard.
//!
//! Scan, debounce and encode for the 5×14 diode-less matrix of the lard61.
//! This crate is `no_std` so it can be used by both the RP2040 firmware and
//! the native CLI tool.

#![no_std]

// Use std when running tests on the host
#[cfg(test)]
#[macro_use]
extern crate std;

pub mod config;
pub mod debounce;
pub mod keycode;
pub mod keymap;
pub mod keyset;
pub mod layout;
pub mod pipeline;
pub mod report;
pub mod rollover;
pub mod scan;

pub use config::{DebounceStrategy, ScanConfig, ScanMode};
pub use debounce::{Debounce, Debouncer, Duration, Instant, DEBOUNCE_THRESHOLD};
pub use keycode::Keycode;
pub use keymap::{Layer, FN_KEY, RECOVERY_CHORD};
pub use keyset::KeySet;
pub use layout::{Board, Col, KeyIndex, Line, PinMap, Row, COLS, KEY_COUNT, ROWS};
pub use pipeline::{Cycle, Pipeline, PressedKeys};
pub use report::KeyboardReport;
pub use rollover::{Encoded, RolloverEncoder, REPORT_CAPACITY};
pub use scan::{MatrixIo, ScanCell, Scanner};
