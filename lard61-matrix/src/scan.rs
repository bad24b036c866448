//! Key matrix scanning.
//!
//! Columns are driven high one at a time. A closed switch connects its
//! column to its row, so the row line goes high while that column is
//! asserted. Rows are sampled either by rising-edge interrupts or by reading
//! them directly once the column has settled.
//!
//! In interrupt mode the edge handler only knows which row fired; the column
//! comes from [`ScanCell`], which the foreground scan updates. Row interrupts
//! are armed only while exactly one column is asserted, so the column the
//! handler observes is always the one that caused the edge.

use atomic_polyfill::{AtomicU16, AtomicU8, Ordering};

use crate::config::{ScanConfig, ScanMode};
use crate::keyset::KeySet;
use crate::layout::{Col, Line, PinMap, Row, ROWS};

/// GPIO access needed by the scanner.
pub trait MatrixIo {
    /// Drive an output line.
    fn write(&mut self, line: Line, high: bool);
    /// Read an input line.
    fn read(&mut self, line: Line) -> bool;
    /// Enable or disable the rising-edge interrupt of a row line.
    fn set_row_irq(&mut self, line: Line, enabled: bool);
    /// Busy wait.
    fn delay_us(&mut self, us: u32);
}

const NO_COLUMN: u8 = u8::MAX;

#[allow(clippy::declare_interior_mutable_const)]
const ROW_IDLE: AtomicU16 = AtomicU16::new(0);

/// State shared between the foreground scan and the row edge interrupt.
///
/// Only [`ScanCell::on_row_edge`] (interrupt context) and [`Scanner`]
/// (foreground) write to it.
pub struct ScanCell {
    /// Column currently asserted, `NO_COLUMN` between columns.
    active: AtomicU8,
    /// Column bits seen high, one word per row.
    rows: [AtomicU16; ROWS],
}

impl ScanCell {
    pub const fn new() -> Self {
        Self {
            active: AtomicU8::new(NO_COLUMN),
            rows: [ROW_IDLE; ROWS],
        }
    }

    /// Record a rising edge on `line` against the asserted column.
    ///
    /// Returns `false` when the edge is discarded: the line is not a row
    /// input, or no column is asserted.
    pub fn on_row_edge(&self, pins: &PinMap, line: Line) -> bool {
        let Some(row) = pins.row_of(line) else {
            return false;
        };
        let Some(col) = self.active_column() else {
            return false;
        };
        self.record(row, col);
        true
    }

    pub fn active_column(&self) -> Option<Col> {
        Col::new(self.active.load(Ordering::Acquire) as usize)
    }

    fn activate(&self, col: Col) {
        self.active.store(col.index() as u8, Ordering::Release);
    }

    fn deactivate(&self) {
        self.active.store(NO_COLUMN, Ordering::Release);
    }

    fn record(&self, row: Row, col: Col) {
        self.rows[row.index()].fetch_or(1 << col.index(), Ordering::AcqRel);
    }

    fn clear(&self) {
        for row in &self.rows {
            row.store(0, Ordering::Release);
        }
    }

    fn take(&self) -> KeySet {
        let mut rows = [0; ROWS];
        for (out, row) in rows.iter_mut().zip(self.rows.iter()) {
            *out = row.swap(0, Ordering::AcqRel);
        }
        KeySet::from_rows(rows)
    }
}

impl Default for ScanCell {
    fn default() -> Self {
        Self::new()
    }
}

/// Produces one raw sample of the whole matrix per call to [`Scanner::scan`].
pub struct Scanner<'a, IO> {
    io: IO,
    pins: &'static PinMap,
    cell: &'a ScanCell,
    mode: ScanMode,
    settle_us: u32,
    row_idle_timeout_us: u32,
}

impl<'a, IO: MatrixIo> Scanner<'a, IO> {
    pub fn new(io: IO, config: &ScanConfig, cell: &'a ScanCell) -> Self {
        let mut scanner = Self {
            io,
            pins: config.board.pins(),
            cell,
            mode: config.mode,
            settle_us: config.settle_us,
            row_idle_timeout_us: config.row_idle_timeout_us,
        };
        scanner.idle();
        scanner
    }

    pub fn pins(&self) -> &'static PinMap {
        self.pins
    }

    pub fn io(&self) -> &IO {
        &self.io
    }

    pub fn io_mut(&mut self) -> &mut IO {
        &mut self.io
    }

    /// All columns low, all row interrupts off.
    fn idle(&mut self) {
        self.cell.deactivate();
        for row in Row::all() {
            self.io.set_row_irq(self.pins.row_line(row), false);
        }
        for col in Col::all() {
            self.io.write(self.pins.col_line(col), false);
        }
    }

    fn rows_idle(&mut self) -> bool {
        let pins = self.pins;
        Row::all().all(|row| !self.io.read(pins.row_line(row)))
    }

    /// Wait until every row reads low so the next column's rising edges
    /// are not merged with the previous column's. Bounded: a row stuck high
    /// must not stall the scan loop. Returns `false` on timeout.
    fn wait_rows_idle(&mut self) -> bool {
        let mut waited = 0;
        while !self.rows_idle() {
            if waited >= self.row_idle_timeout_us {
                #[cfg(feature = "defmt")]
                defmt::warn!("scan: rows still high after {=u32}us", waited);
                return false;
            }
            self.io.delay_us(1);
            waited += 1;
        }
        true
    }

    fn sample_interrupt(&mut self, col: Col) {
        let line = self.pins.col_line(col);

        self.cell.activate(col);
        for row in Row::all() {
            self.io.set_row_irq(self.pins.row_line(row), true);
        }
        self.io.write(line, true);

        // Edges arrive through ScanCell::on_row_edge while we wait
        self.io.delay_us(self.settle_us);

        for row in Row::all() {
            self.io.set_row_irq(self.pins.row_line(row), false);
        }
        self.io.write(line, false);
        self.cell.deactivate();
    }

    fn sample_polled(&mut self, col: Col) {
        let line = self.pins.col_line(col);

        self.io.write(line, true);
        self.io.delay_us(self.settle_us);
        for row in Row::all() {
            if self.io.read(self.pins.row_line(row)) {
                self.cell.record(row, col);
            }
        }
        self.io.write(line, false);
    }

    /// Scan every column once and return the raw sample.
    pub fn scan(&mut self) -> KeySet {
        self.cell.clear();

        for col in Col::all() {
            let idle = self.wait_rows_idle();
            match self.mode {
                ScanMode::Interrupt if idle => self.sample_interrupt(col),
                // A row already high raises no edge, read the levels instead
                ScanMode::Interrupt | ScanMode::Polled => self.sample_polled(col),
            }
        }

        self.cell.take()
    }

    /// Stop scanning and hand back the GPIO.
    pub fn release(mut self) -> IO {
        self.idle();
        self.io
    }
}
