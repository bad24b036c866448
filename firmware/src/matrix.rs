//! Key matrix GPIO for the RP2040.
//!
//! Column lines are push-pull outputs owned by [`BoardIo`]. Row lines are
//! pull-down inputs with rising-edge interrupts; they live in a
//! critical-section mutex because `IO_IRQ_BANK0` needs them to acknowledge
//! edges. Lines are addressed by GPIO number, so boards that wire several
//! columns to one line work unchanged.

use core::cell::RefCell;

use critical_section::Mutex;
use embedded_hal::delay::DelayNs;
use embedded_hal::digital::{InputPin, OutputPin};
use heapless::Vec;
use rp2040_hal as hal;

use hal::gpio::{DynPinId, FunctionNull, FunctionSioInput, FunctionSioOutput, Interrupt, Pin};
use hal::gpio::{PullDown, Pins};
use hal::pac::{self, interrupt};
use lard61_matrix::{Board, Col, Line, MatrixIo, Row, ScanCell, COLS, ROWS};

/// Board this firmware is built for.
pub const BOARD: Board = Board::Lard61;

/// Shared with the row edge interrupt.
pub static SCAN: ScanCell = ScanCell::new();

type FreePin = Pin<DynPinId, FunctionNull, PullDown>;
type ColPin = Pin<DynPinId, FunctionSioOutput, PullDown>;
type RowPin = Pin<DynPinId, FunctionSioInput, PullDown>;

static ROW_PINS: Mutex<RefCell<Vec<RowPin, ROWS>>> = Mutex::new(RefCell::new(Vec::new()));

const BANK0_LINES: usize = 30;

/// Bank 0 pins indexed by GPIO number, waiting to be claimed.
fn free_pins(pins: Pins) -> [Option<FreePin>; BANK0_LINES] {
    [
        Some(pins.gpio0.into_dyn_pin()),
        Some(pins.gpio1.into_dyn_pin()),
        Some(pins.gpio2.into_dyn_pin()),
        Some(pins.gpio3.into_dyn_pin()),
        Some(pins.gpio4.into_dyn_pin()),
        Some(pins.gpio5.into_dyn_pin()),
        Some(pins.gpio6.into_dyn_pin()),
        Some(pins.gpio7.into_dyn_pin()),
        Some(pins.gpio8.into_dyn_pin()),
        Some(pins.gpio9.into_dyn_pin()),
        Some(pins.gpio10.into_dyn_pin()),
        Some(pins.gpio11.into_dyn_pin()),
        Some(pins.gpio12.into_dyn_pin()),
        Some(pins.gpio13.into_dyn_pin()),
        Some(pins.gpio14.into_dyn_pin()),
        Some(pins.gpio15.into_dyn_pin()),
        Some(pins.gpio16.into_dyn_pin()),
        Some(pins.gpio17.into_dyn_pin()),
        Some(pins.gpio18.into_dyn_pin()),
        Some(pins.gpio19.into_dyn_pin()),
        Some(pins.gpio20.into_dyn_pin()),
        Some(pins.gpio21.into_dyn_pin()),
        Some(pins.gpio22.into_dyn_pin()),
        Some(pins.gpio23.into_dyn_pin()),
        Some(pins.gpio24.into_dyn_pin()),
        Some(pins.gpio25.into_dyn_pin()),
        Some(pins.gpio26.into_dyn_pin()),
        Some(pins.gpio27.into_dyn_pin()),
        Some(pins.gpio28.into_dyn_pin()),
        Some(pins.gpio29.into_dyn_pin()),
    ]
}

fn gpio<F: hal::gpio::Function>(pin: &Pin<DynPinId, F, PullDown>) -> u8 {
    pin.id().num
}

/// GPIO backend for [`lard61_matrix::Scanner`].
pub struct BoardIo {
    cols: Vec<ColPin, COLS>,
    timer: hal::Timer,
}

/// Pins left over once the matrix has claimed its lines.
pub struct Spare {
    lines: [Option<FreePin>; BANK0_LINES],
}

impl Spare {
    pub fn take(&mut self, line: Line) -> Option<FreePin> {
        self.lines.get_mut(line.gpio() as usize)?.take()
    }
}

impl BoardIo {
    /// Claim the row and column lines of [`BOARD`] and unmask the row
    /// edge interrupt.
    pub fn new(pins: Pins, timer: hal::Timer) -> (Self, Spare) {
        let map = BOARD.pins();
        let mut lines = free_pins(pins);

        let mut cols = Vec::new();
        for col in Col::all() {
            // Shared lines were claimed by an earlier column
            let Some(pin) = lines[map.col_line(col).gpio() as usize].take() else {
                continue;
            };
            let mut pin = pin.into_push_pull_output();
            let _ = pin.set_low();
            let _ = cols.push(pin);
        }

        let mut rows = Vec::new();
        for row in Row::all() {
            match lines[map.row_line(row).gpio() as usize].take() {
                Some(pin) => {
                    let _ = rows.push(pin.into_pull_down_input());
                }
                // Never reads high, so the row's keys stay released
                None => defmt::error!("row {=usize} shares a line with a column", row.index()),
            }
        }

        defmt::info!(
            "matrix: {} ({=usize} column lines, {=usize} row lines)",
            BOARD.name(),
            cols.len(),
            rows.len()
        );

        critical_section::with(|cs| *ROW_PINS.borrow_ref_mut(cs) = rows);
        // SAFETY: the handler only touches ROW_PINS and SCAN, both of which
        // are initialised above.
        unsafe { pac::NVIC::unmask(pac::Interrupt::IO_IRQ_BANK0) };

        (Self { cols, timer }, Spare { lines })
    }
}

impl MatrixIo for BoardIo {
    fn write(&mut self, line: Line, high: bool) {
        if let Some(pin) = self.cols.iter_mut().find(|p| gpio(p) == line.gpio()) {
            let _ = if high { pin.set_high() } else { pin.set_low() };
        }
    }

    fn read(&mut self, line: Line) -> bool {
        critical_section::with(|cs| {
            ROW_PINS
                .borrow_ref_mut(cs)
                .iter_mut()
                .find(|p| gpio(p) == line.gpio())
                .is_some_and(|pin| matches!(pin.is_high(), Ok(true)))
        })
    }

    fn set_row_irq(&mut self, line: Line, enabled: bool) {
        critical_section::with(|cs| {
            let mut rows = ROW_PINS.borrow_ref_mut(cs);
            if let Some(pin) = rows.iter_mut().find(|p| gpio(p) == line.gpio()) {
                // Drop edges latched while the row was disarmed
                pin.clear_interrupt(Interrupt::EdgeHigh);
                pin.set_interrupt_enabled(Interrupt::EdgeHigh, enabled);
            }
        });
    }

    fn delay_us(&mut self, us: u32) {
        self.timer.delay_us(us);
    }
}

#[interrupt]
fn IO_IRQ_BANK0() {
    critical_section::with(|cs| {
        let map = BOARD.pins();
        for pin in ROW_PINS.borrow_ref_mut(cs).iter_mut() {
            if pin.interrupt_status(Interrupt::EdgeHigh) {
                pin.clear_interrupt(Interrupt::EdgeHigh);
                if !SCAN.on_row_edge(map, Line::new(gpio(pin))) {
                    defmt::trace!("matrix: stray edge on gpio {=u8}", gpio(pin));
                }
            }
        }
    });
}
