//! Physical layout of the lard61 matrix and its pin maps.
//!
//! The matrix has 5 rows and 14 columns. Columns are driven high one at a
//! time and rows are read back, so a closed switch pulls its row line high
//! while its column is asserted.

use core::fmt;

/// Number of rows in the matrix.
pub const ROWS: usize = 5;
/// Number of columns in the matrix.
pub const COLS: usize = 14;
/// Number of matrix positions (not all of them are wired to a switch).
pub const KEY_COUNT: usize = ROWS * COLS;

/// Number of physical switches on each row.
pub const KEYS_PER_ROW: [usize; ROWS] = [14, 14, 13, 12, 8];

/// Row of the matrix, always in `0..ROWS`.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Row(u8);

impl Row {
    pub const fn new(index: usize) -> Option<Self> {
        if index < ROWS {
            Some(Self(index as u8))
        } else {
            None
        }
    }

    pub const fn index(self) -> usize {
        self.0 as usize
    }

    /// All rows, top to bottom.
    pub fn all() -> impl Iterator<Item = Row> {
        (0..ROWS as u8).map(Row)
    }
}

/// Column of the matrix, always in `0..COLS`.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Col(u8);

impl Col {
    pub const fn new(index: usize) -> Option<Self> {
        if index < COLS {
            Some(Self(index as u8))
        } else {
            None
        }
    }

    pub const fn index(self) -> usize {
        self.0 as usize
    }

    /// All columns, left to right.
    pub fn all() -> impl Iterator<Item = Col> {
        (0..COLS as u8).map(Col)
    }
}

/// Position in the matrix flattened row-major: `row * COLS + col`.
///
/// Only obtainable from a valid (row, column) pair, so a stray pin number
/// can never alias a key slot.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct KeyIndex(u8);

impl KeyIndex {
    pub const fn new(row: Row, col: Col) -> Self {
        Self(row.0 * COLS as u8 + col.0)
    }

    /// Build from raw coordinates. Panics at compile time when used in a
    /// const with out-of-range coordinates.
    pub const fn at(row: usize, col: usize) -> Self {
        assert!(row < ROWS && col < COLS);
        Self((row * COLS + col) as u8)
    }

    pub const fn from_index(index: usize) -> Option<Self> {
        if index < KEY_COUNT {
            Some(Self(index as u8))
        } else {
            None
        }
    }

    pub const fn index(self) -> usize {
        self.0 as usize
    }

    pub const fn row(self) -> Row {
        Row(self.0 / COLS as u8)
    }

    pub const fn col(self) -> Col {
        Col(self.0 % COLS as u8)
    }

    /// Whether a switch is actually soldered at this position.
    pub const fn is_physical(self) -> bool {
        let row = self.row().index();
        let col = self.col().index();
        if row < ROWS - 1 {
            col < KEYS_PER_ROW[row]
        } else {
            // Bottom row: 4 keys left of the space bar column gap, 4 right of it
            col < 4 || (col >= 8 && col < 12)
        }
    }

    /// All matrix positions in scan order.
    pub fn all() -> impl Iterator<Item = KeyIndex> {
        (0..KEY_COUNT as u8).map(KeyIndex)
    }
}

impl fmt::Display for KeyIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.row().index(), self.col().index())
    }
}

/// A GPIO line number on the microcontroller.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Line(u8);

impl Line {
    pub const fn new(gpio: u8) -> Self {
        Self(gpio)
    }

    pub const fn gpio(self) -> u8 {
        self.0
    }
}

/// Association of matrix rows and columns to GPIO lines.
#[derive(Debug, PartialEq, Eq)]
pub struct PinMap {
    pub rows: [Line; ROWS],
    pub cols: [Line; COLS],
}

impl PinMap {
    pub const fn row_line(&self, row: Row) -> Line {
        self.rows[row.index()]
    }

    pub const fn col_line(&self, col: Col) -> Line {
        self.cols[col.index()]
    }

    /// Look up the row wired to a GPIO line. Lines that are not row inputs
    /// resolve to `None` and must be discarded.
    pub fn row_of(&self, line: Line) -> Option<Row> {
        self.rows
            .iter()
            .position(|&l| l == line)
            .and_then(Row::new)
    }
}

const fn lines<const N: usize>(gpios: [u8; N]) -> [Line; N] {
    let mut out = [Line(0); N];
    let mut i = 0;
    while i < N {
        out[i] = Line(gpios[i]);
        i += 1;
    }
    out
}

const ROW_LINES: [Line; ROWS] = lines([19, 20, 21, 22, 18]);

static LARD61_PINS: PinMap = PinMap {
    rows: ROW_LINES,
    cols: lines([23, 25, 26, 24, 27, 28, 29, 0, 1, 2, 3, 4, 5, 6]),
};

// GPIO 25 drives the Pico LED and GPIO 0/1 carry the UART, so those columns
// fall back onto lines that are already in use.
static PICO_DEV_PINS: PinMap = PinMap {
    rows: ROW_LINES,
    cols: lines([23, 23, 26, 24, 27, 28, 29, 29, 29, 2, 3, 4, 5, 6]),
};

/// Supported boards carrying the lard61 matrix.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Board {
    /// The lard61 PCB.
    #[default]
    Lard61,
    /// Raspberry Pi Pico wired to the matrix for development.
    PicoDev,
}

impl Board {
    pub fn pins(self) -> &'static PinMap {
        match self {
            Board::Lard61 => &LARD61_PINS,
            Board::PicoDev => &PICO_DEV_PINS,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Board::Lard61 => "lard61",
            Board::PicoDev => "pico-dev",
        }
    }

    /// Crystal start-up wait, as a multiple of the ROM default.
    ///
    /// The lard61 crystal is slow to start: 4 still fails about one
    /// power-on in ten, 8 has not been seen to fail.
    pub const fn xosc_startup_delay_multiplier(self) -> u8 {
        match self {
            Board::Lard61 => 8,
            Board::PicoDev => 1,
        }
    }
}
