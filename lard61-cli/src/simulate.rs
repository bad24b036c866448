//! Replay a raw matrix trace through the scanner and pipeline.

use std::io::Write;

use anyhow::Result;
use lard61_matrix::{
    Col, Instant, KeyIndex, KeySet, KeyboardReport, Keycode, Layer, Line, MatrixIo, PinMap,
    Pipeline, PressedKeys, ScanCell, ScanConfig, ScanMode, Scanner,
};

use crate::trace::Sample;

/// Switches closed according to the current trace sample. A row reads high
/// while a column line with a closed switch on that row is asserted, so
/// columns sharing a line read as one.
struct TraceMatrix {
    pins: &'static PinMap,
    closed: KeySet,
    asserted: Option<u8>,
}

impl MatrixIo for TraceMatrix {
    fn write(&mut self, line: Line, high: bool) {
        if high {
            self.asserted = Some(line.gpio());
        } else if self.asserted == Some(line.gpio()) {
            self.asserted = None;
        }
    }

    fn read(&mut self, line: Line) -> bool {
        let (Some(row), Some(gpio)) = (self.pins.row_of(line), self.asserted) else {
            return false;
        };
        Col::all().any(|col| {
            self.pins.col_line(col).gpio() == gpio && self.closed.contains(KeyIndex::new(row, col))
        })
    }

    fn set_row_irq(&mut self, _line: Line, _enabled: bool) {}

    fn delay_us(&mut self, _us: u32) {}
}

/// What happened over a replay.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct Summary {
    pub cycles: usize,
    pub report_changes: usize,
    pub reflash_at_ms: Option<u64>,
}

fn describe(report: &KeyboardReport) -> String {
    let bytes = report
        .to_bytes()
        .iter()
        .map(|b| format!("{b:02x}"))
        .collect::<Vec<_>>()
        .join(" ");
    let names = report
        .keys
        .iter()
        .filter(|&&k| k != 0)
        .map(|&k| name_of(k))
        .collect::<Vec<_>>()
        .join(" ");
    format!("{bytes}  [{names}]")
}

fn name_of(usage: u8) -> &'static str {
    Keycode::from_usage(usage).map_or("?", Keycode::display_name)
}

/// Feed every sample as one scan cycle, printing each report change.
pub fn run(
    samples: &[Sample],
    config: &ScanConfig,
    show_keys: bool,
    out: &mut impl Write,
) -> Result<Summary> {
    let config = ScanConfig {
        mode: ScanMode::Polled,
        ..*config
    };
    let cell = ScanCell::new();
    let io = TraceMatrix {
        pins: config.board.pins(),
        closed: KeySet::empty(),
        asserted: None,
    };
    let mut scanner = Scanner::new(io, &config, &cell);
    let mut pipeline = Pipeline::new(&config);

    let mut summary = Summary::default();
    let mut last_report = KeyboardReport::empty();
    let mut reflash = false;

    for sample in samples {
        scanner.io_mut().closed = sample.closed;
        let raw = scanner.scan();
        let cycle = pipeline.process(raw, Instant::from_ticks(sample.at_ms * 1000));
        summary.cycles += 1;

        if cycle.stable_changed && show_keys {
            writeln!(out, "{:>8} ms  stable ({} keys)", sample.at_ms, cycle.stable.len())?;
            for line in PressedKeys(&cycle.stable).to_string().lines() {
                writeln!(out, "             {line}")?;
            }
        }

        if cycle.report != last_report {
            let layer = match cycle.layer {
                Layer::Base => "",
                Layer::Function => "  (Fn)",
            };
            writeln!(out, "{:>8} ms  {}{layer}", sample.at_ms, describe(&cycle.report))?;
            last_report = cycle.report;
            summary.report_changes += 1;
        }

        if cycle.reflash_requested() && !reflash {
            writeln!(
                out,
                "{:>8} ms  reflash requested, firmware would reboot to BOOTSEL",
                sample.at_ms
            )?;
            if summary.reflash_at_ms.is_none() {
                summary.reflash_at_ms = Some(sample.at_ms);
            }
        }
        reflash = cycle.reflash_requested();
    }

    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::trace;
    use lard61_matrix::{Board, DebounceStrategy, Duration};

    fn replay(text: &str, config: &ScanConfig, show_keys: bool) -> (Summary, String) {
        let samples = trace::parse(text).unwrap();
        let mut out = Vec::new();
        let summary = run(&samples, config, show_keys, &mut out).unwrap();
        (summary, String::from_utf8(out).unwrap())
    }

    fn every_ms(from: u64, to: u64, keys: &str) -> String {
        (from..to).map(|t| format!("{t} {keys}\n")).collect()
    }

    #[test]
    fn held_key_produces_one_report_change() {
        let text = every_ms(10, 20, "") + &every_ms(20, 30, "0,1");
        let (summary, out) = replay(&text, &ScanConfig::default(), false);
        assert_eq!(summary.cycles, 20);
        assert_eq!(summary.report_changes, 1);
        assert_eq!(summary.reflash_at_ms, None);
        assert!(out.contains("25 ms  00 00 1e 00 00 00 00 00  [1]"), "{out}");
    }

    #[test]
    fn chord_is_reported_once() {
        let text = every_ms(10, 30, "4,0 4,2 4,10 1,4");
        let (summary, out) = replay(&text, &ScanConfig::default(), false);
        assert_eq!(summary.reflash_at_ms, Some(10));
        assert_eq!(out.matches("reflash requested").count(), 1);
        assert!(out.contains("(Fn)"));
    }

    #[test]
    fn per_key_and_threshold_options_apply() {
        let config = ScanConfig {
            debounce: DebounceStrategy::PerKey,
            debounce_threshold: Duration::millis(1),
            ..ScanConfig::default()
        };
        let text = every_ms(10, 20, "") + &every_ms(20, 25, "0,1");
        let (_, out) = replay(&text, &config, false);
        assert!(out.contains("22 ms  00 00 1e"), "{out}");
    }

    #[test]
    fn dev_board_aliases_shared_columns() {
        let config = ScanConfig::new(Board::PicoDev);
        let text = every_ms(10, 20, "0,0");
        let (_, out) = replay(&text, &config, true);
        // Columns 0 and 1 share a line: Esc and 1 both go down
        assert!(out.contains("pressed row=0 col=0"), "{out}");
        assert!(out.contains("pressed row=0 col=1"), "{out}");
    }
}
