mod bootsel;
mod layout;
mod simulate;
mod trace;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use lard61_matrix::{Board, DebounceStrategy, Duration, ScanConfig};
use std::fs;
use std::io;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "lard61-cli")]
#[command(about = "lard61 keyboard companion tool")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Clone, Copy, ValueEnum)]
enum BoardArg {
    /// The lard61 PCB
    Lard61,
    /// Raspberry Pi Pico breadboard prototype
    PicoDev,
}

impl From<BoardArg> for Board {
    fn from(arg: BoardArg) -> Self {
        match arg {
            BoardArg::Lard61 => Board::Lard61,
            BoardArg::PicoDev => Board::PicoDev,
        }
    }
}

#[derive(Subcommand)]
enum Command {
    /// Render both keymap layers as an HTML/SVG page
    Layout {
        /// Write to this file instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Replay a raw matrix trace through the firmware pipeline
    Simulate {
        /// Trace file: `<time_ms> [row,col ...]` per line
        trace: PathBuf,
        /// Pin map used to read the trace
        #[arg(long, value_enum, default_value_t = BoardArg::Lard61)]
        board: BoardArg,
        /// Debounce every key on its own timer
        #[arg(long)]
        per_key: bool,
        /// Debounce quiet time in microseconds
        #[arg(long, default_value_t = 4000)]
        threshold_us: u64,
        /// List the stable keys whenever they change
        #[arg(long)]
        keys: bool,
    },
    /// Detect the keyboard or the RP2040 bootloader on USB
    Detect {
        /// Wait up to this many seconds for the bootloader to appear
        #[arg(long)]
        wait: Option<u64>,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Command::Layout { output } => {
            let html = layout::generate_html();
            match output {
                Some(path) => {
                    fs::write(&path, html)
                        .with_context(|| format!("writing {}", path.display()))?;
                    println!("Layout written to {}", path.display());
                }
                None => print!("{html}"),
            }
        }
        Command::Simulate {
            trace,
            board,
            per_key,
            threshold_us,
            keys,
        } => {
            let text = fs::read_to_string(&trace)
                .with_context(|| format!("reading {}", trace.display()))?;
            let samples = trace::parse(&text).context("parsing trace")?;

            let config = ScanConfig {
                debounce: if per_key {
                    DebounceStrategy::PerKey
                } else {
                    DebounceStrategy::WholeMatrix
                },
                debounce_threshold: Duration::micros(threshold_us),
                ..ScanConfig::new(board.into())
            };

            let summary = simulate::run(&samples, &config, keys, &mut io::stdout().lock())?;
            println!(
                "{} cycles, {} report changes",
                summary.cycles, summary.report_changes
            );
            if let Some(at) = summary.reflash_at_ms {
                println!("Reflash chord held at {at} ms.");
            }
        }
        Command::Detect { wait } => {
            let presence = bootsel::detect()?;
            if presence.keyboard {
                println!("lard61 keyboard detected.");
            }
            if presence.bootsel {
                println!("RP2040 bootloader detected (BOOTSEL mode).");
            } else if let Some(secs) = wait {
                if !bootsel::wait_for_bootsel(std::time::Duration::from_secs(secs))? {
                    eprintln!("RP2040 bootloader not detected after {secs} s.");
                    std::process::exit(1);
                }
            } else {
                println!("RP2040 bootloader not detected.");
                println!("Hold Ctrl + Alt + Fn + R on the keyboard to enter BOOTSEL mode.");
            }
        }
    }

    Ok(())
}
