//! lard61 keyboard firmware for the RP2040.
//!
//! - Interrupt-driven matrix scan of the 5×14 matrix every millisecond
//! - Whole-matrix debouncing and Fn layer via `lard61-matrix`
//! - USB HID boot keyboard reports (6KRO, ghost-tolerant growth)
//! - Ctrl + Alt + Fn + R reboots into the ROM USB bootloader

#![no_std]
#![no_main]

mod hid;
mod matrix;

use defmt_rtt as _;
use panic_probe as _;

use embedded_hal::digital::StatefulOutputPin;
use rp2040_hal as hal;

use hal::clocks::{ClocksManager, InitError};
use hal::fugit::RateExtU32;
use hal::pac;
use hal::pll::common_configs::{PLL_SYS_125MHZ, PLL_USB_48MHZ};
use hal::pll::setup_pll_blocking;
use hal::xosc::setup_xosc_blocking_custom_delay;
use hal::usb::UsbBus;
use hal::{Sio, Timer, Watchdog};
use usb_device::class_prelude::UsbBusAllocator;
use usb_device::device::UsbDeviceBuilder;
use usbd_human_interface_device::device::keyboard::BootKeyboardConfig;
use usbd_human_interface_device::prelude::UsbHidClassBuilder;

use lard61_matrix::{Duration, Line, Pipeline, PressedKeys, ScanConfig, Scanner};
use matrix::{BoardIo, BOARD, SCAN};

#[link_section = ".boot2"]
#[used]
pub static BOOT2_FIRMWARE: [u8; 256] = rp2040_boot2::BOOT_LOADER_W25Q080;

const XOSC_CRYSTAL_FREQ: u32 = 12_000_000;

/// Status LED, also lit by the ROM bootloader while it is active.
const LED_LINE: Line = Line::new(7);

/// `init_clocks_and_plls` with a longer crystal start-up wait.
fn init_clocks(
    xosc: pac::XOSC,
    clocks: pac::CLOCKS,
    pll_sys: pac::PLL_SYS,
    pll_usb: pac::PLL_USB,
    resets: &mut pac::RESETS,
    watchdog: &mut Watchdog,
) -> Result<ClocksManager, InitError> {
    let xosc = setup_xosc_blocking_custom_delay(
        xosc,
        XOSC_CRYSTAL_FREQ.Hz(),
        u32::from(BOARD.xosc_startup_delay_multiplier()),
    )
    .map_err(InitError::XoscErr)?;
    watchdog.enable_tick_generation((XOSC_CRYSTAL_FREQ / 1_000_000) as u8);

    let mut clocks = ClocksManager::new(clocks);
    let pll_sys = setup_pll_blocking(
        pll_sys,
        xosc.operating_frequency(),
        PLL_SYS_125MHZ,
        &mut clocks,
        resets,
    )
    .map_err(InitError::PllError)?;
    let pll_usb = setup_pll_blocking(
        pll_usb,
        xosc.operating_frequency(),
        PLL_USB_48MHZ,
        &mut clocks,
        resets,
    )
    .map_err(InitError::PllError)?;

    clocks
        .init_default(&xosc, &pll_sys, &pll_usb)
        .map_err(InitError::ClockError)?;
    Ok(clocks)
}

#[hal::entry]
fn main() -> ! {
    let mut pac = pac::Peripherals::take().unwrap();
    let mut watchdog = Watchdog::new(pac.WATCHDOG);

    let clocks = init_clocks(
        pac.XOSC,
        pac.CLOCKS,
        pac.PLL_SYS,
        pac.PLL_USB,
        &mut pac.RESETS,
        &mut watchdog,
    )
    .unwrap();

    let sio = Sio::new(pac.SIO);
    let pins = hal::gpio::Pins::new(
        pac.IO_BANK0,
        pac.PADS_BANK0,
        sio.gpio_bank0,
        &mut pac.RESETS,
    );
    let timer = Timer::new(pac.TIMER, &mut pac.RESETS, &clocks);

    // USB
    let usb_bus = UsbBusAllocator::new(UsbBus::new(
        pac.USBCTRL_REGS,
        pac.USBCTRL_DPRAM,
        clocks.usb_clock,
        true,
        &mut pac.RESETS,
    ));
    let mut keyboard = UsbHidClassBuilder::new()
        .add_device(BootKeyboardConfig::default())
        .build(&usb_bus);
    let mut usb_dev = UsbDeviceBuilder::new(&usb_bus, hid::VID_PID)
        .strings(&[hid::strings()])
        .unwrap()
        .build();

    // Matrix
    let config = ScanConfig::new(BOARD);
    let (io, mut spare) = BoardIo::new(pins, timer);
    let mut scanner = Scanner::new(io, &config, &SCAN);
    let mut pipeline = Pipeline::new(&config);

    let mut led = spare.take(LED_LINE).map(|pin| pin.into_push_pull_output());

    defmt::info!("lard61 up, magic reflash combination is Ctrl + Alt + Fn + R");

    let scan_period = Duration::millis(1);
    let mut next_scan = timer.get_counter();
    let mut next_blink = timer.get_counter();

    loop {
        let now = timer.get_counter();

        if now >= next_scan {
            next_scan = now + scan_period;

            let raw = scanner.scan();
            let cycle = pipeline.process(raw, timer.get_counter());

            if cycle.stable_changed {
                defmt::debug!("stable: {}", PressedKeys(&cycle.stable));
            }
            if cycle.reflash_requested() {
                defmt::info!("reflash requested, rebooting to BOOTSEL");
                hal::rom_data::reset_to_usb_boot(1 << LED_LINE.gpio(), 0);
                loop {
                    cortex_m::asm::nop();
                }
            }

            hid::check(keyboard.device().write_report(hid::keys(&cycle.report)));
            hid::check(keyboard.tick());
        }

        if now >= next_blink {
            next_blink = now + hid::blink_period(usb_dev.state());
            if let Some(led) = led.as_mut() {
                let _ = led.toggle();
            }
        }

        usb_dev.poll(&mut [&mut keyboard]);
    }
}
