#![no_std]
#![no_main]

use core::{ptr, slice};

use panic_halt as _;
use static_cell::StaticCell;
use usb_device::bus::UsbBusAllocator;

use no2usb_cdc_firmware::boot::{self, Sections};
use no2usb_cdc_firmware::config;
use no2usb_cdc_firmware::console::{logger, Console, UartLogger};
use no2usb_cdc_firmware::firmware::Firmware;
use no2usb_cdc_firmware::uart::CsrUart;
use no2usb_cdc_firmware::usb::{AppCallbacks, No2Usb, No2UsbBus, UsbStack};

// Reset entry: global pointer and stack from the linker script, then Rust
core::arch::global_asm!(
    ".section .text.start, \"ax\"",
    ".global _start",
    "_start:",
    ".option push",
    ".option norelax",
    "la gp, __global_pointer$",
    ".option pop",
    "la sp, _stack_top",
    "call start_rust",
    "1: j 1b",
);

extern "C" {
    static mut _sbss: u32;
    static mut _ebss: u32;
    static mut _sdata: u32;
    static mut _edata: u32;
    static _sidata: u32;
}

/// Words between two linker symbols
fn span(start: *const u32, end: *const u32) -> usize {
    (end as usize - start as usize) / core::mem::size_of::<u32>()
}

#[no_mangle]
unsafe extern "C" fn start_rust() -> ! {
    let bss = ptr::addr_of_mut!(_sbss);
    let data = ptr::addr_of_mut!(_sdata);
    let data_load = ptr::addr_of!(_sidata);

    // SAFETY: the linker script places these symbols around word-aligned
    // RAM and flash regions nothing else references yet
    let sections = Sections {
        bss: slice::from_raw_parts_mut(bss, span(bss, ptr::addr_of!(_ebss))),
        data: slice::from_raw_parts_mut(data, span(data, ptr::addr_of!(_edata))),
        data_load: slice::from_raw_parts(data_load, span(data, ptr::addr_of!(_edata))),
    };

    let console = boot::start(sections, || {
        // SAFETY: the console is the only driver of the UART block; the
        // logger shares it from the same thread
        let mut uart = unsafe { CsrUart::new(config::uart::CSR_BASE) };
        uart.init();
        uart
    });

    main(console)
}

static LOGGER: UartLogger =
    unsafe { UartLogger::new(config::uart::CSR_BASE, config::logging::MAX_LEVEL) };

static USB: StaticCell<No2Usb> = StaticCell::new();
static USB_BUS: StaticCell<UsbBusAllocator<No2UsbBus<'static>>> = StaticCell::new();

fn main(mut console: Console<CsrUart>) -> ! {
    // Give the host time to notice the detach before we re-enumerate
    for _ in 0..config::boot::DETACH_DELAY_ITERATIONS {
        riscv::asm::nop();
    }

    // SAFETY: single thread of control, nothing has logged yet
    if let Err(err) = unsafe { LOGGER.install() } {
        logger::report_install_error(&mut console, &err);
    }

    // SAFETY: sole instance for the core's wishbone region
    let usb: &'static No2Usb = USB.init(unsafe { No2Usb::new(config::usb::CORE_BASE) });
    let bus = USB_BUS.init(No2UsbBus::new(usb));
    let stack = UsbStack::new(bus);

    let mut firmware = Firmware::new(console, usb, stack, AppCallbacks::new());
    firmware.boot();
    firmware.run()
}
