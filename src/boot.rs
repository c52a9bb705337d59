//! Memory initialisation before `main`
//!
//! Section setup runs before any static is read, so nothing may print or
//! log until it is done. `start` enforces that order for the console.

use crate::console::Console;
use crate::uart::UartRegisters;

/// RAM sections prepared by the startup code
pub struct Sections<'a> {
    /// `.bss`, zeroed
    pub bss: &'a mut [u32],
    /// `.data` in RAM
    pub data: &'a mut [u32],
    /// `.data` load image in flash
    pub data_load: &'a [u32],
}

/// Zero `.bss` and copy the `.data` image into RAM, word by word
pub fn init_sections(sections: Sections<'_>) {
    for word in sections.bss.iter_mut() {
        // SAFETY: `word` is a valid, exclusive reference
        unsafe { core::ptr::write_volatile(word, 0) };
    }

    for (dst, src) in sections.data.iter_mut().zip(sections.data_load) {
        // SAFETY: `dst` is a valid, exclusive reference
        unsafe { core::ptr::write_volatile(dst, *src) };
    }
}

/// Prepare RAM, then open the console UART
///
/// `open_uart` only runs once `.bss` and `.data` are in place.
pub fn start<R, F>(sections: Sections<'_>, open_uart: F) -> Console<R>
where
    R: UartRegisters,
    F: FnOnce() -> R,
{
    init_sections(sections);
    Console::new(open_uart())
}
