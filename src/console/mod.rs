//! Operator console over the UART
//!
//! The console owns the UART driver and the formatted-output buffer, so
//! the main loop carries all console state explicitly.

pub mod format;
pub mod logger;

use core::fmt;

use crate::uart::{Uart, UartRegisters};
pub use format::PrintBuffer;
pub use logger::UartLogger;

/// Byte-oriented console: blocking and non-blocking reads, raw and
/// formatted writes
pub struct Console<R: UartRegisters> {
    uart: Uart<R>,
    buffer: PrintBuffer,
}

impl<R: UartRegisters> Console<R> {
    /// Create a console over a UART register block
    pub fn new(regs: R) -> Self {
        Self {
            uart: Uart::new(regs),
            buffer: PrintBuffer::new(),
        }
    }

    /// Block until a byte arrives
    pub fn getchar(&mut self) -> u8 {
        self.uart.receive_byte()
    }

    /// Return a waiting byte, or `None` without blocking
    pub fn getchar_nowait(&mut self) -> Option<u8> {
        self.uart.try_receive_byte()
    }

    /// Send one byte as-is
    pub fn putchar(&mut self, byte: u8) -> u8 {
        self.uart.transmit_byte(byte)
    }

    /// Send a string with `\n` expanded to `\r\n`
    pub fn puts(&mut self, s: &str) -> usize {
        self.uart.write_string(s.as_bytes())
    }

    /// Format into the print buffer and send it
    ///
    /// Returns the formatted length, not the number of bytes sent.
    pub fn print(&mut self, args: fmt::Arguments) -> usize {
        let len = self.buffer.render(args);
        self.uart.write_string(self.buffer.as_bytes());
        len
    }

    /// Borrow the UART driver
    pub fn uart(&self) -> &Uart<R> {
        &self.uart
    }
}

impl<R: UartRegisters> fmt::Write for Console<R> {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        self.puts(s);
        Ok(())
    }
}

/// Formatted write through a console's print buffer
///
/// Usage: `cprint!(console, "EP {:02x}\n", ep);`
#[macro_export]
macro_rules! cprint {
    ($console:expr, $($arg:tt)*) => {
        $console.print(format_args!($($arg)*))
    };
}
