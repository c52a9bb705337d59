//! `log` sink on the console UART.
//!
//! Records are rendered through a bounded print buffer and written raw to
//! the CSR UART at its fixed address. The logger keeps no state between
//! records, so it can live in a `static`.

use embedded_io::Write;
use log::{LevelFilter, Log, Metadata, Record, SetLoggerError};

use crate::console::{Console, PrintBuffer};
use crate::uart::{CsrUart, Uart, UartRegisters};

/// Logger writing `[LEVEL] message` lines to a UART
pub struct UartLogger {
    csr_base: usize,
    level: LevelFilter,
}

impl UartLogger {
    /// # Safety
    ///
    /// `csr_base` must point at a LiteX UART CSR block. The logger drives
    /// that block directly, so it must only be used from the single thread
    /// of control that also owns the console.
    pub const unsafe fn new(csr_base: usize, level: LevelFilter) -> Self {
        Self { csr_base, level }
    }

    /// Install as the global logger
    ///
    /// # Safety
    ///
    /// Must be called once, before any other code can log. The soft CPU
    /// has no atomics, so the racy setters are used.
    pub unsafe fn install(&'static self) -> Result<(), SetLoggerError> {
        log::set_logger_racy(self)?;
        log::set_max_level_racy(self.level);
        Ok(())
    }
}

impl Log for UartLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= self.level
    }

    fn log(&self, record: &Record) {
        if !self.enabled(record.metadata()) {
            return;
        }

        // SAFETY: address validity and exclusive use are the constructor's contract
        let mut uart = Uart::new(unsafe { CsrUart::new(self.csr_base) });
        let mut buffer = PrintBuffer::new();
        match write_record(&mut uart, &mut buffer, record) {
            Ok(_) => {}
            Err(never) => match never {},
        }
    }

    fn flush(&self) {}
}

/// Render one record and send it as a CRLF-terminated line
///
/// The message is truncated to the print buffer; the line ending is
/// always sent. Returns the logical length of the rendered message.
pub fn write_record<W: Write>(
    out: &mut W,
    buffer: &mut PrintBuffer,
    record: &Record,
) -> Result<usize, W::Error> {
    let len = buffer.render(format_args!("[{}] {}", record.level(), record.args()));
    out.write_all(buffer.as_bytes())?;
    out.write_all(b"\r\n")?;
    Ok(len)
}

/// Tell the console that logging is unavailable
pub fn report_install_error<R: UartRegisters>(
    console: &mut Console<R>,
    err: &SetLoggerError,
) -> usize {
    console.print(format_args!("logger: {}\n", err))
}
