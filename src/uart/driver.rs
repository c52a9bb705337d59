//! Blocking, polled UART driver
//!
//! Spins on the hardware status flags. There is no timeout: a flag that
//! never changes stalls the caller forever.

use core::convert::Infallible;
use core::fmt;

use crate::uart::traits::{UartEvent, UartRegisters};

/// Polled UART driver over a register block
pub struct Uart<R: UartRegisters> {
    regs: R,
}

impl<R: UartRegisters> Uart<R> {
    /// Wrap a register block
    pub fn new(regs: R) -> Self {
        Self { regs }
    }

    /// Block until a byte is available, consume and acknowledge it
    pub fn receive_byte(&mut self) -> u8 {
        while self.regs.rx_empty() {
            core::hint::spin_loop();
        }

        let byte = self.regs.read_data();
        self.regs.acknowledge(UartEvent::Rx);
        byte
    }

    /// Return a byte if one is waiting, `None` otherwise. Never blocks.
    pub fn try_receive_byte(&mut self) -> Option<u8> {
        if self.regs.rx_empty() {
            return None;
        }

        Some(self.receive_byte())
    }

    /// Block until the transmit FIFO has room, then send one byte
    ///
    /// No newline translation happens here; see [`Uart::write_string`].
    pub fn transmit_byte(&mut self, byte: u8) -> u8 {
        while self.regs.tx_full() {
            core::hint::spin_loop();
        }

        self.regs.write_data(byte);
        self.regs.acknowledge(UartEvent::Tx);
        byte
    }

    /// Write a NUL-terminated byte string, translating `\n` into `\r\n`
    ///
    /// Stops at the first NUL or at the end of the slice, whichever comes
    /// first. Returns the number of source bytes processed.
    pub fn write_string(&mut self, s: &[u8]) -> usize {
        let mut count = 0;

        for &byte in s.iter().take_while(|&&b| b != 0) {
            if byte == b'\n' {
                self.transmit_byte(b'\r');
            }
            self.transmit_byte(byte);
            count += 1;
        }

        count
    }

    /// Borrow the register block
    pub fn registers(&self) -> &R {
        &self.regs
    }
}

impl<R: UartRegisters> fmt::Write for Uart<R> {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        self.write_string(s.as_bytes());
        Ok(())
    }
}

impl<R: UartRegisters> embedded_io::ErrorType for Uart<R> {
    type Error = Infallible;
}

impl<R: UartRegisters> embedded_io::Write for Uart<R> {
    /// Raw bytes, no newline translation
    fn write(&mut self, buf: &[u8]) -> Result<usize, Self::Error> {
        for &byte in buf {
            self.transmit_byte(byte);
        }
        Ok(buf.len())
    }

    fn flush(&mut self) -> Result<(), Self::Error> {
        Ok(())
    }
}
