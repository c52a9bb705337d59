//! LiteX UART CSR block

use vcell::VolatileCell;

use crate::uart::traits::{UartEvent, UartRegisters};

/// CSR layout with a 32-bit CSR data width
#[repr(C)]
struct RegisterBlock {
    rxtx: VolatileCell<u32>,
    txfull: VolatileCell<u32>,
    rxempty: VolatileCell<u32>,
    ev_status: VolatileCell<u32>,
    ev_pending: VolatileCell<u32>,
    ev_enable: VolatileCell<u32>,
}

/// Memory-mapped LiteX UART
pub struct CsrUart {
    base: usize,
}

impl CsrUart {
    /// # Safety
    ///
    /// `base` must point at a LiteX UART CSR block, and no other code may
    /// drive the same block concurrently.
    pub const unsafe fn new(base: usize) -> Self {
        Self { base }
    }

    fn regs(&self) -> &RegisterBlock {
        // SAFETY: validity of `base` is the constructor's contract
        unsafe { &*(self.base as *const RegisterBlock) }
    }

    /// Mask all UART events; the firmware polls
    pub fn init(&mut self) {
        let regs = self.regs();
        regs.ev_enable.set(0);
        regs.ev_pending.set(regs.ev_status.get());
    }
}

impl UartRegisters for CsrUart {
    fn rx_empty(&mut self) -> bool {
        self.regs().rxempty.get() != 0
    }

    fn tx_full(&mut self) -> bool {
        self.regs().txfull.get() != 0
    }

    fn read_data(&mut self) -> u8 {
        self.regs().rxtx.get() as u8
    }

    fn write_data(&mut self, byte: u8) {
        self.regs().rxtx.set(u32::from(byte));
    }

    fn acknowledge(&mut self, event: UartEvent) {
        self.regs().ev_pending.set(event.mask());
    }
}
