//! no2usb register map
//!
//! The core exposes 16-bit registers on a 32-bit bus. Endpoint register
//! pairs start at `EP_REGS_OFFSET`; the packet buffer is word-addressed at
//! `DATA_OFFSET`.

use core::ptr;

use vcell::VolatileCell;

use crate::config::usb::{DATA_OFFSET, EP_REGS_OFFSET};

#[repr(C)]
pub struct CoreRegs {
    pub csr: VolatileCell<u32>,
    pub ar: VolatileCell<u32>,
    pub evt: VolatileCell<u32>,
    pub ir: VolatileCell<u32>,
}

#[repr(C)]
pub struct BufferDescriptor {
    pub csr: VolatileCell<u32>,
    pub ptr: VolatileCell<u32>,
}

#[repr(C)]
pub struct EndpointRegs {
    pub status: VolatileCell<u32>,
    _reserved: [VolatileCell<u32>; 3],
    pub bd: [BufferDescriptor; 2],
}

#[repr(C)]
pub struct EndpointPair {
    pub out: EndpointRegs,
    pub in_: EndpointRegs,
}

/// Core CSR bits
pub mod csr {
    pub const PU_ENA: u32 = 1 << 15;
    pub const EVT_PENDING: u32 = 1 << 14;
    pub const CEL_ACTIVE: u32 = 1 << 13;
    pub const CEL_ENA: u32 = 1 << 12;
    pub const BUS_SUSPEND: u32 = 1 << 11;
    pub const BUS_RST: u32 = 1 << 10;
    pub const BUS_RST_PENDING: u32 = 1 << 9;
    pub const SOF_PENDING: u32 = 1 << 8;
    pub const ADDR_MATCH: u32 = 1 << 7;
    pub const ADDR_MASK: u32 = 0x7f;
}

/// Action register bits
pub mod ar {
    pub const CEL_RELEASE: u32 = 1 << 13;
    pub const BUS_RST_CLEAR: u32 = 1 << 9;
    pub const SOF_CLEAR: u32 = 1 << 8;
}

/// Endpoint status bits
pub mod ep {
    pub const TYPE_NONE: u32 = 0x0000;
    pub const TYPE_ISOC: u32 = 0x0001;
    pub const TYPE_INT: u32 = 0x0002;
    pub const TYPE_BULK: u32 = 0x0004;
    pub const TYPE_CTRL: u32 = 0x0006;
    /// Halt flag, meaningful for bulk, interrupt and control types only
    pub const TYPE_HALTED: u32 = 0x0001;
    pub const TYPE_MASK: u32 = 0x0007;

    pub const DT_BIT: u32 = 0x0080;
    pub const BD_IDX: u32 = 0x0040;
    pub const BD_CTRL: u32 = 0x0020;
    pub const BD_DUAL: u32 = 0x0010;

    /// Bulk, control or interrupt
    pub fn is_bci(status: u32) -> bool {
        status & 0x0006 != 0
    }
}

/// Buffer descriptor bits
pub mod bd {
    pub const STATE_MASK: u32 = 0xe000;
    pub const STATE_NONE: u32 = 0x0000;
    pub const STATE_RDY_DATA: u32 = 0x4000;
    pub const STATE_RDY_STALL: u32 = 0x6000;
    pub const STATE_DONE_OK: u32 = 0x8000;
    pub const STATE_DONE_ERR: u32 = 0xa000;
    pub const IS_SETUP: u32 = 0x1000;
    pub const LEN_MASK: u32 = 0x03ff;

    /// Bytes the core appends after every received packet
    pub const CRC_LEN: usize = 2;

    pub fn len(len: usize) -> u32 {
        len as u32 & LEN_MASK
    }

    pub fn state(csr: u32) -> u32 {
        csr & STATE_MASK
    }

    /// Payload length of a completed OUT descriptor
    pub fn rx_len(csr: u32) -> usize {
        ((csr & LEN_MASK) as usize).saturating_sub(CRC_LEN)
    }
}

/// Handle on one no2usb instance
pub struct Registers {
    base: usize,
}

impl Registers {
    /// # Safety
    ///
    /// `base` must be the start of a no2usb wishbone region.
    pub const unsafe fn new(base: usize) -> Self {
        Self { base }
    }

    pub fn core(&self) -> &CoreRegs {
        // SAFETY: validity of `base` is the constructor's contract
        unsafe { &*(self.base as *const CoreRegs) }
    }

    pub fn ep(&self, index: usize) -> &EndpointPair {
        let addr = self.base + EP_REGS_OFFSET + index * core::mem::size_of::<EndpointPair>();
        // SAFETY: callers keep `index` below the core's endpoint count
        unsafe { &*(addr as *const EndpointPair) }
    }

    fn data_ptr(&self, offset: usize) -> *mut u32 {
        (self.base + DATA_OFFSET + offset) as *mut u32
    }

    /// Copy a packet into the buffer memory, one 32-bit word at a time
    pub fn write_data(&self, offset: usize, data: &[u8]) {
        let dst = self.data_ptr(offset);
        for (i, chunk) in data.chunks(4).enumerate() {
            let mut word = [0u8; 4];
            word[..chunk.len()].copy_from_slice(chunk);
            // SAFETY: `offset` comes from the endpoint buffer allocator
            unsafe { ptr::write_volatile(dst.add(i), u32::from_le_bytes(word)) };
        }
    }

    /// Copy a packet out of the buffer memory
    pub fn read_data(&self, offset: usize, buf: &mut [u8]) {
        let src = self.data_ptr(offset);
        for (i, chunk) in buf.chunks_mut(4).enumerate() {
            // SAFETY: `offset` comes from the endpoint buffer allocator
            let word = unsafe { ptr::read_volatile(src.add(i)) }.to_le_bytes();
            chunk.copy_from_slice(&word[..chunk.len()]);
        }
    }
}
