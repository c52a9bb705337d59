//! Hardware and firmware configuration constants for the iCEBreaker LiteX SoC
//!
//! Base addresses must match the SoC generator output (`generated/csr.h` and
//! `generated/mem.h`) for the bitstream the firmware is flashed alongside.

/// LiteX UART CSR block
pub mod uart {
    /// Base address of the UART CSR block (32-bit CSR data width)
    pub const CSR_BASE: usize = 0xf000_2000;

    /// Event bit acknowledging a transmitted byte
    pub const EV_TX: u32 = 0x1;
    /// Event bit acknowledging a received byte
    pub const EV_RX: u32 = 0x2;
}

/// no2usb device controller
pub mod usb {
    /// Base address of the no2usb wishbone region
    pub const CORE_BASE: usize = 0xb000_0000;

    /// Offset of the endpoint register pairs from the core base
    pub const EP_REGS_OFFSET: usize = 0x2000;

    /// Offset of the packet buffer from the core base (shared by TX and RX)
    pub const DATA_OFFSET: usize = 0x8000;

    /// Packet buffer size in bytes (512 words of 32 bits)
    pub const DATA_SIZE: usize = 2048;

    /// Number of endpoint pairs implemented by the core
    pub const NUM_ENDPOINTS: usize = 16;

    /// Root hub port driven by this firmware
    pub const RHPORT: u8 = 0;

    /// EP0 max packet size
    pub const EP0_SIZE: u8 = 64;

    /// pid.codes test VID:PID
    pub const VID: u16 = 0x1209;
    pub const PID: u16 = 0x0001;

    pub const MANUFACTURER: &str = "no2usb";
    pub const PRODUCT: &str = "no2usb CDC-ACM";
    pub const SERIAL_NUMBER: &str = "000000";

    /// Busy-wait iterations while the pull-up is dropped in `force_reset`
    pub const DETACH_SPIN: u32 = 1 << 16;
}

/// Operator console
pub mod console {
    /// Size of the formatted output buffer, terminator slot included
    pub const PRINT_BUFFER_SIZE: usize = 128;

    /// Prompt shown when waiting for a command
    pub const PROMPT: &str = "Command> ";

    /// Bytes strictly above this value are echoed
    pub const PRINTABLE_MIN_EXCLUSIVE: u8 = 32;
    /// Bytes strictly below this value are echoed
    pub const PRINTABLE_MAX_EXCLUSIVE: u8 = 127;
}

/// CDC data interface
pub mod cdc {
    /// Largest block echoed per loop iteration
    pub const ECHO_WINDOW: usize = 64;

    /// Depth of the receive FIFO between the class driver and the echo task
    pub const RX_FIFO_DEPTH: usize = 64;

    /// The only CDC interface exposed
    pub const INTERFACE: u8 = 0;
}

/// Boot sequence
pub mod boot {
    /// Busy-wait iterations so the host notices the detach/re-attach
    pub const DETACH_DELAY_ITERATIONS: u32 = 10_000_000;

    /// Banner printed once the console is up
    pub const BANNER: [&str; 5] = [
        "\n",
        "==========================================================\n",
        "\n",
        "Booting TinyUSB image..\n",
        "\n",
    ];
}

/// Logging
pub mod logging {
    /// Records above this level are discarded
    pub const MAX_LEVEL: log::LevelFilter = log::LevelFilter::Info;
}
