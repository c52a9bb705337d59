//! Console command set
//!
//! Commands are single bytes, matched exactly and case-sensitively. Each
//! one dumps the controller state of a fixed list of endpoints.
//!
//! | Key | Command                | Endpoints        |
//! |-----|------------------------|------------------|
//! | `S` | `DumpSerialEndpoints`  | 0x81, 0x02, 0x82 |
//! | `D` | `DumpStorageEndpoints` | 0x03, 0x83       |

use crate::config::console::{PRINTABLE_MAX_EXCLUSIVE, PRINTABLE_MIN_EXCLUSIVE};

/// CDC notification IN, data OUT, data IN
const SERIAL_ENDPOINTS: [u8; 3] = [0x81, 0x02, 0x82];

/// Mass-storage OUT, IN
const STORAGE_ENDPOINTS: [u8; 2] = [0x03, 0x83];

/// Diagnostic command selected by a console key
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConsoleCommand {
    /// Dump the CDC endpoints (`S`)
    DumpSerialEndpoints,
    /// Dump the mass-storage endpoints (`D`)
    DumpStorageEndpoints,
}

impl ConsoleCommand {
    /// Look up the command bound to a key, if any
    pub fn from_byte(byte: u8) -> Option<Self> {
        match byte {
            b'S' => Some(Self::DumpSerialEndpoints),
            b'D' => Some(Self::DumpStorageEndpoints),
            _ => None,
        }
    }

    /// Endpoint addresses to inspect, in inspection order
    pub fn endpoints(self) -> &'static [u8] {
        match self {
            Self::DumpSerialEndpoints => &SERIAL_ENDPOINTS,
            Self::DumpStorageEndpoints => &STORAGE_ENDPOINTS,
        }
    }
}

/// Whether a received byte is echoed back to the operator
pub fn is_echoed(byte: u8) -> bool {
    byte > PRINTABLE_MIN_EXCLUSIVE && byte < PRINTABLE_MAX_EXCLUSIVE
}
