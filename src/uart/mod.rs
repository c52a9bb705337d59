pub mod csr;
pub mod driver;
pub mod traits;

pub use csr::CsrUart;
pub use driver::Uart;
pub use traits::{UartEvent, UartRegisters};
