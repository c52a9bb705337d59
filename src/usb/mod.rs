//! USB device side: no2usb controller, `usb-device` stack and CDC echo
//!
//! Exposes one CDC-ACM port. Everything the host writes to it is echoed
//! back by [`cdc::echo_task`].

pub mod callbacks;
pub mod cdc;
pub mod no2usb;
pub mod stack;
pub mod traits;

pub use callbacks::AppCallbacks;
pub use no2usb::{No2Usb, No2UsbBus};
pub use stack::UsbStack;
pub use traits::{DeviceCallbacks, DeviceController, ProtocolStack};
