//! USB collaborator traits for abstraction and testability
//!
//! The device controller and the protocol stack are external to the main
//! loop. These traits are the only surface the loop uses, so the no2usb
//! driver and the `usb-device` stack can be swapped with mocks for testing.

use core::fmt;

/// Low-level USB device controller
pub trait DeviceController {
    /// Drain pending hardware events and surface them to the protocol stack
    ///
    /// Polling-mode equivalent of the controller's interrupt handler. Must
    /// be called every loop iteration.
    fn handle_events(&mut self, port: u8);

    /// Write a human-readable dump of one endpoint's controller state
    fn inspect_endpoint<W: fmt::Write>(&mut self, out: &mut W, port: u8, ep_addr: u8);
}

/// Application hooks invoked by the protocol stack from within `task`
pub trait DeviceCallbacks {
    /// Device configured by the host
    fn mount(&mut self);

    /// Device left the configured state
    fn unmount(&mut self);

    /// Bus suspended; the device must drop to suspend current
    fn suspend(&mut self, remote_wakeup_en: bool);

    /// Bus resumed
    fn resume(&mut self);

    /// Host changed the CDC control lines
    fn cdc_line_state(&mut self, itf: u8, dtr: bool, rts: bool);

    /// CDC data arrived from the host
    fn cdc_rx(&mut self, itf: u8);
}

/// USB protocol stack: enumeration, control transfers, CDC class
pub trait ProtocolStack {
    /// Bring the stack up and attach to the bus
    fn init(&mut self);

    /// Advance the device state machine on the events the controller surfaced
    fn task<A: DeviceCallbacks>(&mut self, callbacks: &mut A);

    /// Bytes waiting on the CDC data interface
    fn cdc_available(&self) -> usize;

    /// Read up to `buf.len()` bytes from the CDC data interface
    fn cdc_read(&mut self, buf: &mut [u8]) -> usize;

    /// Queue bytes for the host; returns how many were accepted
    fn cdc_write(&mut self, data: &[u8]) -> usize;

    /// Push queued bytes to the host
    fn cdc_write_flush(&mut self);
}
