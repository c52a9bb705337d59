//! Protocol stack built on `usb-device` and `usbd-serial`
//!
//! `usb-device` reports state rather than events, so [`LinkTracker`] diffs
//! a snapshot after each poll and turns edges into [`DeviceCallbacks`].

use heapless::Deque;
use usb_device::bus::{UsbBus, UsbBusAllocator};
use usb_device::prelude::{StringDescriptors, UsbDevice, UsbDeviceBuilder, UsbDeviceState, UsbVidPid};
use usbd_serial::{SerialPort, USB_CLASS_CDC};

use crate::config::cdc::{INTERFACE, RX_FIFO_DEPTH};
use crate::config::usb;
use crate::usb::traits::{DeviceCallbacks, ProtocolStack};

/// Device and CDC line state observed after one poll
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LinkSnapshot {
    pub state: UsbDeviceState,
    pub remote_wakeup: bool,
    pub dtr: bool,
    pub rts: bool,
    /// CDC data was moved into the receive FIFO during this poll
    pub rx_ready: bool,
}

/// Turns successive snapshots into mount, suspend and line-state callbacks
#[derive(Debug, Default)]
pub struct LinkTracker {
    configured: bool,
    suspended: bool,
    dtr: bool,
    rts: bool,
}

impl LinkTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn update<A: DeviceCallbacks>(&mut self, snapshot: &LinkSnapshot, callbacks: &mut A) {
        let suspended = snapshot.state == UsbDeviceState::Suspend;
        if suspended != self.suspended {
            self.suspended = suspended;
            if suspended {
                callbacks.suspend(snapshot.remote_wakeup);
            } else {
                callbacks.resume();
            }
        }

        // Suspend hides the configured state; it comes back on resume
        if !suspended {
            let configured = snapshot.state == UsbDeviceState::Configured;
            if configured != self.configured {
                self.configured = configured;
                if configured {
                    callbacks.mount();
                } else {
                    callbacks.unmount();
                }
            }
        }

        if (snapshot.dtr, snapshot.rts) != (self.dtr, self.rts) {
            self.dtr = snapshot.dtr;
            self.rts = snapshot.rts;
            callbacks.cdc_line_state(INTERFACE, snapshot.dtr, snapshot.rts);
        }

        if snapshot.rx_ready {
            callbacks.cdc_rx(INTERFACE);
        }
    }
}

/// Move whatever the class driver holds into the FIFO, as far as it fits
fn drain_serial<B: UsbBus>(
    serial: &mut SerialPort<'_, B>,
    fifo: &mut Deque<u8, RX_FIFO_DEPTH>,
) -> usize {
    let room = RX_FIFO_DEPTH - fifo.len();
    if room == 0 {
        return 0;
    }

    let mut chunk = [0u8; RX_FIFO_DEPTH];
    match serial.read(&mut chunk[..room]) {
        Ok(count) => {
            for &byte in &chunk[..count] {
                let _ = fifo.push_back(byte);
            }
            count
        }
        // WouldBlock: nothing received
        Err(_) => 0,
    }
}

/// CDC-ACM device on a `usb-device` bus
pub struct UsbStack<'a, B: UsbBus> {
    alloc: &'a UsbBusAllocator<B>,
    serial: SerialPort<'a, B>,
    device: Option<UsbDevice<'a, B>>,
    rx_fifo: Deque<u8, RX_FIFO_DEPTH>,
    link: LinkTracker,
}

impl<'a, B: UsbBus> UsbStack<'a, B> {
    /// Allocate the CDC endpoints; the device attaches in `init`
    pub fn new(alloc: &'a UsbBusAllocator<B>) -> Self {
        Self {
            alloc,
            serial: SerialPort::new(alloc),
            device: None,
            rx_fifo: Deque::new(),
            link: LinkTracker::new(),
        }
    }

    /// Device state, or `Default` before `init`
    pub fn state(&self) -> UsbDeviceState {
        self.device
            .as_ref()
            .map_or(UsbDeviceState::Default, |device| device.state())
    }

    pub fn is_attached(&self) -> bool {
        self.device.is_some()
    }
}

impl<'a, B: UsbBus> ProtocolStack for UsbStack<'a, B> {
    fn init(&mut self) {
        if self.device.is_some() {
            return;
        }

        let strings = StringDescriptors::default()
            .manufacturer(usb::MANUFACTURER)
            .product(usb::PRODUCT)
            .serial_number(usb::SERIAL_NUMBER);

        let builder = UsbDeviceBuilder::new(self.alloc, UsbVidPid(usb::VID, usb::PID))
            .strings(&[strings])
            .and_then(|builder| builder.max_packet_size_0(usb::EP0_SIZE));

        match builder {
            Ok(builder) => {
                self.device = Some(builder.device_class(USB_CLASS_CDC).build());
                log::info!("usb: attached as {:04x}:{:04x}", usb::VID, usb::PID);
            }
            Err(err) => log::error!("usb: device setup rejected: {:?}", err),
        }
    }

    fn task<A: DeviceCallbacks>(&mut self, callbacks: &mut A) {
        let Some(device) = self.device.as_mut() else {
            return;
        };

        let mut received = 0;
        if device.poll(&mut [&mut self.serial]) {
            received = drain_serial(&mut self.serial, &mut self.rx_fifo);
        }

        let snapshot = LinkSnapshot {
            state: device.state(),
            remote_wakeup: device.remote_wakeup_enabled(),
            dtr: self.serial.dtr(),
            rts: self.serial.rts(),
            rx_ready: received > 0,
        };
        self.link.update(&snapshot, callbacks);
    }

    fn cdc_available(&self) -> usize {
        self.rx_fifo.len()
    }

    fn cdc_read(&mut self, buf: &mut [u8]) -> usize {
        let mut count = 0;
        for slot in buf.iter_mut() {
            match self.rx_fifo.pop_front() {
                Some(byte) => {
                    *slot = byte;
                    count += 1;
                }
                None => break,
            }
        }
        count
    }

    fn cdc_write(&mut self, data: &[u8]) -> usize {
        if data.is_empty() {
            return 0;
        }
        match self.serial.write(data) {
            Ok(count) => count,
            Err(err) => {
                log::trace!("cdc{}: write dropped: {:?}", INTERFACE, err);
                0
            }
        }
    }

    fn cdc_write_flush(&mut self) {
        // WouldBlock means a packet is still in flight; the class driver
        // sends the rest on the next IN completion
        let _ = self.serial.flush();
    }
}
