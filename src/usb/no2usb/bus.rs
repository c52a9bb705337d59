//! `usb-device` bus driver over a shared [`No2Usb`]

use usb_device::bus::{PollResult, UsbBus, UsbBusAllocator};
use usb_device::endpoint::{EndpointAddress, EndpointType};
use usb_device::{Result, UsbDirection};

use super::No2Usb;

/// Bus handle given to `usb-device`
///
/// The allocator owns this handle, so the controller itself stays reachable
/// for event handling and endpoint inspection.
pub struct No2UsbBus<'a> {
    usb: &'a No2Usb,
}

impl<'a> No2UsbBus<'a> {
    pub fn new(usb: &'a No2Usb) -> UsbBusAllocator<Self> {
        UsbBusAllocator::new(Self { usb })
    }
}

impl<'a> UsbBus for No2UsbBus<'a> {
    fn alloc_ep(
        &mut self,
        ep_dir: UsbDirection,
        ep_addr: Option<EndpointAddress>,
        ep_type: EndpointType,
        max_packet_size: u16,
        _interval: u8,
    ) -> Result<EndpointAddress> {
        self.usb.alloc(ep_dir, ep_addr, ep_type, max_packet_size)
    }

    fn enable(&mut self) {
        self.usb.enable();
    }

    fn reset(&self) {
        self.usb.reset();
    }

    fn set_device_address(&self, addr: u8) {
        self.usb.set_address(addr);
    }

    fn write(&self, ep_addr: EndpointAddress, buf: &[u8]) -> Result<usize> {
        self.usb.write(ep_addr, buf)
    }

    fn read(&self, ep_addr: EndpointAddress, buf: &mut [u8]) -> Result<usize> {
        self.usb.read(ep_addr, buf)
    }

    fn set_stalled(&self, ep_addr: EndpointAddress, stalled: bool) {
        self.usb.set_stalled(ep_addr, stalled);
    }

    fn is_stalled(&self, ep_addr: EndpointAddress) -> bool {
        self.usb.is_stalled(ep_addr)
    }

    // The core has no low-power mode to enter
    fn suspend(&self) {}

    fn resume(&self) {}

    fn poll(&self) -> PollResult {
        self.usb.take_events()
    }

    fn force_reset(&self) -> Result<()> {
        self.usb.detach_and_reattach();
        Ok(())
    }
}
