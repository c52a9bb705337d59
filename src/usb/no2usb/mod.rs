//! no2usb full-speed device controller
//!
//! [`No2Usb`] owns the register block and is shared by reference between the
//! main loop and the `usb-device` stack. The loop drains hardware state into
//! a latch through [`DeviceController::handle_events`]; the stack picks the
//! latch up through [`No2UsbBus`]'s `poll`.

mod bus;
pub mod regs;

use core::cell::{Cell, RefCell};
use core::fmt;

use usb_device::endpoint::{EndpointAddress, EndpointType};
use usb_device::{Result, UsbDirection, UsbError};

use crate::config::usb::{DATA_SIZE, DETACH_SPIN, NUM_ENDPOINTS};
use crate::usb::traits::DeviceController;

pub use bus::No2UsbBus;
use regs::{ar, bd, csr, ep, EndpointRegs, Registers};

/// SETUP payload, without CRC
const SETUP_LEN: usize = 8;

/// Buffer memory and type bits of one allocated endpoint half
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct EndpointConfig {
    hw_type: u32,
    ptr: u16,
    max_packet_size: u16,
}

#[derive(Debug, Clone, Copy)]
struct EndpointSlot {
    out: Option<EndpointConfig>,
    in_: Option<EndpointConfig>,
}

impl EndpointSlot {
    const EMPTY: Self = Self {
        out: None,
        in_: None,
    };
}

/// Hardware events collected since the stack last polled
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
struct PendingEvents {
    reset: bool,
    suspend: bool,
    resume: bool,
    ep_out: u16,
    ep_in_complete: u16,
    ep_setup: u16,
}

impl PendingEvents {
    fn has_data(&self) -> bool {
        self.ep_out | self.ep_in_complete | self.ep_setup != 0
    }
}

/// no2usb device controller
pub struct No2Usb {
    regs: Registers,
    endpoints: RefCell<[EndpointSlot; NUM_ENDPOINTS]>,
    next_buffer: Cell<usize>,
    setup_buffer: Cell<u16>,
    pending: Cell<PendingEvents>,
    bus_suspended: Cell<bool>,
}

// SAFETY: the firmware has a single thread of control and never enables
// interrupts, so the controller is only ever touched from the main loop.
unsafe impl Sync for No2Usb {}

fn hw_type(ep_type: EndpointType) -> u32 {
    match ep_type {
        EndpointType::Control => ep::TYPE_CTRL,
        EndpointType::Isochronous { .. } => ep::TYPE_ISOC,
        EndpointType::Bulk => ep::TYPE_BULK,
        EndpointType::Interrupt => ep::TYPE_INT,
    }
}

fn type_name(status: u32) -> &'static str {
    match status & ep::TYPE_MASK & !ep::TYPE_HALTED {
        0 if status & ep::TYPE_ISOC != 0 => "isoc",
        0 => "none",
        ep::TYPE_INT => "int",
        ep::TYPE_BULK => "bulk",
        _ => "ctrl",
    }
}

fn state_name(csr: u32) -> &'static str {
    match bd::state(csr) {
        bd::STATE_NONE => "none",
        bd::STATE_RDY_DATA => "rdy",
        bd::STATE_RDY_STALL => "stall",
        bd::STATE_DONE_OK => "ok",
        bd::STATE_DONE_ERR => "err",
        _ => "?",
    }
}

impl No2Usb {
    /// # Safety
    ///
    /// `base` must be the start of a no2usb wishbone region, and only one
    /// instance may exist per region.
    pub const unsafe fn new(base: usize) -> Self {
        Self {
            regs: Registers::new(base),
            endpoints: RefCell::new([EndpointSlot::EMPTY; NUM_ENDPOINTS]),
            next_buffer: Cell::new(0),
            setup_buffer: Cell::new(0),
            pending: Cell::new(PendingEvents {
                reset: false,
                suspend: false,
                resume: false,
                ep_out: 0,
                ep_in_complete: 0,
                ep_setup: 0,
            }),
            bus_suspended: Cell::new(false),
        }
    }

    fn alloc_buffer(&self, size: usize) -> Result<u16> {
        let size = (size + 3) & !3;
        let addr = self.next_buffer.get();
        if addr + size > DATA_SIZE {
            return Err(UsbError::EndpointMemoryOverflow);
        }
        self.next_buffer.set(addr + size);
        Ok(addr as u16)
    }

    /// Reserve an endpoint half and its packet memory
    ///
    /// Without an explicit address, bulk and interrupt halves of matching
    /// type are paired on the lowest free index.
    fn alloc(
        &self,
        dir: UsbDirection,
        ep_addr: Option<EndpointAddress>,
        ep_type: EndpointType,
        max_packet_size: u16,
    ) -> Result<EndpointAddress> {
        let hw = hw_type(ep_type);
        let range = match ep_addr {
            Some(addr) => addr.index()..(addr.index() + 1).min(NUM_ENDPOINTS),
            None => 1..NUM_ENDPOINTS,
        };
        let mut endpoints = self.endpoints.borrow_mut();

        for index in range {
            let slot = &mut endpoints[index];
            let (own, other) = match dir {
                UsbDirection::Out => (slot.out, slot.in_),
                UsbDirection::In => (slot.in_, slot.out),
            };
            if own.is_some() {
                continue;
            }
            if ep_addr.is_none() && other.map_or(false, |other| other.hw_type != hw) {
                continue;
            }

            let ptr = match dir {
                UsbDirection::Out => self.alloc_buffer(max_packet_size as usize + bd::CRC_LEN)?,
                UsbDirection::In => self.alloc_buffer(max_packet_size as usize)?,
            };
            if index == 0 && dir == UsbDirection::Out {
                self.setup_buffer
                    .set(self.alloc_buffer(SETUP_LEN + bd::CRC_LEN)?);
            }

            let config = Some(EndpointConfig {
                hw_type: hw,
                ptr,
                max_packet_size,
            });
            match dir {
                UsbDirection::Out => slot.out = config,
                UsbDirection::In => slot.in_ = config,
            }
            log::trace!(
                "no2usb: ep {:02x} at {:#05x}, mps {}",
                u8::from(EndpointAddress::from_parts(index, dir)),
                ptr,
                max_packet_size
            );
            return Ok(EndpointAddress::from_parts(index, dir));
        }

        Err(match ep_addr {
            Some(_) => UsbError::InvalidEndpoint,
            None => UsbError::EndpointOverflow,
        })
    }

    fn arm_out(descriptor: &regs::BufferDescriptor, config: &EndpointConfig) {
        descriptor
            .csr
            .set(bd::STATE_RDY_DATA | bd::len(config.max_packet_size as usize + bd::CRC_LEN));
    }

    fn arm_setup(&self) {
        self.regs.ep(0).out.bd[1]
            .csr
            .set(bd::STATE_RDY_DATA | bd::len(SETUP_LEN + bd::CRC_LEN));
    }

    /// Program every endpoint from the allocation table, as after a bus reset
    fn configure_endpoints(&self) {
        let endpoints = self.endpoints.borrow();

        for (index, slot) in endpoints.iter().enumerate() {
            let pair = self.regs.ep(index);

            match slot.out {
                Some(config) if index == 0 => {
                    pair.out.status.set(ep::TYPE_CTRL | ep::BD_CTRL);
                    pair.out.bd[0].ptr.set(config.ptr as u32);
                    pair.out.bd[1].ptr.set(self.setup_buffer.get() as u32);
                    Self::arm_out(&pair.out.bd[0], &config);
                    self.arm_setup();
                }
                Some(config) => {
                    pair.out.status.set(config.hw_type);
                    pair.out.bd[0].ptr.set(config.ptr as u32);
                    Self::arm_out(&pair.out.bd[0], &config);
                }
                None => pair.out.status.set(ep::TYPE_NONE),
            }

            match slot.in_ {
                Some(config) => {
                    let dt = if index == 0 { ep::DT_BIT } else { 0 };
                    pair.in_.status.set(config.hw_type | dt);
                    pair.in_.bd[0].ptr.set(config.ptr as u32);
                    pair.in_.bd[0].csr.set(bd::STATE_NONE);
                }
                None => pair.in_.status.set(ep::TYPE_NONE),
            }
        }
    }

    fn attach(&self) {
        self.regs.core().csr.set(csr::PU_ENA | csr::CEL_ENA);
        self.regs.core().ar.set(ar::CEL_RELEASE);
    }

    fn enable(&self) {
        self.configure_endpoints();
        self.attach();
        log::debug!("no2usb: pull-up enabled");
    }

    fn reset(&self) {
        self.configure_endpoints();
        self.attach();
    }

    fn set_address(&self, addr: u8) {
        self.regs
            .core()
            .csr
            .set(csr::PU_ENA | csr::CEL_ENA | csr::ADDR_MATCH | (addr as u32 & csr::ADDR_MASK));
    }

    /// Drop the pull-up long enough for the host to see a disconnect
    fn detach_and_reattach(&self) {
        let usb_core = self.regs.core();
        let value = usb_core.csr.get();

        usb_core.csr.set(value & !csr::PU_ENA);
        for _ in 0..DETACH_SPIN {
            core::hint::spin_loop();
        }
        usb_core.csr.set(value | csr::PU_ENA);
    }

    /// Latch bus and endpoint events until the stack polls them
    fn collect_events(&self) {
        let usb_core = self.regs.core();
        let status = usb_core.csr.get();
        let mut events = self.pending.get();

        if status & csr::BUS_RST_PENDING != 0 {
            usb_core.ar.set(ar::BUS_RST_CLEAR);
            self.bus_suspended.set(false);
            self.pending.set(PendingEvents {
                reset: true,
                ..PendingEvents::default()
            });
            log::debug!("no2usb: bus reset");
            return;
        }

        if status & csr::SOF_PENDING != 0 {
            usb_core.ar.set(ar::SOF_CLEAR);
        }

        let suspended = status & csr::BUS_SUSPEND != 0;
        if suspended != self.bus_suspended.get() {
            self.bus_suspended.set(suspended);
            events.suspend = suspended;
            events.resume = !suspended;
        }

        let endpoints = self.endpoints.borrow();
        for (index, slot) in endpoints.iter().enumerate() {
            let bit = 1u16 << index;
            let pair = self.regs.ep(index);

            if slot.out.is_some() {
                if index == 0 && bd::state(pair.out.bd[1].csr.get()) == bd::STATE_DONE_OK {
                    events.ep_setup |= bit;
                    events.ep_out |= bit;
                }
                if matches!(
                    bd::state(pair.out.bd[0].csr.get()),
                    bd::STATE_DONE_OK | bd::STATE_DONE_ERR
                ) {
                    events.ep_out |= bit;
                }
            }

            if slot.in_.is_some() && bd::state(pair.in_.bd[0].csr.get()) == bd::STATE_DONE_OK {
                pair.in_.bd[0].csr.set(bd::STATE_NONE);
                events.ep_in_complete |= bit;
            }
        }

        self.pending.set(events);
    }

    /// Hand latched events to the stack, most urgent first
    fn take_events(&self) -> usb_device::bus::PollResult {
        use usb_device::bus::PollResult;

        let events = self.pending.get();

        if events.reset {
            self.pending.set(PendingEvents::default());
            return PollResult::Reset;
        }

        if events.has_data() {
            self.pending.set(PendingEvents {
                suspend: events.suspend,
                resume: events.resume,
                ..PendingEvents::default()
            });
            return PollResult::Data {
                ep_out: events.ep_out,
                ep_in_complete: events.ep_in_complete,
                ep_setup: events.ep_setup,
            };
        }

        self.pending.set(PendingEvents::default());
        if events.resume {
            PollResult::Resume
        } else if events.suspend {
            PollResult::Suspend
        } else {
            PollResult::None
        }
    }

    fn out_config(&self, index: usize) -> Result<EndpointConfig> {
        self.endpoints
            .borrow()
            .get(index)
            .and_then(|slot| slot.out)
            .ok_or(UsbError::InvalidEndpoint)
    }

    fn in_config(&self, index: usize) -> Result<EndpointConfig> {
        self.endpoints
            .borrow()
            .get(index)
            .and_then(|slot| slot.in_)
            .ok_or(UsbError::InvalidEndpoint)
    }

    /// Start a fresh control transfer after a SETUP was consumed
    fn restart_control(&self, config: &EndpointConfig) {
        let pair = self.regs.ep(0);

        pair.in_.bd[0].csr.set(bd::STATE_NONE);
        pair.out.status.set(ep::TYPE_CTRL | ep::BD_CTRL | ep::DT_BIT);
        pair.in_.status.set(ep::TYPE_CTRL | ep::DT_BIT);
        Self::arm_out(&pair.out.bd[0], config);
        self.arm_setup();
        self.regs.core().ar.set(ar::CEL_RELEASE);
    }

    fn read(&self, ep_addr: EndpointAddress, buf: &mut [u8]) -> Result<usize> {
        if !ep_addr.is_out() {
            return Err(UsbError::InvalidEndpoint);
        }
        let index = ep_addr.index();
        let config = self.out_config(index)?;
        let pair = self.regs.ep(index);

        if index == 0 {
            let setup = pair.out.bd[1].csr.get();
            if bd::state(setup) == bd::STATE_DONE_OK {
                let len = bd::rx_len(setup);
                if buf.len() < len {
                    return Err(UsbError::BufferOverflow);
                }
                self.regs
                    .read_data(self.setup_buffer.get() as usize, &mut buf[..len]);
                self.restart_control(&config);
                return Ok(len);
            }
        }

        let descriptor = &pair.out.bd[0];
        let value = descriptor.csr.get();
        match bd::state(value) {
            bd::STATE_DONE_OK => {
                let len = bd::rx_len(value);
                if buf.len() < len {
                    return Err(UsbError::BufferOverflow);
                }
                self.regs.read_data(config.ptr as usize, &mut buf[..len]);
                Self::arm_out(descriptor, &config);
                Ok(len)
            }
            bd::STATE_DONE_ERR => {
                Self::arm_out(descriptor, &config);
                Err(UsbError::WouldBlock)
            }
            _ => Err(UsbError::WouldBlock),
        }
    }

    fn write(&self, ep_addr: EndpointAddress, data: &[u8]) -> Result<usize> {
        if !ep_addr.is_in() {
            return Err(UsbError::InvalidEndpoint);
        }
        let index = ep_addr.index();
        let config = self.in_config(index)?;
        if data.len() > config.max_packet_size as usize {
            return Err(UsbError::BufferOverflow);
        }

        let descriptor = &self.regs.ep(index).in_.bd[0];
        match bd::state(descriptor.csr.get()) {
            bd::STATE_RDY_DATA => return Err(UsbError::WouldBlock),
            bd::STATE_DONE_OK => {
                // Completion the stack has not been told about yet
                let mut events = self.pending.get();
                events.ep_in_complete |= 1 << index;
                self.pending.set(events);
            }
            _ => {}
        }

        self.regs.write_data(config.ptr as usize, data);
        descriptor.csr.set(bd::STATE_RDY_DATA | bd::len(data.len()));
        Ok(data.len())
    }

    fn half(&self, ep_addr: EndpointAddress) -> &EndpointRegs {
        let pair = self.regs.ep(ep_addr.index());
        match ep_addr.direction() {
            UsbDirection::Out => &pair.out,
            UsbDirection::In => &pair.in_,
        }
    }

    fn set_stalled(&self, ep_addr: EndpointAddress, stalled: bool) {
        let index = ep_addr.index();
        if index >= NUM_ENDPOINTS || self.is_stalled(ep_addr) == stalled {
            return;
        }
        let regs = self.half(ep_addr);

        if index == 0 {
            // EP0 stalls per transfer through its data descriptor
            let value = match (stalled, ep_addr.direction()) {
                (true, _) => bd::STATE_RDY_STALL,
                (false, UsbDirection::In) => bd::STATE_NONE,
                (false, UsbDirection::Out) => match self.out_config(0) {
                    Ok(config) => {
                        Self::arm_out(&regs.bd[0], &config);
                        return;
                    }
                    Err(_) => bd::STATE_NONE,
                },
            };
            regs.bd[0].csr.set(value);
            return;
        }

        let status = regs.status.get();
        if !ep::is_bci(status) {
            return;
        }
        if stalled {
            regs.status.set(status | ep::TYPE_HALTED);
        } else {
            // Clearing the halt also resets the data toggle
            regs.status.set(status & ep::TYPE_MASK & !ep::TYPE_HALTED);
        }
    }

    fn is_stalled(&self, ep_addr: EndpointAddress) -> bool {
        let index = ep_addr.index();
        if index >= NUM_ENDPOINTS {
            return false;
        }
        let regs = self.half(ep_addr);

        if index == 0 {
            bd::state(regs.bd[0].csr.get()) == bd::STATE_RDY_STALL
        } else {
            let status = regs.status.get();
            ep::is_bci(status) && status & ep::TYPE_HALTED != 0
        }
    }

    /// Dump one endpoint half: status word and both buffer descriptors
    pub fn inspect<W: fmt::Write>(&self, out: &mut W, ep_addr: u8) -> fmt::Result {
        let addr = EndpointAddress::from(ep_addr);
        if addr.index() >= NUM_ENDPOINTS {
            return writeln!(out, "EP {:02x}: no such endpoint", ep_addr);
        }

        let regs = self.half(addr);
        let status = regs.status.get();
        let halted = ep::is_bci(status) && status & ep::TYPE_HALTED != 0;

        writeln!(
            out,
            "EP {:02x} {}: status {:04x} type {}{} dt {}",
            ep_addr,
            if addr.is_in() { "IN" } else { "OUT" },
            status,
            type_name(status),
            if halted { " halted" } else { "" },
            (status & ep::DT_BIT != 0) as u8,
        )?;
        for (i, descriptor) in regs.bd.iter().enumerate() {
            let value = descriptor.csr.get();
            writeln!(
                out,
                "  BD{}: csr {:04x} {} len {} ptr {:04x}",
                i,
                value,
                state_name(value),
                value & bd::LEN_MASK,
                descriptor.ptr.get(),
            )?;
        }
        Ok(())
    }
}

impl<'a> DeviceController for &'a No2Usb {
    fn handle_events(&mut self, _port: u8) {
        self.collect_events();
    }

    fn inspect_endpoint<W: fmt::Write>(&mut self, out: &mut W, _port: u8, ep_addr: u8) {
        let _ = self.inspect(out, ep_addr);
    }
}
