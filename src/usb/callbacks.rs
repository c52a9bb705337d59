//! Application callbacks for the USB device
//!
//! Apart from logging, only the CDC line state is tracked: DTR tells
//! whether a terminal is attached.

use crate::usb::traits::DeviceCallbacks;

/// Callbacks used by the firmware
#[derive(Debug, Default)]
pub struct AppCallbacks {
    mounted: bool,
    suspended: bool,
    terminal_connected: bool,
}

impl AppCallbacks {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn mounted(&self) -> bool {
        self.mounted
    }

    pub fn suspended(&self) -> bool {
        self.suspended
    }

    /// A host terminal holds DTR asserted
    pub fn terminal_connected(&self) -> bool {
        self.terminal_connected
    }
}

impl DeviceCallbacks for AppCallbacks {
    fn mount(&mut self) {
        self.mounted = true;
        log::info!("usb: mounted");
    }

    fn unmount(&mut self) {
        self.mounted = false;
        log::info!("usb: unmounted");
    }

    fn suspend(&mut self, remote_wakeup_en: bool) {
        self.suspended = true;
        log::debug!("usb: suspended (remote wakeup {})", remote_wakeup_en);
    }

    fn resume(&mut self) {
        self.suspended = false;
        log::debug!("usb: resumed");
    }

    fn cdc_line_state(&mut self, itf: u8, dtr: bool, rts: bool) {
        if dtr != self.terminal_connected {
            if dtr {
                log::info!("cdc{}: terminal connected", itf);
            } else {
                log::info!("cdc{}: terminal disconnected", itf);
            }
        }
        self.terminal_connected = dtr;
        log::trace!("cdc{}: dtr={} rts={}", itf, dtr, rts);
    }

    fn cdc_rx(&mut self, itf: u8) {
        log::trace!("cdc{}: rx", itf);
    }
}
