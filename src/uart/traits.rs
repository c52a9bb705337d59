//! UART register trait for abstraction and testability
//!
//! This trait exposes the four register accesses the console driver needs,
//! allowing the LiteX CSR block to be swapped with a mock for testing.

use crate::config;

/// Events acknowledged through the event-pending register
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UartEvent {
    /// A byte was written to the transmit FIFO
    Tx,
    /// A byte was taken from the receive FIFO
    Rx,
}

impl UartEvent {
    /// Bit to write into the event-pending register
    pub fn mask(self) -> u32 {
        match self {
            UartEvent::Tx => config::uart::EV_TX,
            UartEvent::Rx => config::uart::EV_RX,
        }
    }
}

/// Raw UART register interface
///
/// Every method is a single register access. Sequencing (flag check, data
/// access, acknowledge) is the driver's job.
pub trait UartRegisters {
    /// Receive FIFO is empty
    fn rx_empty(&mut self) -> bool;

    /// Transmit FIFO is full
    fn tx_full(&mut self) -> bool;

    /// Read the combined data register
    fn read_data(&mut self) -> u8;

    /// Write the combined data register
    fn write_data(&mut self, byte: u8);

    /// Acknowledge an event in the event-pending register
    fn acknowledge(&mut self, event: UartEvent);
}

#[cfg(test)]
pub mod mock {
    //! Mock UART registers for testing

    use super::*;
    use core::cell::RefCell;
    use heapless::{Deque, Vec};

    const MOCK_CAPACITY: usize = 1024;

    /// A single register access, in the order the driver performed it
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub enum RegisterAccess {
        RxEmpty,
        TxFull,
        ReadData(u8),
        WriteData(u8),
        Acknowledge(UartEvent),
    }

    /// Mock UART register block for unit testing
    pub struct MockUartRegisters {
        /// Bytes waiting in the receive FIFO
        rx_fifo: RefCell<Deque<u8, MOCK_CAPACITY>>,
        /// Bytes written to the data register
        tx_data: RefCell<Vec<u8, MOCK_CAPACITY>>,
        /// Every register access, oldest first
        trace: RefCell<Vec<RegisterAccess, { MOCK_CAPACITY * 4 }>>,
        /// Number of `tx_full` polls that report a full FIFO
        tx_busy_polls: RefCell<usize>,
        /// Number of `rx_empty` polls that report empty despite queued data
        rx_late_polls: RefCell<usize>,
    }

    impl MockUartRegisters {
        /// Create a mock with empty FIFOs
        pub fn new() -> Self {
            Self {
                rx_fifo: RefCell::new(Deque::new()),
                tx_data: RefCell::new(Vec::new()),
                trace: RefCell::new(Vec::new()),
                tx_busy_polls: RefCell::new(0),
                rx_late_polls: RefCell::new(0),
            }
        }

        /// Queue bytes into the receive FIFO
        pub fn queue_rx_data(&self, data: &[u8]) {
            let mut fifo = self.rx_fifo.borrow_mut();
            for &byte in data {
                let _ = fifo.push_back(byte);
            }
        }

        /// Bytes still waiting in the receive FIFO
        pub fn pending_rx(&self) -> usize {
            self.rx_fifo.borrow().len()
        }

        /// All bytes written to the data register
        pub fn get_tx_data(&self) -> Vec<u8, MOCK_CAPACITY> {
            self.tx_data.borrow().clone()
        }

        /// Clear captured output and the access trace
        pub fn clear_tx_buffer(&self) {
            self.tx_data.borrow_mut().clear();
            self.trace.borrow_mut().clear();
        }

        /// Register accesses performed so far
        pub fn get_trace(&self) -> Vec<RegisterAccess, { MOCK_CAPACITY * 4 }> {
            self.trace.borrow().clone()
        }

        /// Report a full transmit FIFO for the next `polls` checks
        pub fn set_tx_busy_polls(&self, polls: usize) {
            *self.tx_busy_polls.borrow_mut() = polls;
        }

        /// Report an empty receive FIFO for the next `polls` checks
        pub fn set_rx_late_polls(&self, polls: usize) {
            *self.rx_late_polls.borrow_mut() = polls;
        }

        fn record(&self, access: RegisterAccess) {
            let _ = self.trace.borrow_mut().push(access);
        }
    }

    impl Default for MockUartRegisters {
        fn default() -> Self {
            Self::new()
        }
    }

    impl UartRegisters for MockUartRegisters {
        fn rx_empty(&mut self) -> bool {
            self.record(RegisterAccess::RxEmpty);

            let mut late = self.rx_late_polls.borrow_mut();
            if *late > 0 {
                *late -= 1;
                return true;
            }

            self.rx_fifo.borrow().is_empty()
        }

        fn tx_full(&mut self) -> bool {
            self.record(RegisterAccess::TxFull);

            let mut busy = self.tx_busy_polls.borrow_mut();
            if *busy > 0 {
                *busy -= 1;
                return true;
            }

            false
        }

        fn read_data(&mut self) -> u8 {
            // Reading an empty FIFO returns whatever is latched; model it as 0
            let byte = self.rx_fifo.borrow_mut().pop_front().unwrap_or(0);
            self.record(RegisterAccess::ReadData(byte));
            byte
        }

        fn write_data(&mut self, byte: u8) {
            self.record(RegisterAccess::WriteData(byte));
            let _ = self.tx_data.borrow_mut().push(byte);
        }

        fn acknowledge(&mut self, event: UartEvent) {
            self.record(RegisterAccess::Acknowledge(event));
        }
    }

    #[cfg(test)]
    mod tests {
        use super::*;

        #[test]
        fn test_mock_rx_fifo() {
            let mut regs = MockUartRegisters::new();
            regs.queue_rx_data(&[0x41, 0x42]);

            assert!(!regs.rx_empty());
            assert_eq!(regs.read_data(), 0x41);
            assert_eq!(regs.read_data(), 0x42);
            assert!(regs.rx_empty());
        }

        #[test]
        fn test_mock_tx_busy() {
            let mut regs = MockUartRegisters::new();
            regs.set_tx_busy_polls(2);

            assert!(regs.tx_full());
            assert!(regs.tx_full());
            assert!(!regs.tx_full());
        }

        #[test]
        fn test_mock_trace() {
            let mut regs = MockUartRegisters::new();
            regs.write_data(b'x');
            regs.acknowledge(UartEvent::Tx);

            let trace = regs.get_trace();
            assert_eq!(
                trace.as_slice(),
                &[
                    RegisterAccess::WriteData(b'x'),
                    RegisterAccess::Acknowledge(UartEvent::Tx),
                ]
            );
        }
    }
}
