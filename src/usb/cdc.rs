//! Application-level CDC echo
//!
//! Whatever the host writes on the data interface is sent straight back.

use crate::config::cdc::ECHO_WINDOW;
use crate::usb::traits::ProtocolStack;

/// Echo one window of received CDC data back to the host
///
/// Reads at most [`ECHO_WINDOW`] bytes, writes them back unmodified and
/// flushes once. Returns the number of bytes echoed.
pub fn echo_task<S: ProtocolStack>(stack: &mut S) -> usize {
    if stack.cdc_available() == 0 {
        return 0;
    }

    let mut buf = [0u8; ECHO_WINDOW];
    let count = stack.cdc_read(&mut buf);

    stack.cdc_write(&buf[..count]);
    stack.cdc_write_flush();

    count
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::usb::traits::mock::MockProtocolStack;

    #[test]
    fn test_echo_nothing_available() {
        let mut stack = MockProtocolStack::new();

        assert_eq!(echo_task(&mut stack), 0);
        assert!(stack.get_reads().is_empty());
        assert_eq!(stack.flush_count, 0);
    }

    #[test]
    fn test_echo_block_unmodified() {
        let mut stack = MockProtocolStack::new();
        stack.queue_host_data(b"hello, usb\r\n");

        assert_eq!(echo_task(&mut stack), 12);
        assert_eq!(stack.get_tx_data(), b"hello, usb\r\n");
        assert_eq!(stack.flush_count, 1);
    }

    #[test]
    fn test_echo_every_size_up_to_window() {
        for size in 1..=ECHO_WINDOW {
            let mut stack = MockProtocolStack::new();
            let data: heapless::Vec<u8, ECHO_WINDOW> =
                (0..size).map(|i| (i * 7 + 3) as u8).collect();
            stack.queue_host_data(&data);

            assert_eq!(echo_task(&mut stack), size);
            assert_eq!(stack.get_tx_data(), data.as_slice());
            assert_eq!(stack.get_reads(), &[size]);
            assert_eq!(stack.flush_count, 1);
        }
    }

    #[test]
    fn test_echo_window_limits_block() {
        let mut stack = MockProtocolStack::new();
        let data = [0xa5u8; ECHO_WINDOW + 10];
        stack.queue_host_data(&data);

        assert_eq!(echo_task(&mut stack), ECHO_WINDOW);
        assert_eq!(stack.cdc_available(), 10);

        assert_eq!(echo_task(&mut stack), 10);
        assert_eq!(stack.get_tx_data().len(), ECHO_WINDOW + 10);
        assert_eq!(stack.flush_count, 2);
    }
}
