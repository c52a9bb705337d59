//! Bounded formatter behind the console's `printf`
//!
//! Renders into a fixed buffer with `vsnprintf` truncation: at most
//! `capacity - 1` bytes are kept, the last slot being reserved for the
//! terminator. The reported length is the untruncated one.

use core::fmt::{self, Write};

use crate::config::console::PRINT_BUFFER_SIZE;
use heapless::Vec;

/// Fixed-capacity output buffer, overwritten on every render
pub struct PrintBuffer {
    bytes: Vec<u8, PRINT_BUFFER_SIZE>,
}

impl PrintBuffer {
    /// Create an empty buffer
    pub const fn new() -> Self {
        Self { bytes: Vec::new() }
    }

    /// Render `args`, replacing the previous contents
    ///
    /// Returns the logical length of the formatted output, which exceeds
    /// the stored length when the output was truncated.
    pub fn render(&mut self, args: fmt::Arguments) -> usize {
        self.bytes.clear();

        let mut sink = TruncatingSink {
            bytes: &mut self.bytes,
            logical_len: 0,
        };
        // Only a failing Display impl can error; keep what was rendered
        let _ = sink.write_fmt(args);

        sink.logical_len
    }

    /// Rendered bytes, without terminator
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Bytes that can be stored by a single render
    pub const fn usable_capacity() -> usize {
        PRINT_BUFFER_SIZE - 1
    }
}

impl Default for PrintBuffer {
    fn default() -> Self {
        Self::new()
    }
}

struct TruncatingSink<'a> {
    bytes: &'a mut Vec<u8, PRINT_BUFFER_SIZE>,
    logical_len: usize,
}

impl Write for TruncatingSink<'_> {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        self.logical_len += s.len();

        let room = PrintBuffer::usable_capacity().saturating_sub(self.bytes.len());
        let take = room.min(s.len());
        // Cannot fail: `take` fits in the remaining capacity
        let _ = self.bytes.extend_from_slice(&s.as_bytes()[..take]);

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_short() {
        let mut buf = PrintBuffer::new();

        let len = buf.render(format_args!("ep {:02x} len {}", 0x81, 7));

        assert_eq!(len, 11);
        assert_eq!(buf.as_bytes(), b"ep 81 len 7");
    }

    #[test]
    fn test_render_overwrites_previous() {
        let mut buf = PrintBuffer::new();
        buf.render(format_args!("first message"));

        buf.render(format_args!("2nd"));

        assert_eq!(buf.as_bytes(), b"2nd");
    }

    #[test]
    fn test_render_exact_fit() {
        let mut buf = PrintBuffer::new();
        let line = [b'x'; PRINT_BUFFER_SIZE - 1];
        let line = core::str::from_utf8(&line).unwrap();

        let len = buf.render(format_args!("{}", line));

        assert_eq!(len, PRINT_BUFFER_SIZE - 1);
        assert_eq!(buf.as_bytes().len(), PRINT_BUFFER_SIZE - 1);
    }

    #[test]
    fn test_render_truncates_and_reports_logical_length() {
        let mut buf = PrintBuffer::new();
        let line = [b'y'; 200];
        let line = core::str::from_utf8(&line).unwrap();

        let len = buf.render(format_args!("{}!", line));

        assert_eq!(len, 201);
        assert_eq!(buf.as_bytes().len(), PRINT_BUFFER_SIZE - 1);
        assert!(buf.as_bytes().iter().all(|&b| b == b'y'));
    }

    #[test]
    fn test_render_truncates_across_pieces() {
        let mut buf = PrintBuffer::new();
        let head = [b'a'; 120];
        let head = core::str::from_utf8(&head).unwrap();

        let len = buf.render(format_args!("{}{}", head, "bcdefghijk"));

        assert_eq!(len, 130);
        assert_eq!(&buf.as_bytes()[120..], b"bcdefgh");
    }
}
