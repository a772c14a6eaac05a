//! Bounded sliding-window byte buffer.
//!
//! Accumulates chunks up to `max_window` bytes, then discards from the
//! front as new chunks arrive. This is what lets a native extractor scan a
//! multi-megabyte HTML document without ever holding the whole thing in
//! memory — only the most recent window is addressable.

const DEFAULT_MAX_WINDOW: usize = 500 * 1024;

pub struct StreamingBuffer {
    window: Vec<u8>,
    max_window: usize,
    total: u64,
}

impl StreamingBuffer {
    pub fn new(max_window: usize) -> Self {
        Self {
            window: Vec::with_capacity(max_window.min(64 * 1024)),
            max_window,
            total: 0,
        }
    }

    /// Appends a chunk, discarding from the front of the window once it
    /// exceeds `max_window`.
    pub fn add(&mut self, chunk: &[u8]) {
        self.total += chunk.len() as u64;
        self.window.extend_from_slice(chunk);
        if self.window.len() > self.max_window {
            let overflow = self.window.len() - self.max_window;
            self.window.drain(0..overflow);
        }
    }

    pub fn total(&self) -> u64 {
        self.total
    }

    pub fn get(&self) -> &[u8] {
        &self.window
    }

    pub fn get_str(&self) -> std::borrow::Cow<'_, str> {
        String::from_utf8_lossy(&self.window)
    }

    pub fn has_boundary(&self, markers: &[&str]) -> bool {
        let text = self.get_str();
        markers.iter().any(|m| text.contains(m))
    }
}

impl Default for StreamingBuffer {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_WINDOW)
    }
}

/// Pure free function mirroring [`StreamingBuffer::has_boundary`] for callers
/// that already have a materialized fragment in hand.
pub fn has_boundary(buf: &str, markers: &[&str]) -> bool {
    markers.iter().any(|m| buf.contains(m))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn window_discards_from_front_once_full() {
        let mut buf = StreamingBuffer::new(10);
        buf.add(b"0123456789");
        buf.add(b"abcde");
        assert_eq!(buf.get(), b"56789abcde");
        assert_eq!(buf.total(), 15);
    }

    #[test]
    fn boundary_detection_is_substring_match() {
        let mut buf = StreamingBuffer::new(1024);
        buf.add(b"<html>this content has been deleted</html>");
        assert!(buf.has_boundary(&["has been deleted", "age-restricted"]));
        assert!(!buf.has_boundary(&["login-required"]));
    }
}
