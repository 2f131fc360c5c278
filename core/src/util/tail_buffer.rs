use std::collections::VecDeque;

/// Byte buffer that keeps only the most recent `cap` bytes.
///
/// Command output beyond the cap is dropped from the front so the tail,
/// where compilers and package managers print their errors, survives.
#[derive(Debug, Clone)]
pub struct TailBuffer {
    inner: VecDeque<u8>,
    cap: usize,
    dropped: usize,
}

impl TailBuffer {
    pub fn new(cap: usize) -> Self {
        Self {
            inner: VecDeque::with_capacity(cap.min(64 * 1024)),
            cap,
            dropped: 0,
        }
    }

    pub fn push(&mut self, data: &[u8]) {
        let data = if data.len() > self.cap {
            self.dropped += data.len() - self.cap;
            &data[data.len() - self.cap..]
        } else {
            data
        };
        let overflow = self
            .inner
            .len()
            .saturating_add(data.len())
            .saturating_sub(self.cap);
        if overflow > 0 {
            self.inner.drain(..overflow);
            self.dropped += overflow;
        }
        self.inner.extend(data);
    }

    pub fn truncated(&self) -> bool {
        self.dropped > 0
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    /// Lossy UTF-8 view of the retained bytes.
    pub fn to_string_lossy(&self) -> String {
        let mut vec = Vec::with_capacity(self.inner.len());
        vec.extend(self.inner.iter().copied());
        String::from_utf8_lossy(&vec).into_owned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keeps_tail_when_over_capacity() {
        let mut buf = TailBuffer::new(5);
        buf.push(b"abc");
        assert!(!buf.truncated());
        buf.push(b"defg");
        assert_eq!(buf.to_string_lossy(), "cdefg");
        assert!(buf.truncated());

        buf.push(b"0123456789");
        assert_eq!(buf.to_string_lossy(), "56789");
        assert_eq!(buf.len(), 5);
    }
}
