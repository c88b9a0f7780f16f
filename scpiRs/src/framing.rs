//! Delimiter based framing for instruments that end every reply with a ready prompt.
//!
//! The instrument does not send a length prefix, so the only way to find the end of a reply is to
//! scan the incoming stream for the prompt. The prompt can be split over two (or more) reads,
//! which is why the scan keeps the tail of the previous read around.

use std::{
    io,
    time::{Duration, Instant},
};

use crate::InstrumentError;

/// Number of bytes requested from the underlying port per read.
const CHUNK_SIZE: usize = 512;

/// Buffer that assembles delimited frames from an arbitrary sequence of reads.
///
/// Bytes that arrive after a delimiter are kept and served first on the next call to
/// [`FrameBuffer::read_until`].
#[derive(Debug, Default)]
pub struct FrameBuffer {
    pending: Vec<u8>,
}

impl FrameBuffer {
    /// Create an empty frame buffer.
    pub fn new() -> Self {
        Self::default()
    }

    /// Bytes that have been received but not yet returned as part of a frame.
    pub fn pending(&self) -> &[u8] {
        &self.pending
    }

    /// Drop all received bytes.
    pub fn clear(&mut self) {
        self.pending.clear();
    }

    /// Read until `delimiter` is found and return everything before it.
    ///
    /// The `read` closure is called with a buffer and the time that is left until the timeout
    /// elapses. It should block at most that long and behave like [`std::io::Read::read`]:
    /// `Ok(0)` means the channel was closed, `WouldBlock`/`TimedOut` mean nothing arrived yet.
    ///
    /// # Arguments
    /// * `delimiter` - The byte sequence that terminates a frame. Must not be empty.
    /// * `timeout` - Time after which we give up and return [`InstrumentError::Timeout`].
    /// * `read` - The function that pulls more bytes from the port.
    pub fn read_until<F>(
        &mut self,
        delimiter: &[u8],
        timeout: Duration,
        mut read: F,
    ) -> Result<Vec<u8>, InstrumentError>
    where
        F: FnMut(&mut [u8], Duration) -> io::Result<usize>,
    {
        if delimiter.is_empty() {
            return Err(io::Error::new(io::ErrorKind::InvalidInput, "empty delimiter").into());
        }

        let deadline = Instant::now().checked_add(timeout);
        // Everything before this index is known to not contain the start of a delimiter.
        let mut searched = 0;
        let mut chunk = [0u8; CHUNK_SIZE];

        loop {
            if let Some(pos) = find(&self.pending[searched..], delimiter) {
                let end = searched + pos;
                let mut frame: Vec<u8> = self.pending.drain(..end + delimiter.len()).collect();
                frame.truncate(end);
                return Ok(frame);
            }
            searched = self
                .pending
                .len()
                .saturating_sub(delimiter.len().saturating_sub(1));

            let remaining = match deadline {
                Some(deadline) => deadline.saturating_duration_since(Instant::now()),
                None => timeout,
            };
            if remaining.is_zero() {
                return Err(InstrumentError::Timeout(timeout));
            }

            match read(&mut chunk, remaining) {
                Ok(0) => return Err(InstrumentError::ChannelClosed),
                Ok(n) => self.pending.extend_from_slice(&chunk[..n]),
                Err(e)
                    if matches!(
                        e.kind(),
                        io::ErrorKind::WouldBlock
                            | io::ErrorKind::TimedOut
                            | io::ErrorKind::Interrupted
                    ) => {}
                Err(e) => return Err(e.into()),
            }
        }
    }
}

/// Position of the first occurrence of `needle` in `haystack`.
fn find(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    haystack
        .windows(needle.len())
        .position(|window| window == needle)
}
