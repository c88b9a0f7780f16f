//! Loopback interface for testing the byte level behavior of a session.
//!
//! Every scripted chunk from the instrument is delivered by exactly one read, which makes it easy
//! to split a prompt over several reads. When the script runs out, the instrument goes silent and
//! reads time out. An empty chunk simulates the instrument closing the channel.

use std::{collections::VecDeque, io, thread, time::Duration};

use crate::{
    FrameBuffer, InstrumentError, InstrumentInterface,
    loopback::{IncrIndex, check_leftovers},
};

/// Scripted raw exchange with an instrument. See the module documentation for details.
#[derive(Debug)]
pub struct LoopbackInterfaceBytes {
    from_host: Vec<Vec<u8>>,
    from_host_index: IncrIndex,
    from_inst: VecDeque<Vec<u8>>,
    frames: FrameBuffer,
    terminator: String,
    closed: bool,
}

impl LoopbackInterfaceBytes {
    /// Create a new loopback instrument with given bytes to and from instrument.
    ///
    /// When the [`LoopbackInterfaceBytes`] is dropped, a `finalize` function is called that
    /// checks if all bytes that you have provided have been used. If not, the program panics.
    /// Whenever something is written to the instrument that is not expected, the
    /// [`LoopbackInterfaceBytes`] will panic as well.
    ///
    /// # Arguments:
    /// * `from_host` - Vector of vectors for command bytes from host to instrument. Each entry
    ///   is one complete write, terminator included.
    /// * `from_inst` - Vector of vectors for chunks from instrument to host, one chunk per read.
    ///   A chunk must not be longer than 512 bytes.
    pub fn new(from_host: Vec<Vec<u8>>, from_inst: Vec<Vec<u8>>) -> Self {
        LoopbackInterfaceBytes {
            from_host,
            from_host_index: IncrIndex::default(),
            from_inst: from_inst.into(),
            frames: FrameBuffer::new(),
            terminator: "\n".to_string(),
            closed: false,
        }
    }

    /// This command panics if not all bytes in the [`LoopbackInterfaceBytes`] have been used.
    ///
    /// It is automatically called when the [`LoopbackInterfaceBytes`] is dropped, but you can also
    /// call it manually to ensure that all bytes have been used.
    pub fn finalize(&mut self) {
        check_leftovers("host to instrument", &self.from_host, &self.from_host_index);
        if !std::thread::panicking() {
            if let Some(fil) = self.from_inst.front() {
                panic!("Leftover expected commands found from instrument to host: {fil:?}");
            }
        }
    }

    /// Has [`InstrumentInterface::close`] been called?
    pub fn is_closed(&self) -> bool {
        self.closed
    }
}

impl InstrumentInterface for LoopbackInterfaceBytes {
    fn write_raw(&mut self, cmd: &[u8]) -> Result<(), InstrumentError> {
        if self.closed {
            return Err(InstrumentError::ChannelClosed);
        }
        let exp = self
            .from_host
            .get(self.from_host_index.next())
            .expect("No more bytes were expected from host to instrument.");
        assert_eq!(
            exp.as_slice(),
            cmd,
            "Expected sendcmd '{0:?}', got '{1:?}'",
            std::str::from_utf8(exp),
            std::str::from_utf8(cmd)
        );
        Ok(())
    }

    fn receive_until(
        &mut self,
        delimiter: &[u8],
        timeout: Duration,
    ) -> Result<Vec<u8>, InstrumentError> {
        if self.closed {
            return Err(InstrumentError::ChannelClosed);
        }
        let from_inst = &mut self.from_inst;
        self.frames
            .read_until(delimiter, timeout, |buf, remaining| match from_inst.pop_front() {
                Some(chunk) => {
                    buf[..chunk.len()].copy_from_slice(&chunk);
                    Ok(chunk.len())
                }
                None => {
                    thread::sleep(remaining);
                    Err(io::ErrorKind::TimedOut.into())
                }
            })
    }

    fn close(&mut self) {
        self.closed = true;
    }

    fn get_terminator(&self) -> &str {
        self.terminator.as_str()
    }

    fn set_terminator(&mut self, terminator: &str) {
        self.terminator = terminator.to_string();
    }
}

impl Drop for LoopbackInterfaceBytes {
    fn drop(&mut self) {
        self.finalize();
    }
}
