//! This module provides the main implementation for the Instrument Interface trait.
//!
//! It can be called with any type that implements [`std::io::Read`], [`std::io::Write`], and
//! [`PortControl`], such as [`std::net::TcpStream`] or a [`crate::TelnetStream`].

use std::{
    collections::VecDeque,
    io::{Read, Write},
    net::{Shutdown, TcpStream},
    time::Duration,
};

use crate::{FrameBuffer, InstrumentError, InstrumentInterface};

/// Control over the timing and lifetime of a port.
///
/// Reads on a port must never block forever, so before every read the [`Instrument`] hands the
/// time that is left to the port. Ports that cannot block (e.g., in-memory buffers) can use the
/// default implementations.
pub trait PortControl {
    /// Set the maximum time the next read may block.
    fn set_read_timeout(&mut self, _timeout: Duration) -> std::io::Result<()> {
        Ok(())
    }

    /// Shut the port down. Errors are ignored, the port is dropped afterwards anyway.
    fn shutdown(&mut self) {}
}

impl PortControl for TcpStream {
    fn set_read_timeout(&mut self, timeout: Duration) -> std::io::Result<()> {
        TcpStream::set_read_timeout(self, Some(timeout))
    }

    fn shutdown(&mut self) {
        let _ = TcpStream::shutdown(self, Shutdown::Both);
    }
}

impl PortControl for VecDeque<u8> {}

/// A general instrument interface that can be built with any port that implements
/// [`std::io::Read`], [`std::io::Write`], and [`PortControl`].
///
/// # Example
///
/// The following shows how to create an [`Instrument`] interface from your own stream. To talk to
/// an instrument via TCP/IP, you should rather use [`crate::TcpIpInterface`], which also takes
/// care of telnet negotiation.
///
/// ```no_run
/// use std::net::TcpStream;
///
/// use scpirs::Instrument;
///
/// let my_port = TcpStream::connect("192.168.10.1:5025").unwrap();
/// let inst_interface = Instrument::new(my_port);
/// ```
#[derive(Debug)]
pub struct Instrument<P: Read + Write + PortControl> {
    port: P,
    terminator: String,
    frames: FrameBuffer,
    closed: bool,
}

impl<P: Read + Write + PortControl> Instrument<P> {
    /// Create a new instance of [`Instrument`] with a given port.
    ///
    /// The terminator is by default set to `"\n"`, but can be changed using the `set_terminator`
    /// function.
    pub fn new(port: P) -> Self {
        Self {
            port,
            terminator: "\n".to_string(),
            frames: FrameBuffer::new(),
            closed: false,
        }
    }

    /// Has [`InstrumentInterface::close`] been called on this interface?
    pub fn is_closed(&self) -> bool {
        self.closed
    }

    /// Get a reference to the underlying port.
    pub fn port(&self) -> &P {
        &self.port
    }
}

impl<P: Read + Write + PortControl> InstrumentInterface for Instrument<P> {
    fn write_raw(&mut self, data: &[u8]) -> Result<(), InstrumentError> {
        if self.closed {
            return Err(InstrumentError::ChannelClosed);
        }
        self.port.write_all(data)?;
        self.port.flush()?;
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
        let port = &mut self.port;
        self.frames.read_until(delimiter, timeout, |buf, remaining| {
            port.set_read_timeout(remaining)?;
            port.read(buf)
        })
    }

    fn close(&mut self) {
        if !self.closed {
            self.port.shutdown();
            self.frames.clear();
            self.closed = true;
        }
    }

    fn get_terminator(&self) -> &str {
        self.terminator.as_str()
    }

    fn set_terminator(&mut self, terminator: &str) {
        self.terminator = terminator.to_string();
    }
}
