//! Minimal telnet handling for remote-control services that run on a telnet server.
//!
//! We never want any telnet option enabled, so every negotiation from the server is refused and
//! all command sequences are removed from the data stream before framing sees it.

use std::{
    io::{self, Read, Write},
    time::Duration,
};

use crate::PortControl;

const IAC: u8 = 255;
const DONT: u8 = 254;
const DO: u8 = 253;
const WONT: u8 = 252;
const WILL: u8 = 251;
const SB: u8 = 250;
const SE: u8 = 240;

/// Where we are inside a telnet command sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TelnetState {
    Data,
    Iac,
    /// Waiting for the option byte of a `DO`, `DONT`, `WILL`, or `WONT`.
    Negotiate(u8),
    Subnegotiation,
    SubnegotiationIac,
}

/// A byte stream wrapper that speaks just enough telnet to get out of the way.
///
/// Incoming `IAC` sequences are stripped, `DO` is answered with `WONT` and `WILL` with `DONT`.
/// Outgoing `0xFF` bytes are escaped as `IAC IAC`.
#[derive(Debug)]
pub struct TelnetStream<S: Read + Write> {
    inner: S,
    state: TelnetState,
    replies: Vec<u8>,
}

impl<S: Read + Write> TelnetStream<S> {
    /// Wrap a raw byte stream.
    pub fn new(inner: S) -> Self {
        Self {
            inner,
            state: TelnetState::Data,
            replies: Vec::new(),
        }
    }

    /// Get a reference to the wrapped stream.
    pub fn get_ref(&self) -> &S {
        &self.inner
    }

    /// Remove telnet commands from `buf[..len]` in place and return the number of data bytes.
    fn filter(&mut self, buf: &mut [u8], len: usize) -> usize {
        let mut out = 0;
        for idx in 0..len {
            let byte = buf[idx];
            self.state = match (self.state, byte) {
                (TelnetState::Data, IAC) => TelnetState::Iac,
                (TelnetState::Data, _) => {
                    buf[out] = byte;
                    out += 1;
                    TelnetState::Data
                }
                (TelnetState::Iac, IAC) => {
                    buf[out] = IAC;
                    out += 1;
                    TelnetState::Data
                }
                (TelnetState::Iac, DO | DONT | WILL | WONT) => TelnetState::Negotiate(byte),
                (TelnetState::Iac, SB) => TelnetState::Subnegotiation,
                (TelnetState::Iac, _) => TelnetState::Data,
                (TelnetState::Negotiate(verb), option) => {
                    match verb {
                        DO => self.replies.extend_from_slice(&[IAC, WONT, option]),
                        WILL => self.replies.extend_from_slice(&[IAC, DONT, option]),
                        _ => {}
                    }
                    TelnetState::Data
                }
                (TelnetState::Subnegotiation, IAC) => TelnetState::SubnegotiationIac,
                (TelnetState::Subnegotiation, _) => TelnetState::Subnegotiation,
                (TelnetState::SubnegotiationIac, SE) => TelnetState::Data,
                (TelnetState::SubnegotiationIac, _) => TelnetState::Subnegotiation,
            };
        }
        out
    }

    /// Send out the refusals that piled up while reading.
    fn flush_replies(&mut self) -> io::Result<()> {
        if !self.replies.is_empty() {
            self.inner.write_all(&self.replies)?;
            self.inner.flush()?;
            self.replies.clear();
        }
        Ok(())
    }
}

impl<S: Read + Write> Read for TelnetStream<S> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        loop {
            let len = self.inner.read(buf)?;
            if len == 0 {
                return Ok(0);
            }
            let data = self.filter(buf, len);
            self.flush_replies()?;
            // A read that only carried telnet commands is not an end of stream.
            if data > 0 {
                return Ok(data);
            }
        }
    }
}

impl<S: Read + Write> Write for TelnetStream<S> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        if buf.contains(&IAC) {
            let mut escaped = Vec::with_capacity(buf.len() + 1);
            for &byte in buf {
                if byte == IAC {
                    escaped.push(IAC);
                }
                escaped.push(byte);
            }
            self.inner.write_all(&escaped)?;
        } else {
            self.inner.write_all(buf)?;
        }
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        self.inner.flush()
    }
}

impl<S: Read + Write + PortControl> PortControl for TelnetStream<S> {
    fn set_read_timeout(&mut self, timeout: Duration) -> io::Result<()> {
        self.inner.set_read_timeout(timeout)
    }

    fn shutdown(&mut self) {
        self.inner.shutdown();
    }
}
