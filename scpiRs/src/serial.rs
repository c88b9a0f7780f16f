//! This module provides the implementation for an instrument controlled via a serial port.
//!
//! It uses the `serialport` crate and is only available with the `serial` feature enabled.

use std::{io, time::Duration};

use serialport::{SerialPort, SerialPortBuilder};

use crate::{Instrument, InstrumentError, PortControl};

impl PortControl for Box<dyn SerialPort> {
    fn set_read_timeout(&mut self, timeout: Duration) -> io::Result<()> {
        self.set_timeout(timeout).map_err(io::Error::from)
    }
}

/// Constructors for serial port instruments.
#[derive(Debug)]
pub struct SerialInterface {}

impl SerialInterface {
    /// Try to open a serial port instrument.
    ///
    /// The terminator is by default set to `"\n"`, but can be changed using the `set_terminator`
    /// function. Framing works the same as for TCP/IP, replies are read until the delimiter
    /// (usually the prompt) shows up.
    ///
    /// # Arguments
    /// * `spb` - A `SerialPortBuilder` to configure the serial port. See
    ///   [`serialport::SerialPortBuilder`] and the [`serialport::new`] function for more details.
    pub fn try_new(spb: SerialPortBuilder) -> Result<Instrument<Box<dyn SerialPort>>, InstrumentError> {
        Ok(Instrument::new(spb.open()?))
    }
}
