//! ScpiRs: Talk to prompt-delimited SCPI instruments from Rust
//!
//! The ScpiRs library provides a blocking command session for instruments that speak SCPI over a
//! byte stream and terminate every reply with a fixed ready prompt, e.g., `"atlas ready>"`. It is
//! split into four parts:
//!
//! - **Transport**: The [`InstrumentInterface`] trait and its implementations. Framing is
//!   delimiter based (see [`FrameBuffer`]), reads always honor a timeout.
//! - **Command Session**: The [`Session`] owns one connection, serializes the
//!   send-then-receive exchange, and tracks the [`ConnectionState`].
//! - **Command Registry**: A declarative table of [`CommandDescriptor`]s. Arguments are validated
//!   before a single byte is sent.
//! - **Response Decoder**: Turns raw replies into a typed [`Response`] or a classified
//!   [`InstrumentError`].
//!
//! # Example
//!
//! ```no_run
//! use scpirs::{Arg, CommandDescriptor, Param, ParamKind, Session, SessionConfig};
//!
//! static SET_WAVELENGTH: CommandDescriptor = CommandDescriptor::action(
//!     "conf_fix_wav",
//!     ":CONFigure:FIXed:WAVelength",
//!     &[Param::required("wavelength", ParamKind::Float { min: 0.0, max: f64::MAX })],
//! );
//!
//! let config = SessionConfig::default()
//!     .with_host("insight-laser")
//!     .with_prompt("atlas ready>")
//!     .with_terminator("\n\r");
//! let session = Session::open(&config).unwrap();
//! session.execute(&SET_WAVELENGTH, &[Arg::from(1550)]).unwrap();
//! ```
//!
//! # Testing your driver
//!
//! All drivers built on ScpiRs should be tested without hardware using the loopback interfaces,
//! see [`LoopbackInterfaceString`] and [`LoopbackInterfaceBytes`].
//!
//! # License
//!
//! Licensed under either of
//!
//! - Apache License, Version 2.0 ([LICENSE-APACHE](http://www.apache.org/licenses/LICENSE-2.0))
//! - MIT license ([LICENSE-MIT](http://opensource.org/licenses/MIT))
//!
//! at your option.
//!
//! # Contribution
//!
//! Unless you explicitly state otherwise, any contribution intentionally submitted
//! for inclusion in the work by you, as defined in the Apache-2.0 license, shall be
//! dual licensed as above, without any additional terms or conditions.

#![warn(missing_docs)]

mod command;
mod config;
mod decode;
mod framing;
mod instrument;
mod loopback;
mod observer;
#[cfg(feature = "serial")]
mod serial;
mod session;
mod tcp_ip;
mod telnet;

pub use command::{Arg, CommandDescriptor, CommandRegistry, Param, ParamKind, ReplyKind};
pub use config::SessionConfig;
pub use decode::{QueuedError, Response, Value, decode};
pub use framing::FrameBuffer;
pub use instrument::{Instrument, PortControl};
pub use loopback::{LoopbackInterfaceBytes, LoopbackInterfaceString};
pub use observer::{NullObserver, Outcome, SessionEvent, SessionObserver, TracingObserver};
#[cfg(feature = "serial")]
pub use serial::SerialInterface;
pub use session::{ConnectionState, Connector, Session};
pub use tcp_ip::{TcpIpConnector, TcpIpInstrument, TcpIpInterface};
pub use telnet::TelnetStream;

use std::time::Duration;

use thiserror::Error;

/// The error enum for all sessions and instruments.
///
/// Every failure that can happen between validating an argument and decoding a reply is one of
/// these variants, such that a caller can always tell what went wrong and whether the connection
/// can still be trusted (see [`InstrumentError::is_transport_fault`]).
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum InstrumentError {
    /// An argument was rejected before anything was sent to the instrument.
    #[error("Invalid argument `{param}` for command `{command}`: {reason}")]
    InvalidArgument {
        /// Name of the command that was requested.
        command: String,
        /// Name of the offending parameter.
        param: String,
        /// Human readable reason for the rejection.
        reason: String,
    },
    /// The requested command name is not part of the registry.
    #[error("Command `{0}` is not part of the command registry.")]
    UnknownCommand(String),
    /// The channel to the instrument could not be established.
    #[error("Could not connect to {addr}: {source}")]
    Connection {
        /// The address we tried to connect to.
        addr: String,
        /// The underlying error.
        #[source]
        source: std::io::Error,
    },
    /// Error when reading from/writing to an interface. See [`std::io::Error`] for more details.
    #[error(transparent)]
    Io(#[from] std::io::Error),
    /// The instrument closed the channel while we were waiting for a reply.
    #[error("The instrument closed the connection.")]
    ChannelClosed,
    /// Timeout occurred while waiting for the delimiter. The error contains the timeout that was
    /// exceeded.
    #[error(
        "Timeout occured while waiting for a response from the instrument. Timeout was set to {0:?}."
    )]
    Timeout(Duration),
    /// Timeout occurred while waiting for the response to a command. The connection is faulted
    /// afterwards and must be re-established.
    #[error(
        "Timeout occured while waiting for a response to command: {command}. Timeout was set to {timeout:?}."
    )]
    CommandTimeout {
        /// The command that timed out.
        command: String,
        /// The timeout that was set.
        timeout: Duration,
    },
    /// The instrument reported an error in-band. The connection remains usable.
    #[error("Instrument reported error {}: {message}", display_code(.code))]
    Instrument {
        /// The firmware error code, if the reply contained one.
        code: Option<i32>,
        /// The firmware error message.
        message: String,
    },
    /// The reply could not be decoded into the shape the command declares.
    #[error("Response to `{command}` could not be decoded ({reason}). Response was: {response}")]
    Protocol {
        /// The command that was sent.
        command: String,
        /// The raw response (delimiter removed).
        response: String,
        /// What was wrong with it.
        reason: String,
    },
    /// A command was requested while the connection was not usable.
    #[error("Connection is {0}, (re)connect before sending commands.")]
    NotConnected(ConnectionState),
    /// The session configuration could not be loaded.
    #[error("Invalid configuration: {0}")]
    Config(String),
    #[cfg(feature = "serial")]
    /// Serial port errors can occur when opening a serial interface. See the [`serialport::Error`]
    /// documentation for more information.
    #[error(transparent)]
    Serialport(#[from] serialport::Error),
}

impl InstrumentError {
    /// Does this error leave the byte stream in an unknown state?
    ///
    /// If so, the session marks its connection as [`ConnectionState::Faulted`] and refuses
    /// further commands until it is reconnected.
    pub fn is_transport_fault(&self) -> bool {
        matches!(
            self,
            InstrumentError::Io(_)
                | InstrumentError::ChannelClosed
                | InstrumentError::Timeout(_)
                | InstrumentError::CommandTimeout { .. }
        )
    }
}

/// Render an optional firmware error code for error messages.
fn display_code(code: &Option<i32>) -> String {
    match code {
        Some(code) => code.to_string(),
        None => "(no code)".to_string(),
    }
}

/// The `InstrumentInterface` trait defines the transport underneath a [`Session`].
///
/// An implementation must be able to write raw bytes and to read until a delimiter shows up in
/// the incoming stream. Sending commands with the terminator appended is provided on top of that.
pub trait InstrumentInterface {
    /// Write raw bytes to the instrument and flush them.
    fn write_raw(&mut self, data: &[u8]) -> Result<(), InstrumentError>;

    /// Block until `delimiter` is observed or `timeout` elapses.
    ///
    /// Returns everything read before the delimiter, the delimiter itself is stripped. Bytes
    /// received after the delimiter are kept for the next call.
    ///
    /// # Errors
    /// - [`InstrumentError::Timeout`] if no delimiter arrives in time.
    /// - [`InstrumentError::ChannelClosed`] if the instrument closes the channel mid-read.
    fn receive_until(
        &mut self,
        delimiter: &[u8],
        timeout: Duration,
    ) -> Result<Vec<u8>, InstrumentError>;

    /// Send a command to the instrument.
    ///
    /// This function takes the command, appends the terminator, and writes it to the instrument.
    ///
    /// # Arguments:
    /// - `cmd` - A string slice that will be sent to the instrument.
    fn sendcmd(&mut self, cmd: &str) -> Result<(), InstrumentError> {
        let frame = format!("{cmd}{}", self.get_terminator());
        self.write_raw(frame.as_bytes())
    }

    /// Release the channel. Calling this more than once is fine.
    fn close(&mut self) {}

    /// Get the terminator that is appended to each command.
    fn get_terminator(&self) -> &str {
        "\n"
    }

    /// Set the terminator of an interface from a `&str`.
    ///
    /// # Arguments:
    /// - `_terminator` - A string slice that will be used as the terminator for commands
    fn set_terminator(&mut self, _terminator: &str) {}
}
