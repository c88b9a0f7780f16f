//! This module provides the implementation for an instrument controlled via TCP/IP.
//!
//! Remote-control services on instruments of this kind typically run on a telnet server, so the
//! [`std::net::TcpStream`] is always wrapped in a [`TelnetStream`] that refuses every option the
//! server offers.

use std::{
    io,
    net::{SocketAddr, TcpStream, ToSocketAddrs},
    time::Duration,
};

use crate::{Connector, Instrument, InstrumentError, SessionConfig, TelnetStream};

/// A TCP/IP connection to an instrument, with telnet negotiation handled transparently.
pub type TcpIpInstrument = Instrument<TelnetStream<TcpStream>>;

/// Constructors for [`TcpIpInstrument`]s.
#[derive(Debug)]
pub struct TcpIpInterface {}

impl TcpIpInterface {
    /// Try to open a new TCP/IP connection to `host:port`.
    ///
    /// Every address the host resolves to is tried in turn, each with the given connect timeout.
    /// The terminator is by default set to `"\n"`, but can be changed using the `set_terminator`
    /// function.
    ///
    /// # Arguments
    /// * `host` - Host name or IP address of the instrument.
    /// * `port` - TCP port, `23` for a telnet server.
    /// * `connect_timeout` - Maximum time to wait for each connection attempt.
    ///
    /// # Errors
    /// [`InstrumentError::Connection`] if the host cannot be resolved or no address accepts the
    /// connection in time.
    pub fn open(
        host: &str,
        port: u16,
        connect_timeout: Duration,
    ) -> Result<TcpIpInstrument, InstrumentError> {
        let addr = format!("{host}:{port}");
        let connection_error = |source: io::Error| InstrumentError::Connection {
            addr: addr.clone(),
            source,
        };

        let candidates: Vec<SocketAddr> = (host, port)
            .to_socket_addrs()
            .map_err(connection_error)?
            .collect();

        let mut last_error = io::Error::new(
            io::ErrorKind::NotFound,
            "host did not resolve to any address",
        );
        for candidate in candidates {
            tracing::debug!(%candidate, "Connecting to instrument");
            match TcpStream::connect_timeout(&candidate, connect_timeout) {
                Ok(stream) => {
                    return Self::from_stream(stream, connect_timeout).map_err(connection_error);
                }
                Err(e) => last_error = e,
            }
        }
        Err(connection_error(last_error))
    }

    /// Try to open a new TCP/IP connection to an already resolved socket address.
    ///
    /// # Arguments
    /// * `sock_addr` - Socket address.
    pub fn try_new<A: ToSocketAddrs>(sock_addr: A) -> Result<TcpIpInstrument, InstrumentError> {
        let stream = TcpStream::connect(sock_addr)?;
        Ok(Self::from_stream(stream, Duration::from_secs(3))?)
    }

    fn from_stream(stream: TcpStream, write_timeout: Duration) -> io::Result<TcpIpInstrument> {
        stream.set_nodelay(true)?;
        stream.set_write_timeout(Some(write_timeout))?;
        Ok(Instrument::new(TelnetStream::new(stream)))
    }
}

/// A [`Connector`] that opens a fresh [`TcpIpInstrument`] on every (re)connect.
#[derive(Debug, Clone)]
pub struct TcpIpConnector {
    host: String,
    port: u16,
    connect_timeout: Duration,
}

impl TcpIpConnector {
    /// Create a connector for `host:port`.
    pub fn new(host: &str, port: u16, connect_timeout: Duration) -> Self {
        Self {
            host: host.to_string(),
            port,
            connect_timeout,
        }
    }

    /// Create a connector from the address part of a [`SessionConfig`].
    pub fn from_config(config: &SessionConfig) -> Self {
        Self::new(&config.host, config.port, config.connect_timeout)
    }

    /// The `host:port` this connector talks to.
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl Connector for TcpIpConnector {
    type Interface = TcpIpInstrument;

    fn connect(&mut self) -> Result<Self::Interface, InstrumentError> {
        TcpIpInterface::open(&self.host, self.port, self.connect_timeout)
    }

    fn target(&self) -> String {
        self.addr()
    }
}
