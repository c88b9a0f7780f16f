//! The command session: one connection, one command in flight at a time.
//!
//! A [`Session`] validates and formats a command, sends it, waits for the ready prompt, and
//! decodes the reply. The lock on the connection is held from the send until the reply is read,
//! such that concurrent callers can never interleave their exchanges.
//!
//! Any fault on the byte stream (timeout, closed channel, I/O error) leaves the stream in an
//! unknown position. The session then marks the connection as [`ConnectionState::Faulted`] and
//! refuses commands until [`Session::reconnect`] is called.

use std::{
    fmt, io,
    sync::{Arc, Mutex, MutexGuard, PoisonError},
    time::Duration,
};

use crate::{
    Arg, CommandDescriptor, CommandRegistry, InstrumentError, InstrumentInterface, Outcome,
    Response, SessionConfig, SessionEvent, SessionObserver, TcpIpConnector, TracingObserver,
    decode,
};

/// State of the connection held by a [`Session`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    /// No channel is open. This is the initial state.
    Disconnected,
    /// The channel is open and in sync with the instrument.
    Connected,
    /// A transport fault occurred, the channel was torn down. Reconnect to continue.
    Faulted,
}

impl fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ConnectionState::Disconnected => "disconnected",
            ConnectionState::Connected => "connected",
            ConnectionState::Faulted => "faulted",
        };
        f.write_str(name)
    }
}

/// Opens a fresh [`InstrumentInterface`] whenever a session (re)connects.
///
/// Implemented by [`TcpIpConnector`] and by any closure returning an interface, which is handy to
/// hand a loopback interface to a session in tests.
pub trait Connector {
    /// The interface this connector produces.
    type Interface: InstrumentInterface;

    /// Establish a new channel.
    fn connect(&mut self) -> Result<Self::Interface, InstrumentError>;

    /// A human readable description of the target, used in connection errors.
    fn target(&self) -> String {
        "instrument".to_string()
    }
}

impl<T, F> Connector for F
where
    T: InstrumentInterface,
    F: FnMut() -> Result<T, InstrumentError>,
{
    type Interface = T;

    fn connect(&mut self) -> Result<T, InstrumentError> {
        self()
    }
}

/// The connection shared by all clones of a session.
struct Link<C: Connector> {
    connector: C,
    interface: Option<C::Interface>,
    state: ConnectionState,
}

impl<C: Connector> Link<C> {
    /// Close and drop the interface, if there is one.
    fn teardown(&mut self) {
        if let Some(mut interface) = self.interface.take() {
            interface.close();
        }
    }
}

impl<C: Connector> Drop for Link<C> {
    fn drop(&mut self) {
        self.teardown();
    }
}

/// A blocking command session with an instrument.
///
/// Clones of a session share the same connection and observer.
///
/// # Example
///
/// ```no_run
/// use scpirs::{CommandDescriptor, ReplyKind, Session, SessionConfig};
///
/// static IDN: CommandDescriptor = CommandDescriptor::query("idn_q", "*IDN?", &[], ReplyKind::Text);
///
/// let config = SessionConfig::from_file("laser.toml").unwrap();
/// let session = Session::open(&config).unwrap();
/// println!("{:?}", session.execute(&IDN, &[]).unwrap());
/// ```
pub struct Session<C: Connector> {
    link: Arc<Mutex<Link<C>>>,
    config: Arc<SessionConfig>,
    observer: Arc<dyn SessionObserver>,
}

impl<C: Connector> Clone for Session<C> {
    fn clone(&self) -> Self {
        Self {
            link: Arc::clone(&self.link),
            config: Arc::clone(&self.config),
            observer: Arc::clone(&self.observer),
        }
    }
}

impl<C: Connector> fmt::Debug for Session<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("state", &self.state())
            .field("config", &self.config)
            .finish()
    }
}

impl Session<TcpIpConnector> {
    /// Connect to the instrument described by `config` via TCP/IP.
    pub fn open(config: &SessionConfig) -> Result<Self, InstrumentError> {
        let session = Self::new(config.clone(), TcpIpConnector::from_config(config));
        session.connect()?;
        Ok(session)
    }
}

impl<C: Connector> Session<C> {
    /// Create a new, disconnected session. Events go to a [`TracingObserver`].
    pub fn new(config: SessionConfig, connector: C) -> Self {
        Self {
            link: Arc::new(Mutex::new(Link {
                connector,
                interface: None,
                state: ConnectionState::Disconnected,
            })),
            config: Arc::new(config),
            observer: Arc::new(TracingObserver),
        }
    }

    /// Replace the observer that receives the session's events.
    pub fn with_observer<O: SessionObserver + 'static>(mut self, observer: O) -> Self {
        self.observer = Arc::new(observer);
        self
    }

    /// The configuration this session was created with.
    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// The current state of the connection.
    pub fn state(&self) -> ConnectionState {
        self.lock().state
    }

    /// Open the connection. Does nothing if the session is already connected.
    ///
    /// If configured, the instrument's greeting is read up to the first prompt within the connect
    /// timeout.
    ///
    /// # Errors
    /// [`InstrumentError::Connection`] if the channel cannot be opened or no greeting arrives. The
    /// session is [`ConnectionState::Disconnected`] afterwards.
    pub fn connect(&self) -> Result<(), InstrumentError> {
        let mut link = self.lock();
        if link.state == ConnectionState::Connected {
            return Ok(());
        }
        self.open_link(&mut link)
    }

    /// Close the connection. Calling this on a closed session is fine.
    pub fn disconnect(&self) {
        let mut link = self.lock();
        let had_interface = link.interface.is_some();
        link.teardown();
        self.set_state(&mut link, ConnectionState::Disconnected);
        if had_interface {
            self.observer.on_event(&SessionEvent::Disconnected);
        }
    }

    /// Tear down the current connection, whatever its state, and open a new one.
    pub fn reconnect(&self) -> Result<(), InstrumentError> {
        let mut link = self.lock();
        self.open_link(&mut link)
    }

    /// Execute a command with the configured default timeout.
    ///
    /// See [`Session::execute_with_timeout`].
    pub fn execute(
        &self,
        descriptor: &CommandDescriptor,
        args: &[Arg],
    ) -> Result<Response, InstrumentError> {
        self.execute_with_timeout(descriptor, args, self.config.command_timeout)
    }

    /// Look up a command by name and execute it with the configured default timeout.
    pub fn execute_named(
        &self,
        registry: &CommandRegistry,
        name: &str,
        args: &[Arg],
    ) -> Result<Response, InstrumentError> {
        self.execute(registry.get(name)?, args)
    }

    /// Validate, send, and decode one command.
    ///
    /// Arguments are validated before the connection is even looked at, so an invalid argument
    /// never results in any I/O.
    ///
    /// # Errors
    /// - [`InstrumentError::InvalidArgument`] if an argument violates its parameter's constraint.
    /// - [`InstrumentError::NotConnected`] if the session is not connected.
    /// - [`InstrumentError::CommandTimeout`] if the prompt did not arrive in time. The session is
    ///   faulted afterwards.
    /// - [`InstrumentError::Io`] or [`InstrumentError::ChannelClosed`] on transport failures. The
    ///   session is faulted afterwards.
    /// - [`InstrumentError::Instrument`] if the instrument reported an error. The session remains
    ///   connected.
    /// - [`InstrumentError::Protocol`] if the reply could not be decoded. The session remains
    ///   connected.
    pub fn execute_with_timeout(
        &self,
        descriptor: &CommandDescriptor,
        args: &[Arg],
        timeout: Duration,
    ) -> Result<Response, InstrumentError> {
        let frame = descriptor.format(args)?;

        let mut link = self.lock();
        if link.state != ConnectionState::Connected {
            return Err(InstrumentError::NotConnected(link.state));
        }
        let Some(interface) = link.interface.as_mut() else {
            return Err(InstrumentError::NotConnected(ConnectionState::Disconnected));
        };

        let exchange = interface.sendcmd(&frame).and_then(|()| {
            self.observer.on_event(&SessionEvent::CommandSent {
                command: descriptor.name,
                frame: &frame,
            });
            interface.receive_until(self.config.prompt.as_bytes(), timeout)
        });

        let raw = match exchange {
            Ok(raw) => raw,
            Err(InstrumentError::Timeout(_)) => {
                let err = InstrumentError::CommandTimeout {
                    command: frame,
                    timeout,
                };
                self.fault(&mut link, descriptor.name, &err);
                return Err(err);
            }
            Err(err) => {
                if err.is_transport_fault() {
                    self.fault(&mut link, descriptor.name, &err);
                }
                return Err(err);
            }
        };
        drop(link);

        let response = decode(descriptor, &raw);
        let outcome = match &response {
            Ok(Response::Acknowledged(_)) => Some(Outcome::Acknowledged),
            Ok(Response::Value(value)) => Some(Outcome::Value(value)),
            Err(InstrumentError::Instrument { code, message }) => Some(Outcome::Instrument {
                code: *code,
                message,
            }),
            Err(InstrumentError::Protocol { reason, .. }) => Some(Outcome::Protocol { reason }),
            Err(_) => None,
        };
        if let Some(outcome) = outcome {
            self.observer.on_event(&SessionEvent::ResponseReceived {
                command: descriptor.name,
                outcome,
            });
        }
        response
    }

    /// Lock the link. A poisoned lock is recovered, the connection state tells whether the link
    /// can still be used.
    fn lock(&self) -> MutexGuard<'_, Link<C>> {
        self.link.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn set_state(&self, link: &mut Link<C>, state: ConnectionState) {
        if link.state != state {
            let from = link.state;
            link.state = state;
            self.observer
                .on_event(&SessionEvent::StateChanged { from, to: state });
        }
    }

    /// Tear the link down after a transport fault.
    fn fault(&self, link: &mut Link<C>, command: &str, err: &InstrumentError) {
        link.teardown();
        self.set_state(link, ConnectionState::Faulted);
        self.observer.on_event(&SessionEvent::Faulted {
            command: Some(command),
            error: err,
        });
    }

    /// Replace whatever interface the link has with a freshly connected one.
    fn open_link(&self, link: &mut Link<C>) -> Result<(), InstrumentError> {
        link.teardown();
        self.set_state(link, ConnectionState::Disconnected);

        let mut interface = link.connector.connect()?;
        interface.set_terminator(&self.config.terminator);

        if self.config.await_banner {
            if let Err(err) =
                interface.receive_until(self.config.prompt.as_bytes(), self.config.connect_timeout)
            {
                interface.close();
                return Err(InstrumentError::Connection {
                    addr: link.connector.target(),
                    source: banner_error(err),
                });
            }
        }

        link.interface = Some(interface);
        self.set_state(link, ConnectionState::Connected);
        self.observer.on_event(&SessionEvent::Connected);
        Ok(())
    }
}

/// Describe why the greeting could not be read as an I/O error.
fn banner_error(err: InstrumentError) -> io::Error {
    match err {
        InstrumentError::Io(e) => e,
        InstrumentError::Timeout(timeout) => io::Error::new(
            io::ErrorKind::TimedOut,
            format!("no prompt in the greeting within {timeout:?}"),
        ),
        InstrumentError::ChannelClosed => io::Error::new(
            io::ErrorKind::ConnectionAborted,
            "channel closed before the greeting was complete",
        ),
        other => io::Error::other(other.to_string()),
    }
}
