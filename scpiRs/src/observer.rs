//! Structured events emitted by a [`crate::Session`] and the observers that consume them.
//!
//! The session never logs on its own. It hands every event to an injected [`SessionObserver`],
//! by default the [`TracingObserver`].

use crate::{ConnectionState, InstrumentError, Value};

/// How a command ended, as far as the reply is concerned.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Outcome<'a> {
    /// The instrument acknowledged an action.
    Acknowledged,
    /// A query returned a value.
    Value(&'a Value),
    /// The instrument reported an error in-band.
    Instrument {
        /// Firmware error code.
        code: Option<i32>,
        /// Firmware error message.
        message: &'a str,
    },
    /// The reply could not be decoded.
    Protocol {
        /// What was wrong with the reply.
        reason: &'a str,
    },
}

/// Something that happened on a session.
#[derive(Debug, Clone, Copy)]
pub enum SessionEvent<'a> {
    /// A connection was established (and the banner consumed, if configured).
    Connected,
    /// A command line was written to the instrument, terminator excluded.
    CommandSent {
        /// Name of the command.
        command: &'a str,
        /// The line that was sent.
        frame: &'a str,
    },
    /// A reply was received and classified.
    ResponseReceived {
        /// Name of the command.
        command: &'a str,
        /// The classification of the reply.
        outcome: Outcome<'a>,
    },
    /// A transport fault put the connection into [`ConnectionState::Faulted`].
    Faulted {
        /// Name of the command in flight, if any.
        command: Option<&'a str>,
        /// The error that caused the fault.
        error: &'a InstrumentError,
    },
    /// The connection was closed on request.
    Disconnected,
    /// The state of the connection changed.
    StateChanged {
        /// State before the change.
        from: ConnectionState,
        /// State after the change.
        to: ConnectionState,
    },
}

/// Receives the events of a session. Must be shareable, as clones of a session share it.
pub trait SessionObserver: Send + Sync {
    /// Handle a single event.
    fn on_event(&self, event: &SessionEvent<'_>);
}

impl<F> SessionObserver for F
where
    F: Fn(&SessionEvent<'_>) + Send + Sync,
{
    fn on_event(&self, event: &SessionEvent<'_>) {
        self(event)
    }
}

/// Forwards events to `tracing`.
///
/// Traffic is logged at `debug`, instrument and protocol errors at `warn`, transport faults at
/// `error`.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingObserver;

impl SessionObserver for TracingObserver {
    fn on_event(&self, event: &SessionEvent<'_>) {
        match *event {
            SessionEvent::Connected => tracing::debug!("Connected to instrument"),
            SessionEvent::CommandSent { command, frame } => {
                tracing::debug!(command, frame, "Command sent")
            }
            SessionEvent::ResponseReceived { command, outcome } => match outcome {
                Outcome::Acknowledged => tracing::debug!(command, "Command acknowledged"),
                Outcome::Value(value) => tracing::debug!(command, ?value, "Value received"),
                Outcome::Instrument { code, message } => {
                    tracing::warn!(command, ?code, message, "Instrument reported an error")
                }
                Outcome::Protocol { reason } => {
                    tracing::warn!(command, reason, "Malformed response")
                }
            },
            SessionEvent::Faulted { command, error } => {
                tracing::error!(command, %error, "Connection faulted")
            }
            SessionEvent::Disconnected => tracing::debug!("Disconnected from instrument"),
            SessionEvent::StateChanged { from, to } => {
                tracing::trace!(%from, %to, "Connection state changed")
            }
        }
    }
}

/// Discards all events.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullObserver;

impl SessionObserver for NullObserver {
    fn on_event(&self, _event: &SessionEvent<'_>) {}
}
