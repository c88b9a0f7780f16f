//! Loopback interface implemented for testing instruments that communicate by sending strings.
//!
//! End-of-command is in these cases always determined by a terminator string, usually `"\n"` or
//! similar, and end-of-reply by the instrument's ready prompt.

use std::{collections::VecDeque, time::Duration};

use crate::{
    FrameBuffer, InstrumentError, InstrumentInterface,
    loopback::{IncrIndex, check_leftovers},
};

/// An interface that allows you to simply write tests for your instrument driver.
///
/// # Example
///
/// Let us send a `"*IDN?"` query through a [`crate::Session`] and check the decoded reply. The
/// session gets its interface from a connector, here a closure that hands out the loopback once.
///
/// ```
/// use scpirs::{
///     CommandDescriptor, InstrumentError, LoopbackInterfaceString, ReplyKind, Response, Session,
///     SessionConfig, Value,
/// };
///
/// static IDN: CommandDescriptor = CommandDescriptor::query("idn_q", "*IDN?", &[], ReplyKind::Text);
///
/// let loopback = LoopbackInterfaceString::new(vec!["*IDN?"], vec!["MyInstrument,1.0,1234"], "\n")
///     .with_prompt(">");
/// let mut loopback = Some(loopback);
///
/// let config = SessionConfig::default().with_await_banner(false);
/// let session = Session::new(config, move || loopback.take().ok_or(InstrumentError::ChannelClosed));
/// session.connect().unwrap();
///
/// let response = session.execute(&IDN, &[]).unwrap();
/// assert_eq!(response, Response::Value(Value::Text("MyInstrument,1.0,1234".to_string())));
/// ```
///
/// If a command is sent that was not scripted, or if scripted commands are left over when the
/// loopback is dropped, the loopback panics and with it your test.
#[derive(Debug)]
pub struct LoopbackInterfaceString {
    from_host: Vec<String>,
    from_inst: Vec<String>,
    terminator_exp: String,
    prompt: String,
    from_host_index: IncrIndex,
    from_inst_index: IncrIndex,
    curr_bytes: VecDeque<u8>,
    frames: FrameBuffer,
    terminator: String,
}

impl LoopbackInterfaceString {
    /// Create a new loopback instrument with given commands to and from instrument.
    ///
    /// The main purpose of this interface is to provide a simple loopback interface for testing of
    /// instrument drivers. To do so, you can provide a list of commands that are expected to go from
    /// the host to the instrument, and a list of replies that are expected to go from the
    /// instrument to the host. The commands are read in order. At the end, when the
    /// [`LoopbackInterfaceString`] is dropped, a `finalize` function is called that checks if all
    /// commands that you have provided have been used. If not, the program panics. During
    /// instrument calls, whenever something is sent to the instrument that is not expected, the
    /// [`LoopbackInterfaceString`] will panic as well. This way, your tests can ensure easily that all
    /// commands that you have provided are used in the correct order.
    ///
    /// # Arguments:
    /// * `from_host` - Commands from host to instrument, without terminator.
    /// * `from_inst` - Replies from instrument to host. The prompt set with
    ///   [`LoopbackInterfaceString::with_prompt`] is appended to each of them.
    /// * `terminator_exp` - The expected terminator. This is required for every instantiation of
    ///   the loopback interface.
    pub fn new<S: AsRef<str>>(from_host: Vec<S>, from_inst: Vec<S>, terminator_exp: &str) -> Self {
        LoopbackInterfaceString {
            from_host: from_host.iter().map(|s| s.as_ref().to_string()).collect(),
            from_inst: from_inst.iter().map(|s| s.as_ref().to_string()).collect(),
            terminator_exp: terminator_exp.to_string(),
            prompt: String::new(),
            from_host_index: IncrIndex::default(),
            from_inst_index: IncrIndex::default(),
            curr_bytes: VecDeque::new(),
            frames: FrameBuffer::new(),
            terminator: "\n".to_string(), // default terminator, as interfaces
        }
    }

    /// Append `prompt` to every scripted reply.
    pub fn with_prompt(mut self, prompt: &str) -> Self {
        self.prompt = prompt.to_string();
        self
    }

    /// This command panics if not all commands in the [`LoopbackInterfaceString`] have been used.
    ///
    /// It is automatically called when the [`LoopbackInterfaceString`] is dropped, but you can also call
    /// it manually to ensure that all commands have been used.
    pub fn finalize(&mut self) {
        check_leftovers("host to instrument", &self.from_host, &self.from_host_index);
        check_leftovers("instrument to host", &self.from_inst, &self.from_inst_index);
    }

    /// Get the next command from host to instrument as a string including the terminator.
    fn get_next_from_host_with_terminator(&mut self) -> String {
        let cmd = self
            .from_host
            .get(self.from_host_index.next())
            .expect("No more commands were expected from host to instrument.");
        format!("{cmd}{}", self.terminator_exp)
    }
}

/// Move the next scripted reply (or what is left of it) into `buf`.
///
/// Panics if the script has no more replies: the driver waits for something that will never come.
fn feed(
    curr_bytes: &mut VecDeque<u8>,
    from_inst: &[String],
    from_inst_index: &mut IncrIndex,
    prompt: &str,
    buf: &mut [u8],
) -> usize {
    if curr_bytes.is_empty() {
        let reply = from_inst
            .get(from_inst_index.next())
            .expect("No more commands were expected from instrument to host.");
        curr_bytes.extend(reply.as_bytes());
        curr_bytes.extend(prompt.as_bytes());
    }
    let len = buf.len().min(curr_bytes.len());
    for (slot, byte) in buf.iter_mut().zip(curr_bytes.drain(..len)) {
        *slot = byte;
    }
    len
}

impl InstrumentInterface for LoopbackInterfaceString {
    fn write_raw(&mut self, cmd: &[u8]) -> Result<(), InstrumentError> {
        let exp = self.get_next_from_host_with_terminator();
        assert_eq!(
            exp.as_bytes(),
            cmd,
            "Expected sendcmd '{0}', got '{1:?}'",
            exp,
            std::str::from_utf8(cmd)
        );
        Ok(())
    }

    fn receive_until(
        &mut self,
        delimiter: &[u8],
        timeout: Duration,
    ) -> Result<Vec<u8>, InstrumentError> {
        let Self {
            curr_bytes,
            from_inst,
            from_inst_index,
            prompt,
            frames,
            ..
        } = self;
        frames.read_until(delimiter, timeout, |buf, _| {
            Ok(feed(curr_bytes, from_inst, from_inst_index, prompt, buf))
        })
    }

    fn get_terminator(&self) -> &str {
        self.terminator.as_str()
    }

    fn set_terminator(&mut self, terminator: &str) {
        self.terminator = terminator.to_string();
    }
}

impl Drop for LoopbackInterfaceString {
    fn drop(&mut self) {
        self.finalize();
    }
}
