//! Declarative command descriptors and the registry that looks them up by name.
//!
//! A [`CommandDescriptor`] knows everything needed to turn a list of [`Arg`]s into the exact line
//! that goes on the wire, and what shape the reply has. Descriptors are meant to be defined once,
//! as `static` tables, and never changed afterwards.

use std::{collections::HashMap, fmt};

use crate::InstrumentError;

/// Maximum number of decimals that are sent for floating point arguments.
const FLOAT_DECIMALS: usize = 9;

/// An argument value bound to a command invocation.
#[derive(Debug, Clone, PartialEq)]
pub enum Arg {
    /// An integer value.
    Int(i64),
    /// A floating point value.
    Float(f64),
    /// A token: a choice mnemonic, a preset such as `MAX`, or a file name.
    Token(String),
}

impl Arg {
    fn type_name(&self) -> &'static str {
        match self {
            Arg::Int(_) => "integer",
            Arg::Float(_) => "float",
            Arg::Token(_) => "token",
        }
    }
}

impl fmt::Display for Arg {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Arg::Int(val) => write!(f, "{val}"),
            Arg::Float(val) => write!(f, "{val}"),
            Arg::Token(val) => write!(f, "{val}"),
        }
    }
}

impl From<i32> for Arg {
    fn from(val: i32) -> Self {
        Arg::Int(val.into())
    }
}

impl From<i64> for Arg {
    fn from(val: i64) -> Self {
        Arg::Int(val)
    }
}

impl From<u32> for Arg {
    fn from(val: u32) -> Self {
        Arg::Int(val.into())
    }
}

impl From<f64> for Arg {
    fn from(val: f64) -> Self {
        Arg::Float(val)
    }
}

impl From<&str> for Arg {
    fn from(val: &str) -> Self {
        Arg::Token(val.to_string())
    }
}

impl From<String> for Arg {
    fn from(val: String) -> Self {
        Arg::Token(val)
    }
}

/// The type and constraint of a single parameter.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ParamKind {
    /// An integer in `min..=max` that lies on the grid `min + n * step`.
    Integer {
        /// Smallest allowed value.
        min: i64,
        /// Largest allowed value.
        max: i64,
        /// Grid spacing, `1` for any integer.
        step: i64,
    },
    /// A finite floating point number in `min..=max`. Integers are accepted as well.
    Float {
        /// Smallest allowed value.
        min: f64,
        /// Largest allowed value.
        max: f64,
    },
    /// One of the listed SCPI mnemonics, e.g., `"INCReasing"`.
    Choice(&'static [&'static str]),
    /// A file name on the instrument, sent single-quoted.
    Filename,
}

/// One parameter of a [`CommandDescriptor`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Param {
    /// Name of the parameter, used in error messages.
    pub name: &'static str,
    /// Type and constraint.
    pub kind: ParamKind,
    /// Named values that numeric parameters accept instead of a number, e.g., `"MAXimum"`.
    pub presets: &'static [&'static str],
    /// Optional parameters may be omitted. They must come after all required ones.
    pub optional: bool,
}

impl Param {
    /// A parameter that must always be given.
    pub const fn required(name: &'static str, kind: ParamKind) -> Self {
        Self {
            name,
            kind,
            presets: &[],
            optional: false,
        }
    }

    /// A trailing parameter that may be left out.
    pub const fn optional(name: &'static str, kind: ParamKind) -> Self {
        Self {
            name,
            kind,
            presets: &[],
            optional: true,
        }
    }

    /// Allow the given preset mnemonics in place of a number.
    pub const fn with_presets(mut self, presets: &'static [&'static str]) -> Self {
        self.presets = presets;
        self
    }

    /// Check one argument and render it in wire format.
    fn render(&self, arg: &Arg) -> Result<String, String> {
        if let Arg::Token(token) = arg {
            if let Some(preset) = match_mnemonic(token, self.presets) {
                return Ok(preset.to_string());
            }
        }

        match (self.kind, arg) {
            (ParamKind::Integer { min, max, step }, Arg::Int(val)) => {
                if *val < min || *val > max {
                    return Err(format!("{val} is outside of {min}..={max}"));
                }
                if step > 1 && (val - min) % step != 0 {
                    return Err(format!("{val} is not a multiple of {step} from {min}"));
                }
                Ok(val.to_string())
            }
            (ParamKind::Float { min, max }, Arg::Int(val)) => {
                render_float(*val as f64, min, max)
            }
            (ParamKind::Float { min, max }, Arg::Float(val)) => render_float(*val, min, max),
            (ParamKind::Choice(choices), Arg::Token(token)) => match_mnemonic(token, choices)
                .map(str::to_string)
                .ok_or_else(|| format!("`{token}` is not one of {}", choices.join(", "))),
            (ParamKind::Filename, Arg::Token(name)) => {
                if name.is_empty() {
                    Err("file name is empty".to_string())
                } else if name.contains('\'') || name.chars().any(char::is_control) {
                    Err(format!("file name `{name}` contains a quote or control character"))
                } else {
                    Ok(format!("'{name}'"))
                }
            }
            (kind, arg) => Err(format!(
                "expected {}, got {} `{arg}`",
                kind_name(&kind, self.presets),
                arg.type_name()
            )),
        }
    }
}

fn kind_name(kind: &ParamKind, presets: &[&str]) -> String {
    let base = match kind {
        ParamKind::Integer { .. } => "an integer".to_string(),
        ParamKind::Float { .. } => "a number".to_string(),
        ParamKind::Choice(choices) => format!("one of {}", choices.join(", ")),
        ParamKind::Filename => "a file name".to_string(),
    };
    if presets.is_empty() {
        base
    } else {
        format!("{base} or one of {}", presets.join(", "))
    }
}

fn render_float(val: f64, min: f64, max: f64) -> Result<String, String> {
    if !val.is_finite() {
        return Err(format!("{val} is not a finite number"));
    }
    if val < min || val > max {
        return Err(format!("{val} is outside of {min}..={max}"));
    }
    Ok(format_float(val))
}

/// Render a float with at most nine decimals and no trailing zeros: `1550`, `0.01`, `1531.5`.
pub(crate) fn format_float(val: f64) -> String {
    let mut out = format!("{val:.prec$}", prec = FLOAT_DECIMALS);
    if out.contains('.') {
        let trimmed = out.trim_end_matches('0').trim_end_matches('.').len();
        out.truncate(trimmed);
    }
    if out == "-0" {
        out = "0".to_string();
    }
    out
}

/// The short form of a SCPI mnemonic: its leading upper case part, e.g. `INCR` for `INCReasing`.
fn short_form(mnemonic: &str) -> &str {
    let end = mnemonic
        .find(|c: char| c.is_ascii_lowercase())
        .unwrap_or(mnemonic.len());
    &mnemonic[..end]
}

/// Find the mnemonic that `input` names, in long or short form, ignoring case.
pub(crate) fn match_mnemonic(input: &str, mnemonics: &[&'static str]) -> Option<&'static str> {
    let input = input.trim();
    mnemonics.iter().copied().find(|mnemonic| {
        input.eq_ignore_ascii_case(mnemonic) || input.eq_ignore_ascii_case(short_form(mnemonic))
    })
}

/// The shape of the reply a command produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ReplyKind {
    /// An action: the reply only acknowledges the command (or reports an error).
    Ack,
    /// Free text, e.g., an identification string.
    Text,
    /// A single mnemonic, e.g., `FLAT`.
    Token,
    /// A single integer.
    Integer,
    /// A single floating point number.
    Float,
    /// An ordered list of numbers, e.g., a sequence listing.
    Floats,
    /// One or more `code,"message"` entries from the error queue.
    ErrorQueue,
}

/// Immutable description of one instrument command.
///
/// # Example
///
/// ```
/// use scpirs::{Arg, CommandDescriptor, Param, ParamKind};
///
/// static SET_POWER: CommandDescriptor = CommandDescriptor::action(
///     "conf_fix_pow",
///     ":CONFigure:FIXed:POWer",
///     &[Param::required("power", ParamKind::Float { min: -10.0, max: 10.0 })],
/// );
///
/// assert_eq!(SET_POWER.format(&[Arg::from(0)]).unwrap(), ":CONFigure:FIXed:POWer 0");
/// assert!(SET_POWER.format(&[Arg::from(11.0)]).is_err());
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CommandDescriptor {
    /// Canonical name, queries end in `_q` by convention.
    pub name: &'static str,
    /// The fixed part of the wire format, e.g., `":CONFigure:FIXed:WAVelength"`.
    pub header: &'static str,
    /// Ordered parameters.
    pub params: &'static [Param],
    /// What the instrument replies with.
    pub reply: ReplyKind,
}

impl CommandDescriptor {
    /// A command that expects only an acknowledgement.
    pub const fn action(name: &'static str, header: &'static str, params: &'static [Param]) -> Self {
        Self {
            name,
            header,
            params,
            reply: ReplyKind::Ack,
        }
    }

    /// A command that expects a value of the given kind.
    pub const fn query(
        name: &'static str,
        header: &'static str,
        params: &'static [Param],
        reply: ReplyKind,
    ) -> Self {
        Self {
            name,
            header,
            params,
            reply,
        }
    }

    /// Does this command expect a value reply?
    pub fn is_query(&self) -> bool {
        self.reply != ReplyKind::Ack
    }

    /// Check the arguments against the parameters and render each of them in wire format.
    ///
    /// # Errors
    /// [`InstrumentError::InvalidArgument`] naming the first offending parameter.
    pub fn validate(&self, args: &[Arg]) -> Result<Vec<String>, InstrumentError> {
        if args.len() > self.params.len() {
            return Err(self.invalid(
                "arguments",
                format!(
                    "expected at most {} argument(s), got {}",
                    self.params.len(),
                    args.len()
                ),
            ));
        }

        let mut rendered = Vec::with_capacity(args.len());
        for (idx, param) in self.params.iter().enumerate() {
            match args.get(idx) {
                Some(arg) => rendered.push(
                    param
                        .render(arg)
                        .map_err(|reason| self.invalid(param.name, reason))?,
                ),
                None if param.optional => break,
                None => return Err(self.invalid(param.name, "missing required argument".into())),
            }
        }
        Ok(rendered)
    }

    /// Validate the arguments and build the line that is sent, without terminator.
    ///
    /// The line is the header alone, or the header, one space, and the comma separated arguments.
    pub fn format(&self, args: &[Arg]) -> Result<String, InstrumentError> {
        let rendered = self.validate(args)?;
        if rendered.is_empty() {
            Ok(self.header.to_string())
        } else {
            Ok(format!("{} {}", self.header, rendered.join(",")))
        }
    }

    fn invalid(&self, param: &str, reason: String) -> InstrumentError {
        InstrumentError::InvalidArgument {
            command: self.name.to_string(),
            param: param.to_string(),
            reason,
        }
    }
}

/// Lookup of [`CommandDescriptor`]s by name, built once from a static table.
#[derive(Debug, Clone, Default)]
pub struct CommandRegistry {
    commands: HashMap<&'static str, &'static CommandDescriptor>,
}

impl CommandRegistry {
    /// Build a registry from a static table of descriptors.
    ///
    /// # Errors
    /// [`InstrumentError::Config`] if a name is used twice or if a required parameter follows an
    /// optional one.
    pub fn from_table(table: &'static [CommandDescriptor]) -> Result<Self, InstrumentError> {
        let mut commands = HashMap::with_capacity(table.len());
        for descriptor in table {
            let mut seen_optional = false;
            for param in descriptor.params {
                if seen_optional && !param.optional {
                    return Err(InstrumentError::Config(format!(
                        "command `{}`: required parameter `{}` follows an optional one",
                        descriptor.name, param.name
                    )));
                }
                seen_optional |= param.optional;
            }
            if commands.insert(descriptor.name, descriptor).is_some() {
                return Err(InstrumentError::Config(format!(
                    "command `{}` is defined twice",
                    descriptor.name
                )));
            }
        }
        Ok(Self { commands })
    }

    /// Look up a descriptor by name.
    ///
    /// # Errors
    /// [`InstrumentError::UnknownCommand`] if no command has this name.
    pub fn get(&self, name: &str) -> Result<&'static CommandDescriptor, InstrumentError> {
        self.commands
            .get(name)
            .copied()
            .ok_or_else(|| InstrumentError::UnknownCommand(name.to_string()))
    }

    /// Validate `args` against `descriptor`, see [`CommandDescriptor::validate`].
    pub fn validate(
        &self,
        descriptor: &CommandDescriptor,
        args: &[Arg],
    ) -> Result<(), InstrumentError> {
        descriptor.validate(args).map(|_| ())
    }

    /// Number of registered commands.
    pub fn len(&self) -> usize {
        self.commands.len()
    }

    /// Is the registry empty?
    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    /// Iterate over all registered descriptors, in no particular order.
    pub fn iter(&self) -> impl Iterator<Item = &'static CommandDescriptor> + '_ {
        self.commands.values().copied()
    }
}
