//! Parsing of raw protocol lines into structured messages.
//!
//! One inbound line becomes one [`Message`]: an optional `:`-prefixed
//! sender, a command token, and space-separated parameters where a
//! parameter beginning with `:` consumes the remainder of the line
//! verbatim. Parsing never fails; malformed or empty lines simply yield
//! `None` so queue consumers can treat "nothing usable" uniformly.

use std::fmt;

use nom::{
    bytes::complete::take_while1,
    character::complete::{char, space0},
    combinator::opt,
    error::{context, VerboseError},
    sequence::preceded,
    IResult,
};

use crate::ctcp::Ctcp;
use crate::irc;
use crate::util::nick_from_mask;

type ParseResult<I, O> = IResult<I, O, VerboseError<I>>;

/// Parse the message prefix (the part after `:` and before the first space).
fn parse_prefix(input: &str) -> ParseResult<&str, &str> {
    context(
        "parsing message prefix",
        preceded(char(':'), take_while1(|c| c != ' ')),
    )(input)
}

/// Parse the command token (a verb or a numeric reply code).
fn parse_command(input: &str) -> ParseResult<&str, &str> {
    context(
        "parsing IRC command",
        take_while1(|c: char| c.is_alphanumeric()),
    )(input)
}

/// Parse a complete line into its components.
///
/// Line format:
/// ```text
/// [:prefix] <command> [params...] [:trailing]
/// ```
fn parse_line(input: &str) -> ParseResult<&str, RawMessage<'_>> {
    let (input, prefix) = context("parsing optional prefix", opt(parse_prefix))(input)?;
    let (input, _) = space0(input)?;

    let (input, command) = context("parsing required command", parse_command)(input)?;

    let mut params: Vec<&str> = Vec::new();
    let mut rest = input;

    while let Some(b' ') = rest.as_bytes().first().copied() {
        rest = &rest[1..];

        if let Some(b':') = rest.as_bytes().first().copied() {
            // Trailing parameter - everything after `:` until line end
            let after_colon = &rest[1..];
            let end = after_colon.find(['\r', '\n']).unwrap_or(after_colon.len());
            params.push(&after_colon[..end]);
            rest = &after_colon[end..];
            break;
        } else {
            // Regular parameter - until next space or line end
            let mut end = rest.len();
            if let Some(i) = rest.find(' ') {
                end = end.min(i);
            }
            if let Some(i) = rest.find(['\r', '\n']) {
                end = end.min(i);
            }
            let param = &rest[..end];
            if param.is_empty() {
                break;
            }
            params.push(param);
            rest = &rest[end..];
        }
    }

    Ok((
        rest,
        RawMessage {
            prefix,
            command,
            params,
        },
    ))
}

/// Borrowed intermediate produced by the nom parser.
#[derive(Debug)]
struct RawMessage<'a> {
    prefix: Option<&'a str>,
    command: &'a str,
    params: Vec<&'a str>,
}

/// An immutable parse result for one inbound protocol line.
///
/// CTCP sub-messages embedded in the final parameter of a PRIVMSG or
/// NOTICE are excised during construction; [`Message::params`] then holds
/// the visible text with every delimited span removed, and the
/// sub-messages are available through [`Message::ctcp`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    prefix: Option<String>,
    command: String,
    params: Vec<String>,
    ctcp: Vec<Ctcp>,
}

impl Message {
    /// Parses one raw line. Returns `None` for empty or unparseable input;
    /// this never fails with an error.
    pub fn parse(line: &str) -> Option<Message> {
        let line = line.trim_end_matches(['\r', '\n']);
        if line.is_empty() {
            return None;
        }

        match parse_line(line) {
            Ok((_rest, raw)) => Some(Message::from_raw(raw)),
            Err(_) => None,
        }
    }

    fn from_raw(raw: RawMessage<'_>) -> Message {
        let prefix = raw.prefix.map(str::to_string);
        let command = raw.command.to_string();
        let mut params: Vec<String> = raw.params.into_iter().map(str::to_string).collect();

        let carries_ctcp = (command.eq_ignore_ascii_case(irc::CMD_PRIVMSG)
            || command.eq_ignore_ascii_case(irc::CMD_NOTICE))
            && params.len() >= 2;

        let ctcp = if carries_ctcp {
            let mut body = params.pop().unwrap_or_default();
            let sender = prefix.as_deref().unwrap_or("");
            let found = Ctcp::extract(sender, &params[0], &command, &mut body);
            params.push(body);
            found
        } else {
            Vec::new()
        };

        Message {
            prefix,
            command,
            params,
            ctcp,
        }
    }

    /// The sender hostmask, absent for messages originated locally.
    pub fn prefix(&self) -> Option<&str> {
        self.prefix.as_deref()
    }

    /// The nick portion of the sender hostmask.
    pub fn nick(&self) -> Option<&str> {
        self.prefix.as_deref().map(nick_from_mask)
    }

    /// The command token, a verb or numeric reply code.
    pub fn command(&self) -> &str {
        &self.command
    }

    /// Returns `true` if the command token matches `cmd`, ignoring case.
    pub fn is(&self, cmd: &str) -> bool {
        self.command.eq_ignore_ascii_case(cmd)
    }

    /// The ordered parameter list. The final parameter may contain spaces.
    pub fn params(&self) -> &[String] {
        &self.params
    }

    /// A single parameter by zero-based index.
    pub fn param(&self, index: usize) -> Option<&str> {
        self.params.get(index).map(String::as_str)
    }

    /// The final parameter, if any.
    pub fn trailing(&self) -> Option<&str> {
        self.params.last().map(String::as_str)
    }

    /// CTCP sub-messages carried in the final parameter, in the order they
    /// appeared.
    pub fn ctcp(&self) -> &[Ctcp] {
        &self.ctcp
    }
}

impl fmt::Display for Message {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(prefix) = &self.prefix {
            write!(f, ":{prefix} ")?;
        }
        f.write_str(&self.command)?;

        if let Some((last, middles)) = self.params.split_last() {
            for param in middles {
                write!(f, " {param}")?;
            }
            if last.is_empty() || last.starts_with(':') || last.contains(' ') {
                write!(f, " :{last}")?;
            } else {
                write!(f, " {last}")?;
            }
        }

        Ok(())
    }
}
