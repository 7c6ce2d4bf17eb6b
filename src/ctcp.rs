//! Client-to-Client Protocol (CTCP) sub-messages.
//!
//! CTCP requests and replies travel embedded in the body of a PRIVMSG or
//! NOTICE, delimited by a pair of 0x01 bytes. One carrier parameter may
//! hold several sub-messages; extraction excises each delimited span from
//! the carrier text left to right, so the remaining visible text is the
//! original with every span removed.

use std::sync::OnceLock;

use crate::irc::CTCP_DELIM;

/// A CTCP sub-message extracted from a PRIVMSG or NOTICE parameter.
#[derive(Debug, Clone)]
pub struct Ctcp {
    sender: String,
    target: String,
    parent_command: String,
    command: String,
    raw_params: String,
    params: OnceLock<Vec<String>>,
}

impl Ctcp {
    /// Extracts every CTCP sub-message from `text`, removing the delimited
    /// spans from it as they are found. An unmatched trailing delimiter is
    /// left in place.
    pub fn extract(sender: &str, target: &str, parent_command: &str, text: &mut String) -> Vec<Ctcp> {
        let mut found = Vec::new();

        loop {
            let Some(start) = text.find(CTCP_DELIM) else {
                break;
            };
            let Some(len) = text[start + 1..].find(CTCP_DELIM) else {
                break;
            };
            let end = start + 1 + len;

            let inner = text[start + 1..end].to_string();
            text.replace_range(start..=end, "");
            found.push(Ctcp::new(sender, target, parent_command, &inner));
        }

        found
    }

    /// Builds a sub-message from the text between one delimiter pair. The
    /// first space-separated token becomes the command, upper-cased; the
    /// rest is kept raw and tokenized lazily.
    fn new(sender: &str, target: &str, parent_command: &str, body: &str) -> Ctcp {
        let (command, raw_params) = match body.find(' ') {
            Some(space) => (&body[..space], &body[space + 1..]),
            None => (body, ""),
        };

        Ctcp {
            sender: sender.to_string(),
            target: target.to_string(),
            parent_command: parent_command.to_string(),
            command: command.to_ascii_uppercase(),
            raw_params: raw_params.to_string(),
            params: OnceLock::new(),
        }
    }

    /// The hostmask of whoever sent the carrier message.
    pub fn sender(&self) -> &str {
        &self.sender
    }

    /// The target of the carrier message (a channel or the client's nick).
    pub fn target(&self) -> &str {
        &self.target
    }

    /// The command the sub-message was embedded in (PRIVMSG or NOTICE).
    pub fn parent_command(&self) -> &str {
        &self.parent_command
    }

    /// The CTCP command word, upper-cased.
    pub fn command(&self) -> &str {
        &self.command
    }

    /// The unparsed parameter text after the command word.
    pub fn raw_params(&self) -> &str {
        &self.raw_params
    }

    /// The parameter list, split on spaces. Tokenized on first access and
    /// cached for the lifetime of the message.
    pub fn params(&self) -> &[String] {
        self.params.get_or_init(|| {
            self.raw_params
                .split(' ')
                .filter(|tok| !tok.is_empty())
                .map(str::to_string)
                .collect()
        })
    }

    /// A single parameter by zero-based index.
    pub fn param(&self, index: usize) -> Option<&str> {
        self.params().get(index).map(String::as_str)
    }
}

impl PartialEq for Ctcp {
    fn eq(&self, other: &Self) -> bool {
        // The lazy token cache is derived state and excluded on purpose.
        self.sender == other.sender
            && self.target == other.target
            && self.parent_command == other.parent_command
            && self.command == other.command
            && self.raw_params == other.raw_params
    }
}

impl Eq for Ctcp {}
