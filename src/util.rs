//! Small helpers for working with IRC identity strings.

use crate::irc::CTCP_DELIM;

/// Extracts the nick from a `nick!user@host` hostmask.
///
/// A mask with no `!` separator is returned whole, which covers
/// server-originated prefixes that are bare server names.
///
/// # Examples
///
/// ```
/// use slirc_engine::util::nick_from_mask;
///
/// assert_eq!(nick_from_mask("alice!ali@example.com"), "alice");
/// assert_eq!(nick_from_mask("irc.example.com"), "irc.example.com");
/// ```
#[inline]
pub fn nick_from_mask(mask: &str) -> &str {
    match mask.find('!') {
        Some(bang) => &mask[..bang],
        None => mask,
    }
}

/// Wraps a message in CTCP delimiters for embedding in a PRIVMSG or NOTICE.
///
/// # Examples
///
/// ```
/// use slirc_engine::util::ctcp_escape;
///
/// assert_eq!(ctcp_escape("ACTION waves"), "\u{1}ACTION waves\u{1}");
/// ```
#[inline]
pub fn ctcp_escape(message: &str) -> String {
    format!("{CTCP_DELIM}{message}{CTCP_DELIM}")
}
