//! Protocol constants defined by RFC 1459.
//!
//! Command verbs and numeric reply codes are compared as plain string
//! tokens throughout the engine; servers send numerics as three-digit
//! strings, so they are kept as `&str` rather than integers.

/// Parameters: `<server1> [<server2>]`
pub const CMD_PING: &str = "PING";

/// Parameters: `<server> [<server2>]`
pub const CMD_PONG: &str = "PONG";

/// Parameters: `<user> <mode> <unused> :<realname>`
pub const CMD_USER: &str = "USER";

/// Parameters: `<nickname>`
pub const CMD_NICK: &str = "NICK";

/// Parameters: `( <channel> *( "," <channel> ) [ <key> *( "," <key> ) ] ) / "0"`
pub const CMD_JOIN: &str = "JOIN";

/// Parameters: `<channel> *( "," <channel> ) [ <Part Message> ]`
pub const CMD_PART: &str = "PART";

/// Parameters: `<channel> *( "," <channel> ) <user> *( "," <user> ) [<comment>]`
pub const CMD_KICK: &str = "KICK";

/// Parameters: `[ <Quit Message> ]`
pub const CMD_QUIT: &str = "QUIT";

/// Parameters: `<channel> [ <topic> ]`
pub const CMD_TOPIC: &str = "TOPIC";

/// Parameters: `<msgtarget> <text to be sent>`
pub const CMD_PRIVMSG: &str = "PRIVMSG";

/// Parameters: `<msgtarget> <text>`
pub const CMD_NOTICE: &str = "NOTICE";

/// Parameters: `<channel> *( ( "-" / "+" ) *<modes> *<modeparams> )`
pub const CMD_MODE: &str = "MODE";

/// The CTCP message delimiter, the byte 0x01.
pub const CTCP_DELIM: char = '\u{1}';

/// The CTCP ACTION command (`/me`).
pub const CTCP_ACTION: &str = "ACTION";

/// "Welcome to the Internet Relay Network `<nick>!<user>@<host>`"
pub const RPL_WELCOME: &str = "001";

/// "Your host is `<servername>`, running version `<ver>`"
pub const RPL_YOURHOST: &str = "002";

/// "This server was created `<date>`"
pub const RPL_CREATED: &str = "003";

/// "`<servername> <version> <available user modes> <available channel modes>`"
pub const RPL_MYINFO: &str = "004";

/// "`<channel>` :No topic is set"
pub const RPL_NOTOPIC: &str = "331";

/// "`<channel>` :`<topic>`"
pub const RPL_TOPIC: &str = "332";

/// "`<channel>` :`[[@|+]<nick> [[@|+]<nick> [...]]]`"
pub const RPL_NAMREPLY: &str = "353";

/// "`<channel>` :End of /NAMES list"
pub const RPL_ENDOFNAMES: &str = "366";

/// "`<nick>` :Nickname is already in use"
pub const ERR_NICKNAMEINUSE: &str = "433";
