//! # slirc-engine
//!
//! A flood-controlled IRC (RFC 1459) client engine. The engine owns a
//! single TCP or TLS connection to one server, frames and parses the
//! line-oriented protocol, keeps the connection alive against silent
//! failures, throttles outbound traffic to stay under server-side flood
//! penalties, and delivers parsed inbound messages to independently
//! registered listeners.
//!
//! ## What it does
//!
//! - Line-level codec and a never-failing message parser, including
//!   extraction of CTCP sub-messages embedded in PRIVMSG/NOTICE bodies
//! - Connection lifecycle (connect, logon, logoff, disconnect) with a
//!   ping/pong keepalive state machine on the read path
//! - A weighted outbound throttle: callers enqueue without blocking, a
//!   background task paces transmission, a bypass write skips the queue
//! - An ordered listener dispatch loop, plus lookahead waits that can pull
//!   messages synchronously and restore them for ordinary dispatch
//!
//! ## What it does not do
//!
//! The engine performs no reconnection, no server rotation, and no
//! channel/user bookkeeping. A supervising caller catches
//! [`EngineError::ConnectionLost`], waits, and connects again; channel
//! state lives in listeners.
//!
//! ## Quick Start
//!
//! ```no_run
//! use slirc_engine::{Client, Engine, Identity, Listener, Message, ServerTarget};
//!
//! struct PingResponder;
//!
//! #[async_trait::async_trait]
//! impl Listener for PingResponder {
//!     async fn on_message(&mut self, msg: &Message, client: &mut Client) -> anyhow::Result<()> {
//!         if msg.is(slirc_engine::irc::CMD_PING) {
//!             let token = msg.trailing().unwrap_or_default();
//!             client.write_now(&format!("PONG :{token}")).await?;
//!         }
//!         Ok(())
//!     }
//! }
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let target = ServerTarget::new("irc.libera.chat", 6697, true);
//!     let identity = Identity::new("example_bot", "An example bot");
//!
//!     let mut client = Client::connect(&target, identity).await?;
//!     client.logon().await?;
//!
//!     let mut engine = Engine::new(client);
//!     engine.add_listener(Box::new(PingResponder));
//!     engine.run().await?;
//!     Ok(())
//! }
//! ```

#![deny(clippy::all)]

pub mod client;
pub mod codec;
pub mod connection;
pub mod ctcp;
pub mod error;
pub mod flood;
pub mod irc;
pub mod message;
pub mod util;
pub mod wait;

pub use self::client::{Client, Engine, Listener};
pub use self::codec::{LineCodec, MAX_LINE_LEN};
pub use self::connection::{
    Connection, Identity, ServerTarget, DEFAULT_READ_TIMEOUT, MIN_RECV_BUFFER_SIZE,
};
pub use self::ctcp::Ctcp;
pub use self::error::{EngineError, Result};
pub use self::flood::{FloodSender, DECAY_INTERVAL, DECAY_STEP, FLOOD_THRESHOLD, LINE_WEIGHT};
pub use self::message::Message;
pub use self::wait::{MessageWait, MessageWaitRestore};
