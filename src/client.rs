//! The client surface and the inbound dispatch loop.
//!
//! A [`Client`] ties one [`Connection`] to its flood sender and the inbound
//! line queue. The [`Engine`] owns a client plus an ordered list of
//! [`Listener`]s and runs the foreground loop: batch-read whatever the
//! transport has buffered, then drain the queue, parse, and fan each
//! message out to every listener in registration order.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use tracing::error;

use crate::connection::{Connection, Identity, ServerTarget};
use crate::error::Result;
use crate::flood::FloodSender;
use crate::irc;
use crate::message::Message;
use crate::util::nick_from_mask;

/// A registered consumer of inbound messages.
///
/// Listeners are called in registration order. A failure is logged and
/// dispatch continues with the remaining listeners; it never aborts the
/// loop.
#[async_trait]
pub trait Listener: Send {
    async fn on_message(&mut self, msg: &Message, client: &mut Client) -> anyhow::Result<()>;
}

/// One logged-on IRC client: connection, flood sender, inbound queue, and
/// the running flag that gates the dispatch loop.
pub struct Client {
    conn: Connection,
    sender: FloodSender,
    identity: Identity,
    input_queue: VecDeque<String>,
    running: Arc<AtomicBool>,
}

impl Client {
    /// Connects to the target and starts the background sender tasks.
    /// Does not log on; call [`Client::logon`] next.
    pub async fn connect(target: &ServerTarget, identity: Identity) -> Result<Client> {
        let conn = Connection::open(target, &identity).await?;
        Ok(Client::from_connection(conn, identity))
    }

    /// Wraps an already-open connection. Test entry point, and the path a
    /// supervising caller uses when it manages the transport itself.
    pub fn from_connection(conn: Connection, identity: Identity) -> Client {
        let sender = FloodSender::start(conn.writer());

        Client {
            conn,
            sender,
            identity,
            input_queue: VecDeque::new(),
            running: Arc::new(AtomicBool::new(true)),
        }
    }

    /// Sends the USER/NICK login handshake.
    pub async fn logon(&mut self) -> Result<()> {
        self.conn.logon(&self.identity).await
    }

    /// Sends QUIT with the given reason.
    pub async fn logoff(&mut self, reason: &str) -> Result<()> {
        self.conn.logoff(reason).await
    }

    /// Stops the background sender tasks and releases the transport.
    pub async fn disconnect(self) -> Result<()> {
        let Client { conn, sender, .. } = self;
        drop(sender);
        conn.disconnect().await
    }

    /// Queues a raw line for throttled transmission. Never blocks, never
    /// fails visibly; transmission errors are logged in the background.
    pub fn write(&self, line: impl Into<String>) {
        self.sender.write(line);
    }

    /// Writes a raw line immediately, bypassing the flood queue. Blocks
    /// for the duration of one transport write and surfaces its errors.
    /// May overtake lines still queued behind [`Client::write`].
    pub async fn write_now(&self, line: &str) -> Result<()> {
        self.conn.write_now(line).await
    }

    /// Sends a NOTICE to a target through the flood queue.
    pub fn notice(&self, target: &str, text: &str) {
        self.write(format!("{} {} :{}", irc::CMD_NOTICE, target, text));
    }

    /// Responds to a sender/target pair with a NOTICE: to the channel when
    /// the target was one, otherwise back to the sender's nick.
    pub fn respond(&self, sender: &str, target: &str, text: &str) {
        self.notice(respond_target(sender, target), text);
    }

    /// Whether the dispatch loop should keep going. Cleared via
    /// [`Client::set_running`] or through a cloned
    /// [`Client::running_flag`] from any thread.
    pub fn running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    /// Sets or clears the running flag.
    pub fn set_running(&self, running: bool) {
        self.running.store(running, Ordering::SeqCst);
    }

    /// A clone of the running flag, for stopping the loop externally.
    pub fn running_flag(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.running)
    }

    /// The identity this client logs on with.
    pub fn identity(&self) -> &Identity {
        &self.identity
    }

    /// The client's name (login user and nick).
    pub fn name(&self) -> &str {
        &self.identity.name
    }

    /// Number of raw lines waiting in the inbound queue.
    pub fn queued_lines(&self) -> usize {
        self.input_queue.len()
    }

    /// Pops the next raw line off the inbound queue. Never blocks; an
    /// empty queue yields `None`.
    pub fn next_line(&mut self) -> Option<String> {
        self.input_queue.pop_front()
    }

    /// Reads at least one line from the transport (waiting if necessary),
    /// then keeps appending lines to the inbound queue as long as more
    /// input is already buffered.
    pub(crate) async fn fill(&mut self) -> Result<()> {
        loop {
            let line = self.conn.read().await?;
            self.input_queue.push_back(line);

            if self.conn.would_block() {
                return Ok(());
            }
        }
    }

    /// Pushes previously-consumed lines back onto the front of the inbound
    /// queue, preserving their original order.
    pub(crate) fn restore_lines(&mut self, lines: impl DoubleEndedIterator<Item = String>) {
        for line in lines.rev() {
            self.input_queue.push_front(line);
        }
    }
}

fn respond_target<'a>(sender: &'a str, target: &'a str) -> &'a str {
    if target.starts_with('#') {
        target
    } else {
        nick_from_mask(sender)
    }
}

/// The foreground dispatch loop: a client plus its ordered listeners.
pub struct Engine {
    client: Client,
    listeners: Vec<Box<dyn Listener>>,
}

impl Engine {
    pub fn new(client: Client) -> Engine {
        Engine {
            client,
            listeners: Vec::new(),
        }
    }

    /// Appends a listener. Registration order is dispatch order; listeners
    /// are never deduplicated. Register everything before calling
    /// [`Engine::run`].
    pub fn add_listener(&mut self, listener: Box<dyn Listener>) {
        self.listeners.push(listener);
    }

    pub fn client(&self) -> &Client {
        &self.client
    }

    pub fn client_mut(&mut self) -> &mut Client {
        &mut self.client
    }

    /// Tears the engine down into its client.
    pub fn into_client(self) -> Client {
        self.client
    }

    /// Runs the dispatch loop until the running flag is cleared.
    ///
    /// Messages reach listeners in the exact order received from the
    /// transport. The only error that escapes is
    /// [`EngineError::ConnectionLost`](crate::EngineError::ConnectionLost);
    /// the supervising caller is expected to catch it, wait, and establish
    /// a fresh connection.
    pub async fn run(&mut self) -> Result<()> {
        while self.client.running() {
            self.client.fill().await?;

            while let Some(line) = self.client.next_line() {
                let Some(msg) = Message::parse(&line) else {
                    continue;
                };

                for listener in self.listeners.iter_mut() {
                    if let Err(e) = listener.on_message(&msg, &mut self.client).await {
                        error!("error dispatching IRC message: {e:#}");
                    }
                }
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_respond_target_channel_goes_to_channel() {
        assert_eq!(respond_target("alice!a@host", "#chan"), "#chan");
    }

    #[test]
    fn test_respond_target_private_goes_to_sender_nick() {
        assert_eq!(respond_target("alice!a@host", "botnick"), "alice");
        assert_eq!(respond_target("plainnick", "botnick"), "plainnick");
    }
}
