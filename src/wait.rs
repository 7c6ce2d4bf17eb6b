//! Synchronous waits over the asynchronous inbound stream.
//!
//! A [`MessageWait`] lets a caller pull the next inbound message directly,
//! blocking the caller rather than the dispatch loop, since both draw from
//! the same queue. The restoring variant records everything it pulls so a
//! caller can look ahead through a run of messages for a specific reply
//! (a welcome or nickname-rejected numeric during logon, a names list
//! after a join) and then put the run back for the ordinary listeners.

use crate::client::Client;
use crate::error::Result;
use crate::message::Message;

/// Pulls inbound lines ahead of the dispatch loop, consuming them.
pub struct MessageWait<'a> {
    client: &'a mut Client,
}

impl<'a> MessageWait<'a> {
    pub fn new(client: &'a mut Client) -> MessageWait<'a> {
        MessageWait { client }
    }

    /// The next raw line, filling from the transport when the queue is
    /// empty. Returns `None` once the running flag has been cleared.
    pub async fn next_line(&mut self) -> Result<Option<String>> {
        next_queued_line(self.client).await
    }

    /// The next parseable message. Lines that parse to nothing are
    /// consumed and skipped.
    pub async fn next_message(&mut self) -> Result<Option<Message>> {
        loop {
            match self.next_line().await? {
                None => return Ok(None),
                Some(line) => {
                    if let Some(msg) = Message::parse(&line) {
                        return Ok(Some(msg));
                    }
                }
            }
        }
    }
}

/// Like [`MessageWait`], but records every pulled line so the run can be
/// pushed back onto the queue afterwards.
pub struct MessageWaitRestore<'a> {
    client: &'a mut Client,
    record: Vec<String>,
}

impl<'a> MessageWaitRestore<'a> {
    pub fn new(client: &'a mut Client) -> MessageWaitRestore<'a> {
        MessageWaitRestore {
            client,
            record: Vec::new(),
        }
    }

    /// The next raw line, saved for later restoration.
    pub async fn next_line(&mut self) -> Result<Option<String>> {
        let line = next_queued_line(self.client).await?;
        if let Some(line) = &line {
            self.record.push(line.clone());
        }
        Ok(line)
    }

    /// The next parseable message. Skipped lines are still recorded and
    /// will be restored along with everything else.
    pub async fn next_message(&mut self) -> Result<Option<Message>> {
        loop {
            match self.next_line().await? {
                None => return Ok(None),
                Some(line) => {
                    if let Some(msg) = Message::parse(&line) {
                        return Ok(Some(msg));
                    }
                }
            }
        }
    }

    /// Pushes every recorded line back onto the front of the inbound queue
    /// in original order. The record drains in the process, so a second
    /// restore with nothing freshly consumed is a no-op.
    pub fn restore(&mut self) {
        self.client.restore_lines(self.record.drain(..));
    }
}

/// Shared pull path: pop from the queue, filling first when it is empty.
async fn next_queued_line(client: &mut Client) -> Result<Option<String>> {
    if !client.running() {
        return Ok(None);
    }

    if client.queued_lines() == 0 {
        client.fill().await?;
    }

    Ok(client.next_line())
}
