//! Behavioral tests for the engine over an in-memory duplex transport.
//!
//! Time-sensitive cases run with the tokio clock paused so keepalive
//! timeouts and decay ticks fire deterministically via auto-advance.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use tokio::io::{AsyncBufReadExt, AsyncReadExt, AsyncWriteExt, BufReader, DuplexStream};
use tokio::time::Instant;

use slirc_engine::{
    Client, Connection, Engine, Identity, Listener, Message, MessageWait, MessageWaitRestore,
};

const READ_TIMEOUT: Duration = Duration::from_secs(5);

fn test_connection(stream: DuplexStream) -> Connection {
    let mut conn = Connection::from_stream(stream, "tester");
    conn.set_read_timeout(READ_TIMEOUT);
    conn
}

fn test_client(stream: DuplexStream) -> Client {
    Client::from_connection(
        test_connection(stream),
        Identity::new("tester", "test client"),
    )
}

#[tokio::test(start_paused = true)]
async fn keepalive_single_timeout_sends_one_probe() {
    let (client_io, server_io) = tokio::io::duplex(4096);
    let mut conn = test_connection(client_io);

    // The server stays silent until it sees the probe, then answers.
    let server = tokio::spawn(async move {
        let mut reader = BufReader::new(server_io);
        let mut line = String::new();
        reader.read_line(&mut line).await.unwrap();
        assert_eq!(line, "PING :tester\r\n");
        reader
            .get_mut()
            .write_all(b":srv PONG srv :tester\r\n")
            .await
            .unwrap();
    });

    // One timeout, one probe, no raised failure.
    let line = conn.read().await.unwrap();
    assert_eq!(line, ":srv PONG srv :tester");
    server.await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn keepalive_second_timeout_is_connection_lost() {
    let (client_io, mut server_io) = tokio::io::duplex(4096);
    let mut conn = test_connection(client_io);

    let err = conn.read().await.unwrap_err();
    assert!(err.is_connection_lost());

    // Exactly one probe was written before the connection was declared dead.
    drop(conn);
    let mut received = String::new();
    server_io.read_to_string(&mut received).await.unwrap();
    assert_eq!(received, "PING :tester\r\n");
}

#[tokio::test]
async fn keepalive_eof_is_connection_lost() {
    let (client_io, server_io) = tokio::io::duplex(4096);
    let mut conn = test_connection(client_io);

    drop(server_io);
    let err = conn.read().await.unwrap_err();
    assert!(err.is_connection_lost());
}

#[tokio::test(start_paused = true)]
async fn flood_sender_bursts_four_then_defers_the_fifth() {
    let (client_io, server_io) = tokio::io::duplex(16 * 1024);
    let client = test_client(client_io);

    let start = Instant::now();
    for i in 1..=5 {
        client.write(format!("PRIVMSG #chan :line {i}"));
    }

    let mut reader = BufReader::new(server_io);
    let mut arrivals = Vec::new();
    for _ in 0..5 {
        let mut line = String::new();
        reader.read_line(&mut line).await.unwrap();
        arrivals.push((line.trim_end().to_string(), start.elapsed()));
    }

    // FIFO enqueue order is preserved on the wire.
    for (i, (line, _)) in arrivals.iter().enumerate() {
        assert_eq!(line, &format!("PRIVMSG #chan :line {}", i + 1));
    }

    // Weight 4.0 >= threshold 3.9 after four instant sends: the first four
    // go out unthrottled, the fifth waits for at least one decay tick.
    for (line, at) in &arrivals[..4] {
        assert!(*at < Duration::from_secs(1), "{line} was throttled at {at:?}");
    }
    assert!(arrivals[4].1 >= Duration::from_secs(1));
}

#[tokio::test]
async fn write_now_bypasses_the_flood_queue() {
    let (client_io, server_io) = tokio::io::duplex(4096);
    let client = test_client(client_io);

    client.write_now("PONG :srv").await.unwrap();

    let mut reader = BufReader::new(server_io);
    let mut line = String::new();
    reader.read_line(&mut line).await.unwrap();
    assert_eq!(line, "PONG :srv\r\n");
}

#[tokio::test]
async fn lookahead_restore_preserves_order_and_is_single_shot() {
    let (client_io, mut server_io) = tokio::io::duplex(4096);
    let mut client = test_client(client_io);

    for i in 1..=5 {
        server_io
            .write_all(format!(":srv PRIVMSG tester :L{i}\r\n").as_bytes())
            .await
            .unwrap();
    }

    {
        let mut wait = MessageWaitRestore::new(&mut client);
        for i in 1..=3 {
            let msg = wait.next_message().await.unwrap().unwrap();
            assert_eq!(msg.trailing(), Some(format!("L{i}").as_str()));
        }

        wait.restore();
        // Nothing freshly consumed: the second restore is a no-op.
        wait.restore();
    }

    assert_eq!(client.queued_lines(), 5);

    let mut wait = MessageWait::new(&mut client);
    for i in 1..=5 {
        let msg = wait.next_message().await.unwrap().unwrap();
        assert_eq!(msg.trailing(), Some(format!("L{i}").as_str()));
    }
}

#[tokio::test]
async fn wait_yields_none_once_stopped() {
    let (client_io, _server_io) = tokio::io::duplex(4096);
    let mut client = test_client(client_io);
    client.set_running(false);

    let mut wait = MessageWait::new(&mut client);
    assert!(wait.next_line().await.unwrap().is_none());
    assert!(wait.next_message().await.unwrap().is_none());
}

struct FailingListener;

#[async_trait]
impl Listener for FailingListener {
    async fn on_message(&mut self, _msg: &Message, _client: &mut Client) -> anyhow::Result<()> {
        anyhow::bail!("listener exploded")
    }
}

struct Recorder {
    seen: Arc<Mutex<Vec<String>>>,
    stop_after: usize,
}

#[async_trait]
impl Listener for Recorder {
    async fn on_message(&mut self, msg: &Message, client: &mut Client) -> anyhow::Result<()> {
        let mut seen = self.seen.lock().unwrap();
        seen.push(msg.to_string());
        if seen.len() >= self.stop_after {
            client.set_running(false);
        }
        Ok(())
    }
}

#[tokio::test]
async fn failing_listener_does_not_stop_dispatch() {
    let (client_io, mut server_io) = tokio::io::duplex(4096);
    let client = test_client(client_io);

    // A blank line sits between the messages; it must be skipped, not
    // dispatched.
    server_io
        .write_all(b":a!b@c PRIVMSG tester :first\r\n\r\n:a!b@c PRIVMSG tester :second\r\n")
        .await
        .unwrap();

    let seen = Arc::new(Mutex::new(Vec::new()));
    let mut engine = Engine::new(client);
    engine.add_listener(Box::new(FailingListener));
    engine.add_listener(Box::new(Recorder {
        seen: Arc::clone(&seen),
        stop_after: 2,
    }));

    engine.run().await.unwrap();

    let seen = seen.lock().unwrap();
    assert_eq!(
        *seen,
        [
            ":a!b@c PRIVMSG tester :first",
            ":a!b@c PRIVMSG tester :second",
        ]
    );
}

#[tokio::test]
async fn run_propagates_connection_lost() {
    let (client_io, server_io) = tokio::io::duplex(4096);
    let client = test_client(client_io);

    drop(server_io);
    let mut engine = Engine::new(client);
    let err = engine.run().await.unwrap_err();
    assert!(err.is_connection_lost());
}

#[tokio::test]
async fn notice_and_respond_route_through_the_flood_queue() {
    let (client_io, server_io) = tokio::io::duplex(4096);
    let client = test_client(client_io);

    client.respond("alice!a@host", "#chan", "to the channel");
    client.respond("alice!a@host", "tester", "to the sender");

    let mut reader = BufReader::new(server_io);
    let mut first = String::new();
    reader.read_line(&mut first).await.unwrap();
    let mut second = String::new();
    reader.read_line(&mut second).await.unwrap();

    assert_eq!(first, "NOTICE #chan :to the channel\r\n");
    assert_eq!(second, "NOTICE alice :to the sender\r\n");
}
