//! Minimal bot built on the engine.
//!
//! Connects to Libera over TLS, logs on, answers keepalive PINGs, and
//! echoes channel messages that greet it. The reconnect policy lives out
//! here in the supervising loop, not in the engine.

use std::time::Duration;

use async_trait::async_trait;
use slirc_engine::{irc, Client, Engine, Identity, Listener, Message, ServerTarget};
use tracing::{error, info};

struct PingResponder;

#[async_trait]
impl Listener for PingResponder {
    async fn on_message(&mut self, msg: &Message, client: &mut Client) -> anyhow::Result<()> {
        if msg.is(irc::CMD_PING) {
            let token = msg.trailing().unwrap_or_default();
            client.write_now(&format!("{} :{}", irc::CMD_PONG, token)).await?;
        }
        Ok(())
    }
}

struct Greeter {
    channel: String,
}

#[async_trait]
impl Listener for Greeter {
    async fn on_message(&mut self, msg: &Message, client: &mut Client) -> anyhow::Result<()> {
        if msg.is(irc::RPL_WELCOME) {
            client.write(format!("{} {}", irc::CMD_JOIN, self.channel));
        }

        if msg.is(irc::CMD_PRIVMSG) {
            let text = msg.trailing().unwrap_or_default();
            if text.contains("hello") {
                if let Some(sender) = msg.prefix() {
                    let target = msg.param(0).unwrap_or(&self.channel);
                    client.respond(sender, target, "hello yourself");
                }
            }
        }
        Ok(())
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();

    let target = ServerTarget::new("irc.libera.chat", 6697, true);

    loop {
        let identity = Identity::new("slirc_demo_bot", "slirc-engine demo bot");
        let mut client = Client::connect(&target, identity).await?;
        client.logon().await?;

        let mut engine = Engine::new(client);
        engine.add_listener(Box::new(PingResponder));
        engine.add_listener(Box::new(Greeter {
            channel: "#slirc-demo".to_string(),
        }));

        match engine.run().await {
            Ok(()) => {
                info!("engine stopped, shutting down");
                engine.into_client().disconnect().await?;
                return Ok(());
            }
            Err(e) => {
                error!("connection lost: {e}; reconnecting shortly");
                tokio::time::sleep(Duration::from_secs(30)).await;
            }
        }
    }
}
