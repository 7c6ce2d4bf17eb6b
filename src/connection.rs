//! Connection lifecycle and the keepalive-aware read path.
//!
//! A [`Connection`] exclusively owns one TCP or TLS transport to an IRC
//! server, split into a framed line reader and a shared framed writer. The
//! writer half is cloneable so the background flood sender can transmit
//! while the foreground loop keeps reading.

use std::sync::Arc;
use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use socket2::SockRef;
use tokio::io::{AsyncRead, AsyncWrite, ReadHalf, WriteHalf};
use tokio::net::TcpStream;
use tokio::sync::Mutex;
use tokio::time::timeout;
use tokio_rustls::rustls::pki_types::ServerName;
use tokio_rustls::rustls::{ClientConfig, RootCertStore};
use tokio_rustls::TlsConnector;
use tokio_util::codec::{FramedRead, FramedWrite};
use tracing::{info, trace, warn};

use crate::codec::LineCodec;
use crate::error::{EngineError, Result};
use crate::irc;

/// Default socket read timeout. A quiet server triggers a keepalive probe
/// after this long; two consecutive timeouts mean the connection is dead.
pub const DEFAULT_READ_TIMEOUT: Duration = Duration::from_secs(180);

/// Minimum size of the socket receive buffer.
pub const MIN_RECV_BUFFER_SIZE: usize = 8 * 1024;

/// A server to which the client can connect.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerTarget {
    /// Host name or address of the server.
    pub host: String,
    /// Port number, conventionally 6667 plain or 6697 TLS.
    pub port: u16,
    /// Whether to wrap the connection in TLS.
    pub use_tls: bool,
}

impl ServerTarget {
    pub fn new(host: impl Into<String>, port: u16, use_tls: bool) -> ServerTarget {
        ServerTarget {
            host: host.into(),
            port,
            use_tls,
        }
    }
}

/// The client's identity on the network.
///
/// `name` is used as both the login user and the nick.
#[derive(Debug, Clone)]
pub struct Identity {
    /// Login user and nick.
    pub name: String,
    /// Free-text description sent with USER.
    pub description: String,
    /// Separate real name; falls back to `description` when absent.
    pub real_name: Option<String>,
}

impl Identity {
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Identity {
        Identity {
            name: name.into(),
            description: description.into(),
            real_name: None,
        }
    }

    pub fn with_real_name(mut self, real_name: impl Into<String>) -> Identity {
        self.real_name = Some(real_name.into());
        self
    }
}

/// Object-safe bound for the boxed transport stream.
pub(crate) trait IrcStream: AsyncRead + AsyncWrite + Send + Sync + Unpin {}
impl<T: AsyncRead + AsyncWrite + Send + Sync + Unpin> IrcStream for T {}

type BoxedStream = Box<dyn IrcStream>;

/// Writer half of the transport, shared with the flood sender task.
pub(crate) type SharedWriter = Arc<Mutex<FramedWrite<WriteHalf<BoxedStream>, LineCodec>>>;

/// Sends one line through a shared writer, appending CR-LF and flushing.
pub(crate) async fn send_line(writer: &SharedWriter, line: &str) -> Result<()> {
    trace!(line, "writing");
    let mut writer = writer.lock().await;
    writer.send(line.to_string()).await?;
    Ok(())
}

/// An exclusively-owned transport to one IRC server.
pub struct Connection {
    reader: FramedRead<ReadHalf<BoxedStream>, LineCodec>,
    writer: SharedWriter,
    name: String,
    read_timeout: Duration,
    awaiting_pong: bool,
}

impl Connection {
    /// Connects to the server, tunes the socket, and performs the TLS
    /// handshake when the target asks for one.
    pub async fn open(target: &ServerTarget, identity: &Identity) -> Result<Connection> {
        info!(host = %target.host, port = target.port, tls = target.use_tls, "connecting");

        let tcp = TcpStream::connect((target.host.as_str(), target.port)).await?;
        tune_socket(&tcp);

        let stream: BoxedStream = if target.use_tls {
            let connector = TlsConnector::from(Arc::new(tls_config()));
            let server_name = ServerName::try_from(target.host.clone())
                .map_err(|_| EngineError::BadServerName(target.host.clone()))?;
            Box::new(connector.connect(server_name, tcp).await?)
        } else {
            Box::new(tcp)
        };

        Ok(Connection::from_stream(stream, &identity.name))
    }

    /// Builds a connection over an already-established stream. This is how
    /// tests drive the engine over an in-memory duplex pipe.
    pub fn from_stream(
        stream: impl AsyncRead + AsyncWrite + Send + Sync + Unpin + 'static,
        name: &str,
    ) -> Connection {
        let (read_half, write_half) = tokio::io::split(Box::new(stream) as BoxedStream);

        Connection {
            reader: FramedRead::new(read_half, LineCodec::new()),
            writer: Arc::new(Mutex::new(FramedWrite::new(write_half, LineCodec::new()))),
            name: name.to_string(),
            read_timeout: DEFAULT_READ_TIMEOUT,
            awaiting_pong: false,
        }
    }

    /// Sends the USER/NICK login handshake.
    pub async fn logon(&mut self, identity: &Identity) -> Result<()> {
        info!(name = %identity.name, "logging in");

        let real_name = identity
            .real_name
            .as_deref()
            .unwrap_or(&identity.description);
        self.write_now(&format!(
            "{} {} host irc :{}",
            irc::CMD_USER,
            identity.name,
            real_name
        ))
        .await?;
        self.write_now(&format!("{} {}", irc::CMD_NICK, identity.name))
            .await?;

        info!("login complete");
        Ok(())
    }

    /// Sends QUIT with the given reason.
    pub async fn logoff(&mut self, reason: &str) -> Result<()> {
        info!(reason, "quitting irc");
        self.write_now(&format!("{} :{}", irc::CMD_QUIT, reason)).await
    }

    /// Releases the transport. The writer is flushed and shut down first;
    /// the reader half drops with the connection.
    pub async fn disconnect(self) -> Result<()> {
        info!("disconnecting from server");
        let mut writer = self.writer.lock().await;
        writer.close().await?;
        Ok(())
    }

    /// Writes one line synchronously, bypassing any throttle. The CR-LF
    /// terminator is appended and the transport flushed before returning.
    /// May overtake lines still queued in the flood sender.
    pub async fn write_now(&self, line: &str) -> Result<()> {
        send_line(&self.writer, line).await
    }

    /// Reads the next line, probing a quiet server with PING.
    ///
    /// A read timeout with no pong outstanding sends `PING :<name>` and
    /// retries; any successful read counts as liveness and resets the
    /// probe state. A second consecutive timeout, an end of stream, or any
    /// other read error raises [`EngineError::ConnectionLost`], after
    /// which the connection must be abandoned.
    pub async fn read(&mut self) -> Result<String> {
        self.awaiting_pong = false;

        loop {
            match timeout(self.read_timeout, self.reader.next()).await {
                Ok(Some(Ok(line))) => {
                    self.awaiting_pong = false;
                    return Ok(line);
                }
                Ok(Some(Err(e))) => {
                    return Err(EngineError::connection_lost("read failed", Some(e)));
                }
                Ok(None) => {
                    return Err(EngineError::connection_lost("end of stream from server", None));
                }
                Err(_elapsed) => {
                    if self.awaiting_pong {
                        return Err(EngineError::connection_lost(
                            "server stopped responding to pings",
                            None,
                        ));
                    }

                    self.write_now(&format!("{} :{}", irc::CMD_PING, self.name))
                        .await
                        .map_err(|e| match e {
                            EngineError::Io(io) => {
                                EngineError::connection_lost("keepalive probe failed", Some(io))
                            }
                            other => other,
                        })?;
                    self.awaiting_pong = true;
                }
            }
        }
    }

    /// Best-effort hint that the next [`Connection::read`] will return
    /// without waiting. `false` is only reported when a complete line is
    /// already buffered; a `true` may still be wrong the other way.
    pub fn would_block(&self) -> bool {
        !self.reader.read_buffer().contains(&b'\n')
    }

    /// The client name used for keepalive probes.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The configured socket read timeout.
    pub fn read_timeout(&self) -> Duration {
        self.read_timeout
    }

    /// Overrides the socket read timeout.
    pub fn set_read_timeout(&mut self, read_timeout: Duration) {
        self.read_timeout = read_timeout;
    }

    /// Clones the shared writer handle for the flood sender task.
    pub(crate) fn writer(&self) -> SharedWriter {
        Arc::clone(&self.writer)
    }
}

/// Enlarges the receive buffer to the configured minimum when the platform
/// default is smaller.
fn tune_socket(stream: &TcpStream) {
    let sock = SockRef::from(stream);

    match sock.recv_buffer_size() {
        Ok(size) if size < MIN_RECV_BUFFER_SIZE => {
            if let Err(e) = sock.set_recv_buffer_size(MIN_RECV_BUFFER_SIZE) {
                warn!("failed to enlarge receive buffer: {e}");
            }
        }
        Ok(_) => {}
        Err(e) => warn!("failed to query receive buffer size: {e}"),
    }
}

fn tls_config() -> ClientConfig {
    let roots = RootCertStore::from_iter(webpki_roots::TLS_SERVER_ROOTS.iter().cloned());
    ClientConfig::builder()
        .with_root_certificates(roots)
        .with_no_client_auth()
}
