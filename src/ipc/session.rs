//! Connection session: one live socket, the handshake and activity
//! updates.
//!
//! States are `Disconnected` and `Connected(client_id)`. The client id is
//! stored inside the connection value, so "has an active id" and "has a
//! live socket" cannot disagree.

use std::future::Future;
use std::path::{Path, PathBuf};
use std::time::Duration;

use futures::{FutureExt, SinkExt, StreamExt};
use tokio::net::UnixStream;
use tokio_util::codec::Framed;

use super::IpcError;
use super::codec::{IpcCodec, IpcFrame, Opcode};
use super::locator::SocketLocator;
use super::protocol::{self, Activity, Handshake, NonceSource};

/// Default bound on each socket operation.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(2);

struct Connection {
    framed: Framed<UnixStream, IpcCodec>,
    client_id: String,
    last_pid: Option<u32>,
}

/// The bridge's single connection to the chat client.
pub struct Session {
    locator: SocketLocator,
    socket_path: Option<PathBuf>,
    conn: Option<Connection>,
    timeout: Duration,
    nonces: NonceSource,
}

impl Session {
    pub fn new(locator: SocketLocator, timeout: Duration) -> Self {
        // Probe once up front; a miss here is normal when the client
        // starts after us.
        let socket_path = locator.locate();
        Self {
            locator,
            socket_path,
            conn: None,
            timeout,
            nonces: NonceSource::default(),
        }
    }

    pub fn is_connected(&self) -> bool {
        self.conn.is_some()
    }

    /// Client id of the live connection, if any.
    pub fn active_client_id(&self) -> Option<&str> {
        self.conn.as_ref().map(|c| c.client_id.as_str())
    }

    /// Cached socket path from the last successful probe.
    pub fn socket_path(&self) -> Option<&PathBuf> {
        self.socket_path.as_ref()
    }

    /// `Disconnected -> Connected(client_id)`.
    ///
    /// Opens the socket, sends the opcode-0 handshake, and reads one reply
    /// frame. The reply body is returned for logging only. On open or
    /// write failure the session stays disconnected and the cached socket
    /// path is dropped so the next attempt re-probes. A close frame or EOF
    /// in place of the reply means the peer refused the handshake: the
    /// socket is dropped and [`IpcError::Closed`] returned. A late reply
    /// keeps the connection.
    pub async fn connect(&mut self, client_id: &str) -> Result<Option<IpcFrame>, IpcError> {
        if self.conn.is_some() {
            self.disconnect(false).await;
        }

        let path = match self.socket_path.take() {
            Some(path) => path,
            None => self
                .locator
                .locate()
                .ok_or_else(|| IpcError::SocketNotFound(self.locator.runtime_dir().to_path_buf()))?,
        };

        let mut framed = match self.open(&path, client_id).await {
            Ok(framed) => framed,
            Err(e) => {
                tracing::debug!(path = %path.display(), error = %e, "dropping cached socket path");
                return Err(e);
            }
        };
        self.socket_path = Some(path);

        let reply = match tokio::time::timeout(self.timeout, framed.next()).await {
            Ok(Some(Ok(frame))) if frame.opcode == Opcode::Close as i32 => {
                tracing::warn!(client_id, body = %frame.body_text(), "handshake refused");
                return Err(IpcError::Closed);
            }
            Ok(Some(Ok(frame))) => {
                tracing::info!(
                    opcode = frame.opcode,
                    body = %frame.body_text(),
                    "handshake reply"
                );
                Some(frame)
            }
            Ok(Some(Err(e))) => {
                tracing::warn!(error = %e, "failed to read handshake reply");
                None
            }
            Ok(None) => {
                tracing::warn!(client_id, "peer closed the socket before replying to the handshake");
                return Err(IpcError::Closed);
            }
            Err(_) => {
                tracing::warn!(after = ?self.timeout, "no handshake reply");
                None
            }
        };

        self.conn = Some(Connection {
            framed,
            client_id: client_id.to_string(),
            last_pid: None,
        });
        Ok(reply)
    }

    async fn open(
        &self,
        path: &Path,
        client_id: &str,
    ) -> Result<Framed<UnixStream, IpcCodec>, IpcError> {
        let stream = bounded("connect", self.timeout, async {
            UnixStream::connect(path).await.map_err(IpcError::from)
        })
        .await?;
        let mut framed = Framed::new(stream, IpcCodec);

        let body = serde_json::to_vec(&Handshake::new(client_id))?;
        tracing::debug!(path = %path.display(), client_id, "sending handshake");
        bounded(
            "handshake write",
            self.timeout,
            framed.send(IpcFrame::new(Opcode::Handshake, body)),
        )
        .await?;
        Ok(framed)
    }

    /// `Connected(id) -> Connected(id)`: send a `SET_ACTIVITY` command.
    ///
    /// No reply is awaited. Frames the peer has already sent are drained
    /// first; if the peer has hung up, or the write fails, the connection
    /// is dropped and the session becomes disconnected.
    pub async fn set_activity(&mut self, pid: u32, activity: Activity) -> Result<(), IpcError> {
        let result = self.send_activity(pid, activity).await;
        if let Err(e) = &result
            && !matches!(e, IpcError::NotConnected)
            && let Some(conn) = self.conn.take()
        {
            tracing::warn!(client_id = %conn.client_id, error = %e, "connection lost");
        }
        result
    }

    async fn send_activity(&mut self, pid: u32, activity: Activity) -> Result<(), IpcError> {
        let timeout = self.timeout;
        let Some(conn) = self.conn.as_mut() else {
            return Err(IpcError::NotConnected);
        };
        drain_pending(conn, timeout).await?;

        let cleared = activity.is_empty();
        let cmd = protocol::set_activity(self.nonces.next(), pid, activity);
        let body = serde_json::to_vec(&cmd)?;
        bounded(
            "activity write",
            timeout,
            conn.framed.send(IpcFrame::new(Opcode::Frame, body)),
        )
        .await?;
        conn.last_pid = Some(pid);
        tracing::debug!(client_id = %conn.client_id, pid, cleared, nonce = %cmd.nonce, "activity sent");
        Ok(())
    }

    /// `Connected(_) -> Disconnected`. No-op when already disconnected.
    ///
    /// With `clear`, an empty activity is sent first so the status
    /// disappears without waiting for the peer to notice the close.
    pub async fn disconnect(&mut self, clear: bool) {
        let Some(mut conn) = self.conn.take() else {
            return;
        };

        if clear {
            let pid = conn.last_pid.unwrap_or_else(std::process::id);
            let cmd = protocol::set_activity(self.nonces.next(), pid, Activity::default());
            let sent = match serde_json::to_vec(&cmd) {
                Ok(body) => {
                    bounded(
                        "clear write",
                        self.timeout,
                        conn.framed.send(IpcFrame::new(Opcode::Frame, body)),
                    )
                    .await
                }
                Err(e) => Err(e.into()),
            };
            if let Err(e) = sent {
                tracing::debug!(error = %e, "failed to clear activity before closing");
            }
        }

        let closing = SinkExt::<IpcFrame>::close(&mut conn.framed);
        if let Err(e) = bounded("close", self.timeout, closing).await {
            tracing::debug!(error = %e, "error while closing IPC socket");
        }
        tracing::info!(client_id = %conn.client_id, "IPC connection closed");
    }
}

/// Handle whatever the peer sent since the last write, without blocking.
///
/// Replies to `SET_ACTIVITY` are logged and dropped, pings are answered,
/// and a close frame or EOF ends the connection.
async fn drain_pending(conn: &mut Connection, timeout: Duration) -> Result<(), IpcError> {
    while let Some(next) = conn.framed.next().now_or_never() {
        let frame = match next {
            Some(frame) => frame?,
            None => return Err(IpcError::Closed),
        };
        match Opcode::from_raw(frame.opcode) {
            Some(Opcode::Ping) => {
                bounded(
                    "pong write",
                    timeout,
                    conn.framed.send(IpcFrame::new(Opcode::Pong, frame.body)),
                )
                .await?;
            }
            Some(Opcode::Close) => {
                tracing::warn!(body = %frame.body_text(), "peer sent close frame");
                return Err(IpcError::Closed);
            }
            _ => {
                tracing::trace!(opcode = frame.opcode, body = %frame.body_text(), "peer frame");
            }
        }
    }
    Ok(())
}

/// Run a socket operation under a deadline.
async fn bounded<T>(
    op: &'static str,
    after: Duration,
    fut: impl Future<Output = Result<T, IpcError>>,
) -> Result<T, IpcError> {
    tokio::time::timeout(after, fut)
        .await
        .map_err(|_| IpcError::Timeout { op, after })?
}
