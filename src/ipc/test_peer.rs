//! In-process stand-in for the chat client's IPC server, for tests.
//!
//! Binds `discord-ipc-0` in a directory, answers every handshake according
//! to a [`Script`], and reports accepted connections, received frames, sent
//! frames and hang-ups on a channel. Connections are numbered from 0 in
//! accept order.

use std::path::Path;
use std::time::Duration;

use futures::{SinkExt, StreamExt};
use tokio::net::UnixListener;
use tokio::sync::mpsc::{UnboundedReceiver, unbounded_channel};
use tokio::task::JoinHandle;
use tokio_util::codec::Framed;

use super::codec::{IpcCodec, IpcFrame, Opcode};
use super::locator::{SOCKET_NAME, SocketLocator};

const READY: &[u8] = br#"{"cmd":"DISPATCH","evt":"READY","data":{"v":1}}"#;
const REFUSED: &[u8] = br#"{"code":4000,"message":"Invalid Client ID"}"#;
pub(crate) const PING_BODY: &[u8] = br#"{"t":1}"#;
const WAIT: Duration = Duration::from_secs(2);

/// How the peer answers a handshake.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Script {
    /// READY, then keep reading.
    Ready,
    /// Close frame, then hang up.
    Refuse,
    /// Never reply; keep reading.
    Silent,
    /// READY followed by a ping.
    PingAfterReady,
    /// READY, then a close frame and hang up.
    HangUpAfterReady,
}

impl Script {
    fn replies(self) -> Vec<IpcFrame> {
        let ready = IpcFrame::new(Opcode::Frame, READY);
        let close = IpcFrame::new(Opcode::Close, REFUSED);
        match self {
            Self::Ready => vec![ready],
            Self::Refuse => vec![close],
            Self::Silent => Vec::new(),
            Self::PingAfterReady => vec![ready, IpcFrame::new(Opcode::Ping, PING_BODY)],
            Self::HangUpAfterReady => vec![ready, close],
        }
    }

    fn hangs_up(self) -> bool {
        matches!(self, Self::Refuse | Self::HangUpAfterReady)
    }
}

#[derive(Debug, Clone)]
pub(crate) enum PeerEvent {
    Accepted(usize),
    Frame(usize, IpcFrame),
    /// The peer wrote a frame with this opcode.
    Sent(usize, i32),
    Closed(usize),
}

pub(crate) struct TestPeer {
    locator: SocketLocator,
    events: UnboundedReceiver<PeerEvent>,
    seen: Vec<PeerEvent>,
    task: JoinHandle<()>,
    _dir: Option<tempfile::TempDir>,
}

impl TestPeer {
    /// Listen in a fresh temporary runtime directory.
    pub(crate) async fn start() -> Self {
        Self::start_scripted(Script::Ready).await
    }

    pub(crate) async fn start_scripted(script: Script) -> Self {
        let dir = tempfile::tempdir().unwrap();
        let mut peer = Self::bind_scripted(dir.path(), script).await;
        peer._dir = Some(dir);
        peer
    }

    /// Listen at `<runtime_dir>/discord-ipc-0`.
    pub(crate) async fn bind(runtime_dir: &Path) -> Self {
        Self::bind_scripted(runtime_dir, Script::Ready).await
    }

    pub(crate) async fn bind_scripted(runtime_dir: &Path, script: Script) -> Self {
        let listener = UnixListener::bind(runtime_dir.join(SOCKET_NAME)).unwrap();
        let (tx, events) = unbounded_channel();

        let task = tokio::spawn(async move {
            let mut next_id = 0;
            while let Ok((stream, _)) = listener.accept().await {
                let id = next_id;
                next_id += 1;
                let _ = tx.send(PeerEvent::Accepted(id));

                let tx = tx.clone();
                tokio::spawn(async move {
                    let mut framed = Framed::new(stream, IpcCodec);
                    while let Some(Ok(frame)) = framed.next().await {
                        let handshake = frame.opcode == Opcode::Handshake as i32;
                        let _ = tx.send(PeerEvent::Frame(id, frame));
                        if !handshake {
                            continue;
                        }
                        for reply in script.replies() {
                            let opcode = reply.opcode;
                            if framed.send(reply).await.is_ok() {
                                let _ = tx.send(PeerEvent::Sent(id, opcode));
                            }
                        }
                        if script.hangs_up() {
                            break;
                        }
                    }
                    drop(framed);
                    let _ = tx.send(PeerEvent::Closed(id));
                });
            }
        });

        Self {
            locator: SocketLocator::with_runtime_dir(runtime_dir),
            events,
            seen: Vec::new(),
            task,
            _dir: None,
        }
    }

    pub(crate) fn locator(&self) -> SocketLocator {
        self.locator.clone()
    }

    /// Next event, failing the test if none arrives in time.
    pub(crate) async fn next_event(&mut self) -> PeerEvent {
        let event = tokio::time::timeout(WAIT, self.events.recv())
            .await
            .expect("timed out waiting for peer event")
            .expect("peer task ended");
        self.seen.push(event.clone());
        event
    }

    /// Wait until `n` frames have arrived on connection `conn`.
    pub(crate) async fn frames_on(&mut self, conn: usize, n: usize) -> Vec<IpcFrame> {
        loop {
            let frames = self.seen_frames(conn);
            if frames.len() >= n {
                return frames;
            }
            self.next_event().await;
        }
    }

    /// Wait until the peer has written a frame with `opcode` on `conn`.
    pub(crate) async fn expect_sent(&mut self, conn: usize, opcode: Opcode) {
        let opcode = opcode as i32;
        while !self
            .seen
            .iter()
            .any(|e| matches!(e, PeerEvent::Sent(id, op) if *id == conn && *op == opcode))
        {
            self.next_event().await;
        }
    }

    /// Wait until connection `conn` has hung up.
    pub(crate) async fn expect_closed(&mut self, conn: usize) {
        while !self
            .seen
            .iter()
            .any(|e| matches!(e, PeerEvent::Closed(id) if *id == conn))
        {
            self.next_event().await;
        }
    }

    /// Drain events that arrive within `quiet`, then return how many
    /// connections have been accepted so far.
    pub(crate) async fn settle_accepted(&mut self, quiet: Duration) -> usize {
        while let Ok(Some(event)) = tokio::time::timeout(quiet, self.events.recv()).await {
            self.seen.push(event);
        }
        self.seen
            .iter()
            .filter(|e| matches!(e, PeerEvent::Accepted(_)))
            .count()
    }

    fn seen_frames(&self, conn: usize) -> Vec<IpcFrame> {
        self.seen
            .iter()
            .filter_map(|e| match e {
                PeerEvent::Frame(id, frame) if *id == conn => Some(frame.clone()),
                _ => None,
            })
            .collect()
    }
}

impl Drop for TestPeer {
    fn drop(&mut self) {
        self.task.abort();
    }
}
