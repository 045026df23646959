//! Local IPC with the chat client: framing, payloads, socket discovery
//! and the connection session.
//!
//! Wire format: an 8-byte little-endian header (`opcode: i32`,
//! `length: u32`) followed by `length` bytes of UTF-8 JSON.

pub mod codec;
pub mod locator;
pub mod protocol;
pub mod session;

#[cfg(test)]
pub(crate) mod test_peer;

use std::path::PathBuf;
use std::time::Duration;

/// Errors produced by the IPC layer.
#[derive(Debug, thiserror::Error)]
pub enum IpcError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("no IPC socket found under {0}")]
    SocketNotFound(PathBuf),

    #[error("frame truncated: need {needed} bytes, have {available}")]
    Truncated { needed: usize, available: usize },

    #[error("frame body of {0} bytes exceeds the maximum")]
    FrameTooLarge(usize),

    #[error("payload encoding failed: {0}")]
    Json(#[from] serde_json::Error),

    #[error("{op} timed out after {after:?}")]
    Timeout { op: &'static str, after: Duration },

    #[error("peer closed the connection")]
    Closed,

    #[error("not connected")]
    NotConnected,
}
