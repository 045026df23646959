//! JSON payloads carried in IPC frames.

use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};

/// Handshake protocol version. The peer only speaks version 1.
pub const PROTOCOL_VERSION: u32 = 1;

/// Command name for presence updates.
pub const SET_ACTIVITY: &str = "SET_ACTIVITY";

/// Image key used for every activity; registered applications expose a
/// `default` asset, unregistered ones simply show no image.
pub const DEFAULT_IMAGE: &str = "default";

/// Opcode-0 body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Handshake {
    pub v: u32,
    pub client_id: String,
}

impl Handshake {
    pub fn new(client_id: impl Into<String>) -> Self {
        Self {
            v: PROTOCOL_VERSION,
            client_id: client_id.into(),
        }
    }
}

/// Opcode-1 command body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Command<A> {
    pub cmd: String,
    pub nonce: String,
    pub args: A,
}

/// Arguments of a `SET_ACTIVITY` command.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActivityArgs {
    pub pid: u32,
    pub activity: Activity,
}

/// Displayed presence. `Activity::default()` serializes to `{}`, which
/// clears the status on the peer.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Activity {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assets: Option<ActivityAssets>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActivityAssets {
    pub large_image: String,
    pub large_text: String,
}

impl Activity {
    /// The status shown while `game` is running on `distro`.
    pub fn playing(game: &str, distro: &str) -> Self {
        Self {
            details: Some(format!("Playing {game}")),
            state: Some(format!("On {distro}")),
            assets: Some(ActivityAssets {
                large_image: DEFAULT_IMAGE.to_string(),
                large_text: game.to_string(),
            }),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.details.is_none() && self.state.is_none() && self.assets.is_none()
    }
}

/// Build a `SET_ACTIVITY` command.
pub fn set_activity(nonce: String, pid: u32, activity: Activity) -> Command<ActivityArgs> {
    Command {
        cmd: SET_ACTIVITY.to_string(),
        nonce,
        args: ActivityArgs { pid, activity },
    }
}

/// Nanosecond-timestamp nonces, strictly increasing per source even when
/// the clock stalls or steps backwards.
#[derive(Debug, Default)]
pub struct NonceSource {
    last: u128,
}

impl NonceSource {
    pub fn next(&mut self) -> String {
        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_nanos())
            .unwrap_or_default();
        self.last = now.max(self.last + 1);
        self.last.to_string()
    }
}
