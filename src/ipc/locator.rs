//! IPC socket discovery.
//!
//! The chat client listens on `discord-ipc-0` under the user's runtime
//! directory. Sandboxed installs put it one level deeper, so the native
//! path is tried first, then Flatpak, then Snap.

use std::path::{Path, PathBuf};

/// Socket file name. The client takes the lowest free index; a single
/// running client always owns 0.
pub const SOCKET_NAME: &str = "discord-ipc-0";

/// Directories, relative to the runtime dir, that may hold the socket.
const CANDIDATE_DIRS: [&str; 3] = ["", "app/com.discordapp.Discord", "snap.discord"];

/// Probes the fixed candidate paths under one runtime directory.
#[derive(Debug, Clone)]
pub struct SocketLocator {
    runtime_dir: PathBuf,
}

impl SocketLocator {
    /// Locator for the current user: `$XDG_RUNTIME_DIR`, falling back to
    /// `/run/user/<uid>`.
    pub fn for_current_user() -> Self {
        let runtime_dir = std::env::var_os("XDG_RUNTIME_DIR")
            .filter(|v| !v.is_empty())
            .map(PathBuf::from)
            .unwrap_or_else(|| {
                PathBuf::from(format!("/run/user/{}", nix::unistd::getuid().as_raw()))
            });
        Self { runtime_dir }
    }

    pub fn with_runtime_dir(runtime_dir: impl Into<PathBuf>) -> Self {
        Self {
            runtime_dir: runtime_dir.into(),
        }
    }

    pub fn runtime_dir(&self) -> &Path {
        &self.runtime_dir
    }

    /// All candidate paths, in probe order.
    pub fn candidates(&self) -> Vec<PathBuf> {
        CANDIDATE_DIRS
            .iter()
            .map(|dir| self.runtime_dir.join(dir).join(SOCKET_NAME))
            .collect()
    }

    /// First candidate that exists on the filesystem.
    pub fn locate(&self) -> Option<PathBuf> {
        let found = self.candidates().into_iter().find(|p| p.exists());
        match &found {
            Some(path) => tracing::debug!(path = %path.display(), "found IPC socket"),
            None => tracing::debug!(
                runtime_dir = %self.runtime_dir.display(),
                "no IPC socket in any candidate location"
            ),
        }
        found
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn candidate_order() {
        let locator = SocketLocator::with_runtime_dir("/run/user/1000");
        assert_eq!(
            locator.candidates(),
            vec![
                PathBuf::from("/run/user/1000/discord-ipc-0"),
                PathBuf::from("/run/user/1000/app/com.discordapp.Discord/discord-ipc-0"),
                PathBuf::from("/run/user/1000/snap.discord/discord-ipc-0"),
            ]
        );
    }

    #[test]
    fn locate_none_when_empty() {
        let dir = tempfile::tempdir().unwrap();
        let locator = SocketLocator::with_runtime_dir(dir.path());
        assert_eq!(locator.locate(), None);
    }

    #[test]
    fn locate_flatpak_only() {
        let dir = tempfile::tempdir().unwrap();
        let flatpak = dir.path().join("app/com.discordapp.Discord");
        std::fs::create_dir_all(&flatpak).unwrap();
        std::fs::write(flatpak.join(SOCKET_NAME), b"").unwrap();

        let locator = SocketLocator::with_runtime_dir(dir.path());
        assert_eq!(locator.locate(), Some(flatpak.join(SOCKET_NAME)));
    }

    #[test]
    fn native_wins_over_sandboxed() {
        let dir = tempfile::tempdir().unwrap();
        let snap = dir.path().join("snap.discord");
        std::fs::create_dir_all(&snap).unwrap();
        std::fs::write(snap.join(SOCKET_NAME), b"").unwrap();
        std::fs::write(dir.path().join(SOCKET_NAME), b"").unwrap();

        let locator = SocketLocator::with_runtime_dir(dir.path());
        assert_eq!(locator.locate(), Some(dir.path().join(SOCKET_NAME)));
    }
}
