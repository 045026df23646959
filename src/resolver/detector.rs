//! GameDetector trait: reports which Steam game, if any, is running.

use std::path::PathBuf;

/// A running game found in one scan.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DetectedGame {
    /// Folder name under `steamapps/common` (e.g. `"Balatro"`).
    pub name: String,
    /// PID of the process the name was taken from.
    pub pid: u32,
}

/// Result of one scan.
///
/// `game: None` with `skipped > 0` means nothing was found among the
/// entries that could be read; callers can tell a clean miss apart from a
/// partial one.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScanReport {
    pub game: Option<DetectedGame>,
    /// Process entries that vanished or could not be read.
    pub skipped: usize,
}

impl ScanReport {
    pub fn found(name: impl Into<String>, pid: u32) -> Self {
        Self {
            game: Some(DetectedGame {
                name: name.into(),
                pid,
            }),
            skipped: 0,
        }
    }

    pub fn none() -> Self {
        Self::default()
    }
}

/// Scan failure that invalidates the whole tick.
#[derive(Debug, thiserror::Error)]
pub enum ScanError {
    #[error("cannot list process table at {path}: {source}")]
    ProcUnavailable {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// Identifies at most one running game per call.
///
/// Implementations must tolerate individual entries disappearing or being
/// unreadable mid-scan; only a failure to enumerate at all is an error.
pub trait GameDetector {
    fn scan(&mut self) -> Result<ScanReport, ScanError>;
}
