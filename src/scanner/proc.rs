//! Process table access via `/proc/<pid>/exe` and `/proc/<pid>/cmdline`.
//!
//! Every per-process read is best-effort: processes exit between listing
//! and reading, and other users' `exe` links are not readable.

use std::io;
use std::path::{Path, PathBuf};

/// A process table rooted at some directory, normally `/proc`.
#[derive(Debug, Clone)]
pub struct ProcTable {
    root: PathBuf,
}

/// What could be read about one process.
#[derive(Debug, Default)]
pub struct ProcEntry {
    pub pid: u32,
    /// Target of the `exe` link, if readable.
    pub exe: Option<PathBuf>,
    /// NUL-separated arguments, if readable.
    pub args: Option<Vec<String>>,
}

impl ProcEntry {
    /// True when neither source could be read at all.
    pub fn unreadable(&self) -> bool {
        self.exe.is_none() && self.args.is_none()
    }
}

impl ProcTable {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Numeric entries of the table, ascending. Non-numeric entries
    /// (`self`, `sys`, `meminfo`, ...) are ignored.
    pub fn pids(&self) -> io::Result<Vec<u32>> {
        let mut pids: Vec<u32> = std::fs::read_dir(&self.root)?
            .flatten()
            .filter_map(|entry| entry.file_name().to_str()?.parse().ok())
            .collect();
        pids.sort_unstable();
        Ok(pids)
    }

    /// Read `exe` and `cmdline` for one process.
    pub fn entry(&self, pid: u32) -> ProcEntry {
        let dir = self.root.join(pid.to_string());
        ProcEntry {
            pid,
            exe: std::fs::read_link(dir.join("exe")).ok(),
            args: std::fs::read(dir.join("cmdline"))
                .ok()
                .map(|raw| split_cmdline(&raw)),
        }
    }
}

impl Default for ProcTable {
    fn default() -> Self {
        Self::new("/proc")
    }
}

/// Split a raw `cmdline` buffer on NUL, dropping empty pieces.
pub fn split_cmdline(raw: &[u8]) -> Vec<String> {
    raw.split(|&b| b == 0)
        .filter(|arg| !arg.is_empty())
        .map(|arg| String::from_utf8_lossy(arg).into_owned())
        .collect()
}
