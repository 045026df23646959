//! Steam game detection from the process table.
//!
//! A process belongs to a Steam game when its executable, or one of its
//! arguments, lives under `steamapps/common/<Folder>/`. The folder name is
//! what gets reported. Games run through Proton show up as a generic
//! wine or runtime binary, so the argument list is consulted as well.

pub mod ignore;
pub mod proc;

use crate::resolver::{DetectedGame, GameDetector, ScanError, ScanReport};

use self::ignore::IgnoreSet;
use self::proc::{ProcEntry, ProcTable};

/// Path segment Steam installs games under.
pub const STEAM_COMMON: &str = "steamapps/common";

/// Folder name directly below `steamapps/common` in `path`, if any.
///
/// The segment must be a whole path component pair, so
/// `steamapps/commonfoo/x` does not match.
pub fn extract_game_folder(path: &str) -> Option<&str> {
    path.match_indices(STEAM_COMMON).find_map(|(idx, _)| {
        let rest = path[idx + STEAM_COMMON.len()..].strip_prefix('/')?;
        let folder = rest.split('/').next()?;
        (!folder.is_empty()).then_some(folder)
    })
}

/// Candidate folder names for one process: the executable first, then
/// each argument in order. Windows-style arguments (`Z:\...\steamapps\common\...`)
/// are read with `\` as separator.
fn candidates(entry: &ProcEntry) -> Vec<String> {
    let mut names = Vec::new();
    if let Some(exe) = &entry.exe
        && let Some(folder) = exe.to_str().and_then(extract_game_folder)
    {
        names.push(folder.to_string());
    }
    for arg in entry.args.iter().flatten() {
        let arg = arg.replace('\\', "/");
        if let Some(folder) = extract_game_folder(&arg) {
            names.push(folder.to_string());
        }
    }
    names
}

/// [`GameDetector`] over a `/proc`-style process table.
pub struct ProcScanner {
    table: ProcTable,
    ignore: IgnoreSet,
}

impl ProcScanner {
    pub fn new(table: ProcTable, ignore: IgnoreSet) -> Self {
        Self { table, ignore }
    }

    /// Scanner over the live `/proc`.
    pub fn live(ignore: IgnoreSet) -> Self {
        Self::new(ProcTable::default(), ignore)
    }
}

impl GameDetector for ProcScanner {
    /// First non-ignored game in ascending pid order wins.
    fn scan(&mut self) -> Result<ScanReport, ScanError> {
        let pids = self
            .table
            .pids()
            .map_err(|source| ScanError::ProcUnavailable {
                path: self.table.root().to_path_buf(),
                source,
            })?;

        let mut skipped = 0;
        for pid in pids {
            let entry = self.table.entry(pid);
            if entry.unreadable() {
                skipped += 1;
                continue;
            }

            for name in candidates(&entry) {
                if self.ignore.contains(&name) {
                    tracing::trace!(pid, folder = %name, "ignored Steam folder");
                    continue;
                }
                return Ok(ScanReport {
                    game: Some(DetectedGame { name, pid }),
                    skipped,
                });
            }
        }

        Ok(ScanReport {
            game: None,
            skipped,
        })
    }
}
