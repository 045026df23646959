//! Folders under `steamapps/common` that are tooling, not games.

use std::collections::HashSet;

/// Runtime, compatibility-layer and helper folders Steam installs next to
/// games. Their processes (pressure-vessel, shader pre-compilation,
/// controller config) show up in `/proc` while no game is being played.
pub const DEFAULT_IGNORED: &[&str] = &[
    "SteamLinuxRuntime",
    "SteamLinuxRuntime_soldier",
    "SteamLinuxRuntime_sniper",
    "SteamControllerConfigs",
    "Steamworks Shared",
    "Steam Linux Runtime",
    "Proton Experimental",
    "Proton - Experimental",
    "Proton Hotfix",
    "Proton 5.0",
    "Proton 6.3",
    "Proton 7.0",
    "Proton 8.0",
    "Proton 9.0",
    "Proton 10.0",
    "Proton EasyAntiCheat Runtime",
    "Proton BattlEye Runtime",
];

/// Exact-match set of folder names the scanner never reports.
///
/// Built once at startup from [`DEFAULT_IGNORED`] plus configured extras.
#[derive(Debug, Clone)]
pub struct IgnoreSet {
    names: HashSet<String>,
}

impl IgnoreSet {
    pub fn with_defaults() -> Self {
        Self {
            names: DEFAULT_IGNORED.iter().map(|s| s.to_string()).collect(),
        }
    }

    /// Defaults merged with `extra`.
    pub fn with_extra<I, S>(extra: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut set = Self::with_defaults();
        set.names.extend(extra.into_iter().map(Into::into));
        set
    }

    pub fn contains(&self, folder: &str) -> bool {
        self.names.contains(folder)
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}
