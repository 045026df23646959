//! Game catalog: normalized game name to application id.
//!
//! Built once at startup from the detectable-applications list and passed
//! to the bridge loop by value. Nothing mutates it afterwards.

pub mod cache;
pub mod fetch;

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::normalize::normalize;

/// Client id sent for games the catalog does not know. It is not a
/// registered application, so the peer rejects the handshake instead of
/// showing some other application's name.
pub const PLACEHOLDER_CLIENT_ID: &str = "000000000000000000";

/// One entry of the detectable-applications list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DetectableApp {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub executables: Vec<Executable>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Executable {
    pub name: String,
    #[serde(default)]
    pub os: String,
}

/// Errors from loading the catalog.
#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("catalog JSON is invalid: {0}")]
    Json(#[from] serde_json::Error),

    #[error("catalog request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("cache directory not available")]
    NoCacheDir,

    #[error("no usable catalog: {0}")]
    Unavailable(String),
}

/// Outcome of resolving a detected folder name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    Known(String),
    Unknown,
}

impl Resolution {
    /// Id to put in the handshake. Unknown games get
    /// [`PLACEHOLDER_CLIENT_ID`].
    pub fn client_id(&self) -> &str {
        match self {
            Self::Known(id) => id,
            Self::Unknown => PLACEHOLDER_CLIENT_ID,
        }
    }

    pub fn is_known(&self) -> bool {
        matches!(self, Self::Known(_))
    }
}

/// Read-only name → id mapping.
#[derive(Debug, Clone, Default)]
pub struct GameCatalog {
    by_name: HashMap<String, String>,
}

impl GameCatalog {
    /// Index apps by normalized name. A later app with the same key
    /// replaces an earlier one.
    pub fn from_apps(apps: &[DetectableApp]) -> Self {
        let by_name = apps
            .iter()
            .map(|app| (normalize(&app.name), app.id.clone()))
            .filter(|(key, _)| !key.is_empty())
            .collect();
        Self { by_name }
    }

    pub fn len(&self) -> usize {
        self.by_name.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_name.is_empty()
    }

    /// Exact lookup by an already-normalized key.
    pub fn lookup(&self, normalized: &str) -> Option<&str> {
        self.by_name.get(normalized).map(String::as_str)
    }

    /// Normalize `name` and look it up.
    pub fn resolve(&self, name: &str) -> Resolution {
        match self.lookup(&normalize(name)) {
            Some(id) => Resolution::Known(id.to_string()),
            None => Resolution::Unknown,
        }
    }
}
