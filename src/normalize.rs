//! Game name normalization.
//!
//! Catalog keys and detected Steam folder names go through the same
//! function, so `"Slay the Spire"` from the catalog and `"SlayTheSpire"`
//! from `steamapps/common` meet at `"slaythespire"`.

/// Canonicalize a raw folder or display name into a catalog lookup key.
///
/// Lower-cases the input and drops every character outside `[a-z0-9]`.
/// Non-ASCII letters are dropped after lower-casing.
pub fn normalize(raw: &str) -> String {
    raw.to_lowercase()
        .chars()
        .filter(|c| c.is_ascii_lowercase() || c.is_ascii_digit())
        .collect()
}
