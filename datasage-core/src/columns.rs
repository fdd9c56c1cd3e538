//! Caller-pinned output columns.
//!
//! A restriction like `sales:Deposits` pins the bare column name
//! `Deposits` into the final query's projection list. Empty restrictions
//! mean the generator may choose any columns.

use serde::{Deserialize, Serialize};

/// An ordered, de-duplicated set of `table:column` (or bare column)
/// identifiers pinned by the caller.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(transparent)]
pub struct RestrictedColumns(Vec<String>);

impl RestrictedColumns {
    /// Build from raw caller input, preserving first-seen order and
    /// dropping duplicates and blanks.
    pub fn new(raw: impl IntoIterator<Item = String>) -> Self {
        let mut seen = Vec::new();
        for entry in raw {
            let entry = entry.trim().to_string();
            if !entry.is_empty() && !seen.contains(&entry) {
                seen.push(entry);
            }
        }
        Self(seen)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// The raw pinned identifiers, in order.
    pub fn entries(&self) -> &[String] {
        &self.0
    }

    /// Bare column names (the part after `table:`, or the whole entry).
    pub fn bare_names(&self) -> impl Iterator<Item = &str> {
        self.0
            .iter()
            .map(|entry| entry.rsplit_once(':').map_or(entry.as_str(), |(_, col)| col))
    }

    /// Render the block handed to the generation prompt.
    pub fn prompt_block(&self) -> String {
        if self.0.is_empty() {
            "ALL COLUMNS ALLOWED".to_string()
        } else {
            self.0.join(", ")
        }
    }

    /// Pinned bare column names that do NOT appear in the query's
    /// projection list. Empty result means the invariant holds.
    ///
    /// The check is textual: it inspects the segment between the first
    /// `SELECT` and its `FROM` (case-insensitive) and looks for each bare
    /// name as a whole identifier, quoted or not. Good enough to catch a
    /// generator that dropped a pinned column; precise SQL parsing is the
    /// validator's job.
    pub fn missing_from_projection(&self, sql: &str) -> Vec<String> {
        if self.0.is_empty() {
            return Vec::new();
        }
        let projection = projection_segment(&sql.to_lowercase());
        self.bare_names()
            .filter(|name| !contains_identifier(&projection, &name.to_lowercase()))
            .map(|name| name.to_string())
            .collect()
    }
}

/// The text between the first SELECT and the FROM that closes its
/// projection list, over an already-lowercased statement. Falls back to
/// the whole statement when no FROM exists (e.g. `SELECT 1 + 1`).
fn projection_segment(lower: &str) -> String {
    let start = match lower.find("select") {
        Some(idx) => idx + "select".len(),
        None => return lower.to_string(),
    };
    let end = lower[start..]
        .find(" from ")
        .or_else(|| lower[start..].find("\nfrom "))
        .map(|idx| start + idx)
        .unwrap_or(lower.len());
    lower[start..end].to_string()
}

/// Whether `name` occurs in `segment` as a whole identifier, quoted or
/// not. Both inputs are lowercased by the caller.
fn contains_identifier(segment: &str, name: &str) -> bool {
    if name.is_empty() {
        return true;
    }
    let bytes = segment.as_bytes();
    let mut search_from = 0;
    while let Some(rel) = segment[search_from..].find(name) {
        let start = search_from + rel;
        let end = start + name.len();
        let before_ok = start == 0 || !is_ident_char(bytes[start - 1]);
        let after_ok = end == segment.len() || !is_ident_char(bytes[end]);
        if before_ok && after_ok {
            return true;
        }
        search_from = start + name.chars().next().map_or(1, char::len_utf8);
    }
    false
}

fn is_ident_char(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'_'
}

// =============================================================================
// TESTS
// =============================================================================
