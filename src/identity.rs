// 🪪 Identity Map - CID ↔ display name table from membership records
//
// Built once per reconciliation run from a membership report snapshot.
// Resolution is exact string equality on the display name; anything smarter
// (fuzzy or phonetic matching) is deliberately out of scope.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// One membership row after the names are joined.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdentityEntry {
    pub cid: String,
    /// Given + family name with single-space separation.
    pub name: String,
}

/// Outcome of resolving a normalized attendee name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    /// Matched a membership row; carries the member's CID.
    Member(String),
    /// No row matched; carries the normalized name so callers can still use
    /// it as a fallback key for free-credit lookups.
    Unknown(String),
}

impl Resolution {
    pub fn is_member(&self) -> bool {
        matches!(self, Resolution::Member(_))
    }

    /// The key a netlist entry is recorded under: the CID when resolved,
    /// otherwise the normalized name itself.
    pub fn into_key(self) -> String {
        match self {
            Resolution::Member(cid) => cid,
            Resolution::Unknown(name) => name,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdentityMap {
    by_name: HashMap<String, String>,
    by_cid: HashMap<String, String>,
}

impl IdentityMap {
    pub fn new() -> Self {
        IdentityMap {
            by_name: HashMap::new(),
            by_cid: HashMap::new(),
        }
    }

    /// Build from (cid, given name, family name) rows.
    pub fn from_rows<I, S>(rows: I) -> Self
    where
        I: IntoIterator<Item = (S, S, S)>,
        S: AsRef<str>,
    {
        Self::from_entries(rows.into_iter().map(|(cid, given, family)| IdentityEntry {
            cid: cid.as_ref().to_string(),
            name: format!("{} {}", given.as_ref(), family.as_ref()),
        }))
    }

    pub fn from_entries<I>(entries: I) -> Self
    where
        I: IntoIterator<Item = IdentityEntry>,
    {
        let mut map = IdentityMap::new();
        for entry in entries {
            map.insert(entry);
        }
        map
    }

    /// Insert one entry. A duplicated display name or CID keeps the first
    /// row, so resolution stays deterministic.
    pub fn insert(&mut self, entry: IdentityEntry) {
        let IdentityEntry { cid, name } = entry;
        self.by_name.entry(name.clone()).or_insert_with(|| cid.clone());
        self.by_cid.entry(cid).or_insert(name);
    }

    /// Resolve a normalized name by exact display-name equality.
    pub fn resolve(&self, name: &str) -> Resolution {
        match self.by_name.get(name) {
            Some(cid) => Resolution::Member(cid.clone()),
            None => Resolution::Unknown(name.to_string()),
        }
    }

    /// Display name for a CID, used when re-substituting human-readable names
    /// for presentation.
    pub fn display_name(&self, cid: &str) -> Option<&str> {
        self.by_cid.get(cid).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.by_cid.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_cid.is_empty()
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn test_map() -> IdentityMap {
        IdentityMap::from_rows([
            ("01336056", "Name1", "Surname1"),
            ("01337238", "Name2", "Surname2"),
            ("01502382", "Name3", "Surname3"),
        ])
    }

    #[test]
    fn test_resolve_exact_match() {
        let map = test_map();
        assert_eq!(
            map.resolve("Name2 Surname2"),
            Resolution::Member("01337238".to_string())
        );
    }

    #[test]
    fn test_resolve_miss_carries_name() {
        let map = test_map();
        let resolution = map.resolve("Name4 Surname1");

        assert!(!resolution.is_member());
        assert_eq!(resolution.into_key(), "Name4 Surname1");
    }

    #[test]
    fn test_display_name_lookup() {
        let map = test_map();
        assert_eq!(map.display_name("01336056"), Some("Name1 Surname1"));
        assert_eq!(map.display_name("00000000"), None);
    }

    #[test]
    fn test_duplicate_display_name_keeps_first_row() {
        let map = IdentityMap::from_rows([
            ("01000001", "Name1", "Surname1"),
            ("01000002", "Name1", "Surname1"),
        ]);

        assert_eq!(
            map.resolve("Name1 Surname1"),
            Resolution::Member("01000001".to_string())
        );
        // Both CIDs still map back to the shared display name
        assert_eq!(map.display_name("01000002"), Some("Name1 Surname1"));
    }
}
