// 🧹 Name Normalizer - cleans free-text attendee names
//
// Netlist sheets are typed by hand per session, so entries come with trailing
// punctuation, doubled spaces and stray characters. This is the single point
// where that noise is stripped before any matching happens.

use regex::Regex;

/// Pattern for "First Last" with an optional third word for double-barrelled
/// surnames. The optional digit suffixes exist because anonymized fixtures
/// use names such as "Name1 Surname2".
const NAME_PATTERN: &str = "[A-Za-z]+[0-9]? *[A-Za-z]+[0-9]?( *[A-Za-z]+[0-9]?)?";

pub struct NameNormalizer {
    pattern: Regex,
}

impl NameNormalizer {
    pub fn new() -> Self {
        NameNormalizer {
            // Pattern is a compile-time constant
            pattern: Regex::new(NAME_PATTERN).expect("invalid name pattern"),
        }
    }

    /// Extract the first name-shaped run from `raw`.
    ///
    /// Runs of internal whitespace collapse to a single space. Returns `None`
    /// when the input is empty or contains no letters at all - distinguishable
    /// from any valid name, which is always non-empty.
    pub fn normalize(&self, raw: &str) -> Option<String> {
        let found = self.pattern.find(raw)?;
        let cleaned = found
            .as_str()
            .split_whitespace()
            .collect::<Vec<_>>()
            .join(" ");
        Some(cleaned)
    }
}

impl Default for NameNormalizer {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// TESTS
// ============================================================================
