// 🎟️ Free-Credit Ledger - pre-allocated free nets
//
// Committee members hand out free nets by whatever handle they know - a CID
// or a plain name - so this pool is keyed by either form and the engine tries
// both. It is a separate namespace from the payment book and is consulted
// only once the payment book yields nothing.

use crate::names::NameNormalizer;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Remaining free credits, keyed by CID or display name.
///
/// Same discipline as [`crate::PaymentBook`]: absent keys read as zero and are
/// never created implicitly, and a failed consume leaves the pool untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FreeNetLedger {
    credits: HashMap<String, u32>,
}

impl FreeNetLedger {
    pub fn new() -> Self {
        FreeNetLedger {
            credits: HashMap::new(),
        }
    }

    /// Tally a list of free-text allocations into credits per normalized
    /// name. Entries that fail to normalize are skipped.
    pub fn from_names<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let normalizer = NameNormalizer::new();
        let mut ledger = FreeNetLedger::new();
        for raw in names {
            if let Some(name) = normalizer.normalize(raw.as_ref()) {
                ledger.grant(name, 1);
            }
        }
        ledger
    }

    /// Allocate free credits under `key` (summed on repeat).
    pub fn grant(&mut self, key: String, count: u32) {
        *self.credits.entry(key).or_insert(0) += count;
    }

    pub fn remaining(&self, key: &str) -> u32 {
        self.credits.get(key).copied().unwrap_or(0)
    }

    /// Consume one free credit for `key`; failure (no credit, unknown key)
    /// leaves the count untouched.
    pub fn consume(&mut self, key: &str) -> bool {
        match self.credits.get_mut(key) {
            Some(count) if *count > 0 => {
                *count -= 1;
                true
            }
            _ => false,
        }
    }

    pub fn len(&self) -> usize {
        self.credits.len()
    }

    pub fn is_empty(&self) -> bool {
        self.credits.is_empty()
    }
}

// ============================================================================
// TESTS
// ============================================================================
