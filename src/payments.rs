// 💳 Payment Aggregator - purchased net credits per member
//
// Collapses raw purchase-report rows into a per-CID credit count. The same
// member buys nets across several transactions (and across the member and
// non-member reports), so duplicate CIDs sum and two books merge additively.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Remaining purchased credits, keyed by CID.
///
/// CIDs are opaque strings: "01336056" keeps its leading zero and is never
/// coerced to a number. Lookups on absent keys read as zero without inserting,
/// and consumption never drives a balance below zero.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentBook {
    credits: HashMap<String, u32>,
}

impl PaymentBook {
    pub fn new() -> Self {
        PaymentBook {
            credits: HashMap::new(),
        }
    }

    /// Build a book from raw ledger rows, summing duplicate CIDs.
    pub fn from_records<I, S>(records: I) -> Self
    where
        I: IntoIterator<Item = (S, u32)>,
        S: Into<String>,
    {
        let mut book = PaymentBook::new();
        for (cid, quantity) in records {
            book.add(cid.into(), quantity);
        }
        book
    }

    /// Record purchased credits for one CID (summed on repeat).
    pub fn add(&mut self, cid: String, quantity: u32) {
        *self.credits.entry(cid).or_insert(0) += quantity;
    }

    /// Remaining credits for `key`. Absent keys read as zero and are never
    /// created by the lookup.
    pub fn remaining(&self, key: &str) -> u32 {
        self.credits.get(key).copied().unwrap_or(0)
    }

    /// Consume one credit for `key`.
    ///
    /// Decrements only while the balance is positive; a depleted or unknown
    /// key is left untouched and reports failure.
    pub fn consume(&mut self, key: &str) -> bool {
        match self.credits.get_mut(key) {
            Some(count) if *count > 0 => {
                *count -= 1;
                true
            }
            _ => false,
        }
    }

    /// Merge two books additively: union of keys, values summed on overlap.
    /// Used to combine the member and non-member purchase reports.
    pub fn merge(mut self, other: PaymentBook) -> PaymentBook {
        for (cid, quantity) in other.credits {
            self.add(cid, quantity);
        }
        self
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
