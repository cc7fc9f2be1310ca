// ⚖️ Reconciliation Engine - who has paid for which session
//
// Three passes, each producing a new session list so pass ordering and data
// dependencies stay auditable:
//
//   Pass 1: consume purchased credits in strict session/roster order
//   Pass 2: substitute display names and fall back to free credits
//   Pass 3: reverse to newest-first for presentation
//
// Greedy allocation is deliberate: if someone paid for N nets but appears in
// more than N entries (guests, duplicate rows), only the first N appearances
// in session order count as paid.

use crate::freenet::FreeNetLedger;
use crate::identity::IdentityMap;
use crate::netlist::{NetList, NetPlayer, PaidStatus};
use crate::payments::PaymentBook;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

// ============================================================================
// RESULT TYPES
// ============================================================================

/// One row of the outstanding-balance report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutstandingEntry {
    pub name: String,
    /// Appearances without a consumed credit; Unpaid and Unknown both count.
    pub count: u32,
}

/// Output of one full reconciliation run. Rebuilt from freshly loaded sources
/// on every invocation and never persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReconciliationRun {
    /// Sessions newest-first, player keys substituted with display names.
    pub netlists: Vec<NetList>,
    /// Who still owes, most appearances first.
    pub outstanding: Vec<OutstandingEntry>,
}

// ============================================================================
// PASSES
// ============================================================================

/// Pass 1 - greedy payment consumption.
///
/// Sessions are walked in loaded (chronological) order and players in source
/// order; each appearance that finds a positive balance under its key is
/// marked Paid and costs one credit. Earliest-listed wins: once a balance
/// runs out, later appearances stay Unpaid.
pub fn apply_payments(netlists: &[NetList], payments: &mut PaymentBook) -> Vec<NetList> {
    netlists
        .iter()
        .map(|netlist| {
            let players = netlist
                .players
                .iter()
                .map(|player| {
                    let status = if payments.consume(&player.key) {
                        PaidStatus::Paid
                    } else {
                        player.status
                    };
                    NetPlayer {
                        key: player.key.clone(),
                        status,
                    }
                })
                .collect();
            NetList {
                date: netlist.date,
                players,
            }
        })
        .collect()
}

/// Pass 2 - identity substitution and free-credit fallback.
///
/// Free credits may have been recorded under either a CID or a plain name, so
/// unresolved keys are tried as-is and resolved ones under their display name.
pub fn apply_identities(
    netlists: &[NetList],
    identity: &IdentityMap,
    free_nets: &mut FreeNetLedger,
) -> Vec<NetList> {
    netlists
        .iter()
        .map(|netlist| {
            let players = netlist
                .players
                .iter()
                .map(|player| substitute_player(player, identity, free_nets))
                .collect();
            NetList {
                date: netlist.date,
                players,
            }
        })
        .collect()
}

fn substitute_player(
    player: &NetPlayer,
    identity: &IdentityMap,
    free_nets: &mut FreeNetLedger,
) -> NetPlayer {
    match identity.display_name(&player.key) {
        // Key never resolved to a member. A free net recorded under the raw
        // key can still cover it; failing that the entry could not be
        // identified in either the payment or membership records.
        None => {
            let status = if player.status == PaidStatus::Unpaid {
                if free_nets.consume(&player.key) {
                    PaidStatus::Paid
                } else {
                    PaidStatus::Unknown
                }
            } else {
                player.status
            };
            NetPlayer {
                key: player.key.clone(),
                status,
            }
        }
        // Member: try a free net under the display name, then swap the key to
        // the display name for presentation whatever the outcome.
        Some(name) => {
            let status = if player.status == PaidStatus::Unpaid && free_nets.consume(name) {
                PaidStatus::Paid
            } else {
                player.status
            };
            NetPlayer {
                key: name.to_string(),
                status,
            }
        }
    }
}

/// Pass 3 - presentation order only. Sessions load oldest-first; the report
/// shows the most recent session at the top.
pub fn newest_first(mut netlists: Vec<NetList>) -> Vec<NetList> {
    netlists.reverse();
    netlists
}

/// Count appearances per name that ended the run without a consumed credit,
/// most first. Equal counts fall back to name order so the report is
/// deterministic.
pub fn outstanding_report(netlists: &[NetList]) -> Vec<OutstandingEntry> {
    let mut counts: HashMap<&str, u32> = HashMap::new();
    for netlist in netlists {
        for player in &netlist.players {
            if player.status != PaidStatus::Paid {
                *counts.entry(player.key.as_str()).or_insert(0) += 1;
            }
        }
    }

    let mut entries: Vec<OutstandingEntry> = counts
        .into_iter()
        .map(|(name, count)| OutstandingEntry {
            name: name.to_string(),
            count,
        })
        .collect();
    entries.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.name.cmp(&b.name)));
    entries
}

/// Run the full pipeline over freshly loaded sources.
pub fn reconcile(
    netlists: Vec<NetList>,
    mut payments: PaymentBook,
    identity: &IdentityMap,
    mut free_nets: FreeNetLedger,
) -> ReconciliationRun {
    let checked = apply_payments(&netlists, &mut payments);
    let named = apply_identities(&checked, identity, &mut free_nets);
    let netlists = newest_first(named);
    let outstanding = outstanding_report(&netlists);

    ReconciliationRun {
        netlists,
        outstanding,
    }
}

// ============================================================================
// TESTS
// ============================================================================
