// 📋 Netlists - one dated attendance sheet per session
//
// A netlist is the hand-written roster for one session. Attendee order in the
// source column is preserved because it decides who consumes credit first.

use crate::identity::IdentityMap;
use crate::names::NameNormalizer;
use anyhow::{Context, Result};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Netlist date headers are written day-first.
pub const DATE_FORMAT: &str = "%d/%m/%Y";

/// Tri-state payment verdict for one attendee appearance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaidStatus {
    /// Identity known, but no credit covered this appearance.
    Unpaid,
    Paid,
    /// No identity match and no consumable credit found anywhere - this entry
    /// needs human review, which is a different situation from Unpaid.
    Unknown,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NetPlayer {
    /// CID when the name resolved, otherwise the normalized name as written.
    /// Pass 2 of reconciliation substitutes the display name back in.
    pub key: String,
    pub status: PaidStatus,
}

impl NetPlayer {
    pub fn unpaid(key: impl Into<String>) -> Self {
        NetPlayer {
            key: key.into(),
            status: PaidStatus::Unpaid,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NetList {
    pub date: NaiveDate,
    /// Source-column order.
    pub players: Vec<NetPlayer>,
}

/// One raw date column from a netlist sheet, before any cleaning.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionColumn {
    pub date_header: String,
    pub names: Vec<String>,
}

/// Build one [`NetList`] per date column.
///
/// Entries that fail to normalize are dropped without trace: a cell that holds
/// no name-shaped text is assumed not to represent a real attendee. A header
/// that does not parse as DD/MM/YYYY is fatal for the whole source - no
/// partial session list escapes.
pub fn build_netlists(columns: &[SessionColumn], identity: &IdentityMap) -> Result<Vec<NetList>> {
    let normalizer = NameNormalizer::new();
    let mut netlists = Vec::with_capacity(columns.len());

    for column in columns {
        let date = NaiveDate::parse_from_str(&column.date_header, DATE_FORMAT).with_context(
            || {
                format!(
                    "malformed netlist date header {:?} (expected DD/MM/YYYY)",
                    column.date_header
                )
            },
        )?;

        let mut players = Vec::new();
        for raw in &column.names {
            let Some(name) = normalizer.normalize(raw) else {
                continue;
            };
            players.push(NetPlayer::unpaid(identity.resolve(&name).into_key()));
        }

        netlists.push(NetList { date, players });
    }

    Ok(netlists)
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn test_identity_map() -> IdentityMap {
        IdentityMap::from_rows([
            ("01336056", "Name1", "Surname1"),
            ("01337238", "Name2", "Surname2"),
            ("01502382", "Name3", "Surname3"),
        ])
    }

    fn column(header: &str, names: &[&str]) -> SessionColumn {
        SessionColumn {
            date_header: header.to_string(),
            names: names.iter().map(|n| n.to_string()).collect(),
        }
    }

    #[test]
    fn test_build_resolves_cids_in_source_order() {
        let columns = vec![
            column(
                "08/10/2019",
                &["Name1 Surname1", "Name2 Surname2", "Name3 Surname3"],
            ),
            column(
                "09/10/2019",
                &["Name2 Surname2", "Name3 Surname3", "Name1 Surname1"],
            ),
        ];

        let netlists = build_netlists(&columns, &test_identity_map()).unwrap();

        assert_eq!(netlists.len(), 2);
        assert_eq!(netlists[0].date, NaiveDate::from_ymd_opt(2019, 10, 8).unwrap());
        assert_eq!(
            netlists[0].players,
            vec![
                NetPlayer::unpaid("01336056"),
                NetPlayer::unpaid("01337238"),
                NetPlayer::unpaid("01502382"),
            ]
        );
        assert_eq!(netlists[1].date, NaiveDate::from_ymd_opt(2019, 10, 9).unwrap());
        assert_eq!(
            netlists[1].players,
            vec![
                NetPlayer::unpaid("01337238"),
                NetPlayer::unpaid("01502382"),
                NetPlayer::unpaid("01336056"),
            ]
        );
    }

    #[test]
    fn test_unresolved_name_kept_as_key() {
        let columns = vec![column("08/10/2019", &["Name4 Surname1", "Name2 Surname2"])];

        let netlists = build_netlists(&columns, &test_identity_map()).unwrap();

        assert_eq!(
            netlists[0].players,
            vec![
                NetPlayer::unpaid("Name4 Surname1"),
                NetPlayer::unpaid("01337238"),
            ]
        );
    }

    #[test]
    fn test_blank_and_corrupt_cells_dropped() {
        let columns = vec![column(
            "08/10/2019",
            &["", "Name1  Surname1", "12345", "Name3 Surname3!!"],
        )];

        let netlists = build_netlists(&columns, &test_identity_map()).unwrap();

        assert_eq!(
            netlists[0].players,
            vec![NetPlayer::unpaid("01336056"), NetPlayer::unpaid("01502382")]
        );
    }

    #[test]
    fn test_malformed_date_header_is_fatal() {
        let columns = vec![
            column("08/10/2019", &["Name1 Surname1"]),
            column("2019-10-09", &["Name2 Surname2"]),
        ];

        let err = build_netlists(&columns, &test_identity_map()).unwrap_err();
        assert!(err.to_string().contains("2019-10-09"));
    }
}
