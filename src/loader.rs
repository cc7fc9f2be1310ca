// 📂 CSV adapters - map the four source sheets onto core shapes
//
// No decision logic lives here: the loaders read bytes, fix encodings, map
// columns and hand parsed rows to the core modules. Each loader has a
// `_from_reader` form so tests run against in-memory data.

use crate::freenet::FreeNetLedger;
use crate::identity::{IdentityEntry, IdentityMap};
use crate::netlist::{build_netlists, NetList, SessionColumn};
use crate::payments::PaymentBook;
use anyhow::{Context, Result};
use serde::Deserialize;
use std::io::Read;
use std::path::Path;

// ============================================================================
// ROW SHAPES
// ============================================================================

/// Purchase report row: one net-product transaction.
#[derive(Debug, Deserialize)]
struct PurchaseRow {
    // CID must stay a string - "01336056" would lose its leading zero as a
    // number
    #[serde(rename = "CID/Card Number")]
    cid: String,
    #[serde(rename = "Quantity")]
    quantity: u32,
}

/// Membership report row.
#[derive(Debug, Deserialize)]
struct MemberRow {
    #[serde(rename = "CID/Card Number")]
    cid: String,
    #[serde(rename = "First Name")]
    first_name: String,
    #[serde(rename = "Surname")]
    surname: String,
}

// ============================================================================
// ENCODING
// ============================================================================

/// Read a source file, retrying once with a single-byte decode when it is
/// not valid UTF-8. Some committee exports come out of Excel as
/// Windows-1252.
fn read_source(path: &Path) -> Result<String> {
    let bytes =
        std::fs::read(path).with_context(|| format!("failed to read {}", path.display()))?;
    Ok(decode_source(&bytes))
}

fn decode_source(bytes: &[u8]) -> String {
    match std::str::from_utf8(bytes) {
        Ok(text) => text.to_string(),
        Err(_) => {
            let (decoded, _, _) = encoding_rs::WINDOWS_1252.decode(bytes);
            decoded.into_owned()
        }
    }
}

// ============================================================================
// LOADERS
// ============================================================================

/// Load one purchase report into a [`PaymentBook`], summing duplicate CIDs.
pub fn load_payments(path: &Path) -> Result<PaymentBook> {
    let text = read_source(path)?;
    load_payments_from_reader(text.as_bytes())
        .with_context(|| format!("failed to parse purchase report {}", path.display()))
}

pub fn load_payments_from_reader<R: Read>(reader: R) -> Result<PaymentBook> {
    let mut rdr = csv::Reader::from_reader(reader);
    let mut book = PaymentBook::new();
    for row in rdr.deserialize() {
        let row: PurchaseRow = row.context("bad purchase row")?;
        book.add(row.cid, row.quantity);
    }
    Ok(book)
}

/// Load the membership report into an [`IdentityMap`].
pub fn load_identity_map(path: &Path) -> Result<IdentityMap> {
    let text = read_source(path)?;
    load_identity_map_from_reader(text.as_bytes())
        .with_context(|| format!("failed to parse membership report {}", path.display()))
}

pub fn load_identity_map_from_reader<R: Read>(reader: R) -> Result<IdentityMap> {
    let mut rdr = csv::Reader::from_reader(reader);
    let mut entries = Vec::new();
    for row in rdr.deserialize() {
        let row: MemberRow = row.context("bad membership row")?;
        entries.push(IdentityEntry {
            cid: row.cid,
            name: format!("{} {}", row.first_name, row.surname),
        });
    }
    Ok(IdentityMap::from_entries(entries))
}

/// Load the free-net allocation sheet into a [`FreeNetLedger`].
///
/// Layout is loose - names appear wherever a cell was filled in - so every
/// data cell is tallied. The header row is not counted.
pub fn load_free_nets(path: &Path) -> Result<FreeNetLedger> {
    let text = read_source(path)?;
    load_free_nets_from_reader(text.as_bytes())
        .with_context(|| format!("failed to parse free-net sheet {}", path.display()))
}

pub fn load_free_nets_from_reader<R: Read>(reader: R) -> Result<FreeNetLedger> {
    let mut rdr = csv::ReaderBuilder::new().flexible(true).from_reader(reader);
    let mut names = Vec::new();
    for record in rdr.records() {
        let record = record.context("bad free-net row")?;
        names.extend(record.iter().map(str::to_string));
    }
    Ok(FreeNetLedger::from_names(names))
}

/// Load the netlist sheet: one date-headed column per session, cells holding
/// free-text attendee names in roster order. Blank or ragged cells are fine;
/// a header that is not DD/MM/YYYY aborts the whole load.
pub fn load_netlists(path: &Path, identity: &IdentityMap) -> Result<Vec<NetList>> {
    let text = read_source(path)?;
    load_netlists_from_reader(text.as_bytes(), identity)
        .with_context(|| format!("failed to parse netlist sheet {}", path.display()))
}

pub fn load_netlists_from_reader<R: Read>(
    reader: R,
    identity: &IdentityMap,
) -> Result<Vec<NetList>> {
    let mut rdr = csv::ReaderBuilder::new().flexible(true).from_reader(reader);

    let headers = rdr.headers().context("netlist sheet has no header row")?;
    let mut columns: Vec<SessionColumn> = headers
        .iter()
        .map(|header| SessionColumn {
            date_header: header.trim().to_string(),
            names: Vec::new(),
        })
        .collect();

    for record in rdr.records() {
        let record = record.context("bad netlist row")?;
        for (i, cell) in record.iter().enumerate() {
            if let Some(column) = columns.get_mut(i) {
                column.names.push(cell.to_string());
            }
        }
    }

    build_netlists(&columns, identity)
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::netlist::{NetPlayer, PaidStatus};
    use crate::reconcile::reconcile;
    use chrono::NaiveDate;

    const MEMBER_NETS: &str = "\
CID/Card Number,Quantity
01336056,1
01336056,1
01337238,1
01502382,2
";

    const MEMBERS: &str = "\
CID/Card Number,First Name,Surname
01336056,Name1,Surname1
01337238,Name2,Surname2
01502382,Name3,Surname3
";

    const NETLIST: &str = "\
08/10/2019,09/10/2019
Name1 Surname1,Name2 Surname2
Name2 Surname2,Name3 Surname3
Name3 Surname3,Name1 Surname1
";

    fn d(year: i32, month: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(year, month, day).unwrap()
    }

    #[test]
    fn test_payment_loader_sums_duplicate_rows() {
        let book = load_payments_from_reader(MEMBER_NETS.as_bytes()).unwrap();

        assert_eq!(book.remaining("01336056"), 2);
        assert_eq!(book.remaining("01337238"), 1);
        assert_eq!(book.remaining("01502382"), 2);
        assert_eq!(book.len(), 3);
    }

    #[test]
    fn test_identity_map_loader_joins_names() {
        let map = load_identity_map_from_reader(MEMBERS.as_bytes()).unwrap();

        assert_eq!(map.len(), 3);
        assert_eq!(map.display_name("01336056"), Some("Name1 Surname1"));
        assert!(map.resolve("Name3 Surname3").is_member());
    }

    #[test]
    fn test_netlist_loader() {
        let identity = load_identity_map_from_reader(MEMBERS.as_bytes()).unwrap();

        let netlists = load_netlists_from_reader(NETLIST.as_bytes(), &identity).unwrap();

        assert_eq!(netlists.len(), 2);
        assert_eq!(netlists[0].date, d(2019, 10, 8));
        assert_eq!(
            netlists[0].players,
            vec![
                NetPlayer::unpaid("01336056"),
                NetPlayer::unpaid("01337238"),
                NetPlayer::unpaid("01502382"),
            ]
        );
        assert_eq!(netlists[1].date, d(2019, 10, 9));
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
    fn test_netlist_loader_with_excess_spaces() {
        let identity = load_identity_map_from_reader(MEMBERS.as_bytes()).unwrap();
        let sheet = "\
08/10/2019
Name1  Surname1
Name2 Surname2
";

        let netlists = load_netlists_from_reader(sheet.as_bytes(), &identity).unwrap();

        assert_eq!(
            netlists[0].players,
            vec![NetPlayer::unpaid("01336056"), NetPlayer::unpaid("01337238")]
        );
    }

    #[test]
    fn test_netlist_loader_with_name_not_found() {
        let identity = load_identity_map_from_reader(MEMBERS.as_bytes()).unwrap();
        let sheet = "\
08/10/2019,09/10/2019
Name4 Surname1,Name2 Surname2
Name2 Surname2,Name3 Surname3
";

        let netlists = load_netlists_from_reader(sheet.as_bytes(), &identity).unwrap();

        // Unresolved entry keeps its normalized name as the key
        assert_eq!(
            netlists[0].players,
            vec![
                NetPlayer::unpaid("Name4 Surname1"),
                NetPlayer::unpaid("01337238"),
            ]
        );
    }

    #[test]
    fn test_netlist_loader_with_ragged_columns() {
        let identity = load_identity_map_from_reader(MEMBERS.as_bytes()).unwrap();
        let sheet = "\
08/10/2019,09/10/2019
Name1 Surname1,Name2 Surname2
,Name3 Surname3
";

        let netlists = load_netlists_from_reader(sheet.as_bytes(), &identity).unwrap();

        assert_eq!(netlists[0].players, vec![NetPlayer::unpaid("01336056")]);
        assert_eq!(
            netlists[1].players,
            vec![NetPlayer::unpaid("01337238"), NetPlayer::unpaid("01502382")]
        );
    }

    #[test]
    fn test_netlist_loader_bad_date_is_fatal() {
        let identity = IdentityMap::new();
        let sheet = "\
October 8th
Name1 Surname1
";

        assert!(load_netlists_from_reader(sheet.as_bytes(), &identity).is_err());
    }

    #[test]
    fn test_free_net_loader_skips_header_row() {
        let sheet = "\
Free Nets,
Name1 Surname1,Name2 Surname2
Name1 Surname1,
";

        let ledger = load_free_nets_from_reader(sheet.as_bytes()).unwrap();

        assert_eq!(ledger.remaining("Name1 Surname1"), 2);
        assert_eq!(ledger.remaining("Name2 Surname2"), 1);
        // "Free Nets" is the header, not an allocation
        assert_eq!(ledger.remaining("Free Nets"), 0);
    }

    #[test]
    fn test_windows_1252_fallback_decode() {
        let bytes = b"Jos\xe9 Garc\xeda";
        assert_eq!(decode_source(bytes), "José García");
    }

    #[test]
    fn test_utf8_passes_through() {
        let text = "José García";
        assert_eq!(decode_source(text.as_bytes()), text);
    }

    #[test]
    fn test_end_to_end_fixture() {
        let identity = load_identity_map_from_reader(MEMBERS.as_bytes()).unwrap();
        let payments = load_payments_from_reader(MEMBER_NETS.as_bytes()).unwrap();
        let netlists = load_netlists_from_reader(NETLIST.as_bytes(), &identity).unwrap();

        let run = reconcile(netlists, payments, &identity, FreeNetLedger::new());

        // Balances {2, 1, 2}: Name2's second appearance is the only shortfall
        let by_date = |date: NaiveDate| {
            run.netlists
                .iter()
                .find(|netlist| netlist.date == date)
                .unwrap()
        };

        let first = by_date(d(2019, 10, 8));
        assert!(first
            .players
            .iter()
            .all(|player| player.status == PaidStatus::Paid));

        let second = by_date(d(2019, 10, 9));
        assert_eq!(second.players[0].key, "Name2 Surname2");
        assert_eq!(second.players[0].status, PaidStatus::Unpaid);
        assert_eq!(second.players[1].status, PaidStatus::Paid);
        assert_eq!(second.players[2].status, PaidStatus::Paid);

        assert_eq!(run.outstanding.len(), 1);
        assert_eq!(run.outstanding[0].name, "Name2 Surname2");
        assert_eq!(run.outstanding[0].count, 1);
    }
}
