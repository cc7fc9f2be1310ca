use anyhow::{bail, Result};
use std::env;
use std::path::PathBuf;

use net_tracker::{
    load_free_nets, load_identity_map, load_netlists, load_payments, reconcile, FreeNetLedger,
    PaidStatus, PaymentBook, DATE_FORMAT,
};

/// Source files for one reconciliation run.
struct Sources {
    netlist: PathBuf,
    members: PathBuf,
    payments: Vec<PathBuf>,
    freenet: Option<PathBuf>,
    json: bool,
}

fn parse_args(args: &[String]) -> Result<Sources> {
    let mut positional: Vec<PathBuf> = Vec::new();
    let mut freenet = None;
    let mut json = false;

    let mut iter = args.iter();
    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "--freenet" => match iter.next() {
                Some(path) => freenet = Some(PathBuf::from(path)),
                None => bail!("--freenet requires a file path"),
            },
            "--json" => json = true,
            _ => positional.push(PathBuf::from(arg)),
        }
    }

    if positional.len() < 3 {
        bail!(
            "usage: net-tracker <netlist.csv> <members.csv> <payments.csv>... \
             [--freenet <freenet.csv>] [--json]"
        );
    }

    let netlist = positional.remove(0);
    let members = positional.remove(0);

    Ok(Sources {
        netlist,
        members,
        payments: positional,
        freenet,
        json,
    })
}

fn main() -> Result<()> {
    let args: Vec<String> = env::args().skip(1).collect();
    let sources = parse_args(&args)?;

    if !sources.json {
        println!("🏸 Net Payment Tracker");
        println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
        println!("\n📂 Loading sources...");
    }

    let identity = load_identity_map(&sources.members)?;

    let mut payments = PaymentBook::new();
    for path in &sources.payments {
        payments = payments.merge(load_payments(path)?);
    }

    let free_nets = match &sources.freenet {
        Some(path) => load_free_nets(path)?,
        None => FreeNetLedger::new(),
    };

    let netlists = load_netlists(&sources.netlist, &identity)?;

    if !sources.json {
        println!("✓ {} members", identity.len());
        println!("✓ {} paying CIDs", payments.len());
        println!("✓ {} free-net allocations", free_nets.len());
        println!("✓ {} sessions", netlists.len());
    }

    let run = reconcile(netlists, payments, &identity, free_nets);

    if sources.json {
        println!("{}", serde_json::to_string_pretty(&run)?);
        return Ok(());
    }

    for netlist in &run.netlists {
        println!("\n📅 {}", netlist.date.format(DATE_FORMAT));
        for player in &netlist.players {
            let verdict = match player.status {
                PaidStatus::Paid => "paid",
                PaidStatus::Unpaid => "UNPAID",
                PaidStatus::Unknown => "UNKNOWN - needs review",
            };
            println!("   {:<30} {}", player.key, verdict);
        }
    }

    println!("\n💰 Outstanding");
    if run.outstanding.is_empty() {
        println!("   everyone paid up");
    }
    for entry in &run.outstanding {
        println!("   {:<30} {}", entry.name, entry.count);
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(list: &[&str]) -> Vec<String> {
        list.iter().map(|a| a.to_string()).collect()
    }

    #[test]
    fn test_parse_args_minimal() {
        let sources =
            parse_args(&args(&["netlist.csv", "members.csv", "payments.csv"])).unwrap();

        assert_eq!(sources.netlist, PathBuf::from("netlist.csv"));
        assert_eq!(sources.members, PathBuf::from("members.csv"));
        assert_eq!(sources.payments, vec![PathBuf::from("payments.csv")]);
        assert!(sources.freenet.is_none());
        assert!(!sources.json);
    }

    #[test]
    fn test_parse_args_full() {
        let sources = parse_args(&args(&[
            "netlist.csv",
            "members.csv",
            "member_nets.csv",
            "guest_nets.csv",
            "--freenet",
            "freenet.csv",
            "--json",
        ]))
        .unwrap();

        assert_eq!(sources.payments.len(), 2);
        assert_eq!(sources.freenet, Some(PathBuf::from("freenet.csv")));
        assert!(sources.json);
    }

    #[test]
    fn test_parse_args_too_few() {
        assert!(parse_args(&args(&["netlist.csv", "members.csv"])).is_err());
        assert!(parse_args(&args(&["a", "b", "--freenet"])).is_err());
    }
}
