// Net Payment Tracker - Core Library
// Exposes all modules for use in the CLI, API server, and tests

pub mod names;
pub mod payments;
pub mod identity;
pub mod freenet;
pub mod netlist;
pub mod reconcile;
pub mod loader;

// Re-export commonly used types
pub use names::NameNormalizer;
pub use payments::PaymentBook;
pub use identity::{IdentityEntry, IdentityMap, Resolution};
pub use freenet::FreeNetLedger;
pub use netlist::{
    build_netlists, NetList, NetPlayer, PaidStatus, SessionColumn, DATE_FORMAT,
};
pub use reconcile::{
    apply_identities, apply_payments, newest_first, outstanding_report, reconcile,
    OutstandingEntry, ReconciliationRun,
};
pub use loader::{load_free_nets, load_identity_map, load_netlists, load_payments};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
