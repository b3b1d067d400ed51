// spec/src/lib.rs
//
// Shared types, error enum, and deployment configuration for the OMNIUM
// ledger engine. No IO beyond optional config-file loading; everything
// else here is plain data the rest of the workspace builds behaviour on.

mod config;
mod error;
mod types;

pub use config::LedgerConfig;
pub use error::{OmniumError, OmniumResult};
pub use types::{
    Community, CommonsPoolState, CommunityId, ConversionFees, ConversionRequest,
    DividendPoolState, ProvenanceEntry, ProvenanceKind, PurposeChannel, PurposeId, Stratum,
    TimestampMs, TransactionId, TransactionKind, TransactionRecord, Unit, UnitId, Wallet,
    WalletId, T1_LOCKUP_MS, T2_LOCKUP_MS, YEAR_MS,
};
