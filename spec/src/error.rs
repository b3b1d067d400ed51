//! The single error enum shared by every OMNIUM crate.
//!
//! Every fallible core/store API returns `Result<T, OmniumError>`. Variants
//! carry the data needed to reconstruct a useful message; nothing here is a
//! control-flow exception, matching the error model mandated in the design.

use thiserror::Error;

/// All failure kinds the ledger engine can report to a caller.
#[derive(Debug, Error)]
pub enum OmniumError {
    #[error("amount must be positive")]
    Positive,

    #[error("amount out of range: {0}")]
    Amount(String),

    #[error("unknown wallet: {0}")]
    WalletUnknown(String),

    #[error("unknown community: {0}")]
    CommunityUnknown(String),

    #[error("unknown purpose: {0}")]
    PurposeUnknown(String),

    #[error("unknown unit: {0}")]
    UnitUnknown(String),

    #[error("unit {0} is locked until its temporal window elapses")]
    Locked(String),

    #[error("units are not merge-compatible: {0}")]
    MergeIncompatible(String),

    #[error("fees exceed the unit's value")]
    FeesExceedValue,

    #[error("unsupported snapshot schema version: {0}")]
    UnsupportedVersion(u32),

    #[error("unknown content address: {0}")]
    UnknownCid(String),

    #[error("chains have diverged and cannot be fast-forwarded")]
    Diverged,

    #[error("content store I/O failure: {0}")]
    IoFailure(#[from] std::io::Error),

    #[error("serialization failure: {0}")]
    Codec(#[from] serde_json::Error),
}

pub type OmniumResult<T> = Result<T, OmniumError>;
