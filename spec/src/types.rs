//! Shared OMNIUM data model.
//!
//! These types carry no behaviour beyond construction and plain-data
//! queries; the algebra that mutates them lives in `omnium-core`, and the
//! canonical encoding that addresses them lives in `omnium-store`.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Fresh unit identifier, a UUIDv4 string.
pub type UnitId = String;
/// Wallet identifier, caller-chosen (e.g. "alice").
pub type WalletId = String;
/// Community identifier, caller-chosen.
pub type CommunityId = String;
/// Purpose channel identifier, caller-chosen.
pub type PurposeId = String;
/// Transaction identifier, a UUIDv4 string.
pub type TransactionId = String;
/// Milliseconds since the ledger's simulated epoch.
pub type TimestampMs = i64;

/// One of the four temporal strata a unit can occupy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Stratum {
    /// Liquid, unlocked, demurrage-bearing.
    T0,
    /// Locked for 365 days, neutral.
    T1,
    /// Locked for 20 years, dividend-bearing.
    T2,
    /// Permanently locked principal, dividend-bearing.
    #[serde(rename = "Tinf")]
    TInfinity,
}

impl fmt::Display for Stratum {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Stratum::T0 => "T0",
            Stratum::T1 => "T1",
            Stratum::T2 => "T2",
            Stratum::TInfinity => "T\u{221e}",
        };
        f.write_str(s)
    }
}

/// The kind of event a provenance entry records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProvenanceKind {
    Minted,
    Earned,
    Gifted,
    Invested,
    Inherited,
    Converted,
    Merged,
    Split,
}

/// One append-only entry in a unit's history. Never rewritten.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProvenanceEntry {
    pub timestamp: TimestampMs,
    pub kind: ProvenanceKind,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub from: Option<WalletId>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub to: Option<WalletId>,
    pub magnitude: f64,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub note: Option<String>,
    pub transaction_id: TransactionId,
}

/// The quantum of value: Ω = (id, m, T, L, P, R, created_at, last_tick_at, owner).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Unit {
    pub id: UnitId,
    pub magnitude: f64,
    pub stratum: Stratum,
    /// Community memberships; empty means global. Rendered sorted for
    /// deterministic content addresses.
    pub localities: Vec<CommunityId>,
    /// Purpose tags; empty means unrestricted. Rendered sorted.
    pub purposes: Vec<PurposeId>,
    pub provenance: Vec<ProvenanceEntry>,
    pub created_at: TimestampMs,
    pub last_tick_at: TimestampMs,
    pub owner: WalletId,
}

/// A community: a locality with an exit fee and an approximate member count.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Community {
    pub id: CommunityId,
    pub name: String,
    pub description: String,
    /// Fee charged when a unit's locality set loses this community, in [0,1].
    pub boundary_fee: f64,
    pub created_at: TimestampMs,
    /// Approximate counter, not a membership source of truth.
    pub member_count: u64,
}

/// A purpose channel: a spending restriction with a removal fee.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PurposeChannel {
    pub id: PurposeId,
    pub name: String,
    pub description: String,
    /// Wallets a purpose-coloured unit may be transferred to. Rendered sorted.
    pub recipients: Vec<WalletId>,
    /// Fee charged when this purpose is removed from a unit, in [0,1].
    pub conversion_discount: f64,
    pub created_at: TimestampMs,
}

/// A wallet: an owner of units, with community and purpose registrations.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Wallet {
    pub id: WalletId,
    pub name: String,
    pub created_at: TimestampMs,
    /// Rendered sorted.
    pub communities: Vec<CommunityId>,
    /// Rendered sorted.
    pub purposes: Vec<PurposeId>,
}

/// Authoritative mint/burn counters and the simulated clock (C2 state).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CommonsPoolState {
    pub total_minted: f64,
    pub total_burned: f64,
    pub current_supply: f64,
    pub current_time: TimestampMs,
}

impl Default for CommonsPoolState {
    fn default() -> Self {
        Self {
            total_minted: 0.0,
            total_burned: 0.0,
            current_supply: 0.0,
            current_time: 0,
        }
    }
}

/// Demurrage/dividend redistribution pool state (C3 state).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DividendPoolState {
    pub balance: f64,
    pub total_collected: f64,
    pub total_distributed: f64,
    pub total_requested: f64,
    pub deposit_count: u64,
    pub withdrawal_count: u64,
}

impl Default for DividendPoolState {
    fn default() -> Self {
        Self {
            balance: 0.0,
            total_collected: 0.0,
            total_distributed: 0.0,
            total_requested: 0.0,
            deposit_count: 0,
            withdrawal_count: 0,
        }
    }
}

/// The kind of ledger-level operation a transaction record describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionKind {
    Mint,
    Burn,
    Transfer,
    Convert,
    Split,
    Merge,
}

/// An audit record of one ledger-level operation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransactionRecord {
    pub id: TransactionId,
    pub kind: TransactionKind,
    pub timestamp: TimestampMs,
    pub input_unit_ids: Vec<UnitId>,
    pub output_unit_ids: Vec<UnitId>,
    pub fees: f64,
    pub description: String,
}

/// A request to transform a unit along one or more dimensions (C5 input).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ConversionRequest {
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub target_stratum: Option<Stratum>,
    #[serde(default)]
    pub add_localities: Vec<CommunityId>,
    #[serde(default)]
    pub remove_localities: Vec<CommunityId>,
    #[serde(default)]
    pub add_purposes: Vec<PurposeId>,
    #[serde(default)]
    pub remove_purposes: Vec<PurposeId>,
    #[serde(default)]
    pub strip_reputation: bool,
}

/// The four independently-tracked fee components of a conversion.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ConversionFees {
    pub temporal: f64,
    pub locality: f64,
    pub purpose: f64,
    pub reputation: f64,
}

impl ConversionFees {
    pub fn total(&self) -> f64 {
        self.temporal + self.locality + self.purpose + self.reputation
    }
}

/// Year length in milliseconds, fixed for deterministic temporal accrual.
pub const YEAR_MS: i64 = 365 * 86_400 * 1000;
/// Lockup window for T1 units, in milliseconds.
pub const T1_LOCKUP_MS: i64 = YEAR_MS;
/// Lockup window for T2 units, in milliseconds.
pub const T2_LOCKUP_MS: i64 = 20 * YEAR_MS;
