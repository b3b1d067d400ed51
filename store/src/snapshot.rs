//! Canonical snapshot serialization.
//!
//! A snapshot is the point-in-time serialization of all ledger state. Its
//! byte encoding must be canonical — fixed field order, sets rendered as
//! sorted sequences, no pretty-printing — so that two hosts computing the
//! same state produce the same content address.

use omnium_spec::{
    Community, CommonsPoolState, DividendPoolState, OmniumError, OmniumResult, PurposeChannel,
    TimestampMs, Unit, Wallet,
};
use serde::{Deserialize, Serialize};

pub const CURRENT_SNAPSHOT_VERSION: u32 = 2;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    pub version: u32,
    pub timestamp: TimestampMs,
    pub pool: CommonsPoolState,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub dividend_pool: Option<DividendPoolState>,
    pub units: Vec<Unit>,
    pub wallets: Vec<Wallet>,
    pub communities: Vec<Community>,
    pub purposes: Vec<PurposeChannel>,
}

impl Snapshot {
    /// Build a v2 snapshot, canonicalizing its sequences in the process.
    pub fn new(
        timestamp: TimestampMs,
        pool: CommonsPoolState,
        dividend_pool: DividendPoolState,
        units: Vec<Unit>,
        wallets: Vec<Wallet>,
        communities: Vec<Community>,
        purposes: Vec<PurposeChannel>,
    ) -> Self {
        let mut snapshot = Self {
            version: CURRENT_SNAPSHOT_VERSION,
            timestamp,
            pool,
            dividend_pool: Some(dividend_pool),
            units,
            wallets,
            communities,
            purposes,
        };
        snapshot.canonicalize();
        snapshot
    }

    /// Effective dividend pool state, substituting the schema-v1 default
    /// (all zeroes) when the field is absent.
    pub fn dividend_pool_or_default(&self) -> DividendPoolState {
        self.dividend_pool.unwrap_or_default()
    }

    /// Sort every set-valued sequence into a fixed, lexicographic order so
    /// the canonical encoding is independent of insertion order.
    fn canonicalize(&mut self) {
        self.units.sort_by(|a, b| a.id.cmp(&b.id));
        for unit in &mut self.units {
            unit.localities.sort();
            unit.purposes.sort();
            unit.provenance.sort_by_key(|p| p.timestamp);
        }
        self.wallets.sort_by(|a, b| a.id.cmp(&b.id));
        for wallet in &mut self.wallets {
            wallet.communities.sort();
            wallet.purposes.sort();
        }
        self.communities.sort_by(|a, b| a.id.cmp(&b.id));
        self.purposes.sort_by(|a, b| a.id.cmp(&b.id));
        for purpose in &mut self.purposes {
            purpose.recipients.sort();
        }
    }

    /// Encode to the canonical byte form used for content addressing.
    pub fn to_canonical_bytes(&self) -> OmniumResult<Vec<u8>> {
        let mut canonical = self.clone();
        canonical.canonicalize();
        Ok(serde_json::to_vec(&canonical)?)
    }

    /// Decode from bytes, rejecting unsupported schema versions. A v1
    /// snapshot (no `dividend_pool` field) is accepted and its dividend pool
    /// treated as the schema default.
    pub fn from_canonical_bytes(bytes: &[u8]) -> OmniumResult<Self> {
        let value: serde_json::Value = serde_json::from_slice(bytes)?;
        let version = value
            .get("version")
            .and_then(|v| v.as_u64())
            .unwrap_or(0) as u32;
        if version != 1 && version != 2 {
            return Err(OmniumError::UnsupportedVersion(version));
        }
        let snapshot: Snapshot = serde_json::from_value(value)?;
        Ok(snapshot)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn empty_snapshot() -> Snapshot {
        Snapshot::new(
            0,
            CommonsPoolState::default(),
            DividendPoolState::default(),
            vec![],
            vec![],
            vec![],
            vec![],
        )
    }

    #[test]
    fn round_trip_preserves_state() {
        let snapshot = empty_snapshot();
        let bytes = snapshot.to_canonical_bytes().unwrap();
        let restored = Snapshot::from_canonical_bytes(&bytes).unwrap();
        assert_eq!(snapshot, restored);
    }

    #[test]
    fn unsupported_version_is_rejected() {
        let mut snapshot = empty_snapshot();
        snapshot.version = 3;
        let bytes = serde_json::to_vec(&snapshot).unwrap();
        let err = Snapshot::from_canonical_bytes(&bytes).unwrap_err();
        assert!(matches!(err, OmniumError::UnsupportedVersion(3)));
    }

    #[test]
    fn v1_snapshot_defaults_dividend_pool() {
        let snapshot = empty_snapshot();
        let mut value = serde_json::to_value(&snapshot).unwrap();
        let obj = value.as_object_mut().unwrap();
        obj.insert("version".to_string(), serde_json::json!(1));
        obj.remove("dividend_pool");
        let bytes = serde_json::to_vec(&value).unwrap();
        let restored = Snapshot::from_canonical_bytes(&bytes).unwrap();
        assert_eq!(restored.dividend_pool, None);
        assert_eq!(restored.dividend_pool_or_default(), DividendPoolState::default());
    }

    #[test]
    fn canonicalization_sorts_sets() {
        let mut snapshot = empty_snapshot();
        snapshot.units.push(Unit {
            id: "z".to_string(),
            magnitude: 1.0,
            stratum: omnium_spec::Stratum::T0,
            localities: vec!["b".to_string(), "a".to_string()],
            purposes: vec![],
            provenance: vec![],
            created_at: 0,
            last_tick_at: 0,
            owner: "alice".to_string(),
        });
        let bytes = snapshot.to_canonical_bytes().unwrap();
        let restored = Snapshot::from_canonical_bytes(&bytes).unwrap();
        assert_eq!(restored.units[0].localities, vec!["a", "b"]);
    }
}
