//! Unit algebra (C1): construct, split, merge, tag, and summarize
//! dimensional units.

use omnium_spec::{
    OmniumError, OmniumResult, ProvenanceEntry, ProvenanceKind, Stratum, TimestampMs,
    TransactionId, Unit, WalletId, T1_LOCKUP_MS, T2_LOCKUP_MS,
};

/// A human-facing summary of a unit's current state.
#[derive(Debug, Clone, PartialEq)]
pub struct UnitSummary {
    pub id: String,
    pub magnitude: f64,
    pub stratum: Stratum,
    pub locked: bool,
    pub reputation: f64,
}

fn new_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

/// Construct a fresh unit with one initial provenance entry.
#[allow(clippy::too_many_arguments)]
pub fn create(
    magnitude: f64,
    stratum: Stratum,
    localities: Vec<String>,
    purposes: Vec<String>,
    owner: WalletId,
    kind: ProvenanceKind,
    from: Option<WalletId>,
    note: Option<String>,
    transaction_id: TransactionId,
    now: TimestampMs,
) -> Unit {
    let entry = ProvenanceEntry {
        timestamp: now,
        kind,
        from,
        to: Some(owner.clone()),
        magnitude,
        note,
        transaction_id,
    };
    Unit {
        id: new_id(),
        magnitude,
        stratum,
        localities,
        purposes,
        provenance: vec![entry],
        created_at: now,
        last_tick_at: now,
        owner,
    }
}

/// Split `unit` into a remainder (keeping `unit.id`) and a fresh piece of
/// magnitude `amount`. Requires `0 < amount < unit.magnitude`.
pub fn split(
    unit: &Unit,
    amount: f64,
    now: TimestampMs,
    transaction_id: TransactionId,
) -> OmniumResult<(Unit, Unit)> {
    if !(amount > 0.0 && amount < unit.magnitude) {
        return Err(OmniumError::Amount(format!(
            "split amount {amount} must be in (0, {})",
            unit.magnitude
        )));
    }

    let remainder_amount = unit.magnitude - amount;

    let mut remainder = unit.clone();
    remainder.magnitude = remainder_amount;
    remainder.last_tick_at = now;
    remainder.provenance.push(ProvenanceEntry {
        timestamp: now,
        kind: ProvenanceKind::Split,
        from: None,
        to: None,
        magnitude: remainder_amount,
        note: Some("remainder after split".to_string()),
        transaction_id: transaction_id.clone(),
    });

    let mut piece = unit.clone();
    piece.id = new_id();
    piece.magnitude = amount;
    piece.last_tick_at = now;
    piece.provenance.push(ProvenanceEntry {
        timestamp: now,
        kind: ProvenanceKind::Split,
        from: None,
        to: None,
        magnitude: amount,
        note: Some("split piece".to_string()),
        transaction_id,
    });

    Ok((remainder, piece))
}

fn as_sorted_set(items: &[String]) -> Vec<String> {
    let mut sorted = items.to_vec();
    sorted.sort();
    sorted
}

/// Merge two or more units sharing temporality, locality set, purpose set
/// and owner into a single new unit. Fails with `MergeIncompatible`
/// otherwise.
pub fn merge(
    units: &[Unit],
    now: TimestampMs,
    transaction_id: TransactionId,
) -> OmniumResult<Unit> {
    if units.len() < 2 {
        return Err(OmniumError::MergeIncompatible(
            "merge requires at least two units".to_string(),
        ));
    }

    let first = &units[0];
    let localities = as_sorted_set(&first.localities);
    let purposes = as_sorted_set(&first.purposes);

    for unit in &units[1..] {
        if unit.stratum != first.stratum {
            return Err(OmniumError::MergeIncompatible(
                "units have different temporal strata".to_string(),
            ));
        }
        if unit.owner != first.owner {
            return Err(OmniumError::MergeIncompatible(
                "units have different owners".to_string(),
            ));
        }
        if as_sorted_set(&unit.localities) != localities {
            return Err(OmniumError::MergeIncompatible(
                "units have different locality sets".to_string(),
            ));
        }
        if as_sorted_set(&unit.purposes) != purposes {
            return Err(OmniumError::MergeIncompatible(
                "units have different purpose sets".to_string(),
            ));
        }
    }

    let total_magnitude: f64 = units.iter().map(|u| u.magnitude).sum();

    let mut provenance: Vec<ProvenanceEntry> =
        units.iter().flat_map(|u| u.provenance.clone()).collect();
    provenance.sort_by_key(|p| p.timestamp);
    provenance.push(ProvenanceEntry {
        timestamp: now,
        kind: ProvenanceKind::Merged,
        from: None,
        to: Some(first.owner.clone()),
        magnitude: total_magnitude,
        note: None,
        transaction_id,
    });

    Ok(Unit {
        id: new_id(),
        magnitude: total_magnitude,
        stratum: first.stratum,
        localities,
        purposes,
        provenance,
        created_at: now,
        last_tick_at: now,
        owner: first.owner.clone(),
    })
}

/// Whether `unit` is currently locked against spend/transfer at time `now`.
pub fn is_locked(unit: &Unit, now: TimestampMs) -> bool {
    match unit.stratum {
        Stratum::T0 => false,
        Stratum::T1 => now < unit.created_at + T1_LOCKUP_MS,
        Stratum::T2 => now < unit.created_at + T2_LOCKUP_MS,
        Stratum::TInfinity => true,
    }
}

/// Append a new provenance entry, preserving time order.
pub fn add_provenance(unit: &mut Unit, entry: ProvenanceEntry) {
    unit.provenance.push(entry);
}

/// Reputation score in [0, 1], rewarding provenance diversity, depth, and
/// the fraction of entries that were earned rather than given or minted.
pub fn reputation_score(unit: &Unit) -> f64 {
    let len = unit.provenance.len();
    if len == 0 {
        return 0.0;
    }

    let mut kinds = std::collections::HashSet::new();
    let mut earned_count = 0usize;
    for entry in &unit.provenance {
        kinds.insert(entry.kind);
        if entry.kind == ProvenanceKind::Earned {
            earned_count += 1;
        }
    }

    let diversity = (kinds.len() as f64 / 5.0).min(0.3);
    let depth = ((len as f64 + 1.0).log10() / 3.0).min(0.3);
    let earned_fraction = (earned_count as f64 / len as f64) * 0.4;

    (diversity + depth + earned_fraction).min(1.0)
}

/// Human-facing summary of a unit's current state.
pub fn summary(unit: &Unit, now: TimestampMs) -> UnitSummary {
    UnitSummary {
        id: unit.id.clone(),
        magnitude: unit.magnitude,
        stratum: unit.stratum,
        locked: is_locked(unit, now),
        reputation: reputation_score(unit),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn minted_unit(magnitude: f64, stratum: Stratum, now: TimestampMs) -> Unit {
        create(
            magnitude,
            stratum,
            vec![],
            vec![],
            "alice".to_string(),
            ProvenanceKind::Minted,
            None,
            None,
            "tx-1".to_string(),
            now,
        )
    }

    #[test]
    fn create_sets_created_and_last_tick_to_clock_sample() {
        let unit = minted_unit(100.0, Stratum::T0, 42);
        assert_eq!(unit.created_at, 42);
        assert_eq!(unit.last_tick_at, 42);
        assert_eq!(unit.provenance.len(), 1);
    }

    #[test]
    fn split_conserves_magnitude_and_keeps_id_on_remainder() {
        let unit = minted_unit(100.0, Stratum::T0, 0);
        let (remainder, piece) = split(&unit, 30.0, 10, "tx-2".to_string()).unwrap();
        assert_eq!(remainder.id, unit.id);
        assert_eq!(remainder.magnitude, 70.0);
        assert_eq!(piece.magnitude, 30.0);
        assert_ne!(piece.id, unit.id);
        assert_eq!(remainder.created_at, unit.created_at);
        assert_eq!(piece.created_at, unit.created_at);
        assert_eq!(remainder.last_tick_at, 10);
        assert_eq!(piece.last_tick_at, 10);
    }

    #[test]
    fn split_rejects_out_of_range_amounts() {
        let unit = minted_unit(100.0, Stratum::T0, 0);
        assert!(matches!(
            split(&unit, 0.0, 1, "tx".to_string()),
            Err(OmniumError::Amount(_))
        ));
        assert!(matches!(
            split(&unit, 100.0, 1, "tx".to_string()),
            Err(OmniumError::Amount(_))
        ));
    }

    #[test]
    fn merge_sums_magnitude_and_resets_lockup_anchor() {
        let a = minted_unit(40.0, Stratum::T1, 0);
        let b = minted_unit(60.0, Stratum::T1, 0);
        let merged = merge(&[a, b], 500, "tx-3".to_string()).unwrap();
        assert_eq!(merged.magnitude, 100.0);
        assert_eq!(merged.created_at, 500);
        assert_eq!(merged.last_tick_at, 500);
        assert!(merged
            .provenance
            .last()
            .map(|p| p.kind == ProvenanceKind::Merged)
            .unwrap_or(false));
    }

    #[test]
    fn merge_rejects_incompatible_strata() {
        let a = minted_unit(40.0, Stratum::T0, 0);
        let b = minted_unit(60.0, Stratum::T1, 0);
        assert!(matches!(
            merge(&[a, b], 500, "tx".to_string()),
            Err(OmniumError::MergeIncompatible(_))
        ));
    }

    #[test]
    fn lockup_windows_by_stratum() {
        let t0 = minted_unit(1.0, Stratum::T0, 0);
        assert!(!is_locked(&t0, 0));

        let t1 = minted_unit(1.0, Stratum::T1, 0);
        assert!(is_locked(&t1, T1_LOCKUP_MS - 1));
        assert!(!is_locked(&t1, T1_LOCKUP_MS));

        let tinf = minted_unit(1.0, Stratum::TInfinity, 0);
        assert!(is_locked(&tinf, i64::MAX));
    }
}
