//! Conversion engine (C5): computes Ω′ = Ω·f(ΔT)·f(ΔL)·f(ΔP)·f(ΔR) in four
//! deterministic phases, each deducting its own fee from the running
//! magnitude.

use crate::registries::{CommunityRegistry, PurposeRegistry};
use omnium_spec::{
    ConversionFees, ConversionRequest, OmniumError, OmniumResult, ProvenanceEntry, ProvenanceKind,
    Stratum, TimestampMs, TransactionId, Unit,
};

const LOCALITY_ADD_FEE: f64 = 0.01;
const LOCALITY_REMOVE_DEFAULT_FEE: f64 = 0.03;
const PURPOSE_REMOVE_DEFAULT_FEE: f64 = 0.03;
const REPUTATION_STRIP_FEE: f64 = 0.05;

fn stratum_rank(stratum: Stratum) -> u8 {
    match stratum {
        Stratum::T0 => 0,
        Stratum::T1 => 1,
        Stratum::T2 => 2,
        Stratum::TInfinity => 3,
    }
}

fn temporal_fee_rate(from: Stratum, to: Stratum) -> f64 {
    if stratum_rank(to) >= stratum_rank(from) {
        return 0.0;
    }
    match (from, to) {
        (Stratum::T1, Stratum::T0) => 0.02,
        (Stratum::T2, Stratum::T0) => 0.05,
        (Stratum::T2, Stratum::T1) => 0.03,
        (Stratum::TInfinity, Stratum::T0) => 0.10,
        (Stratum::TInfinity, Stratum::T1) => 0.08,
        (Stratum::TInfinity, Stratum::T2) => 0.05,
        _ => 0.0,
    }
}

struct Computed {
    magnitude: f64,
    fees: ConversionFees,
    stratum: Stratum,
    localities: Vec<String>,
    purposes: Vec<String>,
    strip_reputation: bool,
}

fn compute(
    unit: &Unit,
    request: &ConversionRequest,
    communities: &CommunityRegistry,
    purposes_registry: &PurposeRegistry,
) -> OmniumResult<Computed> {
    let mut m = unit.magnitude;
    let mut fees = ConversionFees::default();
    let new_stratum = request.target_stratum.unwrap_or(unit.stratum);

    // Phase 1: temporal.
    if new_stratum != unit.stratum {
        let rate = temporal_fee_rate(unit.stratum, new_stratum);
        fees.temporal = m * rate;
        m -= fees.temporal;
        tracing::debug!(fee = fees.temporal, phase = "temporal", "conversion phase fee");
    }

    // Phase 2: locality.
    let mut localities = unit.localities.clone();
    for added in &request.add_localities {
        if communities.get(added).is_err() {
            return Err(OmniumError::CommunityUnknown(added.clone()));
        }
        if !localities.iter().any(|c| c == added) {
            fees.locality += m * LOCALITY_ADD_FEE;
            m -= m * LOCALITY_ADD_FEE;
            localities.push(added.clone());
        }
    }
    for removed in &request.remove_localities {
        if let Some(pos) = localities.iter().position(|c| c == removed) {
            let rate = communities
                .get(removed)
                .map(|c| c.boundary_fee)
                .unwrap_or(LOCALITY_REMOVE_DEFAULT_FEE);
            fees.locality += m * rate;
            m -= m * rate;
            localities.remove(pos);
        }
    }
    localities.sort();
    tracing::debug!(fee = fees.locality, phase = "locality", "conversion phase fee");

    // Phase 3: purpose.
    let mut unit_purposes = unit.purposes.clone();
    for added in &request.add_purposes {
        if purposes_registry.get(added).is_err() {
            return Err(OmniumError::PurposeUnknown(added.clone()));
        }
        if !unit_purposes.iter().any(|p| p == added) {
            unit_purposes.push(added.clone());
        }
    }
    for removed in &request.remove_purposes {
        if let Some(pos) = unit_purposes.iter().position(|p| p == removed) {
            let rate = purposes_registry
                .get(removed)
                .map(|p| p.conversion_discount)
                .unwrap_or(PURPOSE_REMOVE_DEFAULT_FEE);
            fees.purpose += m * rate;
            m -= m * rate;
            unit_purposes.remove(pos);
        }
    }
    unit_purposes.sort();
    tracing::debug!(fee = fees.purpose, phase = "purpose", "conversion phase fee");

    // Phase 4: reputation strip.
    if request.strip_reputation {
        fees.reputation = m * REPUTATION_STRIP_FEE;
        m -= fees.reputation;
    }
    tracing::debug!(fee = fees.reputation, phase = "reputation", "conversion phase fee");

    if m <= 0.0 {
        return Err(OmniumError::FeesExceedValue);
    }

    Ok(Computed {
        magnitude: m,
        fees,
        stratum: new_stratum,
        localities,
        purposes: unit_purposes,
        strip_reputation: request.strip_reputation,
    })
}

/// Compute the resulting magnitude and fee breakdown without mutating
/// anything.
pub fn preview(
    unit: &Unit,
    request: &ConversionRequest,
    communities: &CommunityRegistry,
    purposes_registry: &PurposeRegistry,
) -> OmniumResult<(f64, ConversionFees)> {
    let computed = compute(unit, request, communities, purposes_registry)?;
    Ok((computed.magnitude, computed.fees))
}

/// Check whether a conversion request would succeed against `unit`,
/// without mutating anything.
pub fn validate(
    unit: &Unit,
    request: &ConversionRequest,
    communities: &CommunityRegistry,
    purposes_registry: &PurposeRegistry,
) -> (bool, Option<String>) {
    match compute(unit, request, communities, purposes_registry) {
        Ok(_) => (true, None),
        Err(err) => (false, Some(err.to_string())),
    }
}

/// Apply a conversion request to `unit`, producing the new unit. The
/// lockup clock restarts: `created_at` and `last_tick_at` become `now`.
pub fn convert(
    unit: &Unit,
    request: &ConversionRequest,
    communities: &CommunityRegistry,
    purposes_registry: &PurposeRegistry,
    now: TimestampMs,
    transaction_id: TransactionId,
) -> OmniumResult<Unit> {
    let computed = compute(unit, request, communities, purposes_registry)?;

    let mut provenance = if computed.strip_reputation {
        vec![]
    } else {
        unit.provenance.clone()
    };
    provenance.push(ProvenanceEntry {
        timestamp: now,
        kind: ProvenanceKind::Converted,
        from: None,
        to: Some(unit.owner.clone()),
        magnitude: computed.magnitude,
        note: Some(format!(
            "converted {:?} -> {:?}, total fee {:.6}",
            unit.stratum,
            computed.stratum,
            computed.fees.total()
        )),
        transaction_id,
    });

    Ok(Unit {
        id: uuid::Uuid::new_v4().to_string(),
        magnitude: computed.magnitude,
        stratum: computed.stratum,
        localities: computed.localities,
        purposes: computed.purposes,
        provenance,
        created_at: now,
        last_tick_at: now,
        owner: unit.owner.clone(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use omnium_spec::ProvenanceKind;

    fn unit_t2(magnitude: f64) -> Unit {
        Unit {
            id: "u1".to_string(),
            magnitude,
            stratum: Stratum::T2,
            localities: vec![],
            purposes: vec![],
            provenance: vec![ProvenanceEntry {
                timestamp: 0,
                kind: ProvenanceKind::Minted,
                from: None,
                to: None,
                magnitude,
                note: None,
                transaction_id: "tx".to_string(),
            }],
            created_at: 0,
            last_tick_at: 0,
            owner: "alice".to_string(),
        }
    }

    #[test]
    fn convert_t2_to_t0_with_locality_and_reputation_strip() {
        let mut communities = CommunityRegistry::new();
        communities
            .create("v".to_string(), "Village".to_string(), "".to_string(), 0.03, 0)
            .unwrap();
        let mut purposes = PurposeRegistry::new();
        purposes
            .create("edu".to_string(), "Education".to_string(), "".to_string(), 0.0, 0)
            .unwrap();

        let unit = unit_t2(100.0);
        let request = ConversionRequest {
            target_stratum: Some(Stratum::T0),
            add_localities: vec!["v".to_string()],
            add_purposes: vec!["edu".to_string()],
            strip_reputation: true,
            ..Default::default()
        };

        let (magnitude, fees) = preview(&unit, &request, &communities, &purposes).unwrap();
        assert!((magnitude - 89.3475).abs() < 1e-6);
        assert!((fees.total() - 10.6525).abs() < 1e-6);
        assert!((fees.temporal - 5.0).abs() < 1e-9);
        assert!((fees.locality - 0.95).abs() < 1e-9);
        assert_eq!(fees.purpose, 0.0);
        assert!((fees.reputation - 4.7025).abs() < 1e-4);
    }

    #[test]
    fn convert_restarts_lockup_clock_and_resets_provenance_on_strip() {
        let communities = CommunityRegistry::new();
        let purposes = PurposeRegistry::new();
        let unit = unit_t2(100.0);
        let request = ConversionRequest {
            target_stratum: Some(Stratum::T0),
            strip_reputation: true,
            ..Default::default()
        };
        let result = convert(&unit, &request, &communities, &purposes, 999, "tx-2".to_string())
            .unwrap();
        assert_eq!(result.created_at, 999);
        assert_eq!(result.last_tick_at, 999);
        assert_eq!(result.provenance.len(), 1);
        assert_eq!(result.provenance[0].kind, ProvenanceKind::Converted);
    }

    #[test]
    fn unknown_locality_on_add_errors() {
        let communities = CommunityRegistry::new();
        let purposes = PurposeRegistry::new();
        let unit = unit_t2(100.0);
        let request = ConversionRequest {
            add_localities: vec!["ghost".to_string()],
            ..Default::default()
        };
        let err = convert(&unit, &request, &communities, &purposes, 0, "tx".to_string())
            .unwrap_err();
        assert!(matches!(err, OmniumError::CommunityUnknown(_)));
    }

    #[test]
    fn fees_exceeding_value_are_rejected() {
        let mut communities = CommunityRegistry::new();
        communities
            .create(
                "full".to_string(),
                "Full Exit Fee".to_string(),
                "".to_string(),
                1.0,
                0,
            )
            .unwrap();
        let purposes = PurposeRegistry::new();

        let mut unit = unit_t2(100.0);
        unit.localities = vec!["full".to_string()];
        let request = ConversionRequest {
            remove_localities: vec!["full".to_string()],
            ..Default::default()
        };

        let err = convert(&unit, &request, &communities, &purposes, 0, "tx".to_string())
            .unwrap_err();
        assert!(matches!(err, OmniumError::FeesExceedValue));
    }
}
