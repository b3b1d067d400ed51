//! Temporal engine (C6): lazy, per-unit continuous-compound demurrage and
//! dividend accrual, settled against the Dividend Pool.

use crate::dividend_pool::DividendPool;
use omnium_spec::{Stratum, TimestampMs, Unit, YEAR_MS};

/// Aggregate result of one `tick` call across a batch of units.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct TickResult {
    pub updated: u64,
    pub total_demurrage: f64,
    pub total_dividend: f64,
}

fn rates(stratum: Stratum) -> (f64, f64) {
    // (demurrage_rate_per_year, dividend_rate_per_year)
    match stratum {
        Stratum::T0 => (0.02, 0.0),
        Stratum::T1 => (0.0, 0.0),
        Stratum::T2 => (0.0, 0.03),
        Stratum::TInfinity => (0.0, 0.015),
    }
}

/// Advance every unit's accrual to `now`. Units whose `last_tick_at`
/// already equals `now` are untouched. Lockup status does not gate
/// accrual.
pub fn tick(units: &mut [Unit], dividend_pool: &mut DividendPool, now: TimestampMs) -> TickResult {
    let mut result = TickResult::default();

    for unit in units.iter_mut() {
        let elapsed_ms = now - unit.last_tick_at;
        if elapsed_ms <= 0 {
            continue;
        }
        let delta_years = elapsed_ms as f64 / YEAR_MS as f64;
        let (demurrage_rate, dividend_rate) = rates(unit.stratum);
        let growth_rate = dividend_rate - demurrage_rate;
        let new_magnitude = unit.magnitude * (growth_rate * delta_years).exp();
        let diff = new_magnitude - unit.magnitude;

        if diff > 0.0 {
            let disbursed = dividend_pool.withdraw(diff);
            unit.magnitude += disbursed;
            result.total_dividend += disbursed;
        } else if diff < 0.0 {
            let amount = -diff;
            dividend_pool.deposit(amount);
            unit.magnitude -= amount;
            result.total_demurrage += amount;
        }

        unit.last_tick_at = now;
        result.updated += 1;
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use omnium_spec::{ProvenanceEntry, ProvenanceKind};

    fn unit(stratum: Stratum, magnitude: f64) -> Unit {
        Unit {
            id: "u1".to_string(),
            magnitude,
            stratum,
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
    fn tick_applies_t0_demurrage_over_one_year() {
        let mut units = vec![unit(Stratum::T0, 100.0)];
        let mut pool = DividendPool::new();
        let result = tick(&mut units, &mut pool, YEAR_MS);

        assert_eq!(result.updated, 1);
        assert!((units[0].magnitude - 100.0 * (-0.02_f64).exp()).abs() < 1e-6);
        assert!((pool.balance() - (100.0 - 100.0 * (-0.02_f64).exp())).abs() < 1e-6);
    }

    #[test]
    fn t2_units_earn_dividends_from_the_pool() {
        let mut units = vec![unit(Stratum::T2, 100.0)];
        let mut pool = DividendPool::new();
        pool.deposit(1000.0);
        let result = tick(&mut units, &mut pool, YEAR_MS);

        assert!(units[0].magnitude > 100.0);
        assert!(result.total_dividend > 0.0);
    }

    #[test]
    fn dividend_shortfall_is_capped_at_available_balance() {
        let mut units = vec![unit(Stratum::T2, 100.0)];
        let mut pool = DividendPool::new();
        // Empty pool: dividend owed cannot be paid in full.
        let result = tick(&mut units, &mut pool, YEAR_MS);
        assert_eq!(result.total_dividend, 0.0);
        assert_eq!(units[0].magnitude, 100.0);
        assert!(pool.export().total_requested > 0.0);
    }

    #[test]
    fn unelapsed_time_is_a_no_op() {
        let mut units = vec![unit(Stratum::T0, 100.0)];
        let mut pool = DividendPool::new();
        let result = tick(&mut units, &mut pool, 0);
        assert_eq!(result.updated, 0);
        assert_eq!(units[0].magnitude, 100.0);
    }

    #[test]
    fn t1_units_are_neutral() {
        let mut units = vec![unit(Stratum::T1, 100.0)];
        let mut pool = DividendPool::new();
        tick(&mut units, &mut pool, YEAR_MS);
        assert_eq!(units[0].magnitude, 100.0);
    }
}
