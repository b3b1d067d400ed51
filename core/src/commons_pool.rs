//! Commons Pool (C2): the single authoritative mint/burn counter and the
//! ledger's simulated clock.

use omnium_spec::{CommonsPoolState, OmniumError, OmniumResult, TimestampMs, Unit};

/// Wraps `CommonsPoolState`, enforcing `current_supply = total_minted -
/// total_burned` on every mutator.
#[derive(Debug, Clone)]
pub struct CommonsPool {
    state: CommonsPoolState,
}

impl Default for CommonsPool {
    fn default() -> Self {
        Self::new()
    }
}

impl CommonsPool {
    pub fn new() -> Self {
        Self {
            state: CommonsPoolState::default(),
        }
    }

    pub fn from_state(state: CommonsPoolState) -> Self {
        Self { state }
    }

    pub fn state(&self) -> CommonsPoolState {
        self.state
    }

    /// Increase `total_minted` and `current_supply` by `amount`. Requires
    /// `amount > 0`; rejects a mint that would overflow supply to infinity.
    pub fn mint(&mut self, amount: f64) -> OmniumResult<()> {
        if amount <= 0.0 {
            return Err(OmniumError::Positive);
        }
        let total_minted = self.state.total_minted + amount;
        let current_supply = self.state.current_supply + amount;
        if !total_minted.is_finite() || !current_supply.is_finite() {
            return Err(OmniumError::Amount(
                "mint would overflow supply to infinity".to_string(),
            ));
        }
        self.state.total_minted = total_minted;
        self.state.current_supply = current_supply;
        tracing::info!(amount, supply = current_supply, "commons pool minted");
        Ok(())
    }

    /// Remove `unit` from circulation, decrementing `current_supply` by its
    /// magnitude.
    pub fn burn(&mut self, unit: &Unit) {
        self.state.total_burned += unit.magnitude;
        self.state.current_supply -= unit.magnitude;
        tracing::info!(unit = %unit.id, magnitude = unit.magnitude, "commons pool burned unit");
    }

    /// Remove `fee` from circulation as a supply sink. Requires `0 < fee <
    /// magnitude`. The caller decides whether to credit an equal amount to
    /// the Dividend Pool.
    pub fn collect_fee(&mut self, magnitude: f64, fee: f64) -> OmniumResult<()> {
        if !(fee > 0.0 && fee < magnitude) {
            return Err(OmniumError::Amount(format!(
                "fee {fee} must be in (0, {magnitude})"
            )));
        }
        self.state.total_burned += fee;
        self.state.current_supply -= fee;
        Ok(())
    }

    pub fn advance_time(&mut self, delta_ms: i64) {
        self.state.current_time += delta_ms;
    }

    pub fn set_time(&mut self, t: TimestampMs) {
        self.state.current_time = t;
    }

    pub fn get_time(&self) -> TimestampMs {
        self.state.current_time
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mint_rejects_non_positive_amounts() {
        let mut pool = CommonsPool::new();
        assert!(matches!(pool.mint(0.0), Err(OmniumError::Positive)));
        assert!(matches!(pool.mint(-1.0), Err(OmniumError::Positive)));
    }

    #[test]
    fn mint_updates_supply_invariant() {
        let mut pool = CommonsPool::new();
        pool.mint(100.0).unwrap();
        assert_eq!(pool.state().current_supply, 100.0);
        assert_eq!(
            pool.state().current_supply,
            pool.state().total_minted - pool.state().total_burned
        );
    }

    #[test]
    fn mint_huge_amount_succeeds_but_overflow_is_rejected() {
        let mut pool = CommonsPool::new();
        assert!(pool.mint(f64::MAX).is_ok());
        assert!(matches!(pool.mint(f64::MAX), Err(OmniumError::Amount(_))));
    }

    #[test]
    fn collect_fee_rejects_fee_equal_to_magnitude() {
        let mut pool = CommonsPool::new();
        pool.mint(100.0).unwrap();
        assert!(matches!(
            pool.collect_fee(100.0, 100.0),
            Err(OmniumError::Amount(_))
        ));
    }

    #[test]
    fn clock_advances_and_sets() {
        let mut pool = CommonsPool::new();
        pool.set_time(1_000);
        pool.advance_time(500);
        assert_eq!(pool.get_time(), 1_500);
    }
}
