//! Dividend Pool (C3): absorbs demurrage and pays dividends, decoupling the
//! temporal engine from the Commons Pool's supply counter.

use omnium_spec::DividendPoolState;

/// Wraps `DividendPoolState`, enforcing `balance = total_collected -
/// total_distributed >= 0`.
#[derive(Debug, Clone)]
pub struct DividendPool {
    state: DividendPoolState,
}

impl Default for DividendPool {
    fn default() -> Self {
        Self::new()
    }
}

impl DividendPool {
    pub fn new() -> Self {
        Self {
            state: DividendPoolState::default(),
        }
    }

    pub fn export(&self) -> DividendPoolState {
        self.state
    }

    pub fn import(state: DividendPoolState) -> Self {
        Self { state }
    }

    pub fn balance(&self) -> f64 {
        self.state.balance
    }

    /// Deposit demurrage (or any other credit) into the pool.
    pub fn deposit(&mut self, amount: f64) {
        debug_assert!(amount >= 0.0, "deposit amount must be non-negative");
        self.state.balance += amount;
        self.state.total_collected += amount;
        self.state.deposit_count += 1;
    }

    /// Withdraw up to `amount`, capped at the available balance. Returns the
    /// amount actually disbursed; a shortfall is recorded in
    /// `total_requested` but not paid.
    pub fn withdraw(&mut self, amount: f64) -> f64 {
        debug_assert!(amount >= 0.0, "withdraw amount must be non-negative");
        self.state.total_requested += amount;
        let disbursed = amount.min(self.state.balance);
        self.state.balance -= disbursed;
        self.state.total_distributed += disbursed;
        self.state.withdrawal_count += 1;
        if disbursed < amount {
            tracing::warn!(
                requested = amount,
                disbursed,
                "dividend pool withdrawal short-paid"
            );
        }
        disbursed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deposit_increases_balance_and_collected() {
        let mut pool = DividendPool::new();
        pool.deposit(10.0);
        pool.deposit(5.0);
        assert_eq!(pool.balance(), 15.0);
        assert_eq!(pool.export().total_collected, 15.0);
        assert_eq!(pool.export().deposit_count, 2);
    }

    #[test]
    fn withdraw_caps_at_balance_and_records_shortfall() {
        let mut pool = DividendPool::new();
        pool.deposit(10.0);
        let disbursed = pool.withdraw(30.0);
        assert_eq!(disbursed, 10.0);
        assert_eq!(pool.balance(), 0.0);
        assert_eq!(pool.export().total_requested, 30.0);
        assert_eq!(pool.export().total_distributed, 10.0);
    }

    #[test]
    fn balance_invariant_holds() {
        let mut pool = DividendPool::new();
        pool.deposit(20.0);
        pool.withdraw(5.0);
        let state = pool.export();
        assert_eq!(state.balance, state.total_collected - state.total_distributed);
    }
}
