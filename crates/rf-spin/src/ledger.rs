//! Player balance bookkeeping

use serde::{Deserialize, Serialize};

use crate::error::{EngineResult, SpinError};

/// Balance and last-win record
///
/// Owned by the spin machine; nothing else mutates it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ledger {
    balance: u64,
    last_win: u64,
}

impl Ledger {
    /// Ledger restored with a starting balance
    pub fn with_balance(balance: u64) -> Self {
        Self {
            balance,
            last_win: 0,
        }
    }

    pub fn balance(&self) -> u64 {
        self.balance
    }

    pub fn last_win(&self) -> u64 {
        self.last_win
    }

    pub fn can_afford(&self, amount: u64) -> bool {
        self.balance >= amount
    }

    /// Take `amount` from the balance
    pub fn deduct(&mut self, amount: u64) -> EngineResult<u64> {
        if amount > self.balance {
            return Err(SpinError::InsufficientBalance {
                balance: self.balance,
                bet: amount,
            });
        }
        self.balance -= amount;
        Ok(self.balance)
    }

    /// Add `amount` to the balance
    pub fn credit(&mut self, amount: u64) -> u64 {
        self.balance = self.balance.saturating_add(amount);
        self.balance
    }

    /// Record the payout of the round just settled (0 on a loss)
    pub fn record_win(&mut self, amount: u64) {
        self.last_win = amount;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deduct_and_credit() {
        let mut ledger = Ledger::with_balance(100);
        assert_eq!(ledger.deduct(20).unwrap(), 80);
        assert_eq!(ledger.credit(40), 120);
        assert_eq!(ledger.balance(), 120);
    }

    #[test]
    fn test_overdraw_refused() {
        let mut ledger = Ledger::with_balance(19);
        let err = ledger.deduct(20).unwrap_err();
        assert!(matches!(
            err,
            SpinError::InsufficientBalance { balance: 19, bet: 20 }
        ));
        assert_eq!(ledger.balance(), 19);
    }

    #[test]
    fn test_exact_balance() {
        let mut ledger = Ledger::with_balance(20);
        assert!(ledger.can_afford(20));
        assert_eq!(ledger.deduct(20).unwrap(), 0);
        assert!(!ledger.can_afford(1));
    }

    #[test]
    fn test_running_sum() {
        let mut ledger = Ledger::default();
        let moves: [(bool, u64); 6] = [
            (true, 1000),
            (false, 20),
            (true, 40),
            (false, 20),
            (false, 20),
            (true, 200),
        ];
        let mut expected: i64 = 0;
        for (is_credit, amount) in moves {
            if is_credit {
                ledger.credit(amount);
                expected += amount as i64;
            } else {
                ledger.deduct(amount).unwrap();
                expected -= amount as i64;
            }
        }
        assert_eq!(ledger.balance() as i64, expected);
    }

    #[test]
    fn test_last_win() {
        let mut ledger = Ledger::with_balance(50);
        assert_eq!(ledger.last_win(), 0);
        ledger.record_win(40);
        assert_eq!(ledger.last_win(), 40);
        ledger.record_win(0);
        assert_eq!(ledger.last_win(), 0);
    }

    #[test]
    fn test_credit_saturates() {
        let mut ledger = Ledger::with_balance(u64::MAX - 1);
        assert_eq!(ledger.credit(10), u64::MAX);
    }
}
