//! Milestone reward gate
//!
//! Minting happens elsewhere; this only tracks whether the player may claim.

use serde::{Deserialize, Serialize};

/// Reward eligibility state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RewardGate {
    threshold: u64,
    claimed: bool,
}

impl RewardGate {
    pub fn new(threshold: u64, claimed: bool) -> Self {
        Self { threshold, claimed }
    }

    pub fn threshold(&self) -> u64 {
        self.threshold
    }

    pub fn is_claimed(&self) -> bool {
        self.claimed
    }

    /// Balance reached the threshold and nothing was claimed yet
    pub fn is_eligible(&self, balance: u64) -> bool {
        !self.claimed && balance >= self.threshold
    }

    /// Points still missing before the reward unlocks
    pub fn remaining(&self, balance: u64) -> u64 {
        self.threshold.saturating_sub(balance)
    }

    pub fn mark_claimed(&mut self) {
        self.claimed = true;
    }
}
