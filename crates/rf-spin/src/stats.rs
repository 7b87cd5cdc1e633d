//! Session statistics

use serde::{Deserialize, Serialize};

use crate::evaluator::WinClass;

/// Counters for the spins settled in this session
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SessionStats {
    pub total_spins: u64,
    pub total_bet: u64,
    pub total_win: u64,
    pub wins: u64,
    pub losses: u64,
    pub big_wins: u64,
    pub best_payout: u64,
}

impl SessionStats {
    /// Record one settled spin
    pub fn record(&mut self, bet: u64, payout: u64, class: WinClass) {
        self.total_spins += 1;
        self.total_bet += bet;
        self.total_win += payout;
        match class {
            WinClass::None => self.losses += 1,
            WinClass::Win => self.wins += 1,
            WinClass::BigWin => {
                self.wins += 1;
                self.big_wins += 1;
            }
        }
        self.best_payout = self.best_payout.max(payout);
    }

    /// Calculate RTP (%)
    pub fn rtp(&self) -> f64 {
        if self.total_bet > 0 {
            (self.total_win as f64 / self.total_bet as f64) * 100.0
        } else {
            0.0
        }
    }

    /// Calculate hit rate (%)
    pub fn hit_rate(&self) -> f64 {
        if self.total_spins > 0 {
            (self.wins as f64 / self.total_spins as f64) * 100.0
        } else {
            0.0
        }
    }

    /// Net result for the player
    pub fn net(&self) -> i64 {
        self.total_win as i64 - self.total_bet as i64
    }
}
