//! Spin engine configuration

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{EngineResult, SpinError};
use crate::paytable::PayTable;
use crate::symbols::SymbolCatalog;
use crate::timing::RevealTiming;

/// Grid specification (rows × columns)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GridSpec {
    /// Visible rows
    pub rows: u8,
    /// Columns, revealed one after another
    pub cols: u8,
}

impl GridSpec {
    /// 5 rows × 6 columns
    pub fn standard_5x6() -> Self {
        Self { rows: 5, cols: 6 }
    }

    /// Total grid positions
    pub fn total_positions(&self) -> usize {
        self.rows as usize * self.cols as usize
    }

    /// Cell index for a position
    pub fn index(&self, row: u8, col: u8) -> usize {
        row as usize * self.cols as usize + col as usize
    }
}

impl Default for GridSpec {
    fn default() -> Self {
        Self::standard_5x6()
    }
}

/// Thresholds for the big win classification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BigWinRule {
    /// Best single-symbol multiplier that counts as a big win
    pub min_best_multiplier: u32,
    /// Payout, in bets, that counts as a big win
    pub min_payout_ratio: u32,
}

impl Default for BigWinRule {
    fn default() -> Self {
        Self {
            min_best_multiplier: 10,
            min_payout_ratio: 8,
        }
    }
}

/// Milestone reward and top-up settings
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RewardConfig {
    /// Balance needed to unlock the milestone reward
    pub threshold: u64,
    /// Points granted per top-up
    pub top_up_amount: u64,
}

impl Default for RewardConfig {
    fn default() -> Self {
        Self {
            threshold: 1500,
            top_up_amount: 1000,
        }
    }
}

/// Complete engine configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SpinConfig {
    pub grid: GridSpec,
    /// Cost of one spin
    pub bet_amount: u64,
    pub pay_table: PayTable,
    pub symbols: SymbolCatalog,
    pub timing: RevealTiming,
    pub big_win: BigWinRule,
    pub reward: RewardConfig,
}

impl Default for SpinConfig {
    fn default() -> Self {
        Self {
            grid: GridSpec::default(),
            bet_amount: 20,
            pay_table: PayTable::standard(),
            symbols: SymbolCatalog::candy(),
            timing: RevealTiming::normal(),
            big_win: BigWinRule::default(),
            reward: RewardConfig::default(),
        }
    }
}

impl SpinConfig {
    /// Load and validate a JSON config file
    pub fn load_from<P: AsRef<Path>>(path: P) -> EngineResult<Self> {
        let content = fs::read_to_string(path.as_ref())?;
        let config: Self = serde_json::from_str(&content)?;
        config.validate()?;
        log::debug!("Loaded spin config from {:?}", path.as_ref());
        Ok(config)
    }

    /// Save config as pretty JSON
    pub fn save_to<P: AsRef<Path>>(&self, path: P) -> EngineResult<()> {
        if let Some(parent) = path.as_ref().parent() {
            fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json)?;
        Ok(())
    }

    /// Use turbo reveal timing
    pub fn with_turbo(mut self) -> Self {
        self.timing = RevealTiming::turbo();
        self
    }

    pub fn validate(&self) -> EngineResult<()> {
        let invalid = |msg: &str| Err(SpinError::InvalidConfig(msg.to_string()));

        if self.grid.rows == 0 || self.grid.cols == 0 {
            return invalid("grid must have at least one row and one column");
        }
        if self.bet_amount == 0 {
            return invalid("bet_amount must be greater than zero");
        }
        if self.symbols.is_empty() {
            return invalid("symbol catalog is empty");
        }
        if self.symbols.len() > u8::MAX as usize + 1 {
            return invalid("symbol catalog holds more than 256 symbols");
        }
        if self
            .pay_table
            .rules()
            .iter()
            .any(|rule| rule.min_count == 0 || rule.multiplier == 0)
        {
            return invalid("pay rules need a non-zero min_count and multiplier");
        }
        if let Some(min_count) = self.pay_table.min_paying_count() {
            let qualifying = (self.grid.total_positions() / min_count as usize)
                .min(self.symbols.len()) as u64;
            let max_payout = (self.pay_table.max_multiplier() as u64)
                .checked_mul(qualifying)
                .filter(|&total| total <= u32::MAX as u64)
                .and_then(|total| total.checked_mul(self.bet_amount));
            if max_payout.is_none() {
                return invalid("pay table multipliers overflow the payout range");
            }
        }
        self.timing.validate(self.grid.cols)
    }
}
