//! Pay table: symbol-count thresholds mapped to bet multipliers

use serde::{Deserialize, Serialize};

/// A single threshold rule
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PayRule {
    /// Minimum number of matching symbols anywhere on the grid
    pub min_count: u32,
    /// Bet multiplier paid when the rule applies
    pub multiplier: u32,
}

impl PayRule {
    pub const fn new(min_count: u32, multiplier: u32) -> Self {
        Self {
            min_count,
            multiplier,
        }
    }
}

/// Ordered pay table
///
/// Rules are kept sorted by descending `min_count`. A symbol count resolves
/// to the first rule it satisfies; lower thresholds never stack on top.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Vec<PayRule>", into = "Vec<PayRule>")]
pub struct PayTable {
    rules: Vec<PayRule>,
}

impl PayTable {
    /// Create a pay table, ordering rules highest threshold first
    pub fn new(mut rules: Vec<PayRule>) -> Self {
        rules.sort_by(|a, b| b.min_count.cmp(&a.min_count));
        Self { rules }
    }

    /// 12+ pays ×10, 10+ pays ×5, 8+ pays ×2
    pub fn standard() -> Self {
        Self::new(vec![
            PayRule::new(12, 10),
            PayRule::new(10, 5),
            PayRule::new(8, 2),
        ])
    }

    /// Multiplier of the highest rule satisfied by `count`, 0 if none
    pub fn highest_pay(&self, count: u32) -> u32 {
        self.rules
            .iter()
            .find(|rule| count >= rule.min_count)
            .map(|rule| rule.multiplier)
            .unwrap_or(0)
    }

    /// Smallest count that pays anything
    pub fn min_paying_count(&self) -> Option<u32> {
        self.rules.last().map(|rule| rule.min_count)
    }

    /// Largest multiplier a single symbol can earn
    pub fn max_multiplier(&self) -> u32 {
        self.rules.iter().map(|r| r.multiplier).max().unwrap_or(0)
    }

    pub fn rules(&self) -> &[PayRule] {
        &self.rules
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

impl Default for PayTable {
    fn default() -> Self {
        Self::standard()
    }
}

impl From<Vec<PayRule>> for PayTable {
    fn from(rules: Vec<PayRule>) -> Self {
        Self::new(rules)
    }
}

impl From<PayTable> for Vec<PayRule> {
    fn from(table: PayTable) -> Self {
        table.rules
    }
}
