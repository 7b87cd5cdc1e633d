//! Win evaluation
//!
//! Tallies every symbol on the grid and resolves each count against the pay
//! table. Distinct symbols pay independently in the same round.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::config::BigWinRule;
use crate::grid::Grid;
use crate::paytable::PayTable;
use crate::symbols::SymbolId;

/// A symbol whose count reached a pay rule
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SymbolWin {
    pub symbol: SymbolId,
    pub count: u32,
    pub multiplier: u32,
}

/// Result classification used by presentation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum WinClass {
    #[default]
    None,
    Win,
    BigWin,
}

impl WinClass {
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::None => "NO WIN",
            Self::Win => "WIN",
            Self::BigWin => "MEGA WIN",
        }
    }
}

/// Result of evaluating a grid
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Evaluation {
    /// Occurrences per symbol, indexed by symbol ID
    pub counts: Vec<u32>,
    /// Qualifying symbols in catalog order
    pub symbol_wins: Vec<SymbolWin>,
    /// Sum of the resolved multipliers
    pub total_multiplier: u32,
    /// Largest single-symbol multiplier
    pub best_multiplier: u32,
    /// Symbol that produced `best_multiplier` (lowest ID on ties)
    pub best_symbol: Option<SymbolId>,
    /// Cells holding a qualifying symbol
    pub winning_cells: BTreeSet<usize>,
    /// bet × total multiplier
    pub payout: u64,
}

impl Evaluation {
    /// Check if this is a winning spin
    pub fn is_win(&self) -> bool {
        self.total_multiplier > 0
    }

    /// Classify against big win thresholds
    pub fn classify(&self, rule: &BigWinRule, bet: u64) -> WinClass {
        if !self.is_win() {
            return WinClass::None;
        }
        let big_payout = bet.saturating_mul(rule.min_payout_ratio as u64);
        if self.best_multiplier >= rule.min_best_multiplier || self.payout >= big_payout {
            WinClass::BigWin
        } else {
            WinClass::Win
        }
    }
}

/// Evaluate `grid` for a spin costing `bet`
pub fn evaluate(grid: &Grid, pay_table: &PayTable, symbol_count: usize, bet: u64) -> Evaluation {
    let counts = grid.counts(symbol_count);

    let symbol_wins: Vec<SymbolWin> = counts
        .iter()
        .enumerate()
        .filter(|&(_, &count)| count > 0)
        .filter_map(|(symbol, &count)| {
            let multiplier = pay_table.highest_pay(count);
            (multiplier > 0).then_some(SymbolWin {
                symbol: symbol as SymbolId,
                count,
                multiplier,
            })
        })
        .collect();

    let total_multiplier = symbol_wins
        .iter()
        .fold(0u32, |total, w| total.saturating_add(w.multiplier));

    let mut best_multiplier = 0;
    let mut best_symbol = None;
    for win in &symbol_wins {
        if win.multiplier > best_multiplier {
            best_multiplier = win.multiplier;
            best_symbol = Some(win.symbol);
        }
    }

    let winning_cells = grid
        .symbols()
        .iter()
        .enumerate()
        .filter(|&(_, symbol)| symbol_wins.iter().any(|w| w.symbol == *symbol))
        .map(|(index, _)| index)
        .collect();

    Evaluation {
        counts,
        symbol_wins,
        total_multiplier,
        best_multiplier,
        best_symbol,
        winning_cells,
        payout: bet.saturating_mul(total_multiplier as u64),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::GridSpec;
    use crate::grid::GridGenerator;
    use crate::paytable::PayRule;

    const BET: u64 = 20;

    /// Grid filled from `(symbol, count)` pairs, remaining cells cycle 1, 3, 5
    fn grid_with(placements: &[(SymbolId, usize)]) -> Grid {
        let mut symbols = Vec::new();
        for &(symbol, count) in placements {
            symbols.extend(std::iter::repeat_n(symbol, count));
        }
        let filler = [1, 3, 5];
        let mut i = 0;
        while symbols.len() < 30 {
            symbols.push(filler[i % filler.len()]);
            i += 1;
        }
        Grid::from_symbols(GridSpec::standard_5x6(), symbols, 6).unwrap()
    }

    #[test]
    fn test_eight_of_a_kind() {
        // 8 × symbol 0, no other symbol above 7
        let mut symbols = vec![0; 8];
        symbols.extend(std::iter::repeat_n(1, 7));
        symbols.extend(std::iter::repeat_n(2, 7));
        symbols.extend(std::iter::repeat_n(3, 4));
        symbols.extend(std::iter::repeat_n(4, 4));
        let grid = Grid::from_symbols(GridSpec::standard_5x6(), symbols, 6).unwrap();

        let eval = evaluate(&grid, &PayTable::standard(), 6, BET);
        assert_eq!(eval.total_multiplier, 2);
        assert_eq!(eval.payout, BET * 2);
        assert_eq!(eval.winning_cells, (0..8).collect::<BTreeSet<usize>>());
        assert_eq!(eval.best_symbol, Some(0));
    }

    #[test]
    fn test_two_symbols_pay_independently() {
        // 12 × symbol 2, 9 × symbol 4, 9 filler cells of symbols 1, 3, 5
        let grid = grid_with(&[(2, 12), (4, 9)]);
        let eval = evaluate(&grid, &PayTable::standard(), 6, BET);

        assert_eq!(eval.total_multiplier, 12);
        assert_eq!(eval.best_multiplier, 10);
        assert_eq!(eval.best_symbol, Some(2));
        assert_eq!(eval.payout, BET * 12);
        assert_eq!(eval.winning_cells.len(), 21);
        assert_eq!(
            eval.classify(&BigWinRule::default(), BET),
            WinClass::BigWin
        );
    }

    #[test]
    fn test_seven_max_pays_nothing() {
        // 7, 7, 7, 7, 1, 1
        let mut symbols = Vec::new();
        for symbol in 0..4 {
            symbols.extend(std::iter::repeat_n(symbol, 7));
        }
        symbols.extend([4, 5]);
        let grid = Grid::from_symbols(GridSpec::standard_5x6(), symbols, 6).unwrap();

        let eval = evaluate(&grid, &PayTable::standard(), 6, BET);
        assert_eq!(eval.total_multiplier, 0);
        assert_eq!(eval.payout, 0);
        assert!(eval.winning_cells.is_empty());
        assert_eq!(eval.best_symbol, None);
        assert_eq!(eval.classify(&BigWinRule::default(), BET), WinClass::None);
    }

    #[test]
    fn test_full_grid_match() {
        let grid = Grid::from_symbols(GridSpec::standard_5x6(), vec![5; 30], 6).unwrap();
        let eval = evaluate(&grid, &PayTable::standard(), 6, BET);
        assert_eq!(eval.total_multiplier, 10);
        assert_eq!(eval.winning_cells.len(), 30);
        assert_eq!(eval.counts[5], 30);
    }

    #[test]
    fn test_payout_ratio_big_win() {
        // ×5 + ×5 = 10 bets, best multiplier only 5
        let grid = grid_with(&[(0, 10), (2, 10)]);
        let eval = evaluate(&grid, &PayTable::standard(), 6, BET);
        assert_eq!(eval.total_multiplier, 10);
        assert_eq!(eval.best_multiplier, 5);
        assert_eq!(eval.classify(&BigWinRule::default(), BET), WinClass::BigWin);
    }

    #[test]
    fn test_huge_multipliers_saturate() {
        let table = PayTable::new(vec![PayRule::new(5, u32::MAX)]);
        let grid = grid_with(&[(0, 15), (2, 15)]);
        let eval = evaluate(&grid, &table, 6, BET);
        assert_eq!(eval.symbol_wins.len(), 2);
        assert_eq!(eval.total_multiplier, u32::MAX);
        assert_eq!(eval.payout, BET * u32::MAX as u64);
    }

    #[test]
    fn test_small_win() {
        let grid = grid_with(&[(0, 10)]);
        let eval = evaluate(&grid, &PayTable::standard(), 6, BET);
        assert_eq!(eval.total_multiplier, 5);
        assert_eq!(eval.classify(&BigWinRule::default(), BET), WinClass::Win);
    }

    #[test]
    fn test_best_symbol_tie_keeps_lowest_id() {
        let grid = grid_with(&[(4, 8), (0, 8)]);
        let eval = evaluate(&grid, &PayTable::standard(), 6, BET);
        assert_eq!(eval.best_multiplier, 2);
        assert_eq!(eval.best_symbol, Some(0));
    }

    #[test]
    fn test_evaluation_is_pure() {
        let mut generator = GridGenerator::seeded(99);
        let table = PayTable::standard();
        for _ in 0..50 {
            let grid = generator.generate(GridSpec::standard_5x6(), 6).unwrap();
            let first = evaluate(&grid, &table, 6, BET);
            let second = evaluate(&grid, &table, 6, BET);
            assert_eq!(first, second);
            assert_eq!(first.counts.iter().sum::<u32>(), 30);
            assert_eq!(first.payout, BET * first.total_multiplier as u64);
        }
    }

    #[test]
    fn test_winning_cells_match_qualifying_symbols() {
        let mut generator = GridGenerator::seeded(5);
        let table = PayTable::standard();
        for _ in 0..200 {
            let grid = generator.generate(GridSpec::standard_5x6(), 6).unwrap();
            let eval = evaluate(&grid, &table, 6, BET);
            for (index, &symbol) in grid.symbols().iter().enumerate() {
                let qualifies = table.highest_pay(eval.counts[symbol as usize]) > 0;
                assert_eq!(eval.winning_cells.contains(&index), qualifies);
            }
        }
    }
}
