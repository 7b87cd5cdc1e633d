//! Grid storage and random grid generation

use rand::{Rng, RngCore, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

use crate::config::GridSpec;
use crate::error::{EngineResult, SpinError};
use crate::symbols::SymbolId;

/// A grid position and the symbol it holds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cell {
    pub row: u8,
    pub col: u8,
    pub symbol: SymbolId,
}

/// Row-major grid of symbol IDs, index = `row * cols + col`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawGrid")]
pub struct Grid {
    spec: GridSpec,
    symbols: Vec<SymbolId>,
}

/// Unchecked wire form of [`Grid`]
#[derive(Deserialize)]
struct RawGrid {
    spec: GridSpec,
    symbols: Vec<SymbolId>,
}

impl TryFrom<RawGrid> for Grid {
    type Error = SpinError;

    /// Shape only; the catalog is checked where the grid is used
    fn try_from(raw: RawGrid) -> Result<Self, Self::Error> {
        Grid::from_symbols(raw.spec, raw.symbols, SymbolId::MAX as usize + 1)
    }
}

impl Grid {
    /// Build a grid, checking size and that every symbol exists in the catalog
    pub fn from_symbols(
        spec: GridSpec,
        symbols: Vec<SymbolId>,
        symbol_count: usize,
    ) -> EngineResult<Self> {
        if symbols.len() != spec.total_positions() {
            return Err(SpinError::InvalidGridState(format!(
                "expected {} cells, got {}",
                spec.total_positions(),
                symbols.len()
            )));
        }
        let grid = Self { spec, symbols };
        grid.check_symbols(symbol_count)?;
        Ok(grid)
    }

    /// Check that every cell holds a symbol from a catalog of `symbol_count`
    pub fn check_symbols(&self, symbol_count: usize) -> EngineResult<()> {
        match self.symbols.iter().find(|&&s| s as usize >= symbol_count) {
            Some(bad) => Err(SpinError::InvalidGridState(format!(
                "symbol {} outside catalog of {}",
                bad, symbol_count
            ))),
            None => Ok(()),
        }
    }

    pub fn spec(&self) -> GridSpec {
        self.spec
    }

    pub fn len(&self) -> usize {
        self.symbols.len()
    }

    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }

    /// Symbol at cell index
    pub fn symbol(&self, index: usize) -> Option<SymbolId> {
        self.symbols.get(index).copied()
    }

    /// Symbol at a position
    pub fn symbol_at(&self, row: u8, col: u8) -> Option<SymbolId> {
        if row >= self.spec.rows || col >= self.spec.cols {
            return None;
        }
        self.symbol(self.spec.index(row, col))
    }

    /// All symbols in cell-index order
    pub fn symbols(&self) -> &[SymbolId] {
        &self.symbols
    }

    /// All cells in index order
    pub fn cells(&self) -> impl Iterator<Item = Cell> + '_ {
        let cols = self.spec.cols as usize;
        self.symbols.iter().enumerate().map(move |(i, &symbol)| Cell {
            row: (i / cols) as u8,
            col: (i % cols) as u8,
            symbol,
        })
    }

    /// Cell indices of one column, top to bottom
    pub fn column_indices(&self, col: u8) -> impl Iterator<Item = usize> {
        let spec = self.spec;
        (0..spec.rows).map(move |row| spec.index(row, col))
    }

    /// Per-symbol tally, length = `symbol_count`
    pub fn counts(&self, symbol_count: usize) -> Vec<u32> {
        let mut counts = vec![0u32; symbol_count];
        for &symbol in &self.symbols {
            if let Some(count) = counts.get_mut(symbol as usize) {
                *count += 1;
            }
        }
        counts
    }

    /// Copy one column from `source`, leaving the other columns untouched
    pub fn copy_column_from(&mut self, source: &Grid, col: u8) -> EngineResult<()> {
        if source.spec != self.spec {
            return Err(SpinError::InvalidGridState(
                "column copy between grids of different shape".into(),
            ));
        }
        if col >= self.spec.cols {
            return Err(SpinError::InvalidGridState(format!(
                "column {} outside [0, {})",
                col, self.spec.cols
            )));
        }
        let indices: Vec<usize> = self.column_indices(col).collect();
        for index in indices {
            self.symbols[index] = source.symbols[index];
        }
        Ok(())
    }
}

/// Random grid source
///
/// Each cell is an independent uniform draw from the catalog. The RNG is
/// owned by the generator so runs are reproducible from a seed.
pub struct GridGenerator<R = ChaCha8Rng> {
    rng: R,
}

impl GridGenerator<ChaCha8Rng> {
    /// Reproducible generator
    pub fn seeded(seed: u64) -> Self {
        Self::with_rng(ChaCha8Rng::seed_from_u64(seed))
    }

    /// Generator seeded from the OS
    pub fn from_os_rng() -> Self {
        Self::with_rng(ChaCha8Rng::from_os_rng())
    }

    /// Seeded when `seed` is set, OS-seeded otherwise
    pub fn new(seed: Option<u64>) -> Self {
        match seed {
            Some(s) => Self::seeded(s),
            None => Self::from_os_rng(),
        }
    }
}

impl<R: RngCore> GridGenerator<R> {
    /// Use any RNG
    pub fn with_rng(rng: R) -> Self {
        Self { rng }
    }

    /// Draw a full grid
    pub fn generate(&mut self, spec: GridSpec, symbol_count: usize) -> EngineResult<Grid> {
        if symbol_count == 0 {
            return Err(SpinError::InvalidGridState("empty symbol catalog".into()));
        }
        let symbols = (0..spec.total_positions())
            .map(|_| self.rng.random_range(0..symbol_count) as SymbolId)
            .collect();
        Grid::from_symbols(spec, symbols, symbol_count)
    }

    pub fn rng_mut(&mut self) -> &mut R {
        &mut self.rng
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn spec() -> GridSpec {
        GridSpec::standard_5x6()
    }

    #[test]
    fn test_generate_fills_every_cell() {
        let mut generator = GridGenerator::seeded(7);
        let grid = generator.generate(spec(), 6).unwrap();
        assert_eq!(grid.len(), 30);
        assert!(grid.symbols().iter().all(|&s| s < 6));
    }

    #[test]
    fn test_seeded_is_reproducible() {
        let a = GridGenerator::seeded(42).generate(spec(), 6).unwrap();
        let b = GridGenerator::seeded(42).generate(spec(), 6).unwrap();
        let c = GridGenerator::seeded(43).generate(spec(), 6).unwrap();
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn test_counts_sum_to_cells() {
        let mut generator = GridGenerator::seeded(1);
        for _ in 0..200 {
            let grid = generator.generate(spec(), 6).unwrap();
            let counts = grid.counts(6);
            assert_eq!(counts.len(), 6);
            assert_eq!(counts.iter().sum::<u32>(), 30);
        }
    }

    #[test]
    fn test_every_symbol_appears_over_many_draws() {
        let mut generator = GridGenerator::seeded(3);
        let mut totals = [0u32; 6];
        for _ in 0..100 {
            let grid = generator.generate(spec(), 6).unwrap();
            for (i, c) in grid.counts(6).iter().enumerate() {
                totals[i] += c;
            }
        }
        // 3000 draws, 500 expected per symbol
        assert!(totals.iter().all(|&t| t > 350 && t < 650), "{:?}", totals);
    }

    #[test]
    fn test_from_symbols_validation() {
        assert!(Grid::from_symbols(spec(), vec![0; 29], 6).is_err());
        assert!(Grid::from_symbols(spec(), vec![6; 30], 6).is_err());
        assert!(Grid::from_symbols(spec(), vec![5; 30], 6).is_ok());
    }

    #[test]
    fn test_check_symbols_against_catalog() {
        let grid = Grid::from_symbols(spec(), vec![7; 30], 8).unwrap();
        assert!(grid.check_symbols(8).is_ok());
        assert!(matches!(
            grid.check_symbols(6),
            Err(SpinError::InvalidGridState(_))
        ));
    }

    #[test]
    fn test_json_goes_through_validation() {
        let grid = Grid::from_symbols(spec(), vec![4; 30], 6).unwrap();
        let json = serde_json::to_string(&grid).unwrap();
        assert_eq!(serde_json::from_str::<Grid>(&json).unwrap(), grid);

        let short = r#"{"spec": {"rows": 5, "cols": 6}, "symbols": [0, 1, 2]}"#;
        assert!(serde_json::from_str::<Grid>(short).is_err());

        // shape is fine, catalog membership is left to the caller
        let foreign = format!(
            r#"{{"spec": {{"rows": 5, "cols": 6}}, "symbols": {:?}}}"#,
            vec![200u8; 30]
        );
        let grid: Grid = serde_json::from_str(&foreign).unwrap();
        assert!(grid.check_symbols(6).is_err());
    }

    #[test]
    fn test_cells_positions() {
        let symbols: Vec<SymbolId> = (0..30).map(|i| (i % 6) as SymbolId).collect();
        let grid = Grid::from_symbols(spec(), symbols, 6).unwrap();
        let cells: Vec<Cell> = grid.cells().collect();
        assert_eq!(cells[7], Cell { row: 1, col: 1, symbol: 1 });
        assert_eq!(grid.symbol_at(4, 5), Some(5));
        assert_eq!(grid.symbol_at(5, 0), None);
    }

    #[test]
    fn test_copy_column_only_touches_that_column() {
        let mut shown = Grid::from_symbols(spec(), vec![0; 30], 6).unwrap();
        let outcome = Grid::from_symbols(spec(), vec![3; 30], 6).unwrap();

        shown.copy_column_from(&outcome, 2).unwrap();

        for cell in shown.cells() {
            let expected = if cell.col == 2 { 3 } else { 0 };
            assert_eq!(cell.symbol, expected, "cell {:?}", cell);
        }
        assert!(shown.copy_column_from(&outcome, 6).is_err());
    }

    #[test]
    fn test_empty_catalog_rejected() {
        let mut generator = GridGenerator::seeded(0);
        assert!(generator.generate(spec(), 0).is_err());
    }
}
