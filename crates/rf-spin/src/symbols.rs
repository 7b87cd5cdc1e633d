//! Symbol catalog
//!
//! Symbols are identified by their position in the catalog. Name, glyph and
//! style class only matter to presentation.

use serde::{Deserialize, Serialize};

/// Index of a symbol in the catalog
pub type SymbolId = u8;

/// A symbol definition
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Symbol {
    /// Display name (e.g., "Lollipop")
    pub name: String,
    /// Glyph shown on the board
    pub glyph: String,
    /// Presentation style class
    pub style: String,
}

impl Symbol {
    pub fn new(name: impl Into<String>, glyph: impl Into<String>, style: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            glyph: glyph.into(),
            style: style.into(),
        }
    }
}

/// Fixed ordered symbol catalog
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SymbolCatalog {
    symbols: Vec<Symbol>,
}

impl SymbolCatalog {
    /// Create a catalog from an ordered symbol list
    pub fn new(symbols: Vec<Symbol>) -> Self {
        Self { symbols }
    }

    /// The six-symbol candy set
    pub fn candy() -> Self {
        Self::new(vec![
            Symbol::new("Lollipop", "🍭", "candy-0"),
            Symbol::new("Watermelon", "🍉", "candy-1"),
            Symbol::new("Grapes", "🍇", "candy-2"),
            Symbol::new("Strawberry", "🍓", "candy-3"),
            Symbol::new("Candy", "🍬", "candy-4"),
            Symbol::new("Star", "⭐", "candy-5"),
        ])
    }

    /// Get symbol by ID
    pub fn get(&self, id: SymbolId) -> Option<&Symbol> {
        self.symbols.get(id as usize)
    }

    /// Glyph for a symbol, `?` for unknown IDs
    pub fn glyph(&self, id: SymbolId) -> &str {
        self.get(id).map(|s| s.glyph.as_str()).unwrap_or("?")
    }

    pub fn len(&self) -> usize {
        self.symbols.len()
    }

    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (SymbolId, &Symbol)> {
        self.symbols
            .iter()
            .enumerate()
            .map(|(i, s)| (i as SymbolId, s))
    }
}

impl Default for SymbolCatalog {
    fn default() -> Self {
        Self::candy()
    }
}
