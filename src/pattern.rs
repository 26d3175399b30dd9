//! Cutting patterns and the append-only pool that holds them.

use std::collections::HashSet;

use crate::config::PoolLimits;
use crate::error::{Error, Result};
use crate::types::{PieceType, Position, Rect, StockType};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PatternEntry {
    pub position: Position,
    pub quantity: u32,
    pub product_idx: usize,
    pub stock_idx: usize,
}

/// A non-empty list of placements on a single stock type.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Pattern {
    entries: Vec<PatternEntry>,
}

impl Pattern {
    pub fn single(entry: PatternEntry) -> Self {
        Self {
            entries: vec![entry],
        }
    }

    /// Builds a multi-entry pattern. Returns `None` for an empty list or one
    /// that spans several stock types.
    pub fn from_entries(entries: Vec<PatternEntry>) -> Option<Self> {
        let stock_idx = entries.first()?.stock_idx;
        if entries.iter().any(|e| e.stock_idx != stock_idx) {
            return None;
        }
        Some(Self { entries })
    }

    pub fn entries(&self) -> &[PatternEntry] {
        &self.entries
    }

    pub fn stock_idx(&self) -> usize {
        self.entries[0].stock_idx
    }

    /// Number of pieces of `product_idx` this pattern yields.
    pub fn quantity_of(&self, product_idx: usize) -> u32 {
        self.entries
            .iter()
            .filter(|e| e.product_idx == product_idx)
            .map(|e| e.quantity)
            .sum()
    }
}

/// Stable index of a pattern in a [`PatternPool`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PatternId(pub usize);

/// Append-only arena of patterns.
///
/// Patterns are never moved or removed, so a [`PatternId`] stays valid for
/// the life of the pool. The `max_patterns` cap never applies to a pattern
/// that yields a (stock, product) pair no earlier pattern yields, so every
/// pair offered to the pool keeps at least one column.
#[derive(Debug, Clone, Default)]
pub struct PatternPool {
    patterns: Vec<Pattern>,
    seen: HashSet<Pattern>,
    covered: HashSet<(usize, usize)>,
    limits: PoolLimits,
}

impl PatternPool {
    pub fn new(limits: PoolLimits) -> Self {
        Self {
            patterns: Vec::new(),
            seen: HashSet::new(),
            covered: HashSet::new(),
            limits,
        }
    }

    pub fn len(&self) -> usize {
        self.patterns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }

    pub fn get(&self, id: PatternId) -> Option<&Pattern> {
        self.patterns.get(id.0)
    }

    pub fn iter(&self) -> impl Iterator<Item = (PatternId, &Pattern)> {
        self.patterns
            .iter()
            .enumerate()
            .map(|(i, p)| (PatternId(i), p))
    }

    pub fn is_full(&self) -> bool {
        self.limits
            .max_patterns
            .is_some_and(|max| self.patterns.len() >= max)
    }

    /// True if some pool pattern yields `product_idx` on `stock_idx`.
    pub fn covers(&self, stock_idx: usize, product_idx: usize) -> bool {
        self.covered.contains(&(stock_idx, product_idx))
    }

    fn adds_coverage(&self, pattern: &Pattern) -> bool {
        pattern
            .entries()
            .iter()
            .any(|e| !self.covers(e.stock_idx, e.product_idx))
    }

    /// Appends patterns in order and returns how many were added.
    ///
    /// Once the pool is full, only patterns that cover a new (stock, product)
    /// pair are still appended.
    pub fn extend(&mut self, patterns: impl IntoIterator<Item = Pattern>) -> usize {
        let before = self.patterns.len();
        let mut dropped = 0usize;
        for pattern in patterns {
            if self.is_full() && !self.adds_coverage(&pattern) {
                dropped += 1;
                continue;
            }
            if self.limits.dedup && !self.seen.insert(pattern.clone()) {
                continue;
            }
            self.covered
                .extend(pattern.entries().iter().map(|e| (e.stock_idx, e.product_idx)));
            self.patterns.push(pattern);
        }
        if dropped > 0 {
            tracing::debug!(len = self.patterns.len(), dropped, "pattern pool at capacity");
        }
        self.patterns.len() - before
    }
}

/// True if `piece` placed at `pos` stays inside `stock`.
fn within_bounds(stock: Rect, pos: Position, piece: Rect) -> bool {
    pos.x as u64 + piece.w as u64 <= stock.w as u64
        && pos.y as u64 + piece.h as u64 <= stock.h as u64
}

/// Enumerates tiling patterns for every (stock type, piece type) pair.
///
/// Each stock is tiled on the grid `(i * pw, j * ph)`, and every cell of the
/// grid becomes a single-entry pattern. With `tiling_columns`, the whole
/// tiling is additionally emitted as one multi-entry pattern, ahead of the
/// pair's single-entry patterns, when it has at least two cells. Re-running
/// on the same input yields the same patterns again.
///
/// # Errors
///
/// Returns [`Error::InvalidStock`] or [`Error::InvalidPiece`] before
/// generating anything if any input type is unusable.
pub fn generate_patterns(
    stock_types: &[StockType],
    pieces: &[PieceType],
    tiling_columns: bool,
) -> Result<Vec<Pattern>> {
    for (index, stock) in stock_types.iter().enumerate() {
        stock.validate(index)?;
    }
    for (index, piece) in pieces.iter().enumerate() {
        if piece.width == 0 || piece.height == 0 {
            return Err(Error::InvalidPiece {
                index,
                width: piece.width,
                height: piece.height,
            });
        }
    }

    let mut patterns = Vec::new();
    for (stock_idx, stock) in stock_types.iter().enumerate() {
        let stock_size = stock.size();
        for (product_idx, piece) in pieces.iter().enumerate() {
            let size = piece.size();
            let mut tiling = Vec::new();
            for i in 0..stock.width / piece.width {
                for j in 0..stock.height / piece.height {
                    let position = Position::new(i * piece.width, j * piece.height);
                    if within_bounds(stock_size, position, size) {
                        tiling.push(PatternEntry {
                            position,
                            quantity: 1,
                            product_idx,
                            stock_idx,
                        });
                    }
                }
            }
            if tiling_columns && tiling.len() >= 2 {
                patterns.extend(Pattern::from_entries(tiling.clone()));
            }
            patterns.extend(tiling.into_iter().map(Pattern::single));
        }
    }
    Ok(patterns)
}
