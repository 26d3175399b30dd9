//! First-fit placement search over occupancy grids.
//!
//! Stocks are tried in index order. Within a stock, candidate top-left
//! corners are scanned with `x` in the outer loop and `y` in the inner loop,
//! and the first collision-free position wins. The order is a fixed policy;
//! it makes no attempt to minimise waste.

use crate::grid::StockSheet;
use crate::observation::Product;
use crate::types::{Position, Rect};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Placement {
    pub stock_idx: usize,
    pub position: Position,
}

/// Finds the first stock and position where `piece` fits.
///
/// Returns `None` if no stock admits the piece or the piece is zero-sized.
/// The sheets are only read.
pub fn find_placement(piece: Rect, stocks: &[StockSheet]) -> Option<Placement> {
    if piece.is_empty() {
        return None;
    }
    stocks
        .iter()
        .enumerate()
        .find_map(|(stock_idx, sheet)| {
            scan_sheet(piece, sheet).map(|position| Placement {
                stock_idx,
                position,
            })
        })
}

/// Row-major scan of a single sheet.
pub fn scan_sheet(piece: Rect, sheet: &StockSheet) -> Option<Position> {
    let size = sheet.size();
    if piece.is_empty() || !piece.fits_in(&size) {
        return None;
    }
    for x in 0..=size.w - piece.w {
        for y in 0..=size.h - piece.h {
            let pos = Position::new(x, y);
            if sheet.is_region_empty(pos, piece) {
                return Some(pos);
            }
        }
    }
    None
}

/// Places the first outstanding product that fits anywhere.
///
/// Products are considered in order; those with zero quantity are skipped.
/// Returns the product index with its placement, or `None` when nothing is
/// outstanding or nothing fits.
pub fn first_fit(products: &[Product], stocks: &[StockSheet]) -> Option<(usize, Placement)> {
    products
        .iter()
        .enumerate()
        .filter(|(_, p)| p.quantity > 0)
        .find_map(|(idx, p)| find_placement(p.size, stocks).map(|pl| (idx, pl)))
}
