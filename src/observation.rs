//! Observation wire types and the per-call snapshot built from them.

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::grid::StockSheet;
use crate::types::{PieceType, Rect, StockType};

/// A piece type with its outstanding demand, as reported by the environment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    pub size: Rect,
    pub quantity: u32,
}

impl Product {
    pub fn new(size: Rect, quantity: u32) -> Self {
        Self { size, quantity }
    }
}

/// One observed stock sheet: a bare occupancy grid, or a grid with a cost.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum StockEntry {
    Grid(Vec<Vec<i32>>),
    Priced { grid: Vec<Vec<i32>>, cost: f64 },
}

impl StockEntry {
    pub fn grid(&self) -> &[Vec<i32>] {
        match self {
            StockEntry::Grid(grid) | StockEntry::Priced { grid, .. } => grid,
        }
    }

    pub fn cost(&self) -> Option<f64> {
        match self {
            StockEntry::Grid(_) => None,
            StockEntry::Priced { cost, .. } => Some(*cost),
        }
    }
}

impl From<&StockSheet> for StockEntry {
    fn from(sheet: &StockSheet) -> Self {
        StockEntry::Grid(sheet.cells().to_vec())
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Observation {
    pub products: Vec<Product>,
    pub stocks: Vec<StockEntry>,
}

/// Side information reported with an observation.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Info {
    /// Share of used stock area that is filled, in `[0, 1]`.
    pub filled_ratio: f64,
}

/// Immutable view of one observation.
///
/// Rebuilt from scratch on every decision and swapped in whole, so stock and
/// piece data never go stale between calls. Stock types take their index
/// from the observed sheet order; a sheet without an explicit cost costs
/// its area.
#[derive(Debug, Clone, Default)]
pub struct Snapshot {
    pub stock_types: Vec<StockType>,
    pub sheets: Vec<StockSheet>,
    pub pieces: Vec<PieceType>,
    pub demands: Vec<u32>,
}

impl Snapshot {
    /// Deep-copies an observation into a snapshot.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::InvalidGrid`] for an empty or ragged occupancy
    /// grid.
    pub fn from_observation(observation: &Observation) -> Result<Self> {
        let sheets = observation
            .stocks
            .iter()
            .enumerate()
            .map(|(idx, entry)| StockSheet::from_cells(idx, entry.grid().to_vec()))
            .collect::<Result<Vec<_>>>()?;

        let stock_types = sheets
            .iter()
            .zip(&observation.stocks)
            .map(|(sheet, entry)| {
                let size = sheet.size();
                let cost = entry.cost().unwrap_or(size.area() as f64);
                StockType::new(size.w, size.h, cost)
            })
            .collect();

        let pieces = observation
            .products
            .iter()
            .map(|p| PieceType::new(p.size.w, p.size.h))
            .collect();
        let demands = observation.products.iter().map(|p| p.quantity).collect();

        Ok(Self {
            stock_types,
            sheets,
            pieces,
            demands,
        })
    }

    pub fn piece_size(&self, product_idx: usize) -> Option<Rect> {
        self.pieces.get(product_idx).map(PieceType::size)
    }

    pub fn total_demand(&self) -> u64 {
        self.demands.iter().map(|&d| d as u64).sum()
    }
}

/// Inverse of the wasted area implied by `info`.
///
/// The reference area is `filled_ratio` times the summed area of one of each
/// product; the outstanding area (size × quantity over products still in
/// demand) is subtracted from it. Returns `+inf` when nothing is wasted.
pub fn fitness(observation: &Observation, info: &Info) -> f64 {
    let total_area =
        info.filled_ratio * observation.products.iter().map(|p| p.size.area() as f64).sum::<f64>();
    let occupied_area: f64 = observation
        .products
        .iter()
        .filter(|p| p.quantity > 0)
        .map(|p| p.size.area() as f64 * p.quantity as f64)
        .sum();

    let wasted_area = total_area - occupied_area;
    if wasted_area <= 0.0 {
        return f64::INFINITY;
    }
    1.0 / wasted_area
}
