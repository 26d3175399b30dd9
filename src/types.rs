use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Width and height of a piece or sheet, in grid cells.
///
/// Serialized as `[w, h]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(from = "[u32; 2]", into = "[u32; 2]")]
pub struct Rect {
    pub w: u32,
    pub h: u32,
}

impl Rect {
    pub fn new(w: u32, h: u32) -> Self {
        Self { w, h }
    }

    pub fn area(&self) -> u64 {
        self.w as u64 * self.h as u64
    }

    pub fn fits_in(&self, other: &Rect) -> bool {
        self.w <= other.w && self.h <= other.h
    }

    pub fn is_empty(&self) -> bool {
        self.w == 0 || self.h == 0
    }
}

impl From<[u32; 2]> for Rect {
    fn from([w, h]: [u32; 2]) -> Self {
        Self { w, h }
    }
}

impl From<Rect> for [u32; 2] {
    fn from(r: Rect) -> Self {
        [r.w, r.h]
    }
}

impl std::fmt::Display for Rect {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}x{}", self.w, self.h)
    }
}

/// Top-left corner of a placement. Serialized as `[x, y]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(from = "[u32; 2]", into = "[u32; 2]")]
pub struct Position {
    pub x: u32,
    pub y: u32,
}

impl Position {
    pub fn new(x: u32, y: u32) -> Self {
        Self { x, y }
    }
}

impl From<[u32; 2]> for Position {
    fn from([x, y]: [u32; 2]) -> Self {
        Self { x, y }
    }
}

impl From<Position> for [u32; 2] {
    fn from(p: Position) -> Self {
        [p.x, p.y]
    }
}

impl std::fmt::Display for Position {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

/// A sheet template. Serialized as `[width, height, cost]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Vec<f64>", into = "[f64; 3]")]
pub struct StockType {
    pub width: u32,
    pub height: u32,
    pub cost: f64,
}

impl StockType {
    pub fn new(width: u32, height: u32, cost: f64) -> Self {
        Self {
            width,
            height,
            cost,
        }
    }

    /// Builds a stock type from its raw `(width, height, cost)` fields.
    ///
    /// # Errors
    ///
    /// Returns [`Error::MalformedStock`] unless exactly three fields are
    /// given, and [`Error::StockDimension`] if a dimension is not a whole
    /// non-negative number.
    pub fn from_fields(fields: &[f64]) -> Result<Self> {
        let [width, height, cost] = fields else {
            return Err(Error::MalformedStock {
                fields: fields.len(),
            });
        };
        Ok(Self {
            width: whole_dimension(*width)?,
            height: whole_dimension(*height)?,
            cost: *cost,
        })
    }

    pub fn size(&self) -> Rect {
        Rect::new(self.width, self.height)
    }

    /// Checks the stock type is usable for pattern generation.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidStock`] for a zero dimension or a negative or
    /// non-finite cost.
    pub fn validate(&self, index: usize) -> Result<()> {
        if self.width == 0 || self.height == 0 {
            return Err(Error::InvalidStock {
                index,
                reason: format!("zero-sized dimensions {}x{}", self.width, self.height),
            });
        }
        if !self.cost.is_finite() || self.cost < 0.0 {
            return Err(Error::InvalidStock {
                index,
                reason: format!("cost must be finite and non-negative, got {}", self.cost),
            });
        }
        Ok(())
    }
}

fn whole_dimension(value: f64) -> Result<u32> {
    if value.is_finite() && value >= 0.0 && value.fract() == 0.0 && value <= u32::MAX as f64 {
        Ok(value as u32)
    } else {
        Err(Error::StockDimension { value })
    }
}

impl TryFrom<Vec<f64>> for StockType {
    type Error = Error;

    fn try_from(fields: Vec<f64>) -> Result<Self> {
        Self::from_fields(&fields)
    }
}

impl From<StockType> for [f64; 3] {
    fn from(s: StockType) -> Self {
        [s.width as f64, s.height as f64, s.cost]
    }
}

/// A piece template; its index is its identity for the episode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PieceType {
    pub width: u32,
    pub height: u32,
}

impl PieceType {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    pub fn size(&self) -> Rect {
        Rect::new(self.width, self.height)
    }
}

/// One placement request for the environment.
///
/// `stock_idx == -1` is the no-op: nothing actionable this step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Action {
    pub stock_idx: i32,
    pub size: Rect,
    pub position: Position,
}

impl Action {
    pub const NOOP: Action = Action {
        stock_idx: -1,
        size: Rect { w: 0, h: 0 },
        position: Position { x: 0, y: 0 },
    };

    pub fn place(stock_idx: usize, size: Rect, position: Position) -> Self {
        Self {
            stock_idx: i32::try_from(stock_idx).unwrap_or(i32::MAX),
            size,
            position,
        }
    }

    pub fn is_noop(&self) -> bool {
        self.stock_idx < 0
    }

    /// The target stock index, or `None` for the no-op.
    pub fn stock_index(&self) -> Option<usize> {
        usize::try_from(self.stock_idx).ok()
    }
}

impl std::fmt::Display for Action {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.stock_index() {
            Some(idx) => write!(f, "{} on stock {} @ {}", self.size, idx, self.position),
            None => write!(f, "pass"),
        }
    }
}
