use thiserror::Error;

/// Configuration errors.
///
/// These are the only failures the engine reports as hard errors; solver
/// trouble and pieces that fit nowhere are ordinary outcomes.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum Error {
    /// A stock type did not carry exactly `width`, `height` and `cost`.
    #[error("stock entry must have exactly 3 fields (width, height, cost), got {fields}")]
    MalformedStock { fields: usize },

    /// A stock dimension was negative, fractional or not finite.
    #[error("stock dimension must be a whole number, got {value}")]
    StockDimension { value: f64 },

    /// A stock type had a zero dimension or an unusable cost.
    #[error("invalid stock type {index}: {reason}")]
    InvalidStock { index: usize, reason: String },

    /// A piece type had a zero dimension.
    #[error("piece type {index} has zero-sized dimensions {width}x{height}")]
    InvalidPiece { index: usize, width: u32, height: u32 },

    /// An occupancy grid was empty or ragged.
    #[error("invalid occupancy grid for stock {index}: {reason}")]
    InvalidGrid { index: usize, reason: String },
}

pub type Result<T> = std::result::Result<T, Error>;
