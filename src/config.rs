use serde::{Deserialize, Serialize};

/// Growth limits for the pattern pool.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PoolLimits {
    /// Skip patterns already in the pool.
    pub dedup: bool,
    /// Stop appending once the pool holds this many patterns, except for
    /// patterns yielding a (stock, product) pair the pool lacks.
    pub max_patterns: Option<usize>,
}

impl Default for PoolLimits {
    fn default() -> Self {
        Self {
            dedup: false,
            max_patterns: Some(20_000),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OptimizerConfig {
    /// Also generate one multi-entry column per (stock, piece) pair that
    /// holds the whole uniform tiling.
    pub tiling_columns: bool,
    /// When every entry of the selected pattern is blocked on the observed
    /// sheet, search for another spot for the same piece.
    pub relocate_blocked: bool,
    /// Weights at or below this are outside the solution support.
    pub support_epsilon: f64,
    pub pool: PoolLimits,
}

impl Default for OptimizerConfig {
    fn default() -> Self {
        Self {
            tiling_columns: true,
            relocate_blocked: true,
            support_epsilon: 1e-9,
            pool: PoolLimits::default(),
        }
    }
}
