//! Restricted master problem over the current pattern pool.
//!
//! One continuous variable `x_i ≥ 0` per pattern, costed at its stock type;
//! one covering row per piece type: `Σ x_i · quantity(i, j) ≥ demand(j)`.
//! Fractional answers are taken as they are, and every call is a full
//! re-solve.

use crate::lp::{LpBackend, LpProblem, LpStatus};
use crate::pattern::{PatternId, PatternPool};
use crate::types::StockType;

/// Patterns carrying positive weight in an optimal solve.
#[derive(Debug, Clone, PartialEq)]
pub struct RmpSolution {
    pub support: Vec<(PatternId, f64)>,
    pub objective: f64,
}

impl RmpSolution {
    pub fn len(&self) -> usize {
        self.support.len()
    }

    pub fn is_empty(&self) -> bool {
        self.support.is_empty()
    }

    pub fn pattern_ids(&self) -> impl Iterator<Item = PatternId> + '_ {
        self.support.iter().map(|&(id, _)| id)
    }
}

/// A solve that did not reach optimality.
#[derive(Debug, Clone, PartialEq)]
pub struct RmpFailure {
    pub status: LpStatus,
}

impl std::fmt::Display for RmpFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "restricted master problem not solved: {}", self.status)
    }
}

/// Builds the covering LP for `pool`.
///
/// Only piece types with positive demand get a row. Patterns pointing at a
/// stock type outside `stock_types` (left over from an earlier observation
/// with more sheets) get no column. Returns the problem together with the
/// pattern behind each column.
pub fn build_problem(
    pool: &PatternPool,
    stock_types: &[StockType],
    demands: &[u32],
) -> (LpProblem, Vec<PatternId>) {
    let mut columns = Vec::with_capacity(pool.len());
    let mut costs = Vec::with_capacity(pool.len());
    for (id, pattern) in pool.iter() {
        let Some(stock) = stock_types.get(pattern.stock_idx()) else {
            continue;
        };
        columns.push(id);
        costs.push(stock.cost);
    }

    let mut problem = LpProblem::new(costs);
    for (product_idx, &demand) in demands.iter().enumerate() {
        if demand == 0 {
            continue;
        }
        let row = columns
            .iter()
            .enumerate()
            .filter_map(|(col, &id)| {
                let qty = pool.get(id)?.quantity_of(product_idx);
                (qty > 0).then_some((col, qty as f64))
            })
            .collect();
        problem.add_row(row, demand as f64);
    }
    (problem, columns)
}

/// Solves the restricted master problem.
///
/// # Errors
///
/// Returns [`RmpFailure`] with the solver status for anything but an optimal
/// solve. Callers treat this as recoverable.
pub fn solve_rmp(
    pool: &PatternPool,
    stock_types: &[StockType],
    demands: &[u32],
    backend: &dyn LpBackend,
    epsilon: f64,
) -> Result<RmpSolution, RmpFailure> {
    let (problem, columns) = build_problem(pool, stock_types, demands);
    let outcome = backend.solve(&problem);

    if outcome.status != LpStatus::Optimal {
        tracing::warn!(
            status = %outcome.status,
            patterns = pool.len(),
            "restricted master problem has no optimal solution"
        );
        return Err(RmpFailure {
            status: outcome.status,
        });
    }

    let support: Vec<(PatternId, f64)> = columns
        .iter()
        .zip(&outcome.values)
        .filter(|&(_, &value)| value > epsilon)
        .map(|(&id, &value)| (id, value))
        .collect();

    tracing::debug!(
        objective = outcome.objective,
        support = support.len(),
        columns = columns.len(),
        "restricted master problem solved"
    );

    Ok(RmpSolution {
        support,
        objective: outcome.objective,
    })
}
