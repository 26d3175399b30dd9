//! Linear-programming boundary.
//!
//! The optimizer only ever asks one question: minimise `cᵗx` subject to
//! `Ax ≥ b`, `x ≥ 0`. [`LpBackend`] is that question; [`GoodLp`] answers it
//! with the pure-Rust solver bundled in `good_lp`.

use std::panic::{AssertUnwindSafe, catch_unwind};

use good_lp::{
    Expression, ResolutionError, Solution, SolverModel, Variable, default_solver, variable,
    variables,
};

/// `min costsᵗx` s.t. `rows[r]·x ≥ rhs[r]` for every row, `x ≥ 0`.
///
/// Rows are sparse: `(column, coefficient)` pairs.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LpProblem {
    pub costs: Vec<f64>,
    pub rows: Vec<Vec<(usize, f64)>>,
    pub rhs: Vec<f64>,
}

impl LpProblem {
    pub fn new(costs: Vec<f64>) -> Self {
        Self {
            costs,
            rows: Vec::new(),
            rhs: Vec::new(),
        }
    }

    pub fn add_row(&mut self, coefficients: Vec<(usize, f64)>, rhs: f64) {
        self.rows.push(coefficients);
        self.rhs.push(rhs);
    }

    pub fn num_vars(&self) -> usize {
        self.costs.len()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum LpStatus {
    Optimal,
    Infeasible,
    Unbounded,
    Error(String),
}

impl std::fmt::Display for LpStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LpStatus::Optimal => write!(f, "optimal"),
            LpStatus::Infeasible => write!(f, "infeasible"),
            LpStatus::Unbounded => write!(f, "unbounded"),
            LpStatus::Error(msg) => write!(f, "error: {msg}"),
        }
    }
}

/// Solver answer. `values` and `objective` are meaningful only when
/// `status` is [`LpStatus::Optimal`].
#[derive(Debug, Clone, PartialEq)]
pub struct LpOutcome {
    pub status: LpStatus,
    pub values: Vec<f64>,
    pub objective: f64,
}

impl LpOutcome {
    pub fn optimal(values: Vec<f64>, objective: f64) -> Self {
        Self {
            status: LpStatus::Optimal,
            values,
            objective,
        }
    }

    pub fn failed(status: LpStatus) -> Self {
        Self {
            status,
            values: Vec::new(),
            objective: f64::NEG_INFINITY,
        }
    }
}

pub trait LpBackend {
    fn solve(&self, problem: &LpProblem) -> LpOutcome;
}

/// [`LpBackend`] over `good_lp`'s default solver.
///
/// Panics inside the solver are reported as [`LpStatus::Error`].
#[derive(Debug, Clone, Copy, Default)]
pub struct GoodLp;

impl LpBackend for GoodLp {
    fn solve(&self, problem: &LpProblem) -> LpOutcome {
        if problem.rows.len() != problem.rhs.len()
            || problem
                .rows
                .iter()
                .flatten()
                .any(|&(col, _)| col >= problem.num_vars())
        {
            return LpOutcome::failed(LpStatus::Error("malformed problem".to_string()));
        }

        // Rows without variables are constants: drop the satisfied ones up
        // front, since there is nothing for the solver to do with them.
        let mut live_rows = Vec::with_capacity(problem.rows.len());
        for (row, &rhs) in problem.rows.iter().zip(&problem.rhs) {
            if row.iter().all(|&(_, coef)| coef == 0.0) {
                if rhs > 0.0 {
                    return LpOutcome::failed(LpStatus::Infeasible);
                }
                continue;
            }
            live_rows.push((row, rhs));
        }

        if problem.num_vars() == 0 {
            return LpOutcome::optimal(Vec::new(), 0.0);
        }

        match catch_unwind(AssertUnwindSafe(|| run_good_lp(&problem.costs, &live_rows))) {
            Ok(outcome) => outcome,
            Err(_) => LpOutcome::failed(LpStatus::Error("solver panicked".to_string())),
        }
    }
}

fn run_good_lp(costs: &[f64], rows: &[(&Vec<(usize, f64)>, f64)]) -> LpOutcome {
    let mut vars = variables!();
    let xs: Vec<Variable> = costs
        .iter()
        .enumerate()
        .map(|(i, _)| vars.add(variable().min(0.0).name(format!("x_{i}"))))
        .collect();

    let objective = xs
        .iter()
        .zip(costs)
        .fold(Expression::from(0.0), |acc, (x, &c)| acc + c * *x);
    let mut model = vars.minimise(objective).using(default_solver);

    for &(row, rhs) in rows {
        let lhs = row
            .iter()
            .fold(Expression::from(0.0), |acc, &(col, coef)| acc + coef * xs[col]);
        model = model.with(lhs.geq(rhs));
    }

    match model.solve() {
        Ok(solution) => {
            let values: Vec<f64> = xs.iter().map(|&x| solution.value(x)).collect();
            let objective = values.iter().zip(costs).map(|(v, c)| v * c).sum();
            LpOutcome::optimal(values, objective)
        }
        Err(ResolutionError::Infeasible) => LpOutcome::failed(LpStatus::Infeasible),
        Err(ResolutionError::Unbounded) => LpOutcome::failed(LpStatus::Unbounded),
        Err(other) => LpOutcome::failed(LpStatus::Error(other.to_string())),
    }
}
