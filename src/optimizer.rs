//! Column-generation driver.
//!
//! Each call refreshes the snapshot from the observation, re-solves the
//! restricted master problem, grows the pattern pool, and emits one
//! placement drawn round-robin from the support of the last optimal solve.
//! Pricing re-enumerates the uniform tilings; it does not use dual prices.

use crate::config::OptimizerConfig;
use crate::error::Result;
use crate::lp::{GoodLp, LpBackend};
use crate::observation::{Observation, Snapshot};
use crate::pattern::{Pattern, PatternPool, generate_patterns};
use crate::placement::{find_placement, scan_sheet};
use crate::policy::Policy;
use crate::rmp::{RmpSolution, solve_rmp};
use crate::types::{Action, Position, Rect};

pub struct Optimizer<B = GoodLp> {
    config: OptimizerConfig,
    backend: B,
    snapshot: Snapshot,
    pool: PatternPool,
    best: Option<RmpSolution>,
    best_value: f64,
    iterations: usize,
}

impl Optimizer<GoodLp> {
    pub fn new(config: OptimizerConfig) -> Self {
        Self::with_backend(config, GoodLp)
    }
}

impl Default for Optimizer<GoodLp> {
    fn default() -> Self {
        Self::new(OptimizerConfig::default())
    }
}

impl<B: LpBackend> Optimizer<B> {
    pub fn with_backend(config: OptimizerConfig, backend: B) -> Self {
        Self {
            config,
            backend,
            snapshot: Snapshot::default(),
            pool: PatternPool::new(config.pool),
            best: None,
            best_value: f64::NEG_INFINITY,
            iterations: 0,
        }
    }

    pub fn pattern_count(&self) -> usize {
        self.pool.len()
    }

    pub fn pool(&self) -> &PatternPool {
        &self.pool
    }

    /// Last optimal solution with a non-empty support.
    pub fn best_solution(&self) -> Option<&RmpSolution> {
        self.best.as_ref()
    }

    /// Objective of [`Self::best_solution`], or `-inf` without one.
    pub fn best_value(&self) -> f64 {
        self.best_value
    }

    pub fn has_solution(&self) -> bool {
        self.best.is_some()
    }

    /// Number of placements emitted so far.
    pub fn iterations(&self) -> usize {
        self.iterations
    }

    /// Runs one decision step.
    ///
    /// # Errors
    ///
    /// Returns a configuration error for malformed stock or piece data.
    /// Solver failures are not errors; they yield [`Action::NOOP`].
    pub fn decide(&mut self, observation: &Observation) -> Result<Action> {
        self.snapshot = Snapshot::from_observation(observation)?;

        match solve_rmp(
            &self.pool,
            &self.snapshot.stock_types,
            &self.snapshot.demands,
            &self.backend,
            self.config.support_epsilon,
        ) {
            Ok(solution) if !solution.is_empty() => {
                self.best_value = solution.objective;
                self.best = Some(solution);
            }
            Ok(_) => {
                tracing::debug!("optimal solve with empty support");
                self.best = None;
                self.best_value = f64::NEG_INFINITY;
            }
            Err(failure) => {
                tracing::debug!(%failure, "no solution this step, extending patterns");
                self.best = None;
                self.best_value = f64::NEG_INFINITY;
            }
        }

        let priced = generate_patterns(
            &self.snapshot.stock_types,
            &self.snapshot.pieces,
            self.config.tiling_columns,
        )?;
        let added = self.pool.extend(priced);

        let action = self.select_action();
        tracing::debug!(
            demand = self.snapshot.total_demand(),
            added,
            patterns = self.pool.len(),
            value = self.best_value,
            %action,
            "decision"
        );
        Ok(action)
    }

    fn select_action(&mut self) -> Action {
        let Some(best) = self.best.as_ref() else {
            return Action::NOOP;
        };
        let (id, _) = best.support[self.iterations % best.len()];
        self.iterations += 1;

        let Some(pattern) = self.pool.get(id) else {
            return Action::NOOP;
        };
        match self.choose_spot(pattern) {
            Some((stock_idx, size, position)) => Action::place(stock_idx, size, position),
            None => Action::NOOP,
        }
    }

    /// Picks where to realise `pattern` on the observed sheets.
    ///
    /// The first entry whose region is still free wins. If all are blocked,
    /// the first entry's piece is searched for on the pattern's own sheet
    /// and then on every sheet; failing that the first entry is returned
    /// unchanged and the environment gets to reject it.
    fn choose_spot(&self, pattern: &Pattern) -> Option<(usize, Rect, Position)> {
        let sheets = &self.snapshot.sheets;
        for entry in pattern.entries() {
            let size = self.snapshot.piece_size(entry.product_idx)?;
            let free = sheets
                .get(entry.stock_idx)
                .is_some_and(|s| s.is_region_empty(entry.position, size));
            if free {
                return Some((entry.stock_idx, size, entry.position));
            }
        }

        let first = pattern.entries().first()?;
        let size = self.snapshot.piece_size(first.product_idx)?;
        if self.config.relocate_blocked {
            let own = sheets
                .get(first.stock_idx)
                .and_then(|s| scan_sheet(size, s))
                .map(|pos| (first.stock_idx, size, pos));
            let anywhere = || {
                find_placement(size, sheets).map(|p| (p.stock_idx, size, p.position))
            };
            if let Some(spot) = own.or_else(anywhere) {
                return Some(spot);
            }
        }
        Some((first.stock_idx, size, first.position))
    }
}

impl<B: LpBackend> Policy for Optimizer<B> {
    fn action(&mut self, observation: &Observation) -> Result<Action> {
        self.decide(observation)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PoolLimits;
    use crate::error::Error;
    use crate::grid::{OUTSIDE, StockSheet};
    use crate::lp::{LpOutcome, LpProblem, LpStatus};
    use crate::observation::{Product, StockEntry};

    struct Failing;

    impl LpBackend for Failing {
        fn solve(&self, _problem: &LpProblem) -> LpOutcome {
            LpOutcome::failed(LpStatus::Error("solver unavailable".into()))
        }
    }

    fn priced(sheet: &StockSheet, cost: f64) -> StockEntry {
        StockEntry::Priced {
            grid: sheet.cells().to_vec(),
            cost,
        }
    }

    fn dedup_config() -> OptimizerConfig {
        OptimizerConfig {
            pool: PoolLimits {
                dedup: true,
                max_patterns: None,
            },
            ..OptimizerConfig::default()
        }
    }

    #[test]
    fn test_starts_without_solution() {
        let opt = Optimizer::new(OptimizerConfig::default());
        assert!(!opt.has_solution());
        assert_eq!(opt.best_value(), f64::NEG_INFINITY);
        assert_eq!(opt.pattern_count(), 0);
        assert_eq!(opt.iterations(), 0);
    }

    #[test]
    fn test_first_call_passes_then_places() {
        let obs = Observation {
            products: vec![Product::new(Rect::new(3, 4), 2)],
            stocks: vec![StockEntry::from(&StockSheet::new(10, 10))],
        };
        let mut opt = Optimizer::new(OptimizerConfig::default());

        // Nothing in the pool yet, so the demand row is uncoverable
        assert_eq!(opt.decide(&obs).unwrap(), Action::NOOP);
        assert!(opt.pattern_count() > 0);

        let action = opt.decide(&obs).unwrap();
        assert_eq!(action.stock_index(), Some(0));
        assert_eq!(action.size, Rect::new(3, 4));
        assert!(opt.has_solution());
        assert!(opt.best_value() > 0.0);
        assert_eq!(opt.iterations(), 1);
    }

    #[test]
    fn test_one_sheet_objective() {
        let obs = Observation {
            products: vec![
                Product::new(Rect::new(5, 4), 2),
                Product::new(Rect::new(3, 3), 0),
            ],
            stocks: vec![priced(&StockSheet::new(10, 4), 5.0)],
        };
        let mut opt = Optimizer::new(OptimizerConfig::default());
        opt.decide(&obs).unwrap();
        let action = opt.decide(&obs).unwrap();

        assert!((opt.best_value() - 5.0).abs() < 1e-6);
        assert_eq!(action, Action::place(0, Rect::new(5, 4), Position::new(0, 0)));
        let best = opt.best_solution().unwrap();
        for id in best.pattern_ids() {
            let pattern = opt.pool().get(id).unwrap();
            assert!(pattern.entries().iter().all(|e| e.product_idx == 0));
        }
    }

    #[test]
    fn test_round_robin_over_support() {
        let sheet = StockSheet::new(6, 6);
        let obs = Observation {
            products: vec![
                Product::new(Rect::new(3, 3), 3),
                Product::new(Rect::new(2, 6), 2),
            ],
            stocks: vec![priced(&sheet, 9.0), priced(&sheet, 4.0)],
        };
        let mut opt = Optimizer::new(dedup_config());
        opt.decide(&obs).unwrap();

        let mut sizes = Vec::new();
        for _ in 0..5 {
            let action = opt.decide(&obs).unwrap();
            assert_eq!(action.stock_index(), Some(1));
            assert_eq!(action.position, Position::new(0, 0));
            sizes.push(action.size);
        }
        assert_eq!(opt.best_solution().unwrap().len(), 2);
        let (a, b) = (Rect::new(3, 3), Rect::new(2, 6));
        assert_eq!(sizes, vec![a, b, a, b, a]);
        assert_eq!(opt.iterations(), 5);
    }

    #[test]
    fn test_solver_failure_falls_back_to_noop() {
        let obs = Observation {
            products: vec![Product::new(Rect::new(2, 2), 1)],
            stocks: vec![StockEntry::from(&StockSheet::new(4, 4))],
        };
        let mut opt = Optimizer::with_backend(OptimizerConfig::default(), Failing);
        for _ in 0..3 {
            assert_eq!(opt.decide(&obs).unwrap(), Action::NOOP);
            assert_eq!(opt.best_value(), f64::NEG_INFINITY);
        }
        assert!(opt.pattern_count() > 0);
        assert_eq!(opt.iterations(), 0);
    }

    #[test]
    fn test_pool_only_grows() {
        let obs = Observation {
            products: vec![
                Product::new(Rect::new(2, 3), 2),
                Product::new(Rect::new(4, 1), 1),
            ],
            stocks: vec![
                StockEntry::from(&StockSheet::new(8, 6)),
                StockEntry::from(&StockSheet::new(5, 5)),
            ],
        };
        let mut opt = Optimizer::new(OptimizerConfig::default());
        let mut last = 0;
        for _ in 0..4 {
            opt.decide(&obs).unwrap();
            assert!(opt.pattern_count() > last);
            last = opt.pattern_count();
        }

        // An observation with no stocks adds nothing but removes nothing
        let bare = Observation {
            products: obs.products.clone(),
            stocks: vec![],
        };
        assert_eq!(opt.decide(&bare).unwrap(), Action::NOOP);
        assert_eq!(opt.pattern_count(), last);
    }

    #[test]
    fn test_blocked_entry_is_relocated() {
        let mut sheet = StockSheet::new(4, 2);
        sheet.fill(Position::new(0, 0), Rect::new(2, 2), 0);
        let obs = Observation {
            products: vec![Product::new(Rect::new(2, 2), 1)],
            stocks: vec![priced(&sheet, 1.0)],
        };
        let mut opt = Optimizer::new(OptimizerConfig::default());
        opt.decide(&obs).unwrap();
        let action = opt.decide(&obs).unwrap();
        assert_eq!(action, Action::place(0, Rect::new(2, 2), Position::new(2, 0)));
    }

    #[test]
    fn test_blocked_pattern_moves_to_another_sheet() {
        let mut full = StockSheet::new(2, 2);
        full.fill(Position::new(0, 0), Rect::new(2, 2), 0);
        let obs = Observation {
            products: vec![Product::new(Rect::new(2, 2), 1)],
            stocks: vec![priced(&full, 1.0), priced(&StockSheet::new(4, 4), 10.0)],
        };
        let mut opt = Optimizer::new(OptimizerConfig::default());
        opt.decide(&obs).unwrap();
        let action = opt.decide(&obs).unwrap();

        // The cheap sheet is chosen by the LP but has no room left
        let best = opt.best_solution().unwrap();
        let id = best.pattern_ids().next().unwrap();
        assert_eq!(opt.pool().get(id).unwrap().stock_idx(), 0);
        assert_eq!(action, Action::place(1, Rect::new(2, 2), Position::new(0, 0)));
    }

    #[test]
    fn test_blocked_pattern_kept_without_relocation() {
        let mut full = StockSheet::new(2, 2);
        full.fill(Position::new(0, 0), Rect::new(2, 2), 0);
        let obs = Observation {
            products: vec![Product::new(Rect::new(2, 2), 1)],
            stocks: vec![priced(&full, 1.0), priced(&StockSheet::new(4, 4), 10.0)],
        };
        let config = OptimizerConfig {
            relocate_blocked: false,
            ..OptimizerConfig::default()
        };
        let mut opt = Optimizer::new(config);
        opt.decide(&obs).unwrap();
        let action = opt.decide(&obs).unwrap();
        assert_eq!(action, Action::place(0, Rect::new(2, 2), Position::new(0, 0)));
    }

    #[test]
    fn test_zero_demand_is_no_solution() {
        let mut obs = Observation {
            products: vec![Product::new(Rect::new(2, 2), 0)],
            stocks: vec![StockEntry::from(&StockSheet::new(4, 4))],
        };
        let mut opt = Optimizer::new(OptimizerConfig::default());
        for _ in 0..2 {
            assert_eq!(opt.decide(&obs).unwrap(), Action::NOOP);
            assert!(opt.best_solution().is_none());
            assert!(!opt.has_solution());
            assert_eq!(opt.best_value(), f64::NEG_INFINITY);
        }
        assert!(opt.pattern_count() > 0);
        assert_eq!(opt.iterations(), 0);

        obs.products[0].quantity = 1;
        assert_ne!(opt.decide(&obs).unwrap(), Action::NOOP);
        assert!(opt.has_solution());
        assert!(opt.best_value().is_finite());
    }

    /// Small pieces alone exceed the default pool cap on a large sheet.
    #[test]
    fn test_capped_pool_covers_every_piece() {
        let obs = Observation {
            products: vec![
                Product::new(Rect::new(1, 1), 1),
                Product::new(Rect::new(1, 2), 1),
                Product::new(Rect::new(2, 1), 1),
                Product::new(Rect::new(3, 3), 1),
            ],
            stocks: vec![StockEntry::from(&StockSheet::new(100, 100))],
        };
        let mut opt = Optimizer::new(OptimizerConfig::default());
        assert_eq!(opt.decide(&obs).unwrap(), Action::NOOP);
        assert!(opt.pool().is_full());
        for product_idx in 0..4 {
            assert!(opt.pool().covers(0, product_idx), "no column for product {product_idx}");
        }

        for _ in 0..3 {
            let action = opt.decide(&obs).unwrap();
            assert_eq!(action.stock_index(), Some(0));
        }
        assert!(opt.has_solution());
        assert!(opt.pattern_count() <= 20_000 + 4);
    }

    #[test]
    fn test_malformed_stock_is_fatal() {
        let obs = Observation {
            products: vec![Product::new(Rect::new(1, 1), 1)],
            stocks: vec![StockEntry::Grid(vec![vec![OUTSIDE; 3]; 3])],
        };
        let mut opt = Optimizer::new(OptimizerConfig::default());
        assert!(matches!(
            opt.decide(&obs),
            Err(Error::InvalidStock { index: 0, .. })
        ));
    }

    #[test]
    fn test_zero_sized_piece_is_fatal() {
        let obs = Observation {
            products: vec![Product::new(Rect::new(0, 2), 1)],
            stocks: vec![StockEntry::from(&StockSheet::new(3, 3))],
        };
        let mut opt = Optimizer::new(OptimizerConfig::default());
        assert!(matches!(
            opt.decide(&obs),
            Err(Error::InvalidPiece { index: 0, .. })
        ));
    }

    /// Drives the optimizer against in-memory sheets until demand is met.
    #[test]
    fn test_episode_satisfies_demand() {
        let mut sheets = vec![StockSheet::new(10, 10)];
        let mut products = vec![
            Product::new(Rect::new(3, 3), 3),
            Product::new(Rect::new(2, 5), 2),
        ];
        let mut opt = Optimizer::new(OptimizerConfig::default());

        for _ in 0..40 {
            if products.iter().all(|p| p.quantity == 0) {
                break;
            }
            let obs = Observation {
                products: products.clone(),
                stocks: sheets.iter().map(StockEntry::from).collect(),
            };
            let action = opt.decide(&obs).unwrap();
            let Some(stock_idx) = action.stock_index() else {
                continue;
            };
            let product_idx = products
                .iter()
                .position(|p| p.size == action.size && p.quantity > 0)
                .expect("action names an outstanding product");
            assert!(
                sheets[stock_idx].fill(action.position, action.size, product_idx),
                "{action} overlaps placed material"
            );
            products[product_idx].quantity -= 1;
        }

        assert!(products.iter().all(|p| p.quantity == 0));
        assert_eq!(sheets[0].filled_area(), 27 + 20);
    }
}
