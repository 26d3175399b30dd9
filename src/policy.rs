use crate::error::Result;
use crate::observation::{Observation, Snapshot};
use crate::placement::first_fit;
use crate::types::Action;

/// Something that turns an observation into one placement request.
pub trait Policy {
    fn action(&mut self, observation: &Observation) -> Result<Action>;
}

/// Places the first outstanding product at the first free spot.
#[derive(Debug, Clone, Copy, Default)]
pub struct FirstFit;

impl Policy for FirstFit {
    fn action(&mut self, observation: &Observation) -> Result<Action> {
        let snapshot = Snapshot::from_observation(observation)?;
        let action = match first_fit(&observation.products, &snapshot.sheets) {
            Some((product_idx, placement)) => Action::place(
                placement.stock_idx,
                observation.products[product_idx].size,
                placement.position,
            ),
            None => Action::NOOP,
        };
        tracing::debug!(%action, "first fit");
        Ok(action)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::{EMPTY, StockSheet};
    use crate::observation::{Product, StockEntry};
    use crate::types::{Position, Rect};

    #[test]
    fn test_first_fit_action() {
        let mut sheet = StockSheet::new(4, 4);
        sheet.fill(Position::new(0, 0), Rect::new(4, 2), 0);
        let obs = Observation {
            products: vec![
                Product::new(Rect::new(5, 5), 1),
                Product::new(Rect::new(2, 2), 2),
            ],
            stocks: vec![StockEntry::from(&sheet)],
        };
        let action = FirstFit.action(&obs).unwrap();
        assert_eq!(action, Action::place(0, Rect::new(2, 2), Position::new(0, 2)));
    }

    #[test]
    fn test_first_fit_passes_when_nothing_fits() {
        let obs = Observation {
            products: vec![Product::new(Rect::new(3, 3), 1)],
            stocks: vec![StockEntry::Grid(vec![vec![EMPTY; 2]; 2])],
        };
        assert_eq!(FirstFit.action(&obs).unwrap(), Action::NOOP);
    }
}
