use crate::error::{Error, Result};
use crate::types::{Position, Rect};

/// Cell value for free material.
pub const EMPTY: i32 = -1;
/// Cell value for padding outside the usable sheet.
pub const OUTSIDE: i32 = -2;

/// Occupancy grid of one concrete stock sheet.
///
/// Cells are indexed `[x][y]`. A cell is [`EMPTY`], [`OUTSIDE`], or the index
/// of the product that fills it. The usable size is the number of columns
/// and rows holding at least one non-[`OUTSIDE`] cell, so a sheet may sit
/// inside a larger padded grid.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StockSheet {
    cells: Vec<Vec<i32>>,
    size: Rect,
}

impl StockSheet {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            cells: vec![vec![EMPTY; height as usize]; width as usize],
            size: Rect::new(width, height),
        }
    }

    /// Wraps an observed grid.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidGrid`] if the grid has no cells or its
    /// columns have different lengths.
    pub fn from_cells(index: usize, cells: Vec<Vec<i32>>) -> Result<Self> {
        let rows = cells.first().map_or(0, Vec::len);
        if rows == 0 {
            return Err(Error::InvalidGrid {
                index,
                reason: "grid has no cells".to_string(),
            });
        }
        if cells.iter().any(|col| col.len() != rows) {
            return Err(Error::InvalidGrid {
                index,
                reason: "columns have different lengths".to_string(),
            });
        }

        let width = cells
            .iter()
            .filter(|col| col.iter().any(|&c| c != OUTSIDE))
            .count();
        let height = (0..rows)
            .filter(|&y| cells.iter().any(|col| col[y] != OUTSIDE))
            .count();

        Ok(Self {
            cells,
            size: Rect::new(width as u32, height as u32),
        })
    }

    pub fn size(&self) -> Rect {
        self.size
    }

    pub fn area(&self) -> u64 {
        self.size.area()
    }

    pub fn cell(&self, x: u32, y: u32) -> Option<i32> {
        self.cells.get(x as usize)?.get(y as usize).copied()
    }

    pub fn cells(&self) -> &[Vec<i32>] {
        &self.cells
    }

    /// True if `rect` at `pos` lies within the sheet and covers only empty
    /// cells.
    pub fn is_region_empty(&self, pos: Position, rect: Rect) -> bool {
        let (x_end, y_end) = (pos.x as u64 + rect.w as u64, pos.y as u64 + rect.h as u64);
        if x_end > self.size.w as u64 || y_end > self.size.h as u64 {
            return false;
        }
        self.cells[pos.x as usize..x_end as usize]
            .iter()
            .all(|col| col[pos.y as usize..y_end as usize].iter().all(|&c| c == EMPTY))
    }

    /// Marks `rect` at `pos` as filled by `product_idx`.
    ///
    /// Returns `false`, leaving the sheet untouched, if the region is not
    /// entirely empty.
    pub fn fill(&mut self, pos: Position, rect: Rect, product_idx: usize) -> bool {
        if !self.is_region_empty(pos, rect) {
            return false;
        }
        let mark = i32::try_from(product_idx).unwrap_or(i32::MAX);
        for col in &mut self.cells[pos.x as usize..(pos.x + rect.w) as usize] {
            for c in &mut col[pos.y as usize..(pos.y + rect.h) as usize] {
                *c = mark;
            }
        }
        true
    }

    pub fn filled_area(&self) -> u64 {
        self.cells.iter().flatten().filter(|&&c| c >= 0).count() as u64
    }

    pub fn is_untouched(&self) -> bool {
        self.filled_area() == 0
    }
}
