use crate::grid::StockSheet;

const MAX_WIDTH: f64 = 80.0;
const MAX_HEIGHT: f64 = 40.0;

/// ASCII picture of a sheet's occupancy.
///
/// Columns run along `x`, lines along `y`. Empty material is `.`, filled
/// cells show their product index in base 36 (`#` beyond that). Large
/// sheets are sampled down to fit 80x40 characters.
pub fn render_sheet(sheet: &StockSheet) -> String {
    let size = sheet.size();
    if size.is_empty() {
        return String::new();
    }

    let scale = f64::min(
        1.0,
        f64::min(MAX_WIDTH / size.w as f64, MAX_HEIGHT / size.h as f64),
    );
    let grid_w = ((size.w as f64 * scale).round() as usize).max(1);
    let grid_h = ((size.h as f64 * scale).round() as usize).max(1);

    let border = format!("+{}+\n", "-".repeat(grid_w));
    let mut result = border.clone();
    for gy in 0..grid_h {
        result.push('|');
        for gx in 0..grid_w {
            let x = (gx * size.w as usize / grid_w) as u32;
            let y = (gy * size.h as usize / grid_h) as u32;
            result.push(cell_char(sheet.cell(x, y)));
        }
        result.push_str("|\n");
    }
    result.push_str(&border);
    result
}

fn cell_char(cell: Option<i32>) -> char {
    match cell {
        Some(c) if c >= 0 => u32::try_from(c)
            .ok()
            .and_then(|d| char::from_digit(d, 36))
            .unwrap_or('#'),
        Some(_) => '.',
        None => ' ',
    }
}
