use std::path::Path;

use calamine::{DataType, Range, Reader, Xlsx, open_workbook};

use crate::ephu::kato::error::{KatoError, Result};

/// Sheet contents as text, addressed from cell A1.
pub type Grid = Vec<Vec<String>>;

/// Reads the first worksheet of a workbook into a text grid.
///
/// Leading blank rows and columns are kept so that row indices match the
/// sheet's own numbering (row 0 is spreadsheet row 1).
pub fn read_first_sheet(path: &Path) -> Result<Grid> {
    let mut workbook: Xlsx<_> = open_workbook(path)?;
    let range = workbook
        .worksheet_range_at(0)
        .ok_or_else(|| KatoError::InvalidWorkbook(format!("no worksheet in {}", path.display())))?
        .map_err(KatoError::from)?;
    Ok(range_to_grid(&range))
}

fn range_to_grid(range: &Range<DataType>) -> Grid {
    let Some((start_row, start_col)) = range.start() else {
        return Vec::new();
    };

    let mut grid: Grid = vec![Vec::new(); start_row as usize];
    for row in range.rows() {
        let mut cells = vec![String::new(); start_col as usize];
        cells.extend(row.iter().map(|cell| cell_to_string(Some(cell))));
        grid.push(cells);
    }
    grid
}

/// Renders a cell the way it reads in the sheet; numbers without a fractional
/// part carry no trailing `.0`.
pub fn cell_to_string(cell: Option<&DataType>) -> String {
    match cell {
        Some(DataType::String(value)) => value.clone(),
        Some(DataType::Float(value)) => value.to_string(),
        Some(DataType::Int(value)) => value.to_string(),
        Some(DataType::Bool(true)) => "True".to_string(),
        Some(DataType::Bool(false)) => "False".to_string(),
        Some(DataType::Empty) | None => String::new(),
        Some(other) => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn numeric_cells_render_without_trailing_zero() {
        assert_eq!(cell_to_string(Some(&DataType::Float(711234.0))), "711234");
        assert_eq!(cell_to_string(Some(&DataType::Float(1.5))), "1.5");
        assert_eq!(cell_to_string(Some(&DataType::Int(42))), "42");
        assert_eq!(cell_to_string(Some(&DataType::Bool(true))), "True");
        assert_eq!(cell_to_string(None), "");
    }

    #[test]
    fn grid_is_anchored_at_a1() {
        let mut range = Range::new((2, 1), (3, 2));
        range.set_value((2, 1), DataType::String("КАТО".into()));
        range.set_value((3, 2), DataType::Float(711234.0));

        let grid = range_to_grid(&range);
        assert_eq!(grid.len(), 4);
        assert!(grid[0].is_empty());
        assert_eq!(grid[2], vec!["", "КАТО", ""]);
        assert_eq!(grid[3], vec!["", "", "711234"]);
    }
}
