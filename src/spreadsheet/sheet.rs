use crate::spreadsheet::cell::{Cell, Value};
use crate::spreadsheet::SpreadsheetError;
use std::collections::HashMap;

/// In-memory view of one worksheet: cell values addressable by 0-based
/// row/column index, with known used extents. The extraction core only reads
/// through this handle and never mutates it.
pub struct Sheet {
    /// Sheet name
    pub name: String,
    /// First used row (0-based)
    pub row_lower_bound: usize,
    /// Last used row (0-based, inclusive)
    pub row_upper_bound: usize,
    /// First used column (0-based)
    pub col_lower_bound: usize,
    /// Last used column (0-based, inclusive)
    pub col_upper_bound: usize,
    /// All non-empty cells in the sheet
    cells: Vec<Cell>,
    /// Index mapping from (row, col) to cell vector position
    indexes: HashMap<(usize, usize), usize>,
}

impl Sheet {
    /// Builds a sheet from its non-empty cells, deriving the used extent.
    pub(crate) fn from_cells(name: &str, cells: Vec<Cell>) -> Result<Self, SpreadsheetError> {
        if cells.is_empty() {
            return Err(SpreadsheetError::EmptySheet);
        }
        let mut row_lower_bound = usize::MAX;
        let mut row_upper_bound = 0;
        let mut col_lower_bound = usize::MAX;
        let mut col_upper_bound = 0;
        let mut indexes = HashMap::with_capacity(cells.len());
        for (index, cell) in cells.iter().enumerate() {
            row_lower_bound = row_lower_bound.min(cell.row);
            row_upper_bound = row_upper_bound.max(cell.row);
            col_lower_bound = col_lower_bound.min(cell.col);
            col_upper_bound = col_upper_bound.max(cell.col);
            indexes.insert((cell.row, cell.col), index);
        }
        Ok(Sheet {
            name: name.to_owned(),
            row_lower_bound,
            row_upper_bound,
            col_lower_bound,
            col_upper_bound,
            cells,
            indexes,
        })
    }

    /// Gets the value at the specified position, if a cell exists there.
    pub fn get(&self, row: usize, col: usize) -> Option<&Value> {
        self.indexes
            .get(&(row, col))
            .map(|index| &self.cells[*index].value)
    }

    /// Gets the value at the specified position, with absent cells read as
    /// the missing marker.
    pub fn value(&self, row: usize, col: usize) -> Value {
        self.get(row, col).cloned().unwrap_or(Value::Missing)
    }
}

/// Builds a sheet fixture from rows of text; empty strings become absent
/// cells so tests can model blanks.
#[cfg(test)]
pub(crate) fn sheet_of(rows: &[&[&str]]) -> Sheet {
    let mut cells = Vec::new();
    for (row, values) in rows.iter().enumerate() {
        for (col, value) in values.iter().enumerate() {
            if !value.is_empty() {
                cells.push(Cell {
                    row,
                    col,
                    value: Value::Text((*value).to_owned()),
                });
            }
        }
    }
    Sheet::from_cells("Sheet1", cells).expect("non-empty fixture")
}
