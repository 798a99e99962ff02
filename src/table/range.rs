use regex::Regex;
use thiserror::Error;

/// Errors related to range resolution.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum RangeError {
    #[error("Invalid column token '{0}'")]
    InvalidColumn(String),

    #[error("Start row {start} is after stop row {stop}")]
    InvertedRows { start: usize, stop: usize },

    #[error("Start column '{start}' is after stop column '{stop}'")]
    InvertedColumns { start: String, stop: String },

    #[error("Range '{reference}' lies outside the sheet's used extent")]
    OutOfExtent { reference: String },
}

/// User-facing range request over a worksheet. Rows are 0-based indices,
/// columns are Excel-style letter tokens, and `None` leaves the side open so
/// the sheet's used extent decides.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Span {
    /// First data row (0-based), None for the sheet's first used row
    pub start_row: Option<usize>,
    /// Last row (0-based, inclusive), None for the sheet's last used row
    pub stop_row: Option<usize>,
    /// First column letter token, None for the sheet's first used column
    pub start_col: Option<String>,
    /// Last column letter token (inclusive), None for the last used column
    pub stop_col: Option<String>,
}

/// A fully resolved rectangle: every side concrete, 0-based, inclusive.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Bound {
    pub start_row: usize,
    pub stop_row: usize,
    pub start_col: usize,
    pub stop_col: usize,
}

impl Bound {
    /// Number of columns covered by the rectangle.
    pub fn width(&self) -> usize {
        self.stop_col - self.start_col + 1
    }

    /// Excel-style reference for diagnostics, e.g. "A2:C10".
    pub fn reference(&self) -> String {
        format!(
            "{}{}:{}{}",
            column_letter(self.start_col),
            self.start_row + 1,
            column_letter(self.stop_col),
            self.stop_row + 1
        )
    }
}

impl Span {
    /// Resolves the span against a sheet's used extent into a concrete
    /// rectangle. Pure and idempotent: resolving the output's indices again
    /// yields the same rectangle.
    pub fn resolve(
        &self,
        row_lower_bound: usize,
        row_upper_bound: usize,
        col_lower_bound: usize,
        col_upper_bound: usize,
    ) -> Result<Bound, RangeError> {
        let start_row = self.start_row.unwrap_or(row_lower_bound);
        let stop_row = self.stop_row.unwrap_or(row_upper_bound);
        let start_col = match &self.start_col {
            Some(token) => column_index(token)?,
            None => col_lower_bound,
        };
        let stop_col = match &self.stop_col {
            Some(token) => column_index(token)?,
            None => col_upper_bound,
        };
        if start_row > stop_row {
            return Err(RangeError::InvertedRows {
                start: start_row,
                stop: stop_row,
            });
        }
        if start_col > stop_col {
            return Err(RangeError::InvertedColumns {
                start: column_letter(start_col),
                stop: column_letter(stop_col),
            });
        }
        let bound = Bound {
            start_row,
            stop_row,
            start_col,
            stop_col,
        };
        // The rectangle may extend past the used extent on one side, but a
        // rectangle entirely outside it can never hold a table.
        if start_row > row_upper_bound
            || stop_row < row_lower_bound
            || start_col > col_upper_bound
            || stop_col < col_lower_bound
        {
            return Err(RangeError::OutOfExtent {
                reference: bound.reference(),
            });
        }
        Ok(bound)
    }
}

/// Converts an Excel-style column token to a 0-based index. Letters are
/// base-26 digits with A=1; a leading `$` is accepted and ignored.
pub fn column_index(token: &str) -> Result<usize, RangeError> {
    let pattern = Regex::new(r"^\$?([A-Za-z]+)$").expect("Hardcode regex pattern");
    let letters = pattern
        .captures(token.trim())
        .and_then(|captures| captures.get(1))
        .ok_or_else(|| RangeError::InvalidColumn(token.to_owned()))?;
    let index = letters
        .as_str()
        .bytes()
        .map(|byte| (byte.to_ascii_uppercase() - b'A' + 1) as usize)
        .fold(0usize, |index, digit| index * 26 + digit);
    Ok(index - 1)
}

/// Converts a 0-based column index to its Excel-style letters.
pub fn column_letter(index: usize) -> String {
    let mut column = index as u32 + 1;
    let mut letters = String::new();
    while column > 0 {
        column -= 1;
        let digit = char::from_u32(65 + column % 26).expect("Hardcode letters");
        column /= 26;
        letters.insert(0, digit);
    }
    letters
}
