//! # Table Extraction Module
//!
//! Turns a rectangular region of a worksheet into a stream of records: a
//! range request is resolved against the sheet's used extent, one or more
//! header rows become field names, and the remaining rows stream out with
//! fill-down and trimming policies applied per cell.
pub(crate) mod header;
pub(crate) mod range;
pub(crate) mod record;
pub(crate) mod stream;

use crate::spreadsheet::{Sheet, Value};
use crate::table::stream::{RecordStream, StreamPolicy};
use thiserror::Error;

pub use crate::table::range::{column_index, column_letter, Bound, RangeError, Span};
pub use crate::table::record::{Entries, Record, Records};

/// Errors related to table extraction.
#[derive(Error, Debug)]
pub enum TableError {
    #[error(transparent)]
    RangeError(#[from] RangeError),

    /// Two columns resolved to the same field name
    #[error("Duplicate header name '{name}'")]
    DuplicateHeader { name: String },

    /// A column's header rows contain no text at all
    #[error("Empty header at column '{column}'")]
    EmptyHeader { column: String },

    /// A data row's width differs from the field count
    #[error("Row {row} has {actual} cells where {expected} were expected")]
    RowShape {
        row: usize,
        expected: usize,
        actual: usize,
    },

    #[error("At least one header row is required")]
    NoHeaderRows,
}

/// Extraction settings for one table.
#[derive(Clone, Debug)]
pub struct TableOptions {
    /// Region of the sheet holding the table, open sides following the
    /// sheet's used extent
    pub span: Span,
    /// Number of header rows at the top of the region
    pub header_rows: usize,
    /// Replacement value for cells that are still blank after fill-down
    pub empty: Value,
    /// Fill blank cells from the value above in the same column
    pub repeat: bool,
    /// Strip leading/trailing whitespace from textual values
    pub trim: bool,
}

impl Default for TableOptions {
    fn default() -> Self {
        TableOptions {
            span: Span::default(),
            header_rows: 1,
            empty: Value::Missing,
            repeat: false,
            trim: true,
        }
    }
}

/// A resolved table: a concrete rectangle over a sheet plus the field names
/// read from its header rows. Range resolution and header interpretation
/// happen once, at construction; each call to [`Table::records`] or
/// [`Table::entries`] starts a fresh pass over the data rows.
pub struct Table<'a> {
    sheet: &'a Sheet,
    bound: Bound,
    data_start: usize,
    fields: Vec<String>,
    options: TableOptions,
}

impl<'a> Table<'a> {
    pub fn new(sheet: &'a Sheet, options: TableOptions) -> Result<Self, TableError> {
        let bound = options.span.resolve(
            sheet.row_lower_bound,
            sheet.row_upper_bound,
            sheet.col_lower_bound,
            sheet.col_upper_bound,
        )?;
        let fields = header::build_fields(sheet, &bound, options.header_rows)?;
        Ok(Table {
            sheet,
            bound,
            data_start: bound.start_row + options.header_rows,
            fields,
            options,
        })
    }

    /// The raw field names, in column order.
    pub fn fields(&self) -> &[String] {
        &self.fields
    }

    /// The resolved rectangle the table occupies.
    pub fn bound(&self) -> &Bound {
        &self.bound
    }

    fn stream(&self) -> RecordStream<SheetRows<'a>> {
        // Rows past the used extent hold nothing; stop at whichever comes
        // first.
        let stop_row = self.bound.stop_row.min(self.sheet.row_upper_bound);
        let rows = SheetRows {
            sheet: self.sheet,
            row: self.data_start,
            stop_row,
            start_col: self.bound.start_col,
            stop_col: self.bound.stop_col,
        };
        RecordStream::new(
            rows,
            self.bound.width(),
            StreamPolicy {
                repeat: self.options.repeat,
                trim: self.options.trim,
                empty: self.options.empty.clone(),
            },
        )
    }

    /// Streams the data rows as positional records with identifier-sanitized
    /// field names.
    pub fn records(&self) -> Result<Records<'a>, TableError> {
        let fields = record::sanitize_fields(&self.fields)?;
        Ok(Records::new(fields, self.stream()))
    }

    /// Streams the data rows as insertion-ordered maps keyed by the raw
    /// field names.
    pub fn entries(&self) -> Entries<'a> {
        Entries::new(self.fields.clone(), self.stream())
    }
}

/// Forward cursor over a sheet's rows, restricted to the bound's columns.
pub(crate) struct SheetRows<'a> {
    sheet: &'a Sheet,
    row: usize,
    stop_row: usize,
    start_col: usize,
    stop_col: usize,
}

impl Iterator for SheetRows<'_> {
    type Item = (usize, Vec<Value>);

    fn next(&mut self) -> Option<Self::Item> {
        if self.row > self.stop_row {
            return None;
        }
        let row = self.row;
        self.row += 1;
        let values = (self.start_col..=self.stop_col)
            .map(|col| self.sheet.value(row, col))
            .collect();
        Some((row, values))
    }
}
