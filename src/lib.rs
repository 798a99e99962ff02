//! # xltab
//!
//! Extracts rectangular tables embedded in spreadsheet worksheets — possibly
//! offset from A1, possibly password-protected, possibly spanning multiple
//! header rows — and streams them as typed records.
//!
//! ```no_run
//! use xltab::{SheetSelector, Span, Spreadsheet, Table, TableOptions};
//!
//! # fn main() -> Result<(), xltab::XlTabError> {
//! let mut book = Spreadsheet::open("inventory.xlsx", None)?;
//! let sheet = book.read_sheet(&SheetSelector::default())?;
//! let table = Table::new(
//!     &sheet,
//!     TableOptions {
//!         span: Span {
//!             start_col: Some("B".to_owned()),
//!             ..Span::default()
//!         },
//!         repeat: true,
//!         ..TableOptions::default()
//!     },
//! )?;
//! for record in table.records()? {
//!     let record = record?;
//!     println!("{:?}", record.get("Name"));
//! }
//! # Ok(())
//! # }
//! ```
pub mod error;
pub mod spreadsheet;
pub mod table;

pub use crate::error::XlTabError;
pub use crate::spreadsheet::{Sheet, SheetSelector, Spreadsheet, SpreadsheetError, Value};
pub use crate::table::{
    Bound, Entries, Record, Records, Span, Table, TableError, TableOptions,
};
