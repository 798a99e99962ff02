use thiserror::Error;

/// Main error type for the crate.
/// Aggregates errors from the standard library and internal modules.
#[derive(Error, Debug)]
pub enum XlTabError {
    #[error("{0}")]
    IoError(#[from] std::io::Error),

    #[error("{0}")]
    ParseIntError(#[from] std::num::ParseIntError),

    // Spreadsheet module errors
    #[error("{0}")]
    SpreadsheetError(#[from] crate::spreadsheet::SpreadsheetError),

    #[error("{0}")]
    CryptoError(#[from] crate::spreadsheet::crypto::CryptoError),

    // Table module errors
    #[error("{0}")]
    TableError(#[from] crate::table::TableError),

    #[error("{0}")]
    RangeError(#[from] crate::table::range::RangeError),
}
