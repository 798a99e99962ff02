//! # Spreadsheet Decoding Module
//!
//! Reads the supported spreadsheet formats — Excel (.xlsx, .xlsm, .xlsb, .xls)
//! and OpenDocument (.ods) — into an in-memory [`Sheet`] of typed values.
//! Format detection is by file extension; password-protected OOXML workbooks
//! are decrypted up front and decoded from memory.
pub(crate) mod cell;
pub(crate) mod crypto;
pub(crate) mod sheet;

use crate::spreadsheet::cell::Cell;
use crate::spreadsheet::SpreadsheetError::{
    InvalidFileFormat, NotEncrypted, SheetNotFound, UnsupportedEncryption,
};
use calamine::{
    Data, Ods, OdsError, Reader, Xls, XlsError, Xlsb, XlsbError, Xlsx, XlsxError,
};
use std::ffi::OsStr;
use std::fs::File;
use std::io::{BufReader, Cursor};
use std::path::Path;
use thiserror::Error;

pub use crate::spreadsheet::cell::Value;
pub use crate::spreadsheet::crypto::CryptoError;
pub use crate::spreadsheet::sheet::Sheet;

/// Custom error types for spreadsheet operations.
#[derive(Error, Debug)]
pub enum SpreadsheetError {
    /// Error in Excel 2007+ format (.xlsx, .xlsm)
    #[error("Invalid xlsx file format: {0}")]
    InvalidXlsxFileFormat(#[from] XlsxError),

    /// Error in Excel Binary format (.xlsb)
    #[error("Invalid xlsb file format: {0}")]
    InvalidXlsbFileFormat(#[from] XlsbError),

    /// Error in legacy Excel format (.xls)
    #[error("Invalid xls file format: {0}")]
    InvalidXlsFileFormat(#[from] XlsError),

    /// Error in OpenDocument format (.ods)
    #[error("Invalid ods file format: {0}")]
    InvalidOdsFileFormat(#[from] OdsError),

    #[error("{0}")]
    IoError(#[from] std::io::Error),

    #[error("{0}")]
    CryptoError(#[from] CryptoError),

    /// Unsupported or unrecognized file format
    #[error("Cannot detect file format for '{name}'")]
    InvalidFileFormat { name: String },

    /// Requested sheet not found in the workbook
    #[error("Sheet '{name}' not found")]
    SheetNotFound { name: String },

    /// Sheet exists but contains no data
    #[error("Empty sheet or missing data")]
    EmptySheet,

    /// Password given for a format that has no OOXML encryption wrapper
    #[error("Password decryption is not supported for '{name}'")]
    UnsupportedEncryption { name: String },

    /// Password given but the file is not an encrypted container
    #[error("File '{name}' is not password-protected")]
    NotEncrypted { name: String },
}

/// Type alias for buffered file reader
pub type FileReader = BufReader<File>;

/// Workbook bytes come either straight from disk or from an in-memory
/// buffer produced by decryption.
pub enum Source {
    File(FileReader),
    Memory(Cursor<Vec<u8>>),
}

impl std::io::Read for Source {
    fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        match self {
            Self::File(reader) => reader.read(buf),
            Self::Memory(cursor) => cursor.read(buf),
        }
    }
}

impl std::io::Seek for Source {
    fn seek(&mut self, pos: std::io::SeekFrom) -> std::io::Result<u64> {
        match self {
            Self::File(reader) => reader.seek(pos),
            Self::Memory(cursor) => cursor.seek(pos),
        }
    }
}

/// Identifies which worksheet to read; the default is the first sheet.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum SheetSelector {
    /// Zero-based position in the workbook's sheet list
    #[default]
    First,
    Index(usize),
    Name(String),
}

impl SheetSelector {
    /// Parses a selector from user input: a non-negative integer selects by
    /// 0-based index, anything else selects by name.
    pub fn parse(input: &str) -> Self {
        match input.parse::<usize>() {
            Ok(index) => Self::Index(index),
            Err(_) => Self::Name(input.to_owned()),
        }
    }
}

/// Wrapper enum for different spreadsheet format readers.
///
/// Provides a unified interface over the various spreadsheet formats
/// supported by the calamine library.
pub enum Spreadsheet {
    /// Excel 2007+ format reader (.xlsx, .xlsm)
    Xlsx(Xlsx<Source>),
    /// Excel Binary format reader (.xlsb)
    Xlsb(Xlsb<Source>),
    /// Legacy Excel format reader (.xls)
    Xls(Xls<Source>),
    /// OpenDocument format reader (.ods)
    Ods(Ods<Source>),
}

impl Spreadsheet {
    /// Opens a spreadsheet file, decrypting it first when a password is given.
    ///
    /// The format is detected from the file extension:
    /// - `.xlsx`, `.xlsm` - Excel 2007+ format
    /// - `.xlsb` - Excel Binary format
    /// - `.xls` - Legacy Excel format
    /// - `.ods` - OpenDocument format
    ///
    /// Password decryption applies to the OOXML formats only; a password for
    /// an `.xls` or `.ods` file is rejected, as is a password for a file that
    /// is not an encrypted OLE container.
    pub fn open<P>(path: P, password: Option<&str>) -> Result<Spreadsheet, SpreadsheetError>
    where
        P: AsRef<Path>,
    {
        let path = path.as_ref();
        let name = || path.to_string_lossy().to_string();
        let extension = path.extension().and_then(OsStr::to_str);
        if !matches!(
            extension,
            Some("xlsx") | Some("xlsm") | Some("xlsb") | Some("xls") | Some("ods")
        ) {
            return Err(InvalidFileFormat { name: name() });
        }
        let source = match (extension, password) {
            (Some("xlsx") | Some("xlsm") | Some("xlsb"), Some(password)) => {
                let bytes = std::fs::read(path)?;
                if !crypto::is_encrypted(&bytes) {
                    return Err(NotEncrypted { name: name() });
                }
                Source::Memory(Cursor::new(crypto::decrypt_workbook(&bytes, password)?))
            }
            (_, Some(_)) => return Err(UnsupportedEncryption { name: name() }),
            (_, None) => Source::File(BufReader::new(File::open(path)?)),
        };
        match extension {
            Some("xlsx") | Some("xlsm") => Ok(Self::Xlsx(Xlsx::new(source)?)),
            Some("xlsb") => Ok(Self::Xlsb(Xlsb::new(source)?)),
            Some("xls") => Ok(Self::Xls(Xls::new(source)?)),
            _ => Ok(Self::Ods(Ods::new(source)?)),
        }
    }

    /// Returns the names of all sheets in the spreadsheet.
    pub fn sheet_names(&self) -> Vec<String> {
        match self {
            Self::Xlsx(xlsx) => xlsx.sheet_names(),
            Self::Xlsb(xlsb) => xlsb.sheet_names(),
            Self::Xls(xls) => xls.sheet_names(),
            Self::Ods(ods) => ods.sheet_names(),
        }
    }

    /// Resolves a selector to a concrete sheet name.
    fn sheet_name(&self, selector: &SheetSelector) -> Result<String, SpreadsheetError> {
        let names = self.sheet_names();
        match selector {
            SheetSelector::First => names.first().cloned().ok_or(SheetNotFound {
                name: "0".to_owned(),
            }),
            SheetSelector::Index(index) => names.get(*index).cloned().ok_or(SheetNotFound {
                name: index.to_string(),
            }),
            SheetSelector::Name(name) => {
                if names.iter().any(|candidate| candidate == name) {
                    Ok(name.to_owned())
                } else {
                    Err(SheetNotFound {
                        name: name.to_owned(),
                    })
                }
            }
        }
    }

    /// Reads the selected worksheet into memory, converting every used cell
    /// to a crate [`Value`].
    pub fn read_sheet(&mut self, selector: &SheetSelector) -> Result<Sheet, SpreadsheetError> {
        let name = self.sheet_name(selector)?;
        let range = match self {
            Self::Xlsx(xlsx) => xlsx.worksheet_range(&name)?,
            Self::Xlsb(xlsb) => xlsb.worksheet_range(&name)?,
            Self::Xls(xls) => xls.worksheet_range(&name)?,
            Self::Ods(ods) => ods.worksheet_range(&name)?,
        };
        let start = range
            .start()
            .map(|(row, col)| (row as usize, col as usize))
            .unwrap_or((0, 0));
        let cells = range
            .used_cells()
            .filter(|(_, _, data)| **data != Data::Empty)
            .map(|(row, col, data)| Cell {
                row: start.0 + row,
                col: start.1 + col,
                value: Value::from(data),
            })
            .collect();
        Sheet::from_cells(&name, cells)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn selector_parses_index_or_name() {
        assert_eq!(SheetSelector::parse("2"), SheetSelector::Index(2));
        assert_eq!(
            SheetSelector::parse("Sheet1"),
            SheetSelector::Name("Sheet1".to_owned())
        );
        assert_eq!(SheetSelector::default(), SheetSelector::First);
    }

    #[test]
    fn password_rejected_for_legacy_formats() {
        assert!(matches!(
            Spreadsheet::open("book.ods", Some("secret")),
            Err(SpreadsheetError::UnsupportedEncryption { .. })
        ));
        assert!(matches!(
            Spreadsheet::open("book.xls", Some("secret")),
            Err(SpreadsheetError::UnsupportedEncryption { .. })
        ));
    }

    #[test]
    fn unknown_extension_is_rejected() {
        assert!(matches!(
            Spreadsheet::open("book.txt", None),
            Err(SpreadsheetError::InvalidFileFormat { .. })
        ));
    }
}
