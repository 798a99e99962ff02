use crate::spreadsheet::Sheet;
use crate::table::range::{column_letter, Bound};
use crate::table::TableError;
use std::collections::HashSet;

/// Builds the table's field names from the header rows at the top of the
/// bound. Each column's name is the concatenation of its trimmed header cell
/// text, top to bottom, with embedded line breaks removed. Every column must
/// end up with a unique, non-empty name.
pub(crate) fn build_fields(
    sheet: &Sheet,
    bound: &Bound,
    header_rows: usize,
) -> Result<Vec<String>, TableError> {
    if header_rows == 0 {
        return Err(TableError::NoHeaderRows);
    }
    let mut fields = Vec::with_capacity(bound.width());
    let mut seen = HashSet::with_capacity(bound.width());
    for col in bound.start_col..=bound.stop_col {
        let mut name = String::new();
        for row in bound.start_row..bound.start_row + header_rows {
            let text = sheet.value(row, col).trimmed().to_string();
            name.extend(text.chars().filter(|c| *c != '\n' && *c != '\r'));
        }
        if name.is_empty() {
            return Err(TableError::EmptyHeader {
                column: column_letter(col),
            });
        }
        if !seen.insert(name.clone()) {
            return Err(TableError::DuplicateHeader { name });
        }
        fields.push(name);
    }
    Ok(fields)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::spreadsheet::sheet::sheet_of;
    use pretty_assertions::assert_eq;

    fn full_bound(sheet: &Sheet) -> Bound {
        Bound {
            start_row: sheet.row_lower_bound,
            stop_row: sheet.row_upper_bound,
            start_col: sheet.col_lower_bound,
            stop_col: sheet.col_upper_bound,
        }
    }

    #[test]
    fn one_field_per_column() {
        let sheet = sheet_of(&[&["Name", "Age", "City"], &["ann", "1", "x"]]);
        let fields = build_fields(&sheet, &full_bound(&sheet), 1).unwrap();
        assert_eq!(fields, vec!["Name", "Age", "City"]);
    }

    #[test]
    fn header_cells_are_trimmed() {
        let sheet = sheet_of(&[&["  Name ", "\tAge\t"]]);
        let fields = build_fields(&sheet, &full_bound(&sheet), 1).unwrap();
        assert_eq!(fields, vec!["Name", "Age"]);
    }

    #[test]
    fn multi_row_headers_concatenate_without_separator() {
        let sheet = sheet_of(&[&["Item", ""], &["Code", "Name"], &["a1", "widget"]]);
        let fields = build_fields(&sheet, &full_bound(&sheet), 2).unwrap();
        assert_eq!(fields, vec!["ItemCode", "Name"]);
    }

    #[test]
    fn embedded_newlines_are_removed() {
        let sheet = sheet_of(&[&["Unit\nPrice"]]);
        let fields = build_fields(&sheet, &full_bound(&sheet), 1).unwrap();
        assert_eq!(fields, vec!["UnitPrice"]);
    }

    #[test]
    fn duplicate_header_is_an_error() {
        let sheet = sheet_of(&[&["Name", "Name"]]);
        assert!(matches!(
            build_fields(&sheet, &full_bound(&sheet), 1),
            Err(TableError::DuplicateHeader { name }) if name == "Name"
        ));
    }

    #[test]
    fn empty_header_reports_column_letter() {
        let sheet = sheet_of(&[&["Name", "", "City"], &["a", "b", "c"]]);
        assert!(matches!(
            build_fields(&sheet, &full_bound(&sheet), 1),
            Err(TableError::EmptyHeader { column }) if column == "B"
        ));
    }

    #[test]
    fn zero_header_rows_is_a_configuration_error() {
        let sheet = sheet_of(&[&["Name"]]);
        assert!(matches!(
            build_fields(&sheet, &full_bound(&sheet), 0),
            Err(TableError::NoHeaderRows)
        ));
    }
}
