use crate::spreadsheet::Value;
use crate::table::stream::RecordStream;
use crate::table::SheetRows;
use crate::table::TableError;
use indexmap::IndexMap;
use regex::Regex;
use std::ops::Index;
use std::sync::Arc;

/// One data row with positional access and name lookup. All records from the
/// same stream share one field layout.
#[derive(Clone, Debug, PartialEq)]
pub struct Record {
    fields: Arc<Vec<String>>,
    values: Vec<Value>,
}

impl Record {
    /// Looks a value up by its field name.
    pub fn get(&self, field: &str) -> Option<&Value> {
        self.fields
            .iter()
            .position(|candidate| candidate == field)
            .map(|index| &self.values[index])
    }

    /// The record's values in field order.
    pub fn values(&self) -> &[Value] {
        &self.values
    }

    /// Iterates over `(field, value)` pairs in field order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.fields
            .iter()
            .map(String::as_str)
            .zip(self.values.iter())
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl Index<usize> for Record {
    type Output = Value;

    fn index(&self, index: usize) -> &Value {
        &self.values[index]
    }
}

/// Rewrites field names into identifiers: every non-word character becomes
/// an underscore and a leading digit gets one prefixed. Names that collide
/// after rewriting are rejected.
pub(crate) fn sanitize_fields(fields: &[String]) -> Result<Vec<String>, TableError> {
    let pattern = Regex::new(r"\W").expect("Hardcode regex pattern");
    let mut sanitized = Vec::with_capacity(fields.len());
    for field in fields {
        let mut name = pattern.replace_all(field, "_").into_owned();
        if name.starts_with(|c: char| c.is_ascii_digit()) {
            name.insert(0, '_');
        }
        if sanitized.contains(&name) {
            return Err(TableError::DuplicateHeader { name });
        }
        sanitized.push(name);
    }
    Ok(sanitized)
}

/// Positional record iterator; field names are identifier-sanitized once at
/// creation and shared by every yielded [`Record`].
pub struct Records<'a> {
    fields: Arc<Vec<String>>,
    stream: RecordStream<SheetRows<'a>>,
}

impl<'a> Records<'a> {
    pub(crate) fn new(
        fields: Vec<String>,
        stream: RecordStream<SheetRows<'a>>,
    ) -> Self {
        Self {
            fields: Arc::new(fields),
            stream,
        }
    }

    /// The sanitized field names shared by all records.
    pub fn fields(&self) -> &[String] {
        &self.fields
    }
}

impl Iterator for Records<'_> {
    type Item = Result<Record, TableError>;

    fn next(&mut self) -> Option<Self::Item> {
        let values = self.stream.next()?;
        Some(values.map(|values| Record {
            fields: Arc::clone(&self.fields),
            values,
        }))
    }
}

/// Mapping record iterator; each row becomes an insertion-ordered map from
/// the raw (unsanitized) field names to values.
pub struct Entries<'a> {
    fields: Vec<String>,
    stream: RecordStream<SheetRows<'a>>,
}

impl<'a> Entries<'a> {
    pub(crate) fn new(fields: Vec<String>, stream: RecordStream<SheetRows<'a>>) -> Self {
        Self { fields, stream }
    }

    /// The raw field names used as map keys.
    pub fn fields(&self) -> &[String] {
        &self.fields
    }
}

impl Iterator for Entries<'_> {
    type Item = Result<IndexMap<String, Value>, TableError>;

    fn next(&mut self) -> Option<Self::Item> {
        let values = self.stream.next()?;
        Some(values.map(|values| {
            self.fields
                .iter()
                .cloned()
                .zip(values)
                .collect::<IndexMap<String, Value>>()
        }))
    }
}
