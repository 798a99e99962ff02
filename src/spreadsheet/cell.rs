use calamine::Data;
use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use iso8601_duration::Duration as IsoDuration;
use std::fmt::Display;

/// A single cell value, decoupled from the decoder's representation.
#[derive(Clone, Debug, Default, PartialEq)]
pub enum Value {
    /// The distinguished "no value" marker; distinct from the empty string.
    #[default]
    Missing,
    /// Boolean values (true/false)
    Bool(bool),
    /// Integer values (xls/ods)
    Int(i64),
    /// Numeric values
    Float(f64),
    /// String values
    Text(String),
    /// Date-only values
    Date(NaiveDate),
    /// Time-only values
    Time(NaiveTime),
    /// Date/time values
    DateTime(NaiveDateTime),
    /// ISO 8601 duration strings kept verbatim (ods time values)
    Duration(String),
}

impl Value {
    /// Returns true for the missing marker and for empty text.
    pub fn is_blank(&self) -> bool {
        match self {
            Self::Missing => true,
            Self::Text(text) => text.is_empty(),
            _ => false,
        }
    }

    /// Returns true if the value is textual.
    pub fn is_text(&self) -> bool {
        matches!(self, Self::Text(_))
    }

    /// Strips leading/trailing whitespace from textual values; other kinds
    /// pass through untouched.
    pub fn trimmed(self) -> Self {
        match self {
            Self::Text(text) => {
                let trimmed = text.trim();
                if trimmed.len() == text.len() {
                    Self::Text(text)
                } else {
                    Self::Text(trimmed.to_owned())
                }
            }
            other => other,
        }
    }
}

impl From<&Data> for Value {
    /// Converts a decoder cell into a crate value, classifying Excel datetime
    /// serials the same way the decoder's typed accessors do: time-of-day if
    /// the serial fits within one day, date if it has no fractional part.
    fn from(data: &Data) -> Self {
        match data {
            Data::Empty => Self::Missing,
            Data::Bool(value) => Self::Bool(*value),
            Data::Int(value) => Self::Int(*value),
            Data::Float(value) => Self::Float(*value),
            Data::String(value) => Self::Text(value.to_owned()),
            Data::DateTime(value) => match value.as_datetime() {
                Some(datetime) if value.as_f64() <= 1.0 => Self::Time(datetime.time()),
                Some(datetime) if value.as_f64().fract() == 0.0 => Self::Date(datetime.date()),
                Some(datetime) => Self::DateTime(datetime),
                None => Self::Float(value.as_f64()),
            },
            Data::DateTimeIso(value) => {
                if let Ok(datetime) = NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S%.f") {
                    Self::DateTime(datetime)
                } else if let Ok(date) = NaiveDate::parse_from_str(value, "%Y-%m-%d") {
                    Self::Date(date)
                } else if let Ok(time) = NaiveTime::parse_from_str(value, "%H:%M:%S%.f") {
                    Self::Time(time)
                } else {
                    Self::Text(value.to_owned())
                }
            }
            Data::DurationIso(value) => Self::Duration(value.to_owned()),
            Data::Error(value) => Self::Text(value.to_string()),
        }
    }
}

impl Display for Value {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Missing => Ok(()),
            Self::Bool(value) => write!(f, "{}", value),
            Self::Int(value) => write!(f, "{}", value),
            Self::Float(value) => write!(f, "{}", value),
            Self::Text(value) => write!(f, "{}", value),
            Self::Date(value) => write!(f, "{}", value.format("%Y-%m-%d")),
            Self::Time(value) => write!(f, "{}", value.format("%H:%M:%S")),
            Self::DateTime(value) => write!(f, "{}", value.format("%Y-%m-%d %H:%M:%S")),
            Self::Duration(value) => match value.parse::<IsoDuration>() {
                Ok(duration) => write!(
                    f,
                    "{:02}:{:02}:{:02}",
                    duration.hour as i64, duration.minute as i64, duration.second as i64
                ),
                Err(_) => write!(f, "{}", value),
            },
        }
    }
}

/// A single cell with its position; positions are 0-based.
#[derive(Clone, Debug)]
pub struct Cell {
    /// Row index (0-based)
    pub row: usize,
    /// Column index (0-based)
    pub col: usize,
    /// Cell value
    pub value: Value,
}
