use crate::spreadsheet::Value;
use crate::table::TableError;

/// Per-cell policies applied to every streamed value, copied from the table
/// options at stream creation.
#[derive(Clone, Debug)]
pub(crate) struct StreamPolicy {
    /// Fill blank cells from the value above in the same column
    pub(crate) repeat: bool,
    /// Strip leading/trailing whitespace from textual values
    pub(crate) trim: bool,
    /// Replacement for cells still blank after fill-down
    pub(crate) empty: Value,
}

/// Lazy, forward-only pass over a table's data rows.
///
/// Each raw row comes in as `(row_index, values)` restricted to the bound's
/// columns. Per cell, in order: fill-down substitution when blank and
/// `repeat` is on, trimming of textual values, carry-state update from
/// non-blank values, and finally replacement of anything still blank with
/// the configured empty value. A row whose width differs from the field
/// count is a shape error that exhausts the stream.
pub(crate) struct RecordStream<R> {
    rows: R,
    width: usize,
    policy: StreamPolicy,
    /// Last non-blank value seen per column; fresh on every stream
    carry: Vec<Option<Value>>,
    done: bool,
}

impl<R> RecordStream<R>
where
    R: Iterator<Item = (usize, Vec<Value>)>,
{
    pub(crate) fn new(rows: R, width: usize, policy: StreamPolicy) -> Self {
        Self {
            rows,
            width,
            policy,
            carry: vec![None; width],
            done: false,
        }
    }
}

impl<R> Iterator for RecordStream<R>
where
    R: Iterator<Item = (usize, Vec<Value>)>,
{
    type Item = Result<Vec<Value>, TableError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        let (row, raw) = self.rows.next()?;
        if raw.len() != self.width {
            self.done = true;
            return Some(Err(TableError::RowShape {
                row,
                expected: self.width,
                actual: raw.len(),
            }));
        }
        let values = raw
            .into_iter()
            .zip(self.carry.iter_mut())
            .map(|(value, carry)| {
                let mut value = if value.is_blank() && self.policy.repeat {
                    carry.clone().unwrap_or(value)
                } else {
                    value
                };
                if self.policy.trim {
                    value = value.trimmed();
                }
                if !value.is_blank() && self.policy.repeat {
                    *carry = Some(value.clone());
                }
                if value.is_blank() {
                    value = self.policy.empty.clone();
                }
                value
            })
            .collect();
        Some(Ok(values))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn text(value: &str) -> Value {
        Value::Text(value.to_owned())
    }

    fn stream(
        rows: Vec<Vec<Value>>,
        width: usize,
        policy: StreamPolicy,
    ) -> RecordStream<std::iter::Enumerate<std::vec::IntoIter<Vec<Value>>>> {
        RecordStream::new(rows.into_iter().enumerate(), width, policy)
    }

    fn policy(repeat: bool, trim: bool) -> StreamPolicy {
        StreamPolicy {
            repeat,
            trim,
            empty: Value::Missing,
        }
    }

    #[test]
    fn rows_pass_through_without_policies() {
        let rows = vec![
            vec![text(" a "), Value::Int(1)],
            vec![Value::Missing, Value::Int(2)],
        ];
        let collected: Vec<_> = stream(rows, 2, policy(false, false))
            .collect::<Result<_, _>>()
            .unwrap();
        assert_eq!(
            collected,
            vec![
                vec![text(" a "), Value::Int(1)],
                vec![Value::Missing, Value::Int(2)],
            ]
        );
    }

    #[test]
    fn repeat_fills_blanks_from_above() {
        let rows = vec![
            vec![text("alice"), Value::Int(30)],
            vec![Value::Missing, Value::Int(31)],
            vec![text("bob"), Value::Missing],
            vec![Value::Missing, Value::Missing],
        ];
        let collected: Vec<_> = stream(rows, 2, policy(true, true))
            .collect::<Result<_, _>>()
            .unwrap();
        assert_eq!(
            collected,
            vec![
                vec![text("alice"), Value::Int(30)],
                vec![text("alice"), Value::Int(31)],
                vec![text("bob"), Value::Int(31)],
                vec![text("bob"), Value::Int(31)],
            ]
        );
    }

    #[test]
    fn leading_blanks_use_empty_replacement() {
        let rows = vec![vec![Value::Missing], vec![text("x")]];
        let mut iterator = stream(
            rows,
            1,
            StreamPolicy {
                repeat: true,
                trim: true,
                empty: text("n/a"),
            },
        );
        assert_eq!(iterator.next().unwrap().unwrap(), vec![text("n/a")]);
        assert_eq!(iterator.next().unwrap().unwrap(), vec![text("x")]);
    }

    #[test]
    fn trim_applies_before_carry_update() {
        // The carried value is the trimmed one.
        let rows = vec![vec![text("  a  ")], vec![Value::Missing]];
        let collected: Vec<_> = stream(rows, 1, policy(true, true))
            .collect::<Result<_, _>>()
            .unwrap();
        assert_eq!(collected, vec![vec![text("a")], vec![text("a")]]);
    }

    #[test]
    fn whitespace_only_text_becomes_blank_under_trim() {
        let rows = vec![vec![text("   ")]];
        let collected: Vec<_> = stream(rows, 1, policy(false, true))
            .collect::<Result<_, _>>()
            .unwrap();
        assert_eq!(collected, vec![vec![Value::Missing]]);
    }

    #[test]
    fn without_repeat_blanks_stay_blank() {
        let rows = vec![vec![text("a")], vec![Value::Missing]];
        let collected: Vec<_> = stream(rows, 1, policy(false, true))
            .collect::<Result<_, _>>()
            .unwrap();
        assert_eq!(collected, vec![vec![text("a")], vec![Value::Missing]]);
    }

    #[test]
    fn shape_mismatch_exhausts_the_stream() {
        let rows = vec![
            vec![text("a"), text("b")],
            vec![text("only-one")],
            vec![text("c"), text("d")],
        ];
        let mut iterator = stream(rows, 2, policy(false, false));
        assert!(iterator.next().unwrap().is_ok());
        assert!(matches!(
            iterator.next().unwrap(),
            Err(TableError::RowShape {
                row: 1,
                expected: 2,
                actual: 1,
            })
        ));
        assert!(iterator.next().is_none());
        assert!(iterator.next().is_none());
    }
}
