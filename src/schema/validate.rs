//! Generic schema validation

use std::ops::Range;

use crate::schema::contract::{TableKind, TableSchema};
use crate::table::FrameTable;

/// Anything with named index levels, named column levels and nullable cells
pub trait Tabular {
    /// Row-index level names, in order
    fn index_names(&self) -> &[String];

    /// Column level names, in order
    fn column_names(&self) -> &[String];

    /// Human-readable location of the first null cell, if any
    fn null_location(&self) -> Option<String>;

    fn has_nulls(&self) -> bool {
        self.null_location().is_some()
    }
}

impl Tabular for FrameTable {
    fn index_names(&self) -> &[String] {
        FrameTable::index_names(self)
    }

    fn column_names(&self) -> &[String] {
        FrameTable::column_names(self)
    }

    fn null_location(&self) -> Option<String> {
        self.first_null()
            .map(|(key, frame)| format!("column {} at frame {}", key, frame))
    }
}

/// Schema contract violations
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SchemaError {
    #[error("The index levels are incorrect for a {kind} table. Expected {expected} but got {actual}")]
    IndexMismatch {
        kind: TableKind,
        expected: String,
        actual: String,
    },

    #[error("The column levels are incorrect for a {kind} table. Expected {expected} but got {actual}")]
    ColumnMismatch {
        kind: TableKind,
        expected: String,
        actual: String,
    },

    #[error("Summaries need a table indexed by {expected} but got {actual}")]
    NotFrameIndexed { expected: String, actual: String },

    #[error("The {kind} table contains null values ({location})")]
    NullValues { kind: TableKind, location: String },
}

/// Render level names as a tuple, e.g. `("behaviours", "outcomes")`
pub fn format_levels<S: AsRef<str>>(names: &[S]) -> String {
    let quoted: Vec<String> = names
        .iter()
        .map(|n| format!("\"{}\"", n.as_ref()))
        .collect();
    format!("({})", quoted.join(", "))
}

fn levels_match(actual: &[String], expected: &[&str]) -> bool {
    actual.len() == expected.len() && actual.iter().zip(expected).all(|(a, e)| a == e)
}

/// Check a table's index levels, column levels and nulls against a schema.
///
/// Level names are compared as ordered tuples, so `(outcomes, behaviours)`
/// does not satisfy a schema declaring `(behaviours, outcomes)`.
pub fn validate<T: Tabular + ?Sized>(table: &T, schema: &TableSchema) -> Result<(), SchemaError> {
    if !levels_match(table.index_names(), schema.index_names) {
        return Err(SchemaError::IndexMismatch {
            kind: schema.kind,
            expected: format_levels(schema.index_names),
            actual: format_levels(table.index_names()),
        });
    }

    if !levels_match(table.column_names(), schema.column_names) {
        return Err(SchemaError::ColumnMismatch {
            kind: schema.kind,
            expected: format_levels(schema.column_names),
            actual: format_levels(table.column_names()),
        });
    }

    if !schema.nullable {
        if let Some(location) = table.null_location() {
            return Err(SchemaError::NullValues {
                kind: schema.kind,
                location,
            });
        }
    }

    Ok(())
}

/// Empty table over `frames` with the schema's index and column levels.
///
/// The index keeps the range's own offset, so frame numbers line up with the
/// source recording even when it does not start at zero.
pub fn init_empty(frames: Range<i64>, schema: &TableSchema) -> FrameTable {
    FrameTable::new(
        schema.index_names.iter().copied(),
        schema.column_names.iter().copied(),
        frames,
    )
}
