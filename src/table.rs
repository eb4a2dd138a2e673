//! Dense frame-by-frame tables
//!
//! A [`FrameTable`] holds one row per video frame and one column per
//! multi-level column key, e.g. `(behaviour, outcome)` or
//! `(individual, measure)`. The row index is a contiguous run of frame
//! numbers that may start at any non-negative offset (the frame number of the
//! original recording), so the table only stores the first frame and the row
//! count.
//!
//! Cells are stored as `f64`. Behaviour tables hold small integer codes
//! (`0`/`1`, `-1` for undecided) which are exact in `f64`; `NaN` marks a null
//! cell and serializes as JSON `null`.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{Range, RangeInclusive};

use crate::error::ComputeError;

/// Multi-level column key (one entry per column level)
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ColumnKey(pub Vec<String>);

impl ColumnKey {
    /// Build a key from its level values, outermost level first
    pub fn new<I, S>(parts: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        ColumnKey(parts.into_iter().map(Into::into).collect())
    }

    /// Value of the key at level position `i`
    pub fn level(&self, i: usize) -> Option<&str> {
        self.0.get(i).map(String::as_str)
    }

    /// Number of levels in the key
    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for ColumnKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({})", self.0.join(", "))
    }
}

impl From<(&str, &str)> for ColumnKey {
    fn from((a, b): (&str, &str)) -> Self {
        ColumnKey::new([a, b])
    }
}

/// One column of a frame table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Column {
    pub key: ColumnKey,
    #[serde(with = "nullable_cells")]
    pub values: Vec<f64>,
}

/// `NaN` <-> JSON `null` for cell vectors
pub(crate) mod nullable_cells {
    use serde::{Deserialize, Deserializer, Serializer};

    #[allow(clippy::ptr_arg)]
    pub fn serialize<S: Serializer>(values: &Vec<f64>, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_seq(values.iter().map(|v| if v.is_nan() { None } else { Some(*v) }))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<f64>, D::Error> {
        let raw: Vec<Option<f64>> = Vec::deserialize(deserializer)?;
        Ok(raw.into_iter().map(|v| v.unwrap_or(f64::NAN)).collect())
    }
}

/// Dense frame-by-frame table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "FrameTableRepr")]
pub struct FrameTable {
    /// Row index level names (normally just `frame`)
    index_names: Vec<String>,
    /// Ordered column level names, e.g. `behaviours, outcomes`
    column_names: Vec<String>,
    /// First frame number of the table
    start: i64,
    /// Number of rows
    len: usize,
    columns: Vec<Column>,
}

/// Unchecked wire form; shape is verified in `TryFrom`
#[derive(Deserialize)]
struct FrameTableRepr {
    index_names: Vec<String>,
    column_names: Vec<String>,
    start: i64,
    len: usize,
    #[serde(default)]
    columns: Vec<Column>,
}

impl TryFrom<FrameTableRepr> for FrameTable {
    type Error = ComputeError;

    fn try_from(repr: FrameTableRepr) -> Result<Self, Self::Error> {
        if repr.start < 0 {
            return Err(ComputeError::OutOfRange(format!(
                "table start frame {} is negative",
                repr.start
            )));
        }
        let end = i64::try_from(repr.len)
            .ok()
            .and_then(|len| repr.start.checked_add(len));
        if end.is_none() {
            return Err(ComputeError::OutOfRange(format!(
                "table of {} rows from frame {} overflows the frame index",
                repr.len, repr.start
            )));
        }
        let mut table = FrameTable {
            index_names: repr.index_names,
            column_names: repr.column_names,
            start: repr.start,
            len: repr.len,
            columns: Vec::with_capacity(repr.columns.len()),
        };
        for column in repr.columns {
            table.push_column(column.key, column.values)?;
        }
        Ok(table)
    }
}

impl FrameTable {
    /// Create a table with no columns over the half-open frame range `frames`
    pub fn new<I, C, S, T>(index_names: I, column_names: C, frames: Range<i64>) -> Self
    where
        I: IntoIterator<Item = S>,
        C: IntoIterator<Item = T>,
        S: Into<String>,
        T: Into<String>,
    {
        let len = frames.end.saturating_sub(frames.start).max(0) as usize;
        Self {
            index_names: index_names.into_iter().map(Into::into).collect(),
            column_names: column_names.into_iter().map(Into::into).collect(),
            start: frames.start,
            len,
            columns: Vec::new(),
        }
    }

    pub fn index_names(&self) -> &[String] {
        &self.index_names
    }

    pub fn column_names(&self) -> &[String] {
        &self.column_names
    }

    /// First frame number
    pub fn start(&self) -> i64 {
        self.start
    }

    /// One past the last frame number
    pub fn stop(&self) -> i64 {
        self.start + self.len as i64
    }

    /// Half-open frame range covered by the table
    pub fn frames(&self) -> Range<i64> {
        self.start..self.stop()
    }

    /// Number of rows
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn keys(&self) -> impl Iterator<Item = &ColumnKey> {
        self.columns.iter().map(|c| &c.key)
    }

    pub fn column(&self, key: &ColumnKey) -> Option<&Column> {
        self.columns.iter().find(|c| &c.key == key)
    }

    /// Values of the column at `key`, or `MissingColumn`
    pub fn values(&self, key: &ColumnKey) -> Result<&[f64], ComputeError> {
        self.column(key)
            .map(|c| c.values.as_slice())
            .ok_or_else(|| ComputeError::MissingColumn(key.to_string()))
    }

    /// Row position of a frame number
    pub fn position(&self, frame: i64) -> Option<usize> {
        if self.frames().contains(&frame) {
            Some((frame - self.start) as usize)
        } else {
            None
        }
    }

    /// Position of a named column level
    pub fn level_position(&self, level: &str) -> Result<usize, ComputeError> {
        self.column_names
            .iter()
            .position(|name| name == level)
            .ok_or_else(|| ComputeError::MissingColumn(format!("column level '{}'", level)))
    }

    /// Distinct values of a column level, in order of first appearance
    pub fn level_values(&self, level: &str) -> Result<Vec<String>, ComputeError> {
        let pos = self.level_position(level)?;
        let mut seen: Vec<String> = Vec::new();
        for key in self.keys() {
            if let Some(value) = key.level(pos) {
                if !seen.iter().any(|s| s == value) {
                    seen.push(value.to_string());
                }
            }
        }
        Ok(seen)
    }

    /// Assign a column, replacing any existing column with the same key
    pub fn insert_column(&mut self, key: ColumnKey, values: Vec<f64>) -> Result<(), ComputeError> {
        if key.len() != self.column_names.len() {
            return Err(ComputeError::ShapeMismatch(format!(
                "column key {} has {} levels but the table has {}",
                key,
                key.len(),
                self.column_names.len()
            )));
        }
        if values.len() != self.len {
            return Err(ComputeError::ShapeMismatch(format!(
                "column {} has {} values but the table has {} rows",
                key,
                values.len(),
                self.len
            )));
        }
        match self.columns.iter_mut().find(|c| c.key == key) {
            Some(existing) => existing.values = values,
            None => self.columns.push(Column { key, values }),
        }
        Ok(())
    }

    /// Add a column whose key must not already be present
    fn push_column(&mut self, key: ColumnKey, values: Vec<f64>) -> Result<(), ComputeError> {
        if self.column(&key).is_some() {
            return Err(ComputeError::ShapeMismatch(format!("duplicate column {}", key)));
        }
        self.insert_column(key, values)
    }

    /// Assign a column holding `value` on every row
    pub fn insert_constant(&mut self, key: ColumnKey, value: f64) -> Result<(), ComputeError> {
        let values = vec![value; self.len];
        self.insert_column(key, values)
    }

    /// Write `value` into the inclusive frame range of an existing column
    pub fn fill(
        &mut self,
        key: &ColumnKey,
        frames: RangeInclusive<i64>,
        value: f64,
    ) -> Result<(), ComputeError> {
        let (first, last) = (*frames.start(), *frames.end());
        let (Some(lo), Some(hi)) = (self.position(first), self.position(last)) else {
            return Err(ComputeError::OutOfRange(format!(
                "frames {}..={} outside table range {}..{}",
                first,
                last,
                self.start,
                self.stop()
            )));
        };
        let column = self
            .columns
            .iter_mut()
            .find(|c| &c.key == key)
            .ok_or_else(|| ComputeError::MissingColumn(key.to_string()))?;
        for cell in &mut column.values[lo..=hi] {
            *cell = value;
        }
        Ok(())
    }

    /// Rows at positions `rows`, keeping their frame numbers
    pub fn slice_rows(&self, rows: Range<usize>) -> FrameTable {
        let lo = rows.start.min(self.len);
        let hi = rows.end.clamp(lo, self.len);
        FrameTable {
            index_names: self.index_names.clone(),
            column_names: self.column_names.clone(),
            start: self.start + lo as i64,
            len: hi - lo,
            columns: self
                .columns
                .iter()
                .map(|c| Column {
                    key: c.key.clone(),
                    values: c.values[lo..hi].to_vec(),
                })
                .collect(),
        }
    }

    /// Rows whose frame number lies in the inclusive range, clamped to the table
    pub fn slice_frames(&self, frames: RangeInclusive<i64>) -> FrameTable {
        let lo = (*frames.start() - self.start).clamp(0, self.len as i64) as usize;
        let hi = (*frames.end() + 1 - self.start).clamp(0, self.len as i64) as usize;
        self.slice_rows(lo..hi.max(lo))
    }

    /// Copy of the table with the index shifted to begin at `start`
    pub fn with_start(&self, start: i64) -> FrameTable {
        FrameTable {
            start,
            ..self.clone()
        }
    }

    /// Sort columns lexicographically by key
    pub fn sort_columns(&mut self) {
        self.columns.sort_by(|a, b| a.key.cmp(&b.key));
    }

    /// Rewrite every column key; the new keys must keep the table's level count
    pub fn map_keys<F>(&mut self, mut f: F) -> Result<(), ComputeError>
    where
        F: FnMut(&ColumnKey) -> ColumnKey,
    {
        let mut renamed: Vec<ColumnKey> = Vec::with_capacity(self.columns.len());
        for column in &self.columns {
            let key = f(&column.key);
            if key.len() != self.column_names.len() {
                return Err(ComputeError::ShapeMismatch(format!(
                    "renamed key {} has {} levels but the table has {}",
                    key,
                    key.len(),
                    self.column_names.len()
                )));
            }
            if renamed.contains(&key) {
                return Err(ComputeError::ShapeMismatch(format!("duplicate column {}", key)));
            }
            renamed.push(key);
        }
        for (column, key) in self.columns.iter_mut().zip(renamed) {
            column.key = key;
        }
        Ok(())
    }

    /// Keep only the columns whose key satisfies `keep`
    pub fn retain_columns<F>(&mut self, mut keep: F)
    where
        F: FnMut(&ColumnKey) -> bool,
    {
        self.columns.retain(|c| keep(&c.key));
    }

    /// Copy of the table without the named column level
    pub fn drop_level(&self, level: &str) -> Result<FrameTable, ComputeError> {
        let pos = self.level_position(level)?;
        let mut column_names = self.column_names.clone();
        column_names.remove(pos);
        let mut out = FrameTable {
            index_names: self.index_names.clone(),
            column_names,
            start: self.start,
            len: self.len,
            columns: Vec::with_capacity(self.columns.len()),
        };
        for column in &self.columns {
            let mut parts = column.key.0.clone();
            parts.remove(pos);
            out.push_column(ColumnKey(parts), column.values.clone())?;
        }
        Ok(out)
    }

    /// First null cell as `(column, frame)`
    pub fn first_null(&self) -> Option<(ColumnKey, i64)> {
        self.columns.iter().find_map(|c| {
            c.values
                .iter()
                .position(|v| v.is_nan())
                .map(|i| (c.key.clone(), self.start + i as i64))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn sample_table() -> FrameTable {
        let mut table = FrameTable::new(["frame"], ["behaviours", "outcomes"], 100..105);
        table
            .insert_column(("fight", "pred").into(), vec![0.0, 1.0, 1.0, 0.0, 1.0])
            .unwrap();
        table
            .insert_column(("fight", "actual").into(), vec![0.0, 1.0, 1.0, 0.0, -1.0])
            .unwrap();
        table
            .insert_column(("groom", "pred").into(), vec![1.0, 0.0, 0.0, 0.0, 0.0])
            .unwrap();
        table
    }

    #[test]
    fn test_frame_range_keeps_offset() {
        let table = sample_table();
        assert_eq!(table.start(), 100);
        assert_eq!(table.stop(), 105);
        assert_eq!(table.len(), 5);
        assert_eq!(table.position(102), Some(2));
        assert_eq!(table.position(105), None);
        assert_eq!(table.position(99), None);
    }

    #[test]
    fn test_insert_rejects_bad_shapes() {
        let mut table = sample_table();
        let short = table.insert_column(("fight", "extra").into(), vec![0.0; 4]);
        assert!(matches!(short, Err(ComputeError::ShapeMismatch(_))));

        let wrong_arity = table.insert_column(ColumnKey::new(["fight"]), vec![0.0; 5]);
        assert!(matches!(wrong_arity, Err(ComputeError::ShapeMismatch(_))));
    }

    #[test]
    fn test_insert_replaces_existing_column() {
        let mut table = sample_table();
        table.insert_constant(("fight", "pred").into(), 0.0).unwrap();
        assert_eq!(table.columns().len(), 3);
        assert_eq!(table.values(&("fight", "pred").into()).unwrap(), &[0.0; 5]);
    }

    #[test]
    fn test_level_values_in_order_of_appearance() {
        let table = sample_table();
        assert_eq!(table.level_values("behaviours").unwrap(), vec!["fight", "groom"]);
        assert_eq!(table.level_values("outcomes").unwrap(), vec!["pred", "actual"]);
        assert!(table.level_values("individuals").is_err());
    }

    #[test]
    fn test_fill_inclusive_range() {
        let mut table = sample_table();
        let key: ColumnKey = ("groom", "pred").into();
        table.fill(&key, 102..=103, 1.0).unwrap();
        assert_eq!(table.values(&key).unwrap(), &[1.0, 0.0, 1.0, 1.0, 0.0]);

        let out_of_range = table.fill(&key, 104..=105, 1.0);
        assert!(matches!(out_of_range, Err(ComputeError::OutOfRange(_))));
    }

    #[test]
    fn test_slice_frames_clamps_and_keeps_frame_numbers() {
        let table = sample_table();
        let slice = table.slice_frames(101..=102);
        assert_eq!(slice.frames(), 101..103);
        assert_eq!(slice.values(&("fight", "pred").into()).unwrap(), &[1.0, 1.0]);

        let clamped = table.slice_frames(90..=200);
        assert_eq!(clamped.frames(), 100..105);

        let outside = table.slice_frames(200..=210);
        assert!(outside.is_empty());
    }

    #[test]
    fn test_sort_and_drop_level() {
        let mut table = sample_table();
        table.sort_columns();
        let keys: Vec<String> = table.keys().map(|k| k.to_string()).collect();
        assert_eq!(keys, vec!["(fight, actual)", "(fight, pred)", "(groom, pred)"]);

        let dropped = table.drop_level("outcomes").unwrap_err();
        // (fight, actual) and (fight, pred) would collapse onto (fight)
        assert!(matches!(dropped, ComputeError::ShapeMismatch(ref msg) if msg.contains("duplicate column")));

        table.retain_columns(|k| k.level(1) == Some("pred"));
        let dropped = table.drop_level("outcomes").unwrap();
        assert_eq!(dropped.column_names(), &["behaviours".to_string()]);
        let keys: Vec<String> = dropped.keys().map(|k| k.to_string()).collect();
        assert_eq!(keys, vec!["(fight)", "(groom)"]);
        assert_eq!(dropped.values(&ColumnKey::new(["fight"])).unwrap(), &[0.0, 1.0, 1.0, 0.0, 1.0]);
    }

    #[test]
    fn test_drop_level_keeps_both_scorers_or_fails() {
        let mut table = FrameTable::new(["frame"], ["scorer", "individuals"], 0..2);
        table.insert_column(("dlc_a", "m1").into(), vec![1.0, 2.0]).unwrap();
        table.insert_column(("dlc_b", "m1").into(), vec![9.0, 9.0]).unwrap();

        let err = table.drop_level("scorer").unwrap_err();
        assert!(matches!(err, ComputeError::ShapeMismatch(_)));
        assert_eq!(table.values(&("dlc_a", "m1").into()).unwrap(), &[1.0, 2.0]);
    }

    #[test]
    fn test_deserialize_rejects_duplicate_columns() {
        let json = r#"{
            "index_names": ["frame"],
            "column_names": ["behaviours", "outcomes"],
            "start": 0,
            "len": 2,
            "columns": [
                {"key": ["fight", "pred"], "values": [1, 1]},
                {"key": ["fight", "pred"], "values": [0, 0]}
            ]
        }"#;
        let err = serde_json::from_str::<FrameTable>(json).unwrap_err();
        assert!(err.to_string().contains("duplicate column"));
    }

    #[test]
    fn test_deserialize_rejects_negative_or_overflowing_start() {
        let negative = r#"{"index_names": ["frame"], "column_names": ["behaviours", "outcomes"],
                           "start": -5, "len": 2}"#;
        let err = serde_json::from_str::<FrameTable>(negative).unwrap_err();
        assert!(err.to_string().contains("negative"));

        let overflowing = r#"{"index_names": ["frame"], "column_names": ["behaviours", "outcomes"],
                              "start": 9223372036854775800, "len": 100}"#;
        assert!(serde_json::from_str::<FrameTable>(overflowing).is_err());
    }

    #[test]
    fn test_new_saturates_extreme_ranges() {
        let table = FrameTable::new(["frame"], ["behaviours", "outcomes"], 5..i64::MIN);
        assert!(table.is_empty());
        assert_eq!(table.start(), 5);
    }

    #[test]
    fn test_null_cells_serialize_as_null() {
        let mut table = FrameTable::new(["frame"], ["individuals", "measures"], 0..3);
        table
            .insert_column(("mouse1", "speed").into(), vec![1.5, f64::NAN, 2.0])
            .unwrap();
        assert_eq!(table.first_null(), Some((("mouse1", "speed").into(), 1)));

        let json = serde_json::to_string(&table).unwrap();
        assert!(json.contains("[1.5,null,2.0]"));

        let back: FrameTable = serde_json::from_str(&json).unwrap();
        let values = back.values(&("mouse1", "speed").into()).unwrap();
        assert!(values[1].is_nan());
        assert_eq!(values[2], 2.0);
    }

    #[test]
    fn test_deserialize_rejects_ragged_columns() {
        let json = r#"{
            "index_names": ["frame"],
            "column_names": ["behaviours", "outcomes"],
            "start": 0,
            "len": 3,
            "columns": [{"key": ["fight", "pred"], "values": [0, 1]}]
        }"#;
        assert!(serde_json::from_str::<FrameTable>(json).is_err());
    }
}
