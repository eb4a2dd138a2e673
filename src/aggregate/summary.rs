//! Whole-record summaries
//!
//! A summary has one row per source column and one value per statistic.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::aggregate::stats::{nan_sum, Describe};
use crate::bouts::codec::{active_mask, vector_to_bouts};
use crate::error::ComputeError;
use crate::schema::{format_levels, SchemaError, Tabular, AGGS, FRAME};
use crate::table::{nullable_cells, ColumnKey, FrameTable};

/// Statistic names of a quantitative summary
pub const QUANTITATIVE_STATS: [&str; 7] = ["mean", "std", "min", "Q1", "median", "Q3", "max"];

/// Statistic names of a behavioural summary
pub const BEHAVIOURAL_STATS: [&str; 9] = [
    "bout_freq",
    "bout_dur_total",
    "bout_dur_mean",
    "bout_dur_std",
    "bout_dur_min",
    "bout_dur_Q1",
    "bout_dur_median",
    "bout_dur_Q3",
    "bout_dur_max",
];

/// Summary statistics of one source column, optionally within one time bin
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatsRow {
    /// Right edge of the time bin in seconds; absent for whole-record summaries
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bin_sec: Option<f64>,
    pub key: ColumnKey,
    #[serde(with = "nullable_cells")]
    pub values: Vec<f64>,
}

/// Table of summary statistics
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatsTable {
    /// Row index level names: the source column levels, prefixed by `bin_sec`
    /// when binned
    pub index_names: Vec<String>,
    pub stat_names: Vec<String>,
    pub rows: Vec<StatsRow>,
    #[serde(skip, default = "aggs_level")]
    column_names: Vec<String>,
}

fn aggs_level() -> Vec<String> {
    vec![AGGS.to_string()]
}

impl StatsTable {
    pub fn new<S: Into<String>>(index_names: Vec<String>, stat_names: impl IntoIterator<Item = S>) -> Self {
        Self {
            index_names,
            stat_names: stat_names.into_iter().map(Into::into).collect(),
            rows: Vec::new(),
            column_names: aggs_level(),
        }
    }

    /// Statistic value for a source column (first matching row)
    pub fn get(&self, key: &ColumnKey, stat: &str) -> Option<f64> {
        let i = self.stat_names.iter().position(|s| s == stat)?;
        self.rows
            .iter()
            .find(|r| &r.key == key)
            .and_then(|r| r.values.get(i).copied())
    }

    /// Rows belonging to the bin with right edge `bin_sec`
    pub fn bin(&self, bin_sec: f64) -> impl Iterator<Item = &StatsRow> {
        self.rows.iter().filter(move |r| r.bin_sec == Some(bin_sec))
    }

    /// Distinct bin right edges, in row order
    pub fn bins(&self) -> Vec<f64> {
        let mut bins: Vec<f64> = Vec::new();
        for row in &self.rows {
            if let Some(b) = row.bin_sec {
                if bins.last() != Some(&b) {
                    bins.push(b);
                }
            }
        }
        bins
    }

    pub fn to_json(&self) -> Result<String, ComputeError> {
        Ok(serde_json::to_string(self)?)
    }
}

impl Tabular for StatsTable {
    fn index_names(&self) -> &[String] {
        &self.index_names
    }

    fn column_names(&self) -> &[String] {
        &self.column_names
    }

    fn null_location(&self) -> Option<String> {
        self.rows.iter().find_map(|row| {
            row.values
                .iter()
                .position(|v| v.is_nan())
                .map(|i| match self.stat_names.get(i) {
                    Some(stat) => format!("row {} statistic {}", row.key, stat),
                    None => format!("row {} statistic {}", row.key, i),
                })
        })
    }
}

/// Per-column reduction applied to a whole record or to each time bin
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Aggregator {
    /// Distribution of numeric values
    Quantitative,
    /// Bout frequency and durations of 0/1 columns
    Behavioural,
}

impl Aggregator {
    pub fn stat_names(self) -> &'static [&'static str] {
        match self {
            Aggregator::Quantitative => &QUANTITATIVE_STATS,
            Aggregator::Behavioural => &BEHAVIOURAL_STATS,
        }
    }

    pub fn apply(self, table: &FrameTable, fps: f64) -> Result<StatsTable, ComputeError> {
        match self {
            Aggregator::Quantitative => aggregate_quantitative(table),
            Aggregator::Behavioural => aggregate_behavioural(table, fps),
        }
    }
}

impl fmt::Display for Aggregator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Aggregator::Quantitative => write!(f, "quantitative"),
            Aggregator::Behavioural => write!(f, "behavioural"),
        }
    }
}

impl FromStr for Aggregator {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "quantitative" => Ok(Aggregator::Quantitative),
            "behavioural" | "behavioral" => Ok(Aggregator::Behavioural),
            other => Err(format!(
                "unknown aggregator '{}' (expected quantitative or behavioural)",
                other
            )),
        }
    }
}

/// Mean, std, min, quartiles and max of every column
pub fn aggregate_quantitative(table: &FrameTable) -> Result<StatsTable, ComputeError> {
    check_frame_index(table)?;

    let mut out = StatsTable::new(table.column_names().to_vec(), QUANTITATIVE_STATS);
    for column in table.columns() {
        out.rows.push(StatsRow {
            bin_sec: None,
            key: column.key.clone(),
            values: Describe::of(&column.values).to_vec(),
        });
    }
    Ok(out)
}

/// Bout count and bout-duration statistics (seconds) of every column.
///
/// A cell is active when it equals 1. Columns without bouts are described as
/// a single zero-length bout, with a frequency of 0.
pub fn aggregate_behavioural(table: &FrameTable, fps: f64) -> Result<StatsTable, ComputeError> {
    check_fps(fps)?;
    check_frame_index(table)?;

    let mut out = StatsTable::new(table.column_names().to_vec(), BEHAVIOURAL_STATS);
    for column in table.columns() {
        let durations: Vec<f64> = vector_to_bouts(&active_mask(&column.values))
            .iter()
            .map(|span| span.duration as f64 / fps)
            .collect();
        let freq = durations.len() as f64;
        let durations = if durations.is_empty() { vec![0.0] } else { durations };

        let mut values = vec![freq, nan_sum(&durations)];
        values.extend(Describe::of(&durations).to_vec());
        out.rows.push(StatsRow {
            bin_sec: None,
            key: column.key.clone(),
            values,
        });
    }
    Ok(out)
}

pub(crate) fn check_fps(fps: f64) -> Result<(), ComputeError> {
    if fps.is_finite() && fps > 0.0 {
        Ok(())
    } else {
        Err(ComputeError::InvalidParameter(format!(
            "fps must be a positive number, got {}",
            fps
        )))
    }
}

/// Summaries run over any frame-indexed table
pub(crate) fn check_frame_index(table: &FrameTable) -> Result<(), SchemaError> {
    if table.index_names() == &[FRAME] {
        Ok(())
    } else {
        Err(SchemaError::NotFrameIndexed {
            expected: format_levels(&[FRAME]),
            actual: format_levels(table.index_names()),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{init_empty, validate, ANALYSIS_SCHEMA, ANALYSIS_SUMMARY_SCHEMA};
    use pretty_assertions::assert_eq;

    fn analysis_table(values: Vec<f64>) -> FrameTable {
        let mut table = init_empty(0..values.len() as i64, &ANALYSIS_SCHEMA);
        table.insert_column(("mouse1", "speed").into(), values).unwrap();
        table
    }

    #[test]
    fn test_quantitative_one_to_five() {
        let table = analysis_table(vec![1.0, 2.0, 3.0, 4.0, 5.0]);
        let stats = aggregate_quantitative(&table).unwrap();
        let key: ColumnKey = ("mouse1", "speed").into();

        assert_eq!(stats.get(&key, "mean"), Some(3.0));
        assert_eq!(stats.get(&key, "median"), Some(3.0));
        assert_eq!(stats.get(&key, "min"), Some(1.0));
        assert_eq!(stats.get(&key, "max"), Some(5.0));
        assert_eq!(stats.get(&key, "Q1"), Some(2.0));
        assert_eq!(stats.get(&key, "Q3"), Some(4.0));
        assert!(validate(&stats, &ANALYSIS_SUMMARY_SCHEMA).is_ok());
    }

    #[test]
    fn test_quantitative_empty_column_is_zero() {
        let table = analysis_table(vec![]);
        let stats = aggregate_quantitative(&table).unwrap();
        assert_eq!(stats.rows[0].values, vec![0.0; 7]);
    }

    #[test]
    fn test_behavioural_single_bout() {
        let mut values = vec![0.0; 50];
        for v in &mut values[5..25] {
            *v = 1.0;
        }
        let stats = aggregate_behavioural(&analysis_table(values), 10.0).unwrap();
        let key: ColumnKey = ("mouse1", "speed").into();

        assert_eq!(stats.get(&key, "bout_freq"), Some(1.0));
        assert_eq!(stats.get(&key, "bout_dur_total"), Some(2.0));
        assert_eq!(stats.get(&key, "bout_dur_mean"), Some(2.0));
        assert_eq!(stats.get(&key, "bout_dur_std"), Some(0.0));
    }

    #[test]
    fn test_behavioural_without_bouts() {
        let stats = aggregate_behavioural(&analysis_table(vec![0.0, -1.0, 0.0]), 25.0).unwrap();
        assert_eq!(stats.rows[0].values, vec![0.0; 9]);
    }

    #[test]
    fn test_behavioural_rejects_bad_fps() {
        let table = analysis_table(vec![1.0]);
        assert!(matches!(
            aggregate_behavioural(&table, 0.0),
            Err(ComputeError::InvalidParameter(_))
        ));
        assert!(aggregate_behavioural(&table, f64::NAN).is_err());
    }

    #[test]
    fn test_summaries_need_frame_index() {
        let table = FrameTable::new(["time"], ["individuals", "measures"], 0..3);
        assert!(matches!(
            aggregate_quantitative(&table),
            Err(ComputeError::Schema(SchemaError::NotFrameIndexed { .. }))
        ));

        let behaviours = FrameTable::new(["time"], ["behaviours", "outcomes"], 0..3);
        let err = aggregate_behavioural(&behaviours, 30.0).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Summaries need a table indexed by (\"frame\") but got (\"time\")"
        );
    }

    #[test]
    fn test_null_location_with_extra_values() {
        let mut stats = aggregate_quantitative(&analysis_table(vec![1.0, 2.0])).unwrap();
        stats.rows[0].values.push(f64::NAN);
        assert_eq!(
            stats.null_location(),
            Some(format!("row {} statistic 7", stats.rows[0].key))
        );
    }

    #[test]
    fn test_stats_table_json_omits_missing_bin() {
        let stats = aggregate_quantitative(&analysis_table(vec![f64::NAN])).unwrap();
        let json = stats.to_json().unwrap();
        assert!(!json.contains("bin_sec"));
        assert!(json.contains("null"));

        let back: StatsTable = serde_json::from_str(&json).unwrap();
        assert_eq!(back.column_names(), &[AGGS.to_string()]);
        assert!(back.has_nulls());
    }

    #[test]
    fn test_aggregator_from_str() {
        assert_eq!("behavioral".parse::<Aggregator>(), Ok(Aggregator::Behavioural));
        assert_eq!(
            Aggregator::Quantitative.to_string().parse::<Aggregator>(),
            Ok(Aggregator::Quantitative)
        );
        assert!("median".parse::<Aggregator>().is_err());
    }
}
