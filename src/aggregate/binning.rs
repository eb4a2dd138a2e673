//! Time-windowed summaries
//!
//! Frames are re-indexed to start at 0 and stamped with `frame / fps`
//! seconds. Bins are right-closed, `(left, right]`, except the first which
//! also includes its left edge. Each bin is labelled by its right edge.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::{debug, warn};

use crate::aggregate::summary::{check_fps, check_frame_index, Aggregator, StatsTable};
use crate::config::AnalyseConfig;
use crate::error::ComputeError;
use crate::schema::BIN_SEC;
use crate::table::FrameTable;

/// Key of the report table binned by custom edges
pub const BINNED_CUSTOM: &str = "binned_custom";

/// Most edges a fixed-width binning may generate for one record
pub const MAX_FIXED_EDGES: usize = 100_000;

/// How bin edges are generated
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BinPolicy {
    /// Equal-width bins of the given number of seconds
    Fixed(f64),
    /// Caller-supplied edges in seconds
    Custom(Vec<f64>),
}

impl BinPolicy {
    /// Edge list for a record whose last timestamp is `t_max` seconds
    pub fn edges(&self, t_max: f64) -> Result<Vec<f64>, ComputeError> {
        match self {
            BinPolicy::Fixed(width) => fixed_width_edges(*width, t_max),
            BinPolicy::Custom(edges) => Ok(edges.clone()),
        }
    }

    /// Name of the binned table in an [`AnalysisReport`]
    pub fn report_key(&self) -> String {
        match self {
            BinPolicy::Fixed(width) => format!("binned_{}", width),
            BinPolicy::Custom(_) => BINNED_CUSTOM.to_string(),
        }
    }
}

/// Edges `0, w, 2w, ...` up to the first edge at or past `t_max`
pub fn fixed_width_edges(width: f64, t_max: f64) -> Result<Vec<f64>, ComputeError> {
    if !(width.is_finite() && width > 0.0) {
        return Err(ComputeError::InvalidParameter(format!(
            "bin width must be a positive number of seconds, got {}",
            width
        )));
    }
    let count = ((t_max.max(0.0) / width).floor() as usize).saturating_add(2);
    if count > MAX_FIXED_EDGES {
        return Err(ComputeError::InvalidParameter(format!(
            "bin width {} s over {} s would need {} edges, the limit is {}",
            width, t_max, count, MAX_FIXED_EDGES
        )));
    }
    Ok((0..count)
        .map(|k| k as f64 * width)
        .take_while(|edge| *edge < t_max + width)
        .collect())
}

/// Timestamp in seconds of the last row once frames start at 0
pub fn last_timestamp(table: &FrameTable, fps: f64) -> f64 {
    table.len().saturating_sub(1) as f64 / fps
}

/// Sorted, deduplicated edges widened to cover 0 and `t_max`
fn bound_edges(edges: &[f64], t_max: f64) -> Result<Vec<f64>, ComputeError> {
    if edges.is_empty() {
        return Err(ComputeError::InvalidParameter("bin edge list is empty".to_string()));
    }
    if let Some(bad) = edges.iter().find(|e| !e.is_finite()) {
        return Err(ComputeError::InvalidParameter(format!(
            "bin edges must be finite, got {}",
            bad
        )));
    }

    let mut bounded = edges.to_vec();
    bounded.sort_by(f64::total_cmp);
    bounded.dedup();

    if bounded[0] > 0.0 {
        warn!(first_edge = bounded[0], "bin edges extended to start at 0");
        bounded.insert(0, 0.0);
    }
    if bounded[bounded.len() - 1] < t_max {
        warn!(
            last_edge = bounded[bounded.len() - 1],
            t_max, "bin edges extended to the last timestamp"
        );
        bounded.push(t_max);
    }
    if bounded.len() == 1 {
        // a single point still makes one closed bin
        bounded.push(bounded[0]);
    }
    Ok(bounded)
}

/// Summarise each time bin of a frame-indexed table.
///
/// `edges` are in seconds and need not bound the data: a 0 edge is added when
/// every edge is positive, and the last timestamp is added when every edge
/// falls short of it. Empty bins still yield one row per column, aggregated
/// as empty input.
pub fn binned(
    table: &FrameTable,
    fps: f64,
    edges: &[f64],
    aggregator: Aggregator,
) -> Result<StatsTable, ComputeError> {
    check_fps(fps)?;
    check_frame_index(table)?;

    let rebased = table.with_start(0);
    let timestamps: Vec<f64> = (0..rebased.len()).map(|i| i as f64 / fps).collect();
    let edges = bound_edges(edges, last_timestamp(&rebased, fps))?;

    let mut index_names = vec![BIN_SEC.to_string()];
    index_names.extend(rebased.column_names().iter().cloned());
    let mut out = StatsTable::new(index_names, aggregator.stat_names().iter().copied());

    for (i, pair) in edges.windows(2).enumerate() {
        let (left, right) = (pair[0], pair[1]);
        let lo = if i == 0 {
            timestamps.partition_point(|t| *t < left)
        } else {
            timestamps.partition_point(|t| *t <= left)
        };
        let hi = timestamps.partition_point(|t| *t <= right).max(lo);

        let stats = aggregator.apply(&rebased.slice_rows(lo..hi), fps)?;
        debug!(left, right, rows = hi - lo, "aggregated bin");

        out.rows.extend(stats.rows.into_iter().map(|mut row| {
            row.bin_sec = Some(right);
            row
        }));
    }

    Ok(out)
}

/// Whole-record summary plus every configured binning of one table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisReport {
    pub aggregator: Aggregator,
    pub summary: StatsTable,
    /// Binned tables keyed `binned_<width>` and `binned_custom`
    pub binned: BTreeMap<String, StatsTable>,
    pub computed_at: DateTime<Utc>,
}

/// Summarise a table and bin it by every width and the custom edges in `config`
pub fn summarise(
    table: &FrameTable,
    config: &AnalyseConfig,
    aggregator: Aggregator,
) -> Result<AnalysisReport, ComputeError> {
    config.validate()?;

    let rebased = table.with_start(0);
    let summary = aggregator.apply(&rebased, config.fps)?;
    let t_max = last_timestamp(&rebased, config.fps);

    let mut policies: Vec<BinPolicy> = config.bins_sec.iter().map(|w| BinPolicy::Fixed(*w)).collect();
    if !config.custom_bins_sec.is_empty() {
        policies.push(BinPolicy::Custom(config.custom_bins_sec.clone()));
    }

    let mut binned_tables = BTreeMap::new();
    for policy in &policies {
        let edges = policy.edges(t_max)?;
        let stats = binned(&rebased, config.fps, &edges, aggregator)?;
        binned_tables.insert(policy.report_key(), stats);
    }

    Ok(AnalysisReport {
        aggregator,
        summary,
        binned: binned_tables,
        computed_at: Utc::now(),
    })
}
