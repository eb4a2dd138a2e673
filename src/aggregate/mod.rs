//! Aggregation and binning engine
//!
//! Summaries reduce each column of a frame-indexed table to a row of
//! statistics. Quantitative summaries describe the value distribution;
//! behavioural summaries run bout detection over `== 1` cells and describe
//! bout durations in seconds. Binned summaries apply the same reduction
//! within consecutive time windows.

pub mod binning;
pub mod stats;
pub mod summary;

pub use binning::{
    binned, fixed_width_edges, summarise, AnalysisReport, BinPolicy, BINNED_CUSTOM, MAX_FIXED_EDGES,
};
pub use summary::{
    aggregate_behavioural, aggregate_quantitative, Aggregator, StatsRow, StatsTable,
    BEHAVIOURAL_STATS, QUANTITATIVE_STATS,
};
