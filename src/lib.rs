//! Ethoframe - Frame/bout engine for animal behaviour classification tables
//!
//! Ethoframe validates the tables produced by a video tracking and behaviour
//! classification workflow, converts per-frame behaviour classifications into
//! bouts and back, and summarises tables over the whole recording or over
//! time bins.
//!
//! ## Modules
//!
//! - **Schema**: Declared index/column levels per table kind and a generic validator
//! - **Bouts**: Run-length codec and the frame table ↔ bout collection converter
//! - **Aggregate**: Quantitative and behavioural summaries, fixed and custom binning

pub mod aggregate;
pub mod behaviours;
pub mod bouts;
pub mod config;
pub mod error;
pub mod keypoints;
pub mod pipeline;
pub mod schema;
pub mod table;

// FFI bindings for C interop (always available for cdylib/staticlib builds)
pub mod ffi;

pub use aggregate::{
    aggregate_behavioural, aggregate_quantitative, binned, summarise, Aggregator, AnalysisReport,
    BinPolicy, StatsTable,
};
pub use bouts::{bouts_to_frames, frames_to_bouts, vector_to_bouts, Bout, BoutCollection};
pub use config::AnalyseConfig;
pub use error::ComputeError;
pub use pipeline::{bouts_json_to_frames_json, frames_json_to_bouts_json, FrameProcessor};
pub use schema::{init_empty, validate, SchemaError, TableKind, TableSchema};
pub use table::{ColumnKey, FrameTable};

/// Ethoframe library version
pub const ETHOFRAME_VERSION: &str = env!("CARGO_PKG_VERSION");
