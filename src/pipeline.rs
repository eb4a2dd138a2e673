//! Pipeline orchestration
//!
//! JSON-in/JSON-out entry points used by the FFI layer and the CLI.
//! Tables travel in their serde form (see [`FrameTable`] and [`StatsTable`]),
//! bout collections in their canonical form.

use tracing::info;

use crate::aggregate::{summarise, Aggregator, StatsTable};
use crate::bouts::{bouts_to_frames, frames_to_bouts, BoutCollection};
use crate::config::AnalyseConfig;
use crate::error::ComputeError;
use crate::schema::{validate, TableKind};
use crate::table::FrameTable;

/// Convert a behaviours frame table (JSON) into its bout collection (JSON).
///
/// # Example
/// ```ignore
/// let bouts_json = frames_json_to_bouts_json(&table_json)?;
/// ```
pub fn frames_json_to_bouts_json(table_json: &str) -> Result<String, ComputeError> {
    let table: FrameTable = serde_json::from_str(table_json)?;
    info!(
        frames = table.len(),
        columns = table.columns().len(),
        "converting frames to bouts"
    );
    frames_to_bouts(&table)?.to_json()
}

/// Rebuild the behaviours frame table (JSON) described by a bout collection (JSON)
pub fn bouts_json_to_frames_json(bouts_json: &str) -> Result<String, ComputeError> {
    let collection = BoutCollection::from_json(bouts_json)?;
    info!(
        start = collection.start,
        stop = collection.stop,
        bouts = collection.bouts.len(),
        "converting bouts to frames"
    );
    let table = bouts_to_frames(&collection)?;
    Ok(serde_json::to_string(&table)?)
}

/// Parse a table of the given kind and check it against that kind's schema.
///
/// Summary and binned kinds are read as [`StatsTable`]s, every other kind as
/// a [`FrameTable`].
pub fn validate_table_json(table_json: &str, kind: TableKind) -> Result<(), ComputeError> {
    info!(%kind, "validating table");
    match kind {
        TableKind::AnalysisSummary | TableKind::AnalysisBinned => {
            let table: StatsTable = serde_json::from_str(table_json)?;
            validate(&table, kind.schema())?;
        }
        _ => {
            let table: FrameTable = serde_json::from_str(table_json)?;
            validate(&table, kind.schema())?;
        }
    }
    Ok(())
}

/// Summarise a frame table (JSON) with a one-off configuration (JSON)
pub fn summarise_json(
    table_json: &str,
    config_json: &str,
    aggregator: Aggregator,
) -> Result<String, ComputeError> {
    let mut processor = FrameProcessor::new(AnalyseConfig::from_json(config_json)?);
    processor.summarise(table_json, aggregator)
}

/// Stateful processor holding the analysis configuration of one recording.
///
/// Use this when several tables of the same recording are summarised with the
/// same frame rate and bins.
pub struct FrameProcessor {
    config: AnalyseConfig,
    summarised: usize,
}

impl FrameProcessor {
    pub fn new(config: AnalyseConfig) -> Self {
        Self {
            config,
            summarised: 0,
        }
    }

    /// Processor with the default bins at the given frame rate
    pub fn with_fps(fps: f64) -> Self {
        Self::new(AnalyseConfig::with_fps(fps))
    }

    pub fn config(&self) -> &AnalyseConfig {
        &self.config
    }

    /// Number of tables summarised so far
    pub fn summarised(&self) -> usize {
        self.summarised
    }

    /// Replace the configuration from JSON
    pub fn load_config(&mut self, json: &str) -> Result<(), ComputeError> {
        self.config = AnalyseConfig::from_json(json)?;
        Ok(())
    }

    pub fn save_config(&self) -> Result<String, ComputeError> {
        self.config.to_json()
    }

    /// Summarise a frame table (JSON) into an analysis report (JSON)
    pub fn summarise(&mut self, table_json: &str, aggregator: Aggregator) -> Result<String, ComputeError> {
        let table: FrameTable = serde_json::from_str(table_json)?;
        info!(
            %aggregator,
            fps = self.config.fps,
            frames = table.len(),
            "summarising table"
        );
        let report = summarise(&table, &self.config, aggregator)?;
        self.summarised += 1;
        Ok(serde_json::to_string(&report)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::behaviours::{ACTUAL, PRED};
    use crate::schema::{init_empty, ANALYSIS_SCHEMA, BEHAVIOURS_SCHEMA};
    use pretty_assertions::assert_eq;

    fn behaviours_json() -> String {
        let mut table = init_empty(100..130, &BEHAVIOURS_SCHEMA);
        let pred: Vec<f64> = (0..30).map(|i| if (10..15).contains(&i) { 1.0 } else { 0.0 }).collect();
        table.insert_column(("fight", ACTUAL).into(), pred.clone()).unwrap();
        table.insert_column(("fight", PRED).into(), pred).unwrap();
        serde_json::to_string(&table).unwrap()
    }

    fn analysis_json() -> String {
        let mut table = init_empty(0..100, &ANALYSIS_SCHEMA);
        let values = (0..100).map(|i| i as f64).collect();
        table.insert_column(("mouse1", "speed").into(), values).unwrap();
        serde_json::to_string(&table).unwrap()
    }

    #[test]
    fn test_frames_json_to_bouts_json() {
        let bouts_json = frames_json_to_bouts_json(&behaviours_json()).unwrap();
        let collection = BoutCollection::from_json(&bouts_json).unwrap();

        assert_eq!((collection.start, collection.stop), (100, 130));
        assert_eq!(collection.bouts.len(), 1);
        assert_eq!((collection.bouts[0].start, collection.bouts[0].stop), (110, 114));
        assert_eq!(collection.bouts[0].actual, 1);
    }

    #[test]
    fn test_json_round_trip() {
        let original = behaviours_json();
        let bouts_json = frames_json_to_bouts_json(&original).unwrap();
        let frames_json = bouts_json_to_frames_json(&bouts_json).unwrap();

        let a: FrameTable = serde_json::from_str(&original).unwrap();
        let b: FrameTable = serde_json::from_str(&frames_json).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_validate_table_json() {
        assert!(validate_table_json(&behaviours_json(), TableKind::Behaviours).is_ok());

        let err = validate_table_json(&behaviours_json(), TableKind::Analysis).unwrap_err();
        assert!(err.to_string().contains("(\"individuals\", \"measures\")"));
    }

    #[test]
    fn test_validate_summary_json() {
        let mut processor = FrameProcessor::with_fps(10.0);
        let report_json = processor.summarise(&analysis_json(), Aggregator::Quantitative).unwrap();
        let report: serde_json::Value = serde_json::from_str(&report_json).unwrap();

        let summary = report["summary"].to_string();
        assert!(validate_table_json(&summary, TableKind::AnalysisSummary).is_ok());
        let binned = report["binned"]["binned_30"].to_string();
        assert!(validate_table_json(&binned, TableKind::AnalysisBinned).is_ok());
        assert!(validate_table_json(&summary, TableKind::AnalysisBinned).is_err());
    }

    #[test]
    fn test_processor_config_round_trip() {
        let mut processor = FrameProcessor::with_fps(25.0);
        let saved = processor.save_config().unwrap();

        let mut other = FrameProcessor::with_fps(1.0);
        other.load_config(&saved).unwrap();
        assert_eq!(other.config(), processor.config());

        processor.summarise(&analysis_json(), Aggregator::Behavioural).unwrap();
        assert_eq!(processor.summarised(), 1);
    }

    #[test]
    fn test_summarise_json_keys() {
        let report_json = summarise_json(
            &analysis_json(),
            r#"{"fps": 10, "bins_sec": [5], "custom_bins_sec": []}"#,
            Aggregator::Quantitative,
        )
        .unwrap();
        let report: serde_json::Value = serde_json::from_str(&report_json).unwrap();
        let keys: Vec<&String> = report["binned"].as_object().unwrap().keys().collect();
        assert_eq!(keys, vec!["binned_5"]);
        assert!(report["computed_at"].is_string());
    }

    #[test]
    fn test_invalid_json() {
        let result = frames_json_to_bouts_json("not json");
        assert!(matches!(result, Err(ComputeError::JsonError(_))));
        assert!(bouts_json_to_frames_json("{}").is_err());
    }

    #[test]
    fn test_negative_collection_start_is_rejected() {
        let lowest = bouts_json_to_frames_json(r#"{"start": -9223372036854775808, "stop": 0, "bouts": []}"#);
        assert!(matches!(lowest, Err(ComputeError::OutOfRange(_))));

        let negative = bouts_json_to_frames_json(r#"{"start": -5, "stop": 5, "bouts": []}"#);
        assert!(matches!(negative, Err(ComputeError::OutOfRange(_))));
    }
}
