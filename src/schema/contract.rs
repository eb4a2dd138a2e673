//! Static schema declarations, one per table kind

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Row index level of every frame-by-frame table
pub const FRAME: &str = "frame";

/// Behaviour level of a behaviours table
pub const BEHAVIOURS: &str = "behaviours";

/// Outcome level of a behaviours table
pub const OUTCOMES: &str = "outcomes";

/// Scorer level of a keypoints table
pub const SCORER: &str = "scorer";

/// Bodypart level of a keypoints table
pub const BODYPARTS: &str = "bodyparts";

/// Coordinate level of a keypoints table (`x`, `y`, `likelihood`)
pub const COORDS: &str = "coords";

/// Individual level of keypoints and analysis tables
pub const INDIVIDUALS: &str = "individuals";

/// Measure level of analysis tables
pub const MEASURES: &str = "measures";

/// Aggregate statistic level of summary tables
pub const AGGS: &str = "aggs";

/// Bin right-edge level of binned summary tables
pub const BIN_SEC: &str = "bin_sec";

const FRAME_INDEX: &[&str] = &[FRAME];

/// Kinds of table exchanged between pipeline stages
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TableKind {
    /// Raw keypoint detections
    Keypoints,
    /// Extracted per-frame features
    Features,
    /// Per-frame behaviour classifications
    Behaviours,
    /// Per-frame analysis measures
    Analysis,
    /// Several analyses side by side
    AnalysisCombined,
    /// Whole-record aggregate statistics
    AnalysisSummary,
    /// Time-binned aggregate statistics
    AnalysisBinned,
}

impl TableKind {
    /// Every declared table kind
    pub const ALL: [TableKind; 7] = [
        TableKind::Keypoints,
        TableKind::Features,
        TableKind::Behaviours,
        TableKind::Analysis,
        TableKind::AnalysisCombined,
        TableKind::AnalysisSummary,
        TableKind::AnalysisBinned,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            TableKind::Keypoints => "keypoints",
            TableKind::Features => "features",
            TableKind::Behaviours => "behaviours",
            TableKind::Analysis => "analysis",
            TableKind::AnalysisCombined => "analysis_combined",
            TableKind::AnalysisSummary => "analysis_summary",
            TableKind::AnalysisBinned => "analysis_binned",
        }
    }

    /// The schema declared for this kind
    pub fn schema(self) -> &'static TableSchema {
        match self {
            TableKind::Keypoints => &KEYPOINTS_SCHEMA,
            TableKind::Features => &FEATURES_SCHEMA,
            TableKind::Behaviours => &BEHAVIOURS_SCHEMA,
            TableKind::Analysis => &ANALYSIS_SCHEMA,
            TableKind::AnalysisCombined => &ANALYSIS_COMBINED_SCHEMA,
            TableKind::AnalysisSummary => &ANALYSIS_SUMMARY_SCHEMA,
            TableKind::AnalysisBinned => &ANALYSIS_BINNED_SCHEMA,
        }
    }
}

impl fmt::Display for TableKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TableKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        TableKind::ALL
            .into_iter()
            .find(|kind| kind.as_str() == s)
            .ok_or_else(|| format!("unknown table kind '{}'", s))
    }
}

/// Declared shape of one table kind
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TableSchema {
    pub kind: TableKind,
    /// Expected row-index level names, in order
    pub index_names: &'static [&'static str],
    /// Expected column level names, in order
    pub column_names: &'static [&'static str],
    /// Whether null cells are allowed
    pub nullable: bool,
}

pub static KEYPOINTS_SCHEMA: TableSchema = TableSchema {
    kind: TableKind::Keypoints,
    index_names: FRAME_INDEX,
    column_names: &[SCORER, INDIVIDUALS, BODYPARTS, COORDS],
    nullable: false,
};

pub static FEATURES_SCHEMA: TableSchema = TableSchema {
    kind: TableKind::Features,
    index_names: FRAME_INDEX,
    column_names: &["features"],
    nullable: false,
};

pub static BEHAVIOURS_SCHEMA: TableSchema = TableSchema {
    kind: TableKind::Behaviours,
    index_names: FRAME_INDEX,
    column_names: &[BEHAVIOURS, OUTCOMES],
    nullable: false,
};

pub static ANALYSIS_SCHEMA: TableSchema = TableSchema {
    kind: TableKind::Analysis,
    index_names: FRAME_INDEX,
    column_names: &[INDIVIDUALS, MEASURES],
    nullable: false,
};

pub static ANALYSIS_COMBINED_SCHEMA: TableSchema = TableSchema {
    kind: TableKind::AnalysisCombined,
    index_names: FRAME_INDEX,
    column_names: &["analysis", INDIVIDUALS, MEASURES],
    nullable: false,
};

// Summaries are indexed by the source columns; all-null inputs yield NaN stats.
pub static ANALYSIS_SUMMARY_SCHEMA: TableSchema = TableSchema {
    kind: TableKind::AnalysisSummary,
    index_names: &[INDIVIDUALS, MEASURES],
    column_names: &[AGGS],
    nullable: true,
};

pub static ANALYSIS_BINNED_SCHEMA: TableSchema = TableSchema {
    kind: TableKind::AnalysisBinned,
    index_names: &[BIN_SEC, INDIVIDUALS, MEASURES],
    column_names: &[AGGS],
    nullable: true,
};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_round_trips_through_str() {
        for kind in TableKind::ALL {
            assert_eq!(kind.as_str().parse::<TableKind>().unwrap(), kind);
            assert_eq!(kind.schema().kind, kind);
        }
        assert!("bouts".parse::<TableKind>().is_err());
    }

    #[test]
    fn test_kind_serializes_snake_case() {
        let json = serde_json::to_string(&TableKind::AnalysisCombined).unwrap();
        assert_eq!(json, "\"analysis_combined\"");
    }

    #[test]
    fn test_frame_indexed_kinds_are_not_nullable() {
        for kind in TableKind::ALL {
            let schema = kind.schema();
            if schema.index_names == FRAME_INDEX {
                assert!(!schema.nullable, "{} should reject nulls", kind);
            }
        }
    }
}
