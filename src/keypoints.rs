//! Keypoints-table helpers
//!
//! Keypoints tables carry `(scorer, individuals, bodyparts, coords)` column
//! keys. Two pseudo-individuals, `single` and `processed`, hold derived
//! points rather than tracked animals.

use crate::error::ComputeError;
use crate::schema::{validate, BODYPARTS, INDIVIDUALS, KEYPOINTS_SCHEMA, SCORER};
use crate::table::FrameTable;

const PSEUDO_INDIVIDUALS: [&str; 2] = ["single", "processed"];

/// Fail with every requested bodypart that the table does not contain
pub fn check_bodyparts_exist<S: AsRef<str>>(
    table: &FrameTable,
    bodyparts: &[S],
) -> Result<(), ComputeError> {
    let present = table.level_values(BODYPARTS)?;
    let missing: Vec<String> = bodyparts
        .iter()
        .map(|bp| bp.as_ref())
        .filter(|bp| !present.iter().any(|p| p == bp))
        .map(str::to_string)
        .collect();

    if missing.is_empty() {
        Ok(())
    } else {
        Err(ComputeError::MissingBodyparts(missing))
    }
}

/// Tracked individuals and bodyparts, in order of first appearance.
///
/// The `single` and `processed` pseudo-individuals are left out.
pub fn headings(table: &FrameTable) -> Result<(Vec<String>, Vec<String>), ComputeError> {
    validate(table, &KEYPOINTS_SCHEMA)?;

    let individuals = table
        .level_values(INDIVIDUALS)?
        .into_iter()
        .filter(|i| !PSEUDO_INDIVIDUALS.contains(&i.as_str()))
        .collect();
    let bodyparts = table.level_values(BODYPARTS)?;
    Ok((individuals, bodyparts))
}

/// Drop the scorer level and sort the columns
pub fn clean_headings(table: &FrameTable) -> Result<FrameTable, ComputeError> {
    let mut out = table.drop_level(SCORER)?;
    out.sort_columns();
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{init_empty, COORDS};
    use crate::table::ColumnKey;
    use pretty_assertions::assert_eq;

    fn keypoints_table() -> FrameTable {
        let mut table = init_empty(0..3, &KEYPOINTS_SCHEMA);
        for individual in ["mouse2", "mouse1", "single"] {
            for bodypart in ["nose", "tail_base"] {
                for coord in ["x", "y", "likelihood"] {
                    table
                        .insert_constant(
                            ColumnKey::new(["dlc", individual, bodypart, coord]),
                            1.0,
                        )
                        .unwrap();
                }
            }
        }
        table
    }

    #[test]
    fn test_check_bodyparts_exist() {
        let table = keypoints_table();
        assert!(check_bodyparts_exist(&table, &["nose", "tail_base"]).is_ok());

        let err = check_bodyparts_exist(&table, &["nose", "ear_left", "ear_right"]).unwrap_err();
        assert_eq!(err.to_string(), "Missing bodyparts: ear_left, ear_right");
    }

    #[test]
    fn test_headings_skip_pseudo_individuals() {
        let (individuals, bodyparts) = headings(&keypoints_table()).unwrap();
        assert_eq!(individuals, vec!["mouse2", "mouse1"]);
        assert_eq!(bodyparts, vec!["nose", "tail_base"]);
    }

    #[test]
    fn test_clean_headings() {
        let clean = clean_headings(&keypoints_table()).unwrap();
        assert_eq!(
            clean.column_names(),
            &[INDIVIDUALS.to_string(), BODYPARTS.to_string(), COORDS.to_string()]
        );
        let first = clean.keys().next().unwrap();
        assert_eq!(first, &ColumnKey::new(["mouse1", "nose", "likelihood"]));
        assert_eq!(clean.columns().len(), 18);
    }

    #[test]
    fn test_clean_headings_rejects_two_scorers() {
        let mut table = keypoints_table();
        table
            .insert_constant(ColumnKey::new(["dlc_resnet", "mouse1", "nose", "x"]), 9.0)
            .unwrap();
        let err = clean_headings(&table).unwrap_err();
        assert!(matches!(err, ComputeError::ShapeMismatch(_)));
    }
}
