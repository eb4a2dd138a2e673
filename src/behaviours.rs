//! Behaviours-table helpers
//!
//! Outcome names shared by the converter, plus the table reshaping steps the
//! scoring workflow runs before bouts are exported: adding user-defined
//! outcome columns, renaming a behaviour, and building a scored table from a
//! START/STOP event log.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::ops::Range;

use crate::error::ComputeError;
use crate::schema::{init_empty, validate, BEHAVIOURS, BEHAVIOURS_SCHEMA};
use crate::table::{ColumnKey, FrameTable};

/// Classifier probability outcome
pub const PROB: &str = "prob";

/// Model-predicted active state (0/1)
pub const PRED: &str = "pred";

/// Ground truth (1/0, or -1 when undecided)
pub const ACTUAL: &str = "actual";

/// Outcomes that are never treated as user-defined
pub fn is_reserved_outcome(outcome: &str) -> bool {
    matches!(outcome, PROB | PRED | ACTUAL)
}

/// Keep `pred` and `actual` for each listed behaviour and add a zeroed column
/// per user-defined outcome. `prob` and unlisted behaviours are dropped.
pub fn include_user_behavs(
    table: &FrameTable,
    user_behavs: &BTreeMap<String, Vec<String>>,
) -> Result<FrameTable, ComputeError> {
    validate(table, &BEHAVIOURS_SCHEMA)?;

    let mut out = init_empty(table.frames(), &BEHAVIOURS_SCHEMA);
    for (behaviour, outcomes) in user_behavs {
        for reserved in [PRED, ACTUAL] {
            let key = ColumnKey::new([behaviour.as_str(), reserved]);
            let values = table.values(&key)?.to_vec();
            out.insert_column(key, values)?;
        }
        for outcome in outcomes {
            if is_reserved_outcome(outcome) {
                return Err(ComputeError::InvalidParameter(format!(
                    "'{}' cannot be used as a user-defined outcome of {}",
                    outcome, behaviour
                )));
            }
            out.insert_constant(ColumnKey::new([behaviour.as_str(), outcome.as_str()]), 0.0)?;
        }
    }
    out.sort_columns();
    Ok(out)
}

/// Rename behaviour `from` to `to` across all of its outcome columns
pub fn rename_behaviour(table: &FrameTable, from: &str, to: &str) -> Result<FrameTable, ComputeError> {
    let pos = table.level_position(BEHAVIOURS)?;
    let mut out = table.clone();
    out.map_keys(|key| {
        let mut parts = key.0.clone();
        if parts[pos] == from {
            parts[pos] = to.to_string();
        }
        ColumnKey(parts)
    })?;
    Ok(out)
}

/// Whether a logged behaviour starts or stops
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum StateChange {
    Start,
    Stop,
}

/// One entry of a manual scoring event log
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StateEvent {
    pub behaviour: String,
    /// Frame at which the change takes effect
    pub frame: i64,
    pub change: StateChange,
}

/// Build a scored behaviours table from an ordered START/STOP event log.
///
/// Every behaviour named in `behaviours` or in the log gets zeroed `actual`
/// and `pred` columns. Events are applied in order: from the event's frame to
/// the end of the table both columns become 1 on START and 0 on STOP.
pub fn from_state_events(
    events: &[StateEvent],
    behaviours: &[String],
    frames: Range<i64>,
) -> Result<FrameTable, ComputeError> {
    let mut table = init_empty(frames, &BEHAVIOURS_SCHEMA);

    let mut names: Vec<&str> = events.iter().map(|e| e.behaviour.as_str()).collect();
    names.extend(behaviours.iter().map(String::as_str));
    for name in names {
        for outcome in [ACTUAL, PRED] {
            let key = ColumnKey::new([name, outcome]);
            if table.column(&key).is_none() {
                table.insert_constant(key, 0.0)?;
            }
        }
    }

    if table.is_empty() {
        return Ok(table);
    }
    let last = table.stop() - 1;
    for event in events {
        let value = match event.change {
            StateChange::Start => 1.0,
            StateChange::Stop => 0.0,
        };
        let first = event.frame.max(table.start());
        if first > last {
            continue;
        }
        for outcome in [ACTUAL, PRED] {
            let key = ColumnKey::new([event.behaviour.as_str(), outcome]);
            table.fill(&key, first..=last, value)?;
        }
    }

    Ok(table)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bouts::frames_to_bouts;
    use pretty_assertions::assert_eq;

    fn scored_table() -> FrameTable {
        let mut table = init_empty(0..4, &BEHAVIOURS_SCHEMA);
        table.insert_column(("fight", PROB).into(), vec![0.2, 0.9, 0.8, 0.1]).unwrap();
        table.insert_column(("fight", PRED).into(), vec![0.0, 1.0, 1.0, 0.0]).unwrap();
        table.insert_column(("fight", ACTUAL).into(), vec![0.0, 1.0, -1.0, 0.0]).unwrap();
        table.insert_column(("groom", PRED).into(), vec![1.0, 0.0, 0.0, 0.0]).unwrap();
        table.insert_column(("groom", ACTUAL).into(), vec![1.0, 0.0, 0.0, 0.0]).unwrap();
        table
    }

    #[test]
    fn test_reserved_outcomes() {
        assert!(is_reserved_outcome("pred"));
        assert!(is_reserved_outcome("actual"));
        assert!(is_reserved_outcome("prob"));
        assert!(!is_reserved_outcome("bite"));
    }

    #[test]
    fn test_include_user_behavs() {
        let user_behavs = BTreeMap::from([(
            "fight".to_string(),
            vec!["bite".to_string(), "chase".to_string()],
        )]);
        let out = include_user_behavs(&scored_table(), &user_behavs).unwrap();

        let keys: Vec<String> = out.keys().map(|k| k.to_string()).collect();
        assert_eq!(
            keys,
            vec!["(fight, actual)", "(fight, bite)", "(fight, chase)", "(fight, pred)"]
        );
        assert_eq!(out.values(&("fight", "bite").into()).unwrap(), &[0.0; 4]);
        assert_eq!(
            out.values(&("fight", ACTUAL).into()).unwrap(),
            &[0.0, 1.0, -1.0, 0.0]
        );
    }

    #[test]
    fn test_include_user_behavs_requires_listed_behaviour() {
        let user_behavs = BTreeMap::from([("rear".to_string(), vec![])]);
        let err = include_user_behavs(&scored_table(), &user_behavs).unwrap_err();
        assert!(matches!(err, ComputeError::MissingColumn(_)));
    }

    #[test]
    fn test_rename_behaviour() {
        let renamed = rename_behaviour(&scored_table(), "groom", "allogroom").unwrap();
        assert_eq!(
            renamed.level_values(BEHAVIOURS).unwrap(),
            vec!["fight", "allogroom"]
        );
        assert!(renamed.column(&("allogroom", PRED).into()).is_some());
    }

    #[test]
    fn test_rename_onto_existing_behaviour_fails() {
        let result = rename_behaviour(&scored_table(), "groom", "fight");
        assert!(matches!(result, Err(ComputeError::ShapeMismatch(_))));
    }

    #[test]
    fn test_from_state_events() {
        let events = vec![
            StateEvent {
                behaviour: "fight".to_string(),
                frame: 12,
                change: StateChange::Start,
            },
            StateEvent {
                behaviour: "fight".to_string(),
                frame: 15,
                change: StateChange::Stop,
            },
        ];
        let table = from_state_events(&events, &["groom".to_string()], 10..20).unwrap();

        let pred = table.values(&("fight", PRED).into()).unwrap();
        assert_eq!(pred, &[0.0, 0.0, 1.0, 1.0, 1.0, 0.0, 0.0, 0.0, 0.0, 0.0]);
        assert_eq!(table.values(&("groom", ACTUAL).into()).unwrap(), &[0.0; 10]);

        let bouts = frames_to_bouts(&table).unwrap();
        assert_eq!(bouts.bouts.len(), 1);
        assert_eq!((bouts.bouts[0].start, bouts.bouts[0].stop), (12, 14));
    }

    #[test]
    fn test_state_event_json() {
        let event: StateEvent =
            serde_json::from_str(r#"{"behaviour": "fight", "frame": 3, "change": "START"}"#).unwrap();
        assert_eq!(event.change, StateChange::Start);
    }
}
