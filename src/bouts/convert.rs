//! Frame table ↔ bout collection conversion
//!
//! `frames_to_bouts` is lossy: every outcome other than `pred` is collapsed to
//! its most frequent value within each bout. `bouts_to_frames` inverts it
//! exactly for tables whose outcomes are already constant within every bout
//! and zero outside bouts.

use std::collections::{BTreeMap, BTreeSet};
use tracing::debug;

use crate::behaviours::{is_reserved_outcome, ACTUAL, PRED};
use crate::bouts::codec::{active_mask, vector_to_bouts_from};
use crate::bouts::types::{Bout, BoutCollection};
use crate::error::ComputeError;
use crate::schema::{init_empty, validate, BEHAVIOURS, BEHAVIOURS_SCHEMA, OUTCOMES};
use crate::table::{ColumnKey, FrameTable};

/// Convert a behaviours frame table into its bout list.
///
/// For each behaviour, bouts are the runs of `pred == 1`. Within each bout the
/// `actual` outcome and every user-defined outcome are reduced to their mode.
/// The collection covers `table.start()..table.stop()`.
pub fn frames_to_bouts(table: &FrameTable) -> Result<BoutCollection, ComputeError> {
    validate(table, &BEHAVIOURS_SCHEMA)?;

    let behaviour_pos = table.level_position(BEHAVIOURS)?;
    let outcome_pos = table.level_position(OUTCOMES)?;
    let mut collection = BoutCollection::new(table.start(), table.stop());

    for behaviour in table.level_values(BEHAVIOURS)? {
        let pred = table.values(&outcome_key(&behaviour, PRED))?;
        let actual = table.values(&outcome_key(&behaviour, ACTUAL))?;

        // Outcomes carried into `user_defined`
        let user_columns: Vec<(&str, &[f64])> = table
            .columns()
            .iter()
            .filter(|c| c.key.level(behaviour_pos) == Some(behaviour.as_str()))
            .filter_map(|c| {
                let outcome = c.key.level(outcome_pos)?;
                (!is_reserved_outcome(outcome)).then_some((outcome, c.values.as_slice()))
            })
            .collect();

        let spans = vector_to_bouts_from(&active_mask(pred), table.start());
        for span in &spans {
            let lo = (span.start - table.start()) as usize;
            let hi = (span.stop - table.start()) as usize;

            let user_defined = user_columns
                .iter()
                .map(|(outcome, values)| (outcome.to_string(), consensus(&values[lo..=hi])))
                .collect();

            collection.bouts.push(Bout {
                start: span.start,
                stop: span.stop,
                behaviour: behaviour.clone(),
                actual: consensus(&actual[lo..=hi]),
                user_defined,
            });
        }

        debug!(behaviour = %behaviour, bouts = spans.len(), "detected bouts");
    }

    Ok(collection)
}

/// Rebuild the behaviours frame table described by a bout collection.
///
/// Columns are the union, per behaviour, of `pred`, `actual` and every
/// user-defined outcome seen on that behaviour's bouts, sorted by key. Frames
/// outside every bout of a behaviour stay zero.
pub fn bouts_to_frames(collection: &BoutCollection) -> Result<FrameTable, ComputeError> {
    collection.validate()?;

    let mut outcomes: BTreeMap<&str, BTreeSet<&str>> = BTreeMap::new();
    for bout in &collection.bouts {
        if let Some(reserved) = bout.user_defined.keys().find(|k| is_reserved_outcome(k)) {
            return Err(ComputeError::InvalidBout(format!(
                "{} bout at {} uses reserved outcome '{}' as a user-defined outcome",
                bout.behaviour, bout.start, reserved
            )));
        }
        outcomes
            .entry(bout.behaviour.as_str())
            .or_insert_with(|| BTreeSet::from([PRED, ACTUAL]))
            .extend(bout.user_defined.keys().map(String::as_str));
    }

    let mut table = init_empty(collection.start..collection.stop, &BEHAVIOURS_SCHEMA);
    for (behaviour, names) in &outcomes {
        for outcome in names {
            table.insert_constant(outcome_key(behaviour, outcome), 0.0)?;
        }
    }

    for bout in &collection.bouts {
        let frames = bout.start..=bout.stop;
        table.fill(&outcome_key(&bout.behaviour, PRED), frames.clone(), 1.0)?;
        table.fill(
            &outcome_key(&bout.behaviour, ACTUAL),
            frames.clone(),
            bout.actual as f64,
        )?;
        for (outcome, value) in &bout.user_defined {
            table.fill(&outcome_key(&bout.behaviour, outcome), frames.clone(), *value as f64)?;
        }
    }

    debug!(
        behaviours = outcomes.len(),
        bouts = collection.bouts.len(),
        frames = table.len(),
        "rebuilt frame table"
    );

    Ok(table)
}

fn outcome_key(behaviour: &str, outcome: &str) -> ColumnKey {
    ColumnKey::new([behaviour, outcome])
}

/// Most frequent value of a coded run; ties go to the smallest value
fn consensus(values: &[f64]) -> i64 {
    let mut counts: BTreeMap<i64, usize> = BTreeMap::new();
    for v in values {
        *counts.entry(*v as i64).or_insert(0) += 1;
    }

    let mut best: Option<(i64, usize)> = None;
    let mut tied = false;
    for (value, count) in counts {
        // ascending iteration keeps the smallest value on ties
        match best {
            Some((_, c)) if count < c => {}
            Some((_, c)) if count == c => tied = true,
            _ => {
                best = Some((value, count));
                tied = false;
            }
        }
    }
    if tied {
        debug!(?best, "consensus tie resolved to the smallest value");
    }
    best.map(|(value, _)| value).unwrap_or(0)
}
