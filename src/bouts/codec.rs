//! Run-length codec for activity vectors
//!
//! This is the single definition of what counts as a bout: a maximal run of
//! consecutive active values.

use serde::{Deserialize, Serialize};

/// One contiguous run of active values
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoutSpan {
    /// First active index (inclusive)
    pub start: i64,
    /// Last active index (inclusive)
    pub stop: i64,
    /// Number of active values, `stop - start + 1`
    #[serde(rename = "dur")]
    pub duration: i64,
}

/// Runs of a positional activity vector, indexed from 0.
///
/// ```
/// use ethoframe::bouts::{vector_to_bouts, BoutSpan};
///
/// let spans = vector_to_bouts(&[true, true, false, true]);
/// assert_eq!(spans[0], BoutSpan { start: 0, stop: 1, duration: 2 });
/// assert_eq!(spans[1], BoutSpan { start: 3, stop: 3, duration: 1 });
/// ```
pub fn vector_to_bouts(vector: &[bool]) -> Vec<BoutSpan> {
    vector_to_bouts_from(vector, 0)
}

/// Runs of an activity vector whose first element sits at index `offset`.
///
/// The vector is padded with an inactive value on both ends, so runs touching
/// either edge are closed without special cases. Run starts are the 0→1
/// transitions, run stops the 1→0 transitions shifted back by one, and the
/// i-th start pairs with the i-th stop.
pub fn vector_to_bouts_from(vector: &[bool], offset: i64) -> Vec<BoutSpan> {
    let mut padded = Vec::with_capacity(vector.len() + 2);
    padded.push(false);
    padded.extend_from_slice(vector);
    padded.push(false);

    let mut starts: Vec<i64> = Vec::new();
    let mut stops: Vec<i64> = Vec::new();
    for (i, pair) in padded.windows(2).enumerate() {
        match (pair[0], pair[1]) {
            (false, true) => starts.push(i as i64),
            (true, false) => stops.push(i as i64 - 1),
            _ => {}
        }
    }

    starts
        .into_iter()
        .zip(stops)
        .map(|(start, stop)| BoutSpan {
            start: start + offset,
            stop: stop + offset,
            duration: stop - start + 1,
        })
        .collect()
}

/// Activity mask of a coded column: a cell is active when it equals 1
pub fn active_mask(values: &[f64]) -> Vec<bool> {
    values.iter().map(|v| *v == 1.0).collect()
}
