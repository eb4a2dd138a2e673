//! Bout event-list types
//!
//! The canonical JSON form is
//! `{start, stop, bouts: [{start, stop, behaviour, actual, user_defined: {k: v}}]}`.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::error::ComputeError;

/// One contiguous run of a behaviour being predicted active
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bout {
    /// First frame of the bout (inclusive)
    pub start: i64,
    /// Last frame of the bout (inclusive)
    pub stop: i64,
    /// Behaviour name
    pub behaviour: String,
    /// Consensus `actual` value over the bout (1, 0, or -1 for undecided)
    pub actual: i64,
    /// Consensus value per user-defined outcome
    #[serde(default)]
    pub user_defined: BTreeMap<String, i64>,
}

impl Bout {
    /// Number of frames in the bout
    pub fn duration(&self) -> i64 {
        self.stop - self.start + 1
    }
}

/// Bouts describing the half-open frame range `start..stop`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoutCollection {
    /// First frame described (inclusive)
    pub start: i64,
    /// One past the last frame described (exclusive)
    pub stop: i64,
    #[serde(default)]
    pub bouts: Vec<Bout>,
}

impl BoutCollection {
    pub fn new(start: i64, stop: i64) -> Self {
        Self {
            start,
            stop,
            bouts: Vec::new(),
        }
    }

    /// Parse the canonical JSON form
    pub fn from_json(json: &str) -> Result<Self, ComputeError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn to_json(&self) -> Result<String, ComputeError> {
        Ok(serde_json::to_string(self)?)
    }

    /// Bouts of one behaviour, in collection order
    pub fn for_behaviour<'a>(&'a self, behaviour: &'a str) -> impl Iterator<Item = &'a Bout> + 'a {
        self.bouts.iter().filter(move |b| b.behaviour == behaviour)
    }

    /// Distinct behaviours, in order of first appearance
    pub fn behaviours(&self) -> Vec<&str> {
        let mut seen: Vec<&str> = Vec::new();
        for bout in &self.bouts {
            if !seen.contains(&bout.behaviour.as_str()) {
                seen.push(&bout.behaviour);
            }
        }
        seen
    }

    /// Check the collection range and that every bout lies inside it
    pub fn validate(&self) -> Result<(), ComputeError> {
        if self.start < 0 {
            return Err(ComputeError::OutOfRange(format!(
                "collection start {} is negative",
                self.start
            )));
        }
        if self.start > self.stop {
            return Err(ComputeError::OutOfRange(format!(
                "collection start {} is after stop {}",
                self.start, self.stop
            )));
        }
        for bout in &self.bouts {
            if bout.start > bout.stop {
                return Err(ComputeError::OutOfRange(format!(
                    "{} bout start {} is after its stop {}",
                    bout.behaviour, bout.start, bout.stop
                )));
            }
            if bout.start < self.start || bout.stop >= self.stop {
                return Err(ComputeError::OutOfRange(format!(
                    "{} bout {}..={} lies outside the collection range {}..{}",
                    bout.behaviour, bout.start, bout.stop, self.start, self.stop
                )));
            }
        }
        Ok(())
    }
}
