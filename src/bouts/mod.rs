//! Bout/frame duality
//!
//! A bout is a maximal run of consecutive frames where a behaviour's `pred`
//! outcome is 1. This module converts between the dense frame table and the
//! sparse bout list.
//!
//! Pipeline: activity vector → codec (runs) → converter (per-behaviour bouts
//! with consensus outcomes) → BoutCollection JSON, and back.

pub mod codec;
pub mod convert;
pub mod types;

pub use codec::{active_mask, vector_to_bouts, vector_to_bouts_from, BoutSpan};
pub use convert::{bouts_to_frames, frames_to_bouts};
pub use types::{Bout, BoutCollection};
