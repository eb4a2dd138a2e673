//! Table schema contracts
//!
//! Every tabular stage of the pipeline declares the shape of the tables it
//! exchanges: the row-index level names, the ordered column level names and
//! whether null cells are allowed. This module holds those declarations (one
//! static [`TableSchema`] per [`TableKind`]) and the single generic
//! validator that checks any [`Tabular`] value against them.

mod contract;
mod validate;

pub use contract::*;
pub use validate::*;
