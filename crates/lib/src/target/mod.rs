//! Build targets.
//!
//! A target is a named unit of work: an ordered list of dependency names, an
//! optional guard deciding whether its own body runs, and an optional body.
//! Targets are declared once when the pipeline is defined and are never
//! mutated afterwards. See [`crate::execute`] for how they are ordered and run.

mod types;

pub use types::*;
