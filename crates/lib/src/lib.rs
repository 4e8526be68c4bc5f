//! keel-lib: Core types and logic for keel
//!
//! This crate provides the pieces a build orchestration run is made of:
//! - `Target`: a named unit of work with dependencies, an optional guard and a body
//! - `TargetGraph`: resolves a requested target into an execution plan and runs it
//! - `ActionRegistry`: named external operations (compile, test, pack, sign, copy)
//! - `sign`: code signing with fallback across timestamp endpoints
//! - `pipeline`: the concrete target graph for a build

pub mod action;
pub mod config;
pub mod execute;
pub mod pipeline;
pub mod sign;
pub mod target;

#[cfg(test)]
mod util;
