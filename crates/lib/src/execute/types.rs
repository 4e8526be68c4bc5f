//! Types for target graph execution.
//!
//! This module defines the structural errors that stop a run before anything
//! executes, the per-target outcomes recorded while a plan runs, and the
//! execution plan and record themselves.

use std::fmt;
use std::time::Duration;

use thiserror::Error;

use crate::action::ActionError;
use crate::target::TargetName;

/// Structural errors in a target graph.
///
/// These are detected before any target body runs.
#[derive(Debug, Error)]
pub enum ExecuteError {
  /// The dependency relation contains a cycle.
  ///
  /// `cycle` lists the targets forming the loop, starting and ending with the
  /// same target.
  #[error("dependency cycle detected: {}", join_names(.cycle))]
  CyclicDependency { cycle: Vec<TargetName> },

  /// Requested target does not exist.
  #[error("target not found: {0}")]
  TargetNotFound(String),

  /// Two targets share a name.
  #[error("duplicate target: {0}")]
  DuplicateTarget(TargetName),

  /// A target depends on a target that was never declared.
  #[error("target {target} depends on unknown target {dependency}")]
  UnknownDependency { target: TargetName, dependency: TargetName },
}

fn join_names(names: &[TargetName]) -> String {
  names.iter().map(TargetName::as_str).collect::<Vec<_>>().join(" -> ")
}

/// Why a target failed.
#[derive(Debug, Error)]
pub enum TargetFailure {
  /// The guard could not be evaluated.
  #[error("guard evaluation failed: {0}")]
  Guard(#[source] ActionError),

  /// The body's action failed.
  #[error("{0}")]
  Action(#[source] ActionError),
}

impl TargetFailure {
  /// The underlying action error.
  pub fn action_error(&self) -> &ActionError {
    match self {
      TargetFailure::Guard(e) | TargetFailure::Action(e) => e,
    }
  }
}

/// Outcome of a single target within a run.
#[derive(Debug)]
pub enum TargetOutcome {
  /// The guard evaluated false; the body did not run.
  Skipped,
  /// The body ran and succeeded.
  Succeeded,
  /// The guard or body failed. The run stopped here.
  Failed(TargetFailure),
}

impl TargetOutcome {
  pub fn is_failed(&self) -> bool {
    matches!(self, TargetOutcome::Failed(_))
  }

  /// Short status label, used in summaries.
  pub fn label(&self) -> &'static str {
    match self {
      TargetOutcome::Skipped => "skipped",
      TargetOutcome::Succeeded => "succeeded",
      TargetOutcome::Failed(_) => "failed",
    }
  }
}

/// The dependency-resolved order in which target bodies run.
///
/// Contains no duplicates; every dependency precedes its dependents.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ExecutionPlan(pub Vec<TargetName>);

impl ExecutionPlan {
  pub fn targets(&self) -> &[TargetName] {
    &self.0
  }

  pub fn len(&self) -> usize {
    self.0.len()
  }

  pub fn is_empty(&self) -> bool {
    self.0.is_empty()
  }
}

impl fmt::Display for ExecutionPlan {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(&join_names(&self.0))
  }
}

/// Record of one target within a run.
#[derive(Debug)]
pub struct TargetRecord {
  pub name: TargetName,
  pub outcome: TargetOutcome,
  pub duration: Duration,
}

/// Result of running a plan.
///
/// Targets appear in the order they were processed. Targets after a failure
/// never ran and are absent.
#[derive(Debug, Default)]
pub struct ExecutionRecord {
  /// The plan this record was produced from.
  pub plan: ExecutionPlan,

  /// One entry per processed target, in plan order.
  pub records: Vec<TargetRecord>,
}

impl ExecutionRecord {
  pub fn new(plan: ExecutionPlan) -> Self {
    Self {
      plan,
      records: Vec::new(),
    }
  }

  pub(crate) fn push(&mut self, name: TargetName, outcome: TargetOutcome, duration: Duration) {
    self.records.push(TargetRecord {
      name,
      outcome,
      duration,
    });
  }

  /// Returns true if no target failed.
  pub fn is_success(&self) -> bool {
    self.failure().is_none()
  }

  pub fn get(&self, name: &str) -> Option<&TargetRecord> {
    self.records.iter().find(|r| r.name == name)
  }

  pub fn outcome(&self, name: &str) -> Option<&TargetOutcome> {
    self.get(name).map(|r| &r.outcome)
  }

  /// The failed target and its failure, if any.
  pub fn failure(&self) -> Option<(&TargetName, &TargetFailure)> {
    self.records.iter().find_map(|r| match &r.outcome {
      TargetOutcome::Failed(failure) => Some((&r.name, failure)),
      _ => None,
    })
  }

  pub fn succeeded(&self) -> impl Iterator<Item = &TargetName> {
    self
      .records
      .iter()
      .filter(|r| matches!(r.outcome, TargetOutcome::Succeeded))
      .map(|r| &r.name)
  }

  pub fn skipped(&self) -> impl Iterator<Item = &TargetName> {
    self
      .records
      .iter()
      .filter(|r| matches!(r.outcome, TargetOutcome::Skipped))
      .map(|r| &r.name)
  }

  /// Planned targets that never ran because an earlier target failed.
  pub fn not_run(&self) -> impl Iterator<Item = &TargetName> {
    self.plan.targets().iter().skip(self.records.len())
  }

  /// Total time spent across processed targets.
  pub fn total_duration(&self) -> Duration {
    self.records.iter().map(|r| r.duration).sum()
  }
}
