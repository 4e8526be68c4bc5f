//! Target graph execution.
//!
//! This module provides the entry points for running a requested target.
//! It handles:
//! - Dependency-first resolution into an execution plan
//! - Cycle detection before any body runs
//! - Guard evaluation, skipping guarded targets whose guard is false
//! - Fail-fast: the first failing target halts the remaining plan
//!
//! Execution is strictly sequential, in plan order, on the calling thread.

pub mod dag;
pub mod types;

use std::time::Instant;

use tracing::{error, info, info_span};

pub use dag::TargetGraph;
pub use types::{ExecuteError, ExecutionPlan, ExecutionRecord, TargetFailure, TargetOutcome, TargetRecord};

impl TargetGraph {
  /// Run `requested` and everything it depends on.
  ///
  /// The plan is resolved first; structural problems (unknown target, cycle)
  /// are returned as `Err` before any body executes. Every planned target is
  /// then processed in order:
  /// 1. Its guard is evaluated once. `false` records `Skipped` and the body
  ///    does not run. Dependencies have already run as part of the plan.
  /// 2. Otherwise its body runs, recording `Succeeded` or `Failed`.
  /// 3. A guard error or body failure records `Failed` and stops the run.
  ///
  /// There is no retry at the target level.
  pub fn run(&self, requested: &str) -> Result<ExecutionRecord, ExecuteError> {
    let plan = self.resolve(requested)?;

    info!(requested = %requested, target_count = plan.len(), "starting run");

    let mut record = ExecutionRecord::new(plan.clone());

    for name in plan.targets() {
      let Some(target) = self.get(name.as_str()) else {
        return Err(ExecuteError::TargetNotFound(name.to_string()));
      };

      let _span = info_span!("target", name = %name).entered();
      let started = Instant::now();

      let outcome = match target.evaluate_guard() {
        Ok(false) => {
          info!("skipping target, guard evaluated false");
          TargetOutcome::Skipped
        }
        Err(e) => {
          error!(error = %e, "guard evaluation failed");
          TargetOutcome::Failed(TargetFailure::Guard(e))
        }
        Ok(true) => {
          info!("running target");
          match target.execute() {
            Ok(()) => {
              info!(elapsed_ms = started.elapsed().as_millis() as u64, "target succeeded");
              TargetOutcome::Succeeded
            }
            Err(e) => {
              error!(error = %e, "target failed");
              TargetOutcome::Failed(TargetFailure::Action(e))
            }
          }
        }
      };

      let failed = outcome.is_failed();
      record.push(name.clone(), outcome, started.elapsed());

      if failed {
        break;
      }
    }

    info!(
      succeeded = record.succeeded().count(),
      skipped = record.skipped().count(),
      failed = !record.is_success(),
      not_run = record.not_run().count(),
      "run complete"
    );

    Ok(record)
  }
}
