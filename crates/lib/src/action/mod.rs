//! External action execution.
//!
//! Actions are the side-effecting operations a target body performs, such as
//! running the compiler, packing a package or signing binaries. Every action
//! reports an [`Outcome`]: success, or failure with an [`ActionError`].
//!
//! # Registry
//!
//! The [`ActionRegistry`] names actions so target bodies can refer to them
//! without knowing how they are implemented. The pipeline binds target bodies
//! to registry entries with [`ActionRegistry::runner`].
//!
//! See [`actions`] for the concrete implementations and [`standard`] for the
//! registry used by the build pipeline.

pub mod actions;
pub mod standard;
mod types;

pub use types::*;

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Instant;

use tracing::{debug, error, info};

use crate::target::Body;

/// A side-effecting operation that reports success or failure.
///
/// Implementations capture everything they need at construction time; running
/// an action takes no input.
pub trait Action: Send + Sync {
  /// Run the action to completion.
  fn execute(&self) -> Outcome;
}

impl<F> Action for F
where
  F: Fn() -> Outcome + Send + Sync,
{
  fn execute(&self) -> Outcome {
    self()
  }
}

/// Named collection of actions.
#[derive(Default)]
pub struct ActionRegistry {
  actions: BTreeMap<String, Arc<dyn Action>>,
}

impl ActionRegistry {
  pub fn new() -> Self {
    Self::default()
  }

  /// Register an action under a name, replacing any previous entry.
  pub fn register(&mut self, name: impl Into<String>, action: impl Action + 'static) -> &mut Self {
    self.actions.insert(name.into(), Arc::new(action));
    self
  }

  /// Check whether an action is registered under `name`.
  pub fn contains(&self, name: &str) -> bool {
    self.actions.contains_key(name)
  }

  /// Registered action names, sorted.
  pub fn names(&self) -> impl Iterator<Item = &str> {
    self.actions.keys().map(String::as_str)
  }

  pub fn len(&self) -> usize {
    self.actions.len()
  }

  pub fn is_empty(&self) -> bool {
    self.actions.is_empty()
  }

  /// Run the action registered under `name`.
  ///
  /// # Errors
  ///
  /// Returns `NotRegistered` if no such action exists, otherwise whatever the
  /// action itself reports.
  pub fn run(&self, name: &str) -> Outcome {
    let action = self
      .actions
      .get(name)
      .ok_or_else(|| ActionError::NotRegistered(name.to_string()))?;

    info!(action = %name, "running action");
    let started = Instant::now();
    let result = action.execute();
    let elapsed_ms = started.elapsed().as_millis() as u64;

    match &result {
      Ok(()) => debug!(action = %name, elapsed_ms, "action succeeded"),
      Err(e) => error!(action = %name, elapsed_ms, error = %e, "action failed"),
    }

    result
  }

  /// Create a target body that runs the named actions in order.
  ///
  /// The first failing action stops the sequence. Names are looked up when the
  /// body runs, so a missing action surfaces as a `NotRegistered` failure of
  /// the target rather than an error while defining the pipeline.
  pub fn runner<'a>(self: &Arc<Self>, names: impl IntoIterator<Item = &'a str>) -> Body {
    let registry = Arc::clone(self);
    let names: Vec<String> = names.into_iter().map(str::to_string).collect();
    Box::new(move || -> Outcome {
      for name in &names {
        registry.run(name)?;
      }
      Ok(())
    })
  }
}

impl std::fmt::Debug for ActionRegistry {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("ActionRegistry")
      .field("actions", &self.actions.keys().collect::<Vec<_>>())
      .finish()
  }
}

#[cfg(test)]
mod tests {
  use std::sync::Mutex;

  use super::*;

  fn recording(log: &Arc<Mutex<Vec<String>>>, name: &str, fail: bool) -> Body {
    let log = Arc::clone(log);
    let name = name.to_string();
    Box::new(move || -> Outcome {
      log.lock().unwrap().push(name.clone());
      if fail {
        Err(ActionError::failed(format!("{} broke", name)))
      } else {
        Ok(())
      }
    })
  }

  #[test]
  fn run_registered_action() {
    let log = Arc::new(Mutex::new(Vec::new()));
    let mut registry = ActionRegistry::new();
    registry.register("compile", recording(&log, "compile", false));

    assert!(registry.contains("compile"));
    registry.run("compile").unwrap();
    assert_eq!(*log.lock().unwrap(), vec!["compile"]);
  }

  #[test]
  fn run_unknown_action_fails() {
    let registry = ActionRegistry::new();
    let err = registry.run("pack").unwrap_err();
    assert!(matches!(err, ActionError::NotRegistered(name) if name == "pack"));
  }

  #[test]
  fn register_replaces_existing() {
    let log = Arc::new(Mutex::new(Vec::new()));
    let mut registry = ActionRegistry::new();
    registry
      .register("test", recording(&log, "first", false))
      .register("test", recording(&log, "second", false));

    assert_eq!(registry.len(), 1);
    registry.run("test").unwrap();
    assert_eq!(*log.lock().unwrap(), vec!["second"]);
  }

  #[test]
  fn names_are_sorted() {
    let mut registry = ActionRegistry::new();
    registry.register("sign", || -> Outcome { Ok(()) });
    registry.register("clean", || -> Outcome { Ok(()) });
    registry.register("pack", || -> Outcome { Ok(()) });

    assert_eq!(registry.names().collect::<Vec<_>>(), vec!["clean", "pack", "sign"]);
  }

  #[test]
  fn runner_runs_in_order() {
    let log = Arc::new(Mutex::new(Vec::new()));
    let mut registry = ActionRegistry::new();
    registry.register("sign", recording(&log, "sign", false));
    registry.register("pack", recording(&log, "pack", false));
    let registry = Arc::new(registry);

    let body = registry.runner(["sign", "pack"]);
    body().unwrap();

    assert_eq!(*log.lock().unwrap(), vec!["sign", "pack"]);
  }

  #[test]
  fn runner_stops_at_first_failure() {
    let log = Arc::new(Mutex::new(Vec::new()));
    let mut registry = ActionRegistry::new();
    registry.register("sign", recording(&log, "sign", true));
    registry.register("pack", recording(&log, "pack", false));
    let registry = Arc::new(registry);

    let body = registry.runner(["sign", "pack"]);
    let err = body().unwrap_err();

    assert_eq!(err.to_string(), "sign broke");
    assert_eq!(*log.lock().unwrap(), vec!["sign"]);
  }

  #[test]
  fn runner_reports_missing_action_when_run() {
    let registry = Arc::new(ActionRegistry::new());
    let body = registry.runner(["merge"]);

    assert!(matches!(body(), Err(ActionError::NotRegistered(_))));
  }
}
