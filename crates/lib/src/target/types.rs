use std::fmt;

use serde::{Deserialize, Serialize};

use crate::action::{ActionError, Outcome};

/// A target body: runs the target's own work.
pub type Body = Box<dyn Fn() -> Outcome + Send + Sync>;

/// A target guard: decides whether the target's body runs.
///
/// Guards should be free of side effects. An `Err` means the guard itself
/// could not be evaluated and is treated as a failure of the target.
pub type Guard = Box<dyn Fn() -> Result<bool, ActionError> + Send + Sync>;

/// Name of a target. Unique within a graph.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TargetName(pub String);

impl TargetName {
  pub fn as_str(&self) -> &str {
    &self.0
  }
}

impl fmt::Display for TargetName {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(&self.0)
  }
}

impl From<&str> for TargetName {
  fn from(name: &str) -> Self {
    TargetName(name.to_string())
  }
}

impl From<String> for TargetName {
  fn from(name: String) -> Self {
    TargetName(name)
  }
}

impl PartialEq<str> for TargetName {
  fn eq(&self, other: &str) -> bool {
    self.0 == other
  }
}

impl PartialEq<&str> for TargetName {
  fn eq(&self, other: &&str) -> bool {
    self.0 == *other
  }
}

/// A named unit of build work.
///
/// Built with chained calls:
///
/// ```
/// use keel_lib::target::Target;
///
/// let publish = Target::new("publish")
///   .description("Copy packages to the local feed")
///   .depends_on("pack")
///   .only_when(|| true)
///   .executes(|| Ok(()));
///
/// assert_eq!(publish.dependencies().len(), 1);
/// ```
pub struct Target {
  name: TargetName,
  description: Option<String>,
  dependencies: Vec<TargetName>,
  guard: Option<Guard>,
  body: Option<Body>,
}

impl Target {
  pub fn new(name: impl Into<TargetName>) -> Self {
    Self {
      name: name.into(),
      description: None,
      dependencies: Vec::new(),
      guard: None,
      body: None,
    }
  }

  pub fn description(mut self, description: impl Into<String>) -> Self {
    self.description = Some(description.into());
    self
  }

  /// Declare a dependency. Dependencies run in declaration order.
  ///
  /// Declaring the same dependency twice has no additional effect.
  pub fn depends_on(mut self, name: impl Into<TargetName>) -> Self {
    let name = name.into();
    if !self.dependencies.contains(&name) {
      self.dependencies.push(name);
    }
    self
  }

  /// Only run this target's body when `predicate` returns true.
  pub fn only_when(mut self, predicate: impl Fn() -> bool + Send + Sync + 'static) -> Self {
    self.guard = Some(Box::new(move || -> Result<bool, ActionError> { Ok(predicate()) }));
    self
  }

  /// Like [`only_when`](Self::only_when), for predicates that can fail.
  pub fn only_when_try(mut self, predicate: impl Fn() -> Result<bool, ActionError> + Send + Sync + 'static) -> Self {
    self.guard = Some(Box::new(predicate));
    self
  }

  pub fn executes(mut self, body: impl Fn() -> Outcome + Send + Sync + 'static) -> Self {
    self.body = Some(Box::new(body));
    self
  }

  pub fn name(&self) -> &TargetName {
    &self.name
  }

  pub fn description_text(&self) -> Option<&str> {
    self.description.as_deref()
  }

  pub fn dependencies(&self) -> &[TargetName] {
    &self.dependencies
  }

  pub fn has_guard(&self) -> bool {
    self.guard.is_some()
  }

  pub fn has_body(&self) -> bool {
    self.body.is_some()
  }

  /// Evaluate the guard. A target without a guard always runs.
  pub fn evaluate_guard(&self) -> Result<bool, ActionError> {
    match &self.guard {
      Some(guard) => guard(),
      None => Ok(true),
    }
  }

  /// Run the body. A target without a body succeeds immediately.
  pub fn execute(&self) -> Outcome {
    match &self.body {
      Some(body) => body(),
      None => Ok(()),
    }
  }
}

impl fmt::Debug for Target {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("Target")
      .field("name", &self.name)
      .field("dependencies", &self.dependencies)
      .field("guard", &self.guard.is_some())
      .field("body", &self.body.is_some())
      .finish()
  }
}
