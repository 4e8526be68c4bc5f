//! Target dependency graph.
//!
//! This module owns the declared targets and resolves a requested target into
//! an [`ExecutionPlan`] with a dependency-first traversal.

use std::collections::HashMap;

use petgraph::dot::{Config, Dot};
use petgraph::graph::DiGraph;
use tracing::debug;

use crate::target::{Target, TargetName};

use super::types::{ExecuteError, ExecutionPlan};

/// Traversal state of a target during resolution.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mark {
  Unvisited,
  InProgress,
  Done,
}

/// The declared targets of a pipeline and their dependency relation.
///
/// Construction checks that names are unique and every dependency is declared.
/// Cycles are reported when a plan is resolved, before anything runs.
pub struct TargetGraph {
  /// Targets in declaration order.
  targets: Vec<Target>,

  /// Map from target name to index in `targets`.
  index: HashMap<TargetName, usize>,
}

impl TargetGraph {
  /// Build a graph from declared targets.
  ///
  /// # Errors
  ///
  /// Returns `DuplicateTarget` if two targets share a name and
  /// `UnknownDependency` if a target depends on an undeclared target.
  pub fn new(targets: impl IntoIterator<Item = Target>) -> Result<Self, ExecuteError> {
    let targets: Vec<Target> = targets.into_iter().collect();
    let mut index = HashMap::with_capacity(targets.len());

    for (idx, target) in targets.iter().enumerate() {
      if index.insert(target.name().clone(), idx).is_some() {
        return Err(ExecuteError::DuplicateTarget(target.name().clone()));
      }
    }

    for target in &targets {
      for dep in target.dependencies() {
        if !index.contains_key(dep) {
          return Err(ExecuteError::UnknownDependency {
            target: target.name().clone(),
            dependency: dep.clone(),
          });
        }
      }
    }

    Ok(Self { targets, index })
  }

  /// Look up a target by name.
  pub fn get(&self, name: &str) -> Option<&Target> {
    self.index.get(&TargetName::from(name)).map(|&idx| &self.targets[idx])
  }

  /// All targets in declaration order.
  pub fn targets(&self) -> &[Target] {
    &self.targets
  }

  pub fn len(&self) -> usize {
    self.targets.len()
  }

  pub fn is_empty(&self) -> bool {
    self.targets.is_empty()
  }

  /// Resolve `requested` into an execution plan.
  ///
  /// Performs a post-order traversal: a target's dependencies are included in
  /// their declared order, then the target itself. A target already in the
  /// plan is not added again. The result is deterministic for a given graph.
  ///
  /// # Errors
  ///
  /// Returns `TargetNotFound` for an unknown target and `CyclicDependency` if
  /// the traversal reaches a target that is still being resolved.
  pub fn resolve(&self, requested: &str) -> Result<ExecutionPlan, ExecuteError> {
    let root = self.index_of(requested)?;

    let mut marks = vec![Mark::Unvisited; self.targets.len()];
    let mut stack = Vec::new();
    let mut order = Vec::new();
    self.visit(root, &mut marks, &mut stack, &mut order)?;

    let plan = ExecutionPlan(order.into_iter().map(|idx| self.targets[idx].name().clone()).collect());
    debug!(requested = %requested, plan = %plan, "resolved execution plan");
    Ok(plan)
  }

  /// Check the whole graph for cycles, not only the part reachable from one target.
  pub fn validate(&self) -> Result<(), ExecuteError> {
    let mut marks = vec![Mark::Unvisited; self.targets.len()];
    let mut stack = Vec::new();
    let mut order = Vec::new();
    for idx in 0..self.targets.len() {
      self.visit(idx, &mut marks, &mut stack, &mut order)?;
    }
    Ok(())
  }

  /// Targets that directly depend on `name`, in declaration order.
  pub fn dependents(&self, name: &str) -> Vec<&TargetName> {
    self
      .targets
      .iter()
      .filter(|t| t.dependencies().iter().any(|d| d == name))
      .map(Target::name)
      .collect()
  }

  /// Render the graph in Graphviz DOT format.
  ///
  /// Edges point from a target to each of its dependencies.
  pub fn to_dot(&self) -> String {
    let mut graph: DiGraph<&str, &str> = DiGraph::new();
    let nodes: Vec<_> = self.targets.iter().map(|t| graph.add_node(t.name().as_str())).collect();

    for (idx, target) in self.targets.iter().enumerate() {
      for dep in target.dependencies() {
        if let Some(&dep_idx) = self.index.get(dep) {
          graph.add_edge(nodes[idx], nodes[dep_idx], "");
        }
      }
    }

    format!("{}", Dot::with_config(&graph, &[Config::EdgeNoLabel]))
  }

  fn index_of(&self, name: &str) -> Result<usize, ExecuteError> {
    self
      .index
      .get(&TargetName::from(name))
      .copied()
      .ok_or_else(|| ExecuteError::TargetNotFound(name.to_string()))
  }

  fn visit(
    &self,
    idx: usize,
    marks: &mut [Mark],
    stack: &mut Vec<usize>,
    order: &mut Vec<usize>,
  ) -> Result<(), ExecuteError> {
    match marks[idx] {
      Mark::Done => return Ok(()),
      Mark::InProgress => {
        let start = stack.iter().position(|&i| i == idx).unwrap_or(0);
        let mut cycle: Vec<TargetName> = stack[start..]
          .iter()
          .map(|&i| self.targets[i].name().clone())
          .collect();
        cycle.push(self.targets[idx].name().clone());
        return Err(ExecuteError::CyclicDependency { cycle });
      }
      Mark::Unvisited => {}
    }

    marks[idx] = Mark::InProgress;
    stack.push(idx);

    let target = &self.targets[idx];
    for dep in target.dependencies() {
      let dep_idx = self.index.get(dep).copied().ok_or_else(|| ExecuteError::UnknownDependency {
        target: target.name().clone(),
        dependency: dep.clone(),
      })?;
      self.visit(dep_idx, marks, stack, order)?;
    }

    stack.pop();
    marks[idx] = Mark::Done;
    order.push(idx);
    Ok(())
  }
}

impl std::fmt::Debug for TargetGraph {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("TargetGraph").field("targets", &self.targets).finish()
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn names(plan: &ExecutionPlan) -> Vec<&str> {
    plan.targets().iter().map(TargetName::as_str).collect()
  }

  fn graph(edges: &[(&str, &[&str])]) -> TargetGraph {
    TargetGraph::new(edges.iter().map(|(name, deps)| {
      deps
        .iter()
        .fold(Target::new(*name), |target, dep| target.depends_on(*dep))
    }))
    .unwrap()
  }

  #[test]
  fn empty_graph() {
    let graph = TargetGraph::new(Vec::new()).unwrap();
    assert!(graph.is_empty());
    assert!(graph.validate().is_ok());
    assert!(matches!(graph.resolve("default"), Err(ExecuteError::TargetNotFound(_))));
  }

  #[test]
  fn single_target_no_deps() {
    let graph = graph(&[("clean", &[])]);
    let plan = graph.resolve("clean").unwrap();
    assert_eq!(names(&plan), vec!["clean"]);
  }

  #[test]
  fn linear_dependency_chain() {
    // c depends on b, b depends on a
    let graph = graph(&[("a", &[]), ("b", &["a"]), ("c", &["b"])]);

    let plan = graph.resolve("c").unwrap();
    assert_eq!(names(&plan), vec!["a", "b", "c"]);

    let plan = graph.resolve("b").unwrap();
    assert_eq!(names(&plan), vec!["a", "b"]);
  }

  #[test]
  fn diamond_dependency() {
    //     a
    //    / \
    //   b   c
    //    \ /
    //     d
    let graph = graph(&[("a", &[]), ("b", &["a"]), ("c", &["a"]), ("d", &["b", "c"])]);

    let plan = graph.resolve("d").unwrap();
    assert_eq!(names(&plan), vec!["a", "b", "c", "d"]);
  }

  #[test]
  fn dependencies_follow_declared_order() {
    let graph = graph(&[("x", &[]), ("y", &[]), ("z", &["y", "x"])]);
    let plan = graph.resolve("z").unwrap();
    assert_eq!(names(&plan), vec!["y", "x", "z"]);
  }

  #[test]
  fn unreachable_targets_are_not_planned() {
    let graph = graph(&[("a", &[]), ("b", &["a"]), ("other", &[])]);
    let plan = graph.resolve("b").unwrap();
    assert_eq!(names(&plan), vec!["a", "b"]);
  }

  #[test]
  fn two_target_cycle() {
    let graph = graph(&[("a", &["b"]), ("b", &["a"])]);

    match graph.resolve("a") {
      Err(ExecuteError::CyclicDependency { cycle }) => {
        let cycle: Vec<&str> = cycle.iter().map(TargetName::as_str).collect();
        assert_eq!(cycle, vec!["a", "b", "a"]);
      }
      other => panic!("expected cycle, got {:?}", other),
    }
  }

  #[test]
  fn self_cycle() {
    let graph = graph(&[("a", &["a"])]);
    assert!(matches!(graph.resolve("a"), Err(ExecuteError::CyclicDependency { .. })));
  }

  #[test]
  fn cycle_reports_only_loop_members() {
    // entry -> a -> b -> c -> a
    let graph = graph(&[("entry", &["a"]), ("a", &["b"]), ("b", &["c"]), ("c", &["a"])]);

    match graph.resolve("entry") {
      Err(ExecuteError::CyclicDependency { cycle }) => {
        let cycle: Vec<&str> = cycle.iter().map(TargetName::as_str).collect();
        assert_eq!(cycle, vec!["a", "b", "c", "a"]);
      }
      other => panic!("expected cycle, got {:?}", other),
    }
  }

  #[test]
  fn validate_finds_unreachable_cycle() {
    let graph = graph(&[("ok", &[]), ("a", &["b"]), ("b", &["a"])]);
    assert!(graph.resolve("ok").is_ok());
    assert!(matches!(graph.validate(), Err(ExecuteError::CyclicDependency { .. })));
  }

  #[test]
  fn duplicate_target_rejected() {
    let result = TargetGraph::new(vec![Target::new("a"), Target::new("a")]);
    assert!(matches!(result, Err(ExecuteError::DuplicateTarget(name)) if name == "a"));
  }

  #[test]
  fn unknown_dependency_rejected() {
    let result = TargetGraph::new(vec![Target::new("a").depends_on("missing")]);
    match result {
      Err(ExecuteError::UnknownDependency { target, dependency }) => {
        assert_eq!(target, "a");
        assert_eq!(dependency, "missing");
      }
      other => panic!("expected unknown dependency, got {:?}", other),
    }
  }

  #[test]
  fn resolve_is_deterministic() {
    let graph = graph(&[
      ("clean", &[]),
      ("restore", &["clean"]),
      ("compile", &["restore"]),
      ("pack", &["compile"]),
      ("verify", &["pack"]),
      ("default", &["verify", "pack", "compile"]),
    ]);

    let first = graph.resolve("default").unwrap();
    let second = graph.resolve("default").unwrap();
    assert_eq!(first, second);
  }

  #[test]
  fn dependents_lists_direct_dependents() {
    let graph = graph(&[("a", &[]), ("b", &["a"]), ("c", &["a"]), ("d", &["b"])]);
    let dependents: Vec<&str> = graph.dependents("a").into_iter().map(TargetName::as_str).collect();
    assert_eq!(dependents, vec!["b", "c"]);
  }

  #[test]
  fn dot_output_contains_edges() {
    let graph = graph(&[("a", &[]), ("b", &["a"])]);
    let dot = graph.to_dot();

    assert!(dot.starts_with("digraph"));
    assert!(dot.contains("label = \"a\""));
    assert!(dot.contains("1 -> 0"));
  }
}
