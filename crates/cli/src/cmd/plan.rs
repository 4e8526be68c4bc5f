//! Implementation of the `keel plan` command.

use anyhow::{Context, Result};
use serde::Serialize;

use super::Session;
use crate::output::{OutputFormat, print_info, print_json};

#[derive(Debug, Serialize)]
struct PlanOutput<'a> {
  target: &'a str,
  plan: Vec<&'a str>,
}

/// Print the order in which `target` and its dependencies would run.
pub fn cmd_plan(session: &Session, target: &str, output: OutputFormat) -> Result<()> {
  let plan = session
    .graph
    .resolve(target)
    .with_context(|| format!("Failed to resolve target: {}", target))?;

  if output.is_json() {
    print_json(&PlanOutput {
      target,
      plan: plan.targets().iter().map(|n| n.as_str()).collect(),
    })?;
    return Ok(());
  }

  for (idx, name) in plan.targets().iter().enumerate() {
    let guarded = session.graph.get(name.as_str()).is_some_and(|t| t.has_guard());
    let marker = if guarded { " (conditional)" } else { "" };
    println!("{:>3}. {}{}", idx + 1, name, marker);
  }
  print_info(&format!("{} target(s)", plan.len()));

  Ok(())
}
