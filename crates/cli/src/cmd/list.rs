//! Implementation of the `keel list` command.

use anyhow::{Context, Result};
use owo_colors::{OwoColorize, Stream};
use serde::Serialize;

use super::Session;
use crate::output::{OutputFormat, print_json, symbols};

#[derive(Debug, Serialize)]
struct TargetItem<'a> {
  name: &'a str,
  #[serde(skip_serializing_if = "Option::is_none")]
  description: Option<&'a str>,
  depends_on: Vec<&'a str>,
  required_by: Vec<&'a str>,
  conditional: bool,
  aggregate: bool,
}

/// List every target in declaration order.
///
/// The whole graph is checked for cycles first.
pub fn cmd_list(session: &Session, output: OutputFormat) -> Result<()> {
  session.graph.validate().context("Invalid target graph")?;

  let items: Vec<TargetItem> = session
    .graph
    .targets()
    .iter()
    .map(|t| TargetItem {
      name: t.name().as_str(),
      description: t.description_text(),
      depends_on: t.dependencies().iter().map(|d| d.as_str()).collect(),
      required_by: session
        .graph
        .dependents(t.name().as_str())
        .into_iter()
        .map(|d| d.as_str())
        .collect(),
      conditional: t.has_guard(),
      aggregate: !t.has_body(),
    })
    .collect();

  if output.is_json() {
    return print_json(&items);
  }

  for item in &items {
    let marker = match (item.conditional, item.aggregate) {
      (true, _) => " (conditional)",
      (false, true) => " (aggregate)",
      (false, false) => "",
    };
    println!(
      "{}{}",
      item.name.if_supports_color(Stream::Stdout, |s| s.bold()),
      marker.if_supports_color(Stream::Stdout, |s| s.yellow())
    );
    if let Some(description) = item.description {
      println!("    {}", description.if_supports_color(Stream::Stdout, |s| s.dimmed()));
    }
    if !item.depends_on.is_empty() {
      println!("    {} {}", symbols::ARROW, item.depends_on.join(", "));
    }
    if !item.required_by.is_empty() {
      println!(
        "    {} {}",
        "required by:".if_supports_color(Stream::Stdout, |s| s.dimmed()),
        item.required_by.join(", ")
      );
    }
  }

  Ok(())
}
