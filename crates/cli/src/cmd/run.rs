//! Implementation of the `keel run` command.
//!
//! Runs a target and its dependencies, then prints a per-target summary. A
//! failed target makes the command fail with that target's error.

use std::time::Instant;

use anyhow::{Context, Result, bail};
use owo_colors::{OwoColorize, Stream};
use serde::Serialize;

use keel_lib::execute::{ExecutionRecord, TargetFailure, TargetOutcome};

use super::Session;
use crate::output::{OutputFormat, format_duration, print_info, print_json, print_stat, print_success, symbols};

#[derive(Debug, Serialize)]
struct RunOutput<'a> {
  target: &'a str,
  version: &'a str,
  local_build: bool,
  success: bool,
  targets: Vec<TargetOutput<'a>>,
  not_run: Vec<&'a str>,
  target_duration_ms: u64,
  duration_ms: u64,
}

#[derive(Debug, Serialize)]
struct TargetOutput<'a> {
  name: &'a str,
  status: &'static str,
  duration_ms: u64,
  #[serde(skip_serializing_if = "Option::is_none")]
  error: Option<String>,
}

/// Execute the run command.
///
/// Structural problems (unknown target, dependency cycle) fail before any
/// target runs.
pub fn cmd_run(session: &Session, target: &str, output: OutputFormat) -> Result<()> {
  let start = Instant::now();

  if !output.is_json() {
    print_info(&format!("Running {} (version {})", target, session.config.version));
  }

  let record = session
    .graph
    .run(target)
    .with_context(|| format!("Failed to run target: {}", target))?;

  if output.is_json() {
    print_json(&RunOutput {
      target,
      version: &session.config.version,
      local_build: session.config.local_build,
      success: record.is_success(),
      targets: record
        .records
        .iter()
        .map(|r| TargetOutput {
          name: r.name.as_str(),
          status: r.outcome.label(),
          duration_ms: r.duration.as_millis() as u64,
          error: match &r.outcome {
            TargetOutcome::Failed(failure) => Some(failure.to_string()),
            _ => None,
          },
        })
        .collect(),
      not_run: record.not_run().map(|n| n.as_str()).collect(),
      target_duration_ms: record.total_duration().as_millis() as u64,
      duration_ms: start.elapsed().as_millis() as u64,
    })?;
  } else {
    print_summary(&record);
    println!();
    print_stat("Succeeded", &record.succeeded().count().to_string());
    print_stat("Skipped", &record.skipped().count().to_string());
    print_stat("Not run", &record.not_run().count().to_string());
    print_stat("Target time", &format_duration(record.total_duration()));
    print_stat("Duration", &format_duration(start.elapsed()));
  }

  if let Some((name, failure)) = record.failure() {
    let kind = match failure {
      TargetFailure::Guard(_) => "guard of target",
      TargetFailure::Action(_) => "target",
    };
    bail!("{} '{}' failed: {}", kind, name, failure.action_error());
  }

  if !output.is_json() {
    print_success("Build succeeded");
  }
  Ok(())
}

fn print_summary(record: &ExecutionRecord) {
  let width = record
    .records
    .iter()
    .map(|r| r.name.as_str().len())
    .max()
    .unwrap_or(0);

  println!();
  for r in &record.records {
    let symbol = match r.outcome {
      TargetOutcome::Succeeded => format!("{}", symbols::SUCCESS.if_supports_color(Stream::Stdout, |s| s.green())),
      TargetOutcome::Skipped => format!("{}", symbols::SKIPPED.if_supports_color(Stream::Stdout, |s| s.yellow())),
      TargetOutcome::Failed(_) => format!("{}", symbols::ERROR.if_supports_color(Stream::Stdout, |s| s.red())),
    };
    println!(
      "  {} {:<width$}  {:<9}  {}",
      symbol,
      r.name.as_str(),
      r.outcome.label(),
      format_duration(r.duration),
      width = width
    );
  }
  for name in record.not_run() {
    println!(
      "  {} {}",
      symbols::INFO.if_supports_color(Stream::Stdout, |s| s.dimmed()),
      name.as_str().if_supports_color(Stream::Stdout, |s| s.dimmed())
    );
  }
}
