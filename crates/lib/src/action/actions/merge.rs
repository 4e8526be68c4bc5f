//! Assembly merging.
//!
//! Merges the assemblies of a project's build output into a single assembly
//! per target framework, then swaps the merged directory in place of the
//! original output so later packing picks it up unchanged.

use std::fs;
use std::path::{Path, PathBuf};

use glob_match::glob_match;
use tracing::{debug, info};

use crate::action::{Action, ActionError, Outcome};

use super::cmd::execute_cmd;

/// Merge a project's assemblies for each target framework.
///
/// For every framework `fw` the input is `bin_dir/fw` and the merged result
/// is written to `bin_dir/{fw}Merged`, which then replaces the input.
#[derive(Debug, Clone)]
pub struct MergeAssemblies {
  /// Merge tool executable.
  pub tool: PathBuf,

  /// Build output directory containing one subdirectory per framework.
  pub bin_dir: PathBuf,

  pub frameworks: Vec<String>,

  /// File name patterns of the assemblies to merge, matched case-insensitively.
  pub patterns: Vec<String>,

  /// Assembly that must come first on the command line.
  pub primary: String,

  /// File name of the merged assembly.
  pub output_name: String,
}

impl MergeAssemblies {
  fn merge_framework(&self, framework: &str) -> Outcome {
    let input = self.bin_dir.join(framework);
    let output = self.bin_dir.join(format!("{}Merged", framework));

    if !input.is_dir() {
      return Err(ActionError::FileNotFound(input));
    }
    fs::create_dir_all(&output)?;

    let assemblies = order_assemblies(collect_assemblies(&input, &self.patterns)?, &self.primary);
    if assemblies.is_empty() {
      return Err(ActionError::failed(format!(
        "no assemblies to merge in {}",
        input.display()
      )));
    }

    info!(framework = %framework, count = assemblies.len(), "merging assemblies");
    let args = merge_args(&output.join(&self.output_name), &input, &assemblies);
    execute_cmd(&self.tool.to_string_lossy(), &args, None, None)?;

    fs::remove_dir_all(&input)?;
    fs::rename(&output, &input)?;
    debug!(from = %output.display(), to = %input.display(), "moved merged output");
    Ok(())
  }
}

impl Action for MergeAssemblies {
  fn execute(&self) -> Outcome {
    for framework in &self.frameworks {
      self.merge_framework(framework)?;
    }
    Ok(())
  }
}

/// Files directly inside `dir` whose name matches any of `patterns`.
fn collect_assemblies(dir: &Path, patterns: &[String]) -> Result<Vec<PathBuf>, ActionError> {
  let patterns: Vec<String> = patterns.iter().map(|p| p.to_lowercase()).collect();
  let mut found = Vec::new();

  for entry in fs::read_dir(dir)? {
    let entry = entry?;
    if !entry.file_type()?.is_file() {
      continue;
    }
    let name = entry.file_name().to_string_lossy().to_lowercase();
    if patterns.iter().any(|p| glob_match(p, &name)) {
      found.push(entry.path());
    }
  }

  Ok(found)
}

/// Order assemblies for the merge tool: the primary assembly first, then the
/// rest sorted by path.
pub fn order_assemblies(mut assemblies: Vec<PathBuf>, primary: &str) -> Vec<PathBuf> {
  let is_primary = |path: &PathBuf| {
    path
      .file_name()
      .is_some_and(|name| name.to_string_lossy().eq_ignore_ascii_case(primary))
  };
  assemblies.sort_by(|a, b| is_primary(b).cmp(&is_primary(a)).then_with(|| a.cmp(b)));
  assemblies
}

fn merge_args(out: &Path, lib: &Path, assemblies: &[PathBuf]) -> Vec<String> {
  let mut args = vec![
    format!("/out:{}", out.display()),
    "/internalize".to_string(),
    "/xmldocs".to_string(),
    format!("/lib:{}", lib.display()),
  ];
  args.extend(assemblies.iter().map(|a| a.display().to_string()));
  args
}
