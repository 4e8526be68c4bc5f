//! Cmd action implementation.
//!
//! Runs an external program to completion and maps its exit status onto an
//! action outcome.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::process::Command;

use tracing::{debug, info};

use crate::action::{Action, ActionError, Outcome};

/// Execute an external program.
///
/// The program inherits the current environment, with `env` merged on top.
///
/// # Arguments
///
/// * `program` - The program to run (resolved through `PATH` if not a path)
/// * `args` - Arguments passed verbatim, without a shell
/// * `env` - Optional extra environment variables
/// * `cwd` - Optional working directory (defaults to the current directory)
///
/// # Returns
///
/// The stdout of the command on success (trimmed).
pub fn execute_cmd(
  program: &str,
  args: &[String],
  env: Option<&BTreeMap<String, String>>,
  cwd: Option<&Path>,
) -> Result<String, ActionError> {
  execute_cmd_redacted(program, args, &[], env, cwd)
}

/// Execute an external program, masking `secrets` wherever they appear in
/// the logged arguments and output.
///
/// The program itself receives the arguments unchanged.
pub fn execute_cmd_redacted(
  program: &str,
  args: &[String],
  secrets: &[&str],
  env: Option<&BTreeMap<String, String>>,
  cwd: Option<&Path>,
) -> Result<String, ActionError> {
  info!(program = %program, args = ?redact(args, secrets), "executing command");

  let mut command = Command::new(program);
  command.args(args);

  if let Some(cwd) = cwd {
    command.current_dir(cwd);
  }

  if let Some(user_env) = env {
    for (key, value) in user_env {
      command.env(key, value);
    }
  }

  let output = command.output()?;

  if !output.status.success() {
    let stderr = String::from_utf8_lossy(&output.stderr);
    let stdout = String::from_utf8_lossy(&output.stdout);

    // Log output for debugging
    if !stderr.is_empty() {
      debug!(stderr = %mask(&stderr, secrets), "command stderr");
    }
    if !stdout.is_empty() {
      debug!(stdout = %mask(&stdout, secrets), "command stdout");
    }

    return Err(ActionError::CmdFailed {
      program: program.to_string(),
      code: output.status.code(),
    });
  }

  let stdout = String::from_utf8_lossy(&output.stdout).trim().to_string();

  if !stdout.is_empty() {
    debug!(stdout = %mask(&stdout, secrets), "command output");
  }

  Ok(stdout)
}

/// Mask for redacted values in logged arguments.
pub const REDACTED: &str = "********";

fn mask(text: &str, secrets: &[&str]) -> String {
  secrets
    .iter()
    .filter(|s| !s.is_empty())
    .fold(text.to_string(), |text, secret| text.replace(secret, REDACTED))
}

fn redact(args: &[String], secrets: &[&str]) -> Vec<String> {
  args.iter().map(|arg| mask(arg, secrets)).collect()
}

/// An external program invocation, built up front and run as an action.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CmdAction {
  pub program: String,
  pub args: Vec<String>,
  pub env: BTreeMap<String, String>,
  pub cwd: Option<PathBuf>,
}

impl CmdAction {
  pub fn new(program: impl Into<String>) -> Self {
    Self {
      program: program.into(),
      args: Vec::new(),
      env: BTreeMap::new(),
      cwd: None,
    }
  }

  pub fn arg(mut self, arg: impl Into<String>) -> Self {
    self.args.push(arg.into());
    self
  }

  pub fn args<I, S>(mut self, args: I) -> Self
  where
    I: IntoIterator<Item = S>,
    S: Into<String>,
  {
    self.args.extend(args.into_iter().map(Into::into));
    self
  }

  pub fn env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
    self.env.insert(key.into(), value.into());
    self
  }

  pub fn current_dir(mut self, cwd: impl Into<PathBuf>) -> Self {
    self.cwd = Some(cwd.into());
    self
  }
}

impl Action for CmdAction {
  fn execute(&self) -> Outcome {
    let env = (!self.env.is_empty()).then_some(&self.env);
    execute_cmd(&self.program, &self.args, env, self.cwd.as_deref()).map(|_| ())
  }
}
