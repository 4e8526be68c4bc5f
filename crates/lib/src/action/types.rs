//! Types shared by all actions.
//!
//! This module defines the outcome type every action reports and the error
//! type carried by a failed outcome.

use std::path::PathBuf;

use thiserror::Error;

use crate::sign::SigningAttempt;

/// The result of running a single action.
pub type Outcome = Result<(), ActionError>;

/// Errors that can occur while running an action.
#[derive(Debug, Error)]
pub enum ActionError {
  /// External command exited unsuccessfully.
  #[error("command failed with exit code {code:?}: {program}")]
  CmdFailed { program: String, code: Option<i32> },

  /// I/O error during execution.
  #[error("io error: {0}")]
  Io(#[from] std::io::Error),

  /// Directory traversal failed.
  #[error("walk error: {0}")]
  Walk(#[from] walkdir::Error),

  /// A file the action needs does not exist.
  #[error("file not found: {}", .0.display())]
  FileNotFound(PathBuf),

  /// No action is registered under the requested name.
  #[error("action not registered: {0}")]
  NotRegistered(String),

  /// Signing was requested with an empty endpoint list.
  #[error("no timestamp endpoints configured")]
  NoTimestampEndpoints,

  /// Signing found no files to sign.
  #[error("no files matching {pattern} under {}", root.display())]
  NothingToSign { root: PathBuf, pattern: String },

  /// Every timestamp endpoint was tried and failed.
  ///
  /// `last` is the error from the final endpoint and is the operative error.
  /// `attempts` keeps every endpoint tried, in order, for diagnostics.
  #[error("all {count} timestamp endpoints failed, last error: {last}", count = .attempts.len())]
  AllEndpointsExhausted {
    attempts: Vec<SigningAttempt>,
    last: Box<ActionError>,
  },

  /// Free-form failure reported by a closure action or guard.
  #[error("{0}")]
  Failed(String),
}

impl ActionError {
  /// Create a free-form failure.
  pub fn failed(message: impl Into<String>) -> Self {
    ActionError::Failed(message.into())
  }
}
