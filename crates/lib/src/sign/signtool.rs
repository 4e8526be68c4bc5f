//! Signing through the external sign tool.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::info;

use crate::action::actions::{REDACTED, execute_cmd_redacted, find_files};
use crate::action::{Action, ActionError, Outcome};

use super::{Signer, sign_with_fallback};

/// Signs files by invoking the sign tool with an RFC 3161 timestamp server.
///
/// The certificate password is passed to the tool but never logged.
#[derive(Clone)]
pub struct SignToolSigner {
  pub tool: PathBuf,
  pub certificate: PathBuf,
  pub password: Option<String>,
  pub digest: String,
  pub description: Option<String>,
  pub url: Option<String>,
}

impl SignToolSigner {
  /// Command-line arguments for signing `files` against `endpoint`.
  pub fn args(&self, files: &[PathBuf], endpoint: &str) -> Vec<String> {
    let mut args = vec![
      "sign".to_string(),
      "/f".to_string(),
      self.certificate.display().to_string(),
    ];
    if let Some(password) = &self.password {
      args.extend(["/p".to_string(), password.clone()]);
    }
    if let Some(description) = &self.description {
      args.extend(["/d".to_string(), description.clone()]);
    }
    if let Some(url) = &self.url {
      args.extend(["/du".to_string(), url.clone()]);
    }
    args.extend([
      "/tr".to_string(),
      endpoint.to_string(),
      "/td".to_string(),
      self.digest.clone(),
    ]);
    args.extend(files.iter().map(|f| f.display().to_string()));
    args
  }
}

impl Signer for SignToolSigner {
  fn sign(&self, files: &[PathBuf], endpoint: &str) -> Result<(), ActionError> {
    if !self.certificate.exists() {
      return Err(ActionError::FileNotFound(self.certificate.clone()));
    }
    let secrets: Vec<&str> = self.password.as_deref().into_iter().collect();
    execute_cmd_redacted(&self.tool.to_string_lossy(), &self.args(files, endpoint), &secrets, None, None).map(|_| ())
  }
}

impl std::fmt::Debug for SignToolSigner {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("SignToolSigner")
      .field("tool", &self.tool)
      .field("certificate", &self.certificate)
      .field("password", &self.password.as_ref().map(|_| REDACTED))
      .field("digest", &self.digest)
      .field("description", &self.description)
      .field("url", &self.url)
      .finish()
  }
}

/// Sign every file under `root` matching `pattern`, falling back across
/// timestamp endpoints.
pub struct SignFiles {
  pub root: PathBuf,
  pub pattern: String,
  pub signer: Arc<dyn Signer>,
  pub endpoints: Vec<String>,
}

impl SignFiles {
  pub fn new(root: impl AsRef<Path>, pattern: impl Into<String>, signer: Arc<dyn Signer>, endpoints: Vec<String>) -> Self {
    Self {
      root: root.as_ref().to_path_buf(),
      pattern: pattern.into(),
      signer,
      endpoints,
    }
  }
}

impl Action for SignFiles {
  fn execute(&self) -> Outcome {
    info!(root = %self.root.display(), "signing binaries");

    let files = if self.root.is_dir() {
      find_files(&self.root, &self.pattern)?
    } else {
      Vec::new()
    };
    if files.is_empty() {
      return Err(ActionError::NothingToSign {
        root: self.root.clone(),
        pattern: self.pattern.clone(),
      });
    }

    let report = sign_with_fallback(self.signer.as_ref(), &files, &self.endpoints)?;
    info!(
      endpoint = %report.endpoint,
      attempts = report.attempts.len(),
      file_count = files.len(),
      "signed binaries"
    );
    Ok(())
  }
}

impl std::fmt::Debug for SignFiles {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("SignFiles")
      .field("root", &self.root)
      .field("pattern", &self.pattern)
      .field("endpoints", &self.endpoints)
      .finish()
  }
}
