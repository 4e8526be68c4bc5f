//! File system actions.
//!
//! Directory cleanup, file discovery, temporary text substitution and copying.

use std::fs;
use std::path::{Path, PathBuf};

use glob_match::glob_match;
use tracing::{debug, info, warn};
use walkdir::WalkDir;

use crate::action::{Action, ActionError, Outcome};

use super::cmd::CmdAction;

/// Find files under `root` whose file name matches `pattern`.
///
/// Matching is case-insensitive and applies to the file name only. Results
/// are sorted so the order is stable across platforms.
pub fn find_files(root: &Path, pattern: &str) -> Result<Vec<PathBuf>, ActionError> {
  let pattern = pattern.to_lowercase();
  let mut found = Vec::new();

  for entry in WalkDir::new(root) {
    let entry = entry?;
    if !entry.file_type().is_file() {
      continue;
    }
    let name = entry.file_name().to_string_lossy().to_lowercase();
    if glob_match(&pattern, &name) {
      found.push(entry.into_path());
    }
  }

  found.sort();
  Ok(found)
}

/// Find directories under `root` named one of `names`.
///
/// Matched directories are not descended into.
pub fn find_directories(root: &Path, names: &[String]) -> Result<Vec<PathBuf>, ActionError> {
  let mut found = Vec::new();
  let mut walker = WalkDir::new(root).min_depth(1).into_iter();

  while let Some(entry) = walker.next() {
    let entry = entry?;
    if !entry.file_type().is_dir() {
      continue;
    }
    let name = entry.file_name().to_string_lossy();
    if names.iter().any(|n| n.as_str() == name) {
      found.push(entry.into_path());
      walker.skip_current_dir();
    }
  }

  found.sort();
  Ok(found)
}

/// Make `path` an existing, empty directory.
pub fn ensure_clean_directory(path: &Path) -> Result<(), ActionError> {
  if path.exists() {
    debug!(path = %path.display(), "removing directory contents");
    for entry in fs::read_dir(path)? {
      let entry = entry?;
      if entry.file_type()?.is_dir() {
        fs::remove_dir_all(entry.path())?;
      } else {
        fs::remove_file(entry.path())?;
      }
    }
  } else {
    fs::create_dir_all(path)?;
  }
  Ok(())
}

/// Empty a fixed set of directories plus every directory under a search root
/// with a matching name (for example `bin` and `obj`).
#[derive(Debug, Clone, Default)]
pub struct CleanDirectories {
  pub dirs: Vec<PathBuf>,
  pub search_root: Option<PathBuf>,
  pub names: Vec<String>,
}

impl Action for CleanDirectories {
  fn execute(&self) -> Outcome {
    let mut targets = self.dirs.clone();

    if let Some(root) = &self.search_root
      && root.exists()
    {
      targets.extend(find_directories(root, &self.names)?);
    }

    for dir in &targets {
      ensure_clean_directory(dir)?;
    }

    info!(count = targets.len(), "cleaned directories");
    Ok(())
  }
}

/// Run a command once per file matching a pattern.
///
/// The command is built by `make` from the file path. Stops at the first
/// failing file. Finding no files is not an error.
pub struct EachFile {
  pub root: PathBuf,
  pub pattern: String,
  pub make: Box<dyn Fn(&Path) -> CmdAction + Send + Sync>,
}

impl Action for EachFile {
  fn execute(&self) -> Outcome {
    let files = find_files(&self.root, &self.pattern)?;
    if files.is_empty() {
      warn!(root = %self.root.display(), pattern = %self.pattern, "no matching files");
    }
    for file in &files {
      (self.make)(file).execute()?;
    }
    Ok(())
  }
}

/// Replace text in a file for the duration of an inner action.
///
/// The original contents are always written back, whether the inner action
/// succeeds or fails. An inner failure takes precedence over a restore failure.
pub struct WithTextSubstitution {
  pub file: PathBuf,
  pub from: String,
  pub to: String,
  pub inner: Box<dyn Action>,
}

impl Action for WithTextSubstitution {
  fn execute(&self) -> Outcome {
    if !self.file.exists() {
      return Err(ActionError::FileNotFound(self.file.clone()));
    }

    let original = fs::read_to_string(&self.file)?;
    fs::write(&self.file, original.replace(&self.from, &self.to))?;
    debug!(file = %self.file.display(), "applied text substitution");

    let result = self.inner.execute();
    let restored = fs::write(&self.file, &original);
    debug!(file = %self.file.display(), "restored original text");

    result?;
    restored?;
    Ok(())
  }
}

/// Copy files into a directory, creating it and overwriting existing files.
#[derive(Debug, Clone)]
pub struct CopyToDirectory {
  pub files: Vec<PathBuf>,
  pub dest: PathBuf,
}

impl Action for CopyToDirectory {
  fn execute(&self) -> Outcome {
    fs::create_dir_all(&self.dest)?;

    for file in &self.files {
      let Some(name) = file.file_name() else {
        return Err(ActionError::FileNotFound(file.clone()));
      };
      if !file.exists() {
        return Err(ActionError::FileNotFound(file.clone()));
      }
      let target = self.dest.join(name);
      fs::copy(file, &target)?;
      info!(from = %file.display(), to = %target.display(), "copied file");
    }

    Ok(())
  }
}
