//! Build configuration.
//!
//! A [`BuildConfig`] is read once at startup, from an optional `keel.toml`
//! plus command-line overrides, and is immutable afterward. Actions receive it
//! behind an `Arc` and derive every path they touch from it.
//!
//! Every field has a default, so an empty file (or no file) describes the
//! standard layout:
//!
//! ```toml
//! configuration = "Release"
//! version = "1.2.3"
//!
//! [layout]
//! source = "source"
//! artifacts = "artifacts"
//!
//! [signing]
//! timestamp_urls = ["http://tsa.example.com", "http://backup.example.com"]
//! ```

use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;
use tracing::debug;

/// Default config file name looked up in the working directory.
pub const CONFIG_FILE_NAME: &str = "keel.toml";

/// Environment variable whose presence marks a CI (non-local) build.
pub const CI_ENV_VAR: &str = "CI";

#[derive(Debug, Error)]
pub enum ConfigError {
  #[error("failed to read config {}: {source}", path.display())]
  Read {
    path: PathBuf,
    #[source]
    source: std::io::Error,
  },

  #[error("failed to parse config {}: {source}", path.display())]
  Parse {
    path: PathBuf,
    #[source]
    source: toml::de::Error,
  },
}

/// Immutable settings for one build invocation.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct BuildConfig {
  /// Build configuration name passed to the compiler.
  pub configuration: String,

  /// Package version stamped into every build output.
  pub version: String,

  /// Whether this is a developer machine build. Defaults to true unless the
  /// `CI` environment variable is set.
  pub local_build: bool,

  pub layout: Layout,
  pub projects: Projects,
  pub tools: Tools,
  pub signing: Signing,
}

/// Directory layout. Relative paths are resolved against `root`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Layout {
  pub root: PathBuf,
  pub source: PathBuf,
  pub artifacts: PathBuf,
  pub publish: PathBuf,
  pub local_packages: PathBuf,

  /// Directory names emptied under `source` by the clean target.
  pub clean_names: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Projects {
  /// Project whose assemblies are merged into one and packed from a nuspec.
  pub merged: String,

  /// Project packed as-is.
  pub standalone: String,

  /// Test project run against the merged package.
  pub e2e_tests: String,

  /// File pattern of the unit test projects.
  pub test_pattern: String,

  pub merge_frameworks: Vec<String>,
  pub merge_patterns: Vec<String>,

  /// Assembly the merge tool must see first.
  pub merge_primary: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Tools {
  pub dotnet: PathBuf,
  pub merge: PathBuf,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Signing {
  pub certificate: PathBuf,
  pub password: Option<String>,
  pub tool: PathBuf,
  pub digest: String,
  pub description: String,
  pub url: String,

  /// File name pattern of the binaries to sign.
  pub file_pattern: String,

  /// Timestamp authorities, most likely to succeed first.
  pub timestamp_urls: Vec<String>,
}

/// Values supplied on the command line, applied over the loaded config.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
  pub configuration: Option<String>,
  pub version: Option<String>,
  pub signing_password: Option<String>,
  pub local_build: Option<bool>,
}

impl Default for BuildConfig {
  fn default() -> Self {
    Self {
      configuration: "Release".to_string(),
      version: "0.0.0-local".to_string(),
      local_build: std::env::var_os(CI_ENV_VAR).is_none(),
      layout: Layout::default(),
      projects: Projects::default(),
      tools: Tools::default(),
      signing: Signing::default(),
    }
  }
}

impl Default for Layout {
  fn default() -> Self {
    Self {
      root: PathBuf::from("."),
      source: PathBuf::from("source"),
      artifacts: PathBuf::from("artifacts"),
      publish: PathBuf::from("publish"),
      local_packages: PathBuf::from("../LocalPackages"),
      clean_names: vec!["bin".to_string(), "obj".to_string(), "TestResults".to_string()],
    }
  }
}

impl Default for Projects {
  fn default() -> Self {
    Self {
      merged: "Octopus.Client".to_string(),
      standalone: "Octopus.Server.Client".to_string(),
      e2e_tests: "Octopus.Client.E2ETests".to_string(),
      test_pattern: "*.Tests.csproj".to_string(),
      merge_frameworks: vec!["net452".to_string(), "netstandard2.0".to_string()],
      merge_patterns: vec![
        "Newtonsoft.Json.dll".to_string(),
        "Octodiff*".to_string(),
        "Octopus.*.dll".to_string(),
      ],
      merge_primary: "Octopus.Server.Client.dll".to_string(),
    }
  }
}

impl Default for Tools {
  fn default() -> Self {
    Self {
      dotnet: PathBuf::from("dotnet"),
      merge: PathBuf::from("ilrepack"),
    }
  }
}

impl Default for Signing {
  fn default() -> Self {
    Self {
      certificate: PathBuf::from("certificates/OctopusDevelopment.pfx"),
      password: None,
      tool: PathBuf::from("certificates/signtool.exe"),
      digest: "sha256".to_string(),
      description: "Octopus Client Tool".to_string(),
      url: "https://octopus.com".to_string(),
      file_pattern: "Octopus.*.dll".to_string(),
      timestamp_urls: [
        "http://tsa.starfieldtech.com",
        "http://www.startssl.com/timestamp",
        "http://timestamp.comodoca.com/rfc3161",
        "http://timestamp.verisign.com/scripts/timstamp.dll",
        "http://timestamp.globalsign.com/scripts/timestamp.dll",
        "https://rfc3161timestamp.globalsign.com/advanced",
      ]
      .into_iter()
      .map(String::from)
      .collect(),
    }
  }
}

impl BuildConfig {
  /// Load a config file.
  ///
  /// A relative `layout.root` is resolved against the directory containing
  /// the file, so a build behaves the same from any working directory.
  pub fn load(path: &Path) -> Result<Self, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
      path: path.to_path_buf(),
      source,
    })?;

    let mut config: BuildConfig = toml::from_str(&content).map_err(|source| ConfigError::Parse {
      path: path.to_path_buf(),
      source,
    })?;

    if config.layout.root.is_relative()
      && let Some(parent) = path.parent()
    {
      config.layout.root = parent.join(&config.layout.root);
    }

    debug!(path = %path.display(), root = %config.layout.root.display(), "loaded config");
    Ok(config)
  }

  /// Apply command-line overrides.
  pub fn with_overrides(mut self, overrides: Overrides) -> Self {
    if let Some(configuration) = overrides.configuration {
      self.configuration = configuration;
    }
    if let Some(version) = overrides.version {
      self.version = version;
    }
    if let Some(password) = overrides.signing_password {
      self.signing.password = Some(password);
    }
    if let Some(local_build) = overrides.local_build {
      self.local_build = local_build;
    }
    self
  }

  fn resolve(&self, path: &Path) -> PathBuf {
    self.layout.root.join(path)
  }

  pub fn source_dir(&self) -> PathBuf {
    self.resolve(&self.layout.source)
  }

  pub fn artifacts_dir(&self) -> PathBuf {
    self.resolve(&self.layout.artifacts)
  }

  pub fn publish_dir(&self) -> PathBuf {
    self.resolve(&self.layout.publish)
  }

  pub fn local_packages_dir(&self) -> PathBuf {
    self.resolve(&self.layout.local_packages)
  }

  pub fn project_dir(&self, project: &str) -> PathBuf {
    self.source_dir().join(project)
  }

  /// Build output of a project for the current configuration.
  pub fn bin_dir(&self, project: &str) -> PathBuf {
    self.project_dir(project).join("bin").join(&self.configuration)
  }

  /// Package a project produces in the artifacts directory.
  pub fn package_path(&self, project: &str) -> PathBuf {
    self.artifacts_dir().join(format!("{}.{}.nupkg", project, self.version))
  }

  pub fn certificate_path(&self) -> PathBuf {
    self.resolve(&self.signing.certificate)
  }

  pub fn sign_tool_path(&self) -> PathBuf {
    self.resolve(&self.signing.tool)
  }
}
