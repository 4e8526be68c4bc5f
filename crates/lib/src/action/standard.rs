//! The named actions a build pipeline runs.
//!
//! Every action is fully configured from a [`BuildConfig`] when the registry
//! is built. Nothing is looked up again when an action runs.

use std::path::Path;
use std::sync::Arc;

use crate::config::BuildConfig;
use crate::sign::{SignFiles, SignToolSigner, Signer};

use super::ActionRegistry;
use super::actions::{CleanDirectories, CmdAction, CopyToDirectory, EachFile, MergeAssemblies, WithTextSubstitution};

/// Registry names of the standard actions.
pub mod names {
  pub const CLEAN: &str = "clean";
  pub const RESTORE: &str = "restore";
  pub const COMPILE: &str = "compile";
  pub const TEST: &str = "test";
  pub const MERGE: &str = "merge";
  pub const SIGN_MERGED: &str = "sign-merged";
  pub const PACK_MERGED: &str = "pack-merged";
  pub const SIGN_STANDALONE: &str = "sign-standalone";
  pub const PACK_STANDALONE: &str = "pack-standalone";
  pub const VERIFY_PACKAGE: &str = "verify-package";
  pub const PUBLISH_LOCAL: &str = "publish-local";

  pub const ALL: [&str; 11] = [
    CLEAN,
    RESTORE,
    COMPILE,
    TEST,
    MERGE,
    SIGN_MERGED,
    PACK_MERGED,
    SIGN_STANDALONE,
    PACK_STANDALONE,
    VERIFY_PACKAGE,
    PUBLISH_LOCAL,
  ];
}

/// Version placeholder in the merged project's nuspec.
const NUSPEC_VERSION_PLACEHOLDER: &str = "<version>$version$</version>";

/// Build the registry of standard actions, signing with the configured sign tool.
pub fn standard_registry(config: &Arc<BuildConfig>) -> ActionRegistry {
  let signer = SignToolSigner {
    tool: config.sign_tool_path(),
    certificate: config.certificate_path(),
    password: config.signing.password.clone(),
    digest: config.signing.digest.clone(),
    description: Some(config.signing.description.clone()),
    url: Some(config.signing.url.clone()),
  };
  standard_registry_with_signer(config, Arc::new(signer))
}

/// Build the registry of standard actions with a custom signer.
pub fn standard_registry_with_signer(config: &Arc<BuildConfig>, signer: Arc<dyn Signer>) -> ActionRegistry {
  let mut registry = ActionRegistry::new();
  let projects = &config.projects;

  registry.register(
    names::CLEAN,
    CleanDirectories {
      dirs: vec![config.artifacts_dir(), config.publish_dir()],
      search_root: Some(config.source_dir()),
      names: config.layout.clean_names.clone(),
    },
  );

  registry.register(
    names::RESTORE,
    dotnet(config, "restore")
      .arg(config.source_dir().display().to_string())
      .arg(version_property(config)),
  );

  registry.register(
    names::COMPILE,
    dotnet(config, "build")
      .arg(config.source_dir().display().to_string())
      .args(["--configuration", config.configuration.as_str()])
      .arg(version_property(config)),
  );

  let test_config = Arc::clone(config);
  registry.register(
    names::TEST,
    EachFile {
      root: config.layout.root.clone(),
      pattern: projects.test_pattern.clone(),
      make: Box::new(move |project: &Path| dotnet_test(&test_config, &project.display().to_string())),
    },
  );

  registry.register(
    names::MERGE,
    MergeAssemblies {
      tool: config.tools.merge.clone(),
      bin_dir: config.bin_dir(&projects.merged),
      frameworks: projects.merge_frameworks.clone(),
      patterns: projects.merge_patterns.clone(),
      primary: projects.merge_primary.clone(),
      output_name: format!("{}.dll", projects.merged),
    },
  );

  registry.register(names::SIGN_MERGED, sign_files(config, &projects.merged, &signer));
  registry.register(names::SIGN_STANDALONE, sign_files(config, &projects.standalone, &signer));

  let nuspec = format!("{}.nuspec", projects.merged);
  registry.register(
    names::PACK_MERGED,
    WithTextSubstitution {
      file: config.project_dir(&projects.merged).join(&nuspec),
      from: NUSPEC_VERSION_PLACEHOLDER.to_string(),
      to: format!("<version>{}</version>", config.version),
      inner: Box::new(dotnet_pack(config, &projects.merged).arg(format!("-p:NuspecFile={}", nuspec))),
    },
  );

  registry.register(names::PACK_STANDALONE, dotnet_pack(config, &projects.standalone));

  let e2e = config
    .source_dir()
    .join(&projects.e2e_tests)
    .join(format!("{}.csproj", projects.e2e_tests));
  registry.register(names::VERIFY_PACKAGE, dotnet_test(config, &e2e.display().to_string()));

  registry.register(
    names::PUBLISH_LOCAL,
    CopyToDirectory {
      files: vec![config.package_path(&projects.merged), config.package_path(&projects.standalone)],
      dest: config.local_packages_dir(),
    },
  );

  registry
}

fn dotnet(config: &BuildConfig, verb: &str) -> CmdAction {
  CmdAction::new(config.tools.dotnet.display().to_string())
    .arg(verb)
    .current_dir(&config.layout.root)
}

fn version_property(config: &BuildConfig) -> String {
  format!("-p:Version={}", config.version)
}

fn dotnet_test(config: &BuildConfig, project: &str) -> CmdAction {
  dotnet(config, "test")
    .arg(project)
    .args(["--configuration", config.configuration.as_str()])
    .arg("--no-build")
}

fn dotnet_pack(config: &BuildConfig, project: &str) -> CmdAction {
  dotnet(config, "pack")
    .arg(config.project_dir(project).display().to_string())
    .args(["--configuration", config.configuration.as_str()])
    .args(["--output".to_string(), config.artifacts_dir().display().to_string()])
    .arg(version_property(config))
    .arg("--no-build")
    .arg("-p:IncludeSymbols=false")
    .args(["--verbosity", "normal"])
}

fn sign_files(config: &BuildConfig, project: &str, signer: &Arc<dyn Signer>) -> SignFiles {
  SignFiles::new(
    config.bin_dir(project),
    config.signing.file_pattern.clone(),
    Arc::clone(signer),
    config.signing.timestamp_urls.clone(),
  )
}

#[cfg(test)]
mod tests {
  use std::fs;
  use std::path::PathBuf;
  use std::sync::Mutex;

  use tempfile::TempDir;

  use super::*;
  use crate::action::ActionError;

  fn config_in(root: &Path) -> Arc<BuildConfig> {
    let mut config = BuildConfig::default();
    config.layout.root = root.to_path_buf();
    config.layout.local_packages = PathBuf::from("LocalPackages");
    config.version = "1.2.3".to_string();
    Arc::new(config)
  }

  #[test]
  fn registers_every_standard_action() {
    let temp = TempDir::new().unwrap();
    let registry = standard_registry(&config_in(temp.path()));

    for name in names::ALL {
      assert!(registry.contains(name), "missing action {}", name);
    }
    assert_eq!(registry.len(), names::ALL.len());
  }

  #[test]
  fn clean_empties_output_directories() {
    let temp = TempDir::new().unwrap();
    let config = config_in(temp.path());
    fs::create_dir_all(config.artifacts_dir()).unwrap();
    fs::write(config.artifacts_dir().join("old.nupkg"), "x").unwrap();
    let obj = config.project_dir("Octopus.Client").join("obj");
    fs::create_dir_all(&obj).unwrap();
    fs::write(obj.join("project.assets.json"), "{}").unwrap();

    standard_registry(&config).run(names::CLEAN).unwrap();

    assert_eq!(fs::read_dir(config.artifacts_dir()).unwrap().count(), 0);
    assert_eq!(fs::read_dir(&obj).unwrap().count(), 0);
    assert!(config.publish_dir().is_dir());
  }

  #[test]
  fn publish_local_copies_both_packages() {
    let temp = TempDir::new().unwrap();
    let config = config_in(temp.path());
    fs::create_dir_all(config.artifacts_dir()).unwrap();
    fs::write(config.package_path("Octopus.Client"), "merged").unwrap();
    fs::write(config.package_path("Octopus.Server.Client"), "standalone").unwrap();

    standard_registry(&config).run(names::PUBLISH_LOCAL).unwrap();

    let local = config.local_packages_dir();
    assert!(local.join("Octopus.Client.1.2.3.nupkg").exists());
    assert!(local.join("Octopus.Server.Client.1.2.3.nupkg").exists());
  }

  #[test]
  fn sign_uses_configured_endpoints_in_order() {
    let temp = TempDir::new().unwrap();
    let config = config_in(temp.path());
    let bin = config.bin_dir("Octopus.Server.Client").join("net452");
    fs::create_dir_all(&bin).unwrap();
    fs::write(bin.join("Octopus.Server.Client.dll"), "x").unwrap();

    let tried = Arc::new(Mutex::new(Vec::new()));
    let recorder = Arc::clone(&tried);
    let signer = move |_: &[PathBuf], endpoint: &str| -> Result<(), ActionError> {
      recorder.lock().unwrap().push(endpoint.to_string());
      Err(ActionError::failed(format!("{} unreachable", endpoint)))
    };

    let registry = standard_registry_with_signer(&config, Arc::new(signer));
    let err = registry.run(names::SIGN_STANDALONE).unwrap_err();

    assert_eq!(*tried.lock().unwrap(), config.signing.timestamp_urls);
    assert!(
      err
        .to_string()
        .ends_with("https://rfc3161timestamp.globalsign.com/advanced unreachable")
    );
  }

  #[test]
  fn pack_merged_requires_nuspec() {
    let temp = TempDir::new().unwrap();
    let registry = standard_registry(&config_in(temp.path()));
    assert!(matches!(
      registry.run(names::PACK_MERGED),
      Err(ActionError::FileNotFound(_))
    ));
  }
}
