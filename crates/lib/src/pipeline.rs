//! The build pipeline's target graph.
//!
//! Defines which targets exist, what they depend on and which registry actions
//! their bodies run. Nothing here executes anything.

use std::sync::Arc;

use crate::action::ActionRegistry;
use crate::action::standard::names as actions;
use crate::config::BuildConfig;
use crate::execute::{ExecuteError, TargetGraph};
use crate::target::Target;

/// Target names of the pipeline.
pub mod names {
  pub const CLEAN: &str = "clean";
  pub const RESTORE: &str = "restore";
  pub const COMPILE: &str = "compile";
  pub const TEST: &str = "test";
  pub const MERGE: &str = "merge";
  pub const PACK_MERGED: &str = "pack-merged";
  pub const PACK_STANDALONE: &str = "pack-standalone";
  pub const VERIFY_PACKAGE: &str = "verify-package";
  pub const PUBLISH_LOCAL: &str = "publish-local";
  pub const DEFAULT: &str = "default";
}

/// Build the pipeline's target graph.
///
/// Bodies look up their actions in `registry` when they run, so an action
/// missing from the registry fails its target rather than the definition.
pub fn define(registry: Arc<ActionRegistry>, config: &BuildConfig) -> Result<TargetGraph, ExecuteError> {
  let local_build = config.local_build;

  TargetGraph::new([
    Target::new(names::CLEAN)
      .description("Empty output and intermediate directories")
      .executes(registry.runner([actions::CLEAN])),
    Target::new(names::RESTORE)
      .description("Restore package dependencies")
      .depends_on(names::CLEAN)
      .executes(registry.runner([actions::RESTORE])),
    Target::new(names::COMPILE)
      .description("Build the solution")
      .depends_on(names::RESTORE)
      .executes(registry.runner([actions::COMPILE])),
    Target::new(names::TEST)
      .description("Run every unit test project")
      .depends_on(names::COMPILE)
      .executes(registry.runner([actions::TEST])),
    Target::new(names::MERGE)
      .description("Merge client assemblies per framework")
      .depends_on(names::TEST)
      .executes(registry.runner([actions::MERGE])),
    Target::new(names::PACK_MERGED)
      .description("Sign and pack the merged client")
      .depends_on(names::MERGE)
      .executes(registry.runner([actions::SIGN_MERGED, actions::PACK_MERGED])),
    Target::new(names::PACK_STANDALONE)
      .description("Sign and pack the standalone client")
      .depends_on(names::COMPILE)
      .executes(registry.runner([actions::SIGN_STANDALONE, actions::PACK_STANDALONE])),
    Target::new(names::VERIFY_PACKAGE)
      .description("Test the packed merged client")
      .depends_on(names::PACK_MERGED)
      .executes(registry.runner([actions::VERIFY_PACKAGE])),
    Target::new(names::PUBLISH_LOCAL)
      .description("Copy packages to the local package feed")
      .depends_on(names::VERIFY_PACKAGE)
      .depends_on(names::PACK_STANDALONE)
      .only_when(move || local_build)
      .executes(registry.runner([actions::PUBLISH_LOCAL])),
    Target::new(names::DEFAULT)
      .description("Full build")
      .depends_on(names::PUBLISH_LOCAL)
      .depends_on(names::PACK_MERGED)
      .depends_on(names::PACK_STANDALONE)
      .depends_on(names::VERIFY_PACKAGE),
  ])
}
