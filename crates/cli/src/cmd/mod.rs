mod graph;
mod list;
mod plan;
mod run;

pub use graph::cmd_graph;
pub use list::cmd_list;
pub use plan::cmd_plan;
pub use run::cmd_run;

use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::debug;

use keel_lib::action::standard::standard_registry;
use keel_lib::config::{BuildConfig, CONFIG_FILE_NAME, Overrides};
use keel_lib::execute::TargetGraph;
use keel_lib::pipeline;

/// Everything a command needs: the effective config and the pipeline built from it.
pub struct Session {
  pub config: Arc<BuildConfig>,
  pub graph: TargetGraph,
}

/// Load the config and define the pipeline.
///
/// An explicit `path` must exist. Without one, `keel.toml` in the working
/// directory is used when present, otherwise the built-in defaults.
pub fn load_session(path: Option<&Path>, overrides: Overrides) -> Result<Session> {
  let config = match path {
    Some(path) => BuildConfig::load(path).with_context(|| format!("Failed to load config: {}", path.display()))?,
    None if Path::new(CONFIG_FILE_NAME).is_file() => {
      BuildConfig::load(Path::new(CONFIG_FILE_NAME)).context("Failed to load config")?
    }
    None => {
      debug!("no config file, using defaults");
      BuildConfig::default()
    }
  };

  let config = Arc::new(config.with_overrides(overrides));
  let registry = Arc::new(standard_registry(&config));
  let graph = pipeline::define(registry, &config).context("Failed to define pipeline")?;

  Ok(Session { config, graph })
}
