mod cmd;
mod output;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

use keel_lib::config::Overrides;

use crate::cmd::{cmd_graph, cmd_list, cmd_plan, cmd_run};
use crate::output::{OutputFormat, print_error};

/// keel - Build target graph runner
#[derive(Parser)]
#[command(name = "keel")]
#[command(author, version, about, long_about = None)]
struct Cli {
  /// Enable verbose output
  #[arg(short, long, global = true)]
  verbose: bool,

  /// Path to the config file (default: keel.toml if present)
  #[arg(long, global = true)]
  config: Option<PathBuf>,

  /// Build configuration name (e.g. Release, Debug)
  #[arg(long, global = true)]
  configuration: Option<String>,

  /// Package version to build instead of the configured one
  #[arg(long, global = true)]
  version_override: Option<String>,

  /// Password of the signing certificate
  #[arg(long, global = true, env = "KEEL_SIGNING_PASSWORD", hide_env_values = true)]
  signing_password: Option<String>,

  /// Treat this as a CI build (skips local-only targets)
  #[arg(long, global = true)]
  ci: bool,

  /// Output format
  #[arg(short = 'o', long, global = true, value_enum, default_value = "text")]
  output: OutputFormat,

  #[command(subcommand)]
  command: Commands,
}

#[derive(Subcommand)]
enum Commands {
  /// Run a target and everything it depends on
  Run {
    /// Target to run
    #[arg(default_value = "default")]
    target: String,
  },

  /// Show the order targets would run in, without running them
  Plan {
    /// Target to plan
    #[arg(default_value = "default")]
    target: String,
  },

  /// List all targets with their dependencies
  List,

  /// Print the target graph in Graphviz DOT format
  Graph,
}

fn main() -> ExitCode {
  let cli = Cli::parse();

  let level = if cli.verbose { LevelFilter::DEBUG } else { LevelFilter::WARN };
  tracing_subscriber::fmt()
    .with_env_filter(
      EnvFilter::builder()
        .with_default_directive(level.into())
        .from_env_lossy(),
    )
    .with_writer(std::io::stderr)
    .without_time()
    .init();

  let overrides = Overrides {
    configuration: cli.configuration,
    version: cli.version_override,
    signing_password: cli.signing_password,
    local_build: cli.ci.then_some(false),
  };

  let result = cmd::load_session(cli.config.as_deref(), overrides).and_then(|session| match cli.command {
    Commands::Run { target } => cmd_run(&session, &target, cli.output),
    Commands::Plan { target } => cmd_plan(&session, &target, cli.output),
    Commands::List => cmd_list(&session, cli.output),
    Commands::Graph => cmd_graph(&session),
  });

  match result {
    Ok(()) => ExitCode::SUCCESS,
    Err(e) => {
      print_error(&format!("{:#}", e));
      ExitCode::FAILURE
    }
  }
}
