//! Individual action implementations.
//!
//! This module contains the concrete actions the build pipeline uses:
//!
//! - [`cmd`] - External program execution
//! - [`fs`] - Directory cleanup, file discovery, text substitution and copying
//! - [`merge`] - Assembly merging per target framework

pub mod cmd;
pub mod fs;
pub mod merge;

pub use cmd::{CmdAction, REDACTED, execute_cmd, execute_cmd_redacted};
pub use fs::{CleanDirectories, CopyToDirectory, EachFile, WithTextSubstitution, find_files};
pub use merge::MergeAssemblies;
