use anyhow::Result;

use super::Session;

/// Print the target graph in DOT format, for piping into Graphviz.
pub fn cmd_graph(session: &Session) -> Result<()> {
  print!("{}", session.graph.to_dot());
  Ok(())
}
