//! Command-line interface orchestration for kdsearch.
//!
//! Offers `build`, `insert`, `query`, and `distributed` commands over
//! comma-separated point files and renders their outcome as text.

mod commands;

pub use commands::{
    BuildCommand, Cli, CliError, Command, DistributedCommand, ExecutionSummary, IndexArgs,
    InsertCommand, InsertSummary, NodeLine, QueryCommand, QuerySummary, StrategyArg, TreeSummary,
    render_summary, run_cli,
};

#[cfg(test)]
mod test_helpers;
