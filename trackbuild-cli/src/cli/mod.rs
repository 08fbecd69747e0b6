//! Command-line interface orchestration for trackbuild.
//!
//! `run` labels every scored graph named by a pipeline configuration and
//! writes the labelled graphs to the configured output directory. `label`
//! labels a single graph file.

mod commands;

pub use commands::{
    Cli, CliError, Command, ExecutionSummary, GraphSummary, LabelCommand, RunCommand,
    SkippedGraph, StrategyArg, render_summary, run_cli,
};

#[cfg(test)]
mod test_helpers;
