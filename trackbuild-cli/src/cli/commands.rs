//! Command implementations and argument parsing for the trackbuild CLI.

use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use clap::{Args, Parser, Subcommand, ValueEnum};
use thiserror::Error;
use tracing::{Span, field, info, instrument, warn};
use trackbuild_core::{
    DEFAULT_SCORE_CUT, ExecutionStrategy, LabelErrorCode, TrackBuildError, TrackBuilder,
    TrackBuilderConfig,
};

use crate::config::{ConfigError, DEFAULT_CONFIG_PATH, PipelineConfig};
use crate::store::{
    GraphWriter, LoadedGraph, StoreError, clear_directory, load_graphs, read_graph,
};

/// Top-level CLI options parsed by [`clap`].
#[derive(Debug, Parser, Clone)]
#[command(
    name = "trackbuild",
    about = "Build track candidates from scored hit graphs."
)]
pub struct Cli {
    /// Command to execute.
    #[command(subcommand)]
    pub command: Command,
}

/// Supported CLI commands.
#[derive(Debug, Subcommand, Clone)]
pub enum Command {
    /// Label every scored graph named by a pipeline configuration.
    Run(RunCommand),
    /// Label a single scored graph file.
    Label(LabelCommand),
}

/// Options accepted by the `run` command.
#[derive(Debug, Args, Clone)]
pub struct RunCommand {
    /// Pipeline configuration file.
    #[arg(default_value = DEFAULT_CONFIG_PATH)]
    pub config: PathBuf,

    /// Override the configured score cut.
    #[arg(long = "score-cut", allow_negative_numbers = true)]
    pub score_cut: Option<f32>,

    /// How the batch of graphs is scheduled.
    #[arg(long, value_enum, default_value_t = StrategyArg::Auto)]
    pub strategy: StrategyArg,

    /// Abort on the first failing graph instead of skipping it.
    #[arg(long = "fail-fast")]
    pub fail_fast: bool,
}

/// Options accepted by the `label` command.
#[derive(Debug, Args, Clone)]
pub struct LabelCommand {
    /// Scored graph file to label.
    pub path: PathBuf,

    /// Edges scoring strictly above this value join their hits.
    #[arg(
        long = "score-cut",
        default_value_t = DEFAULT_SCORE_CUT,
        allow_negative_numbers = true,
    )]
    pub score_cut: f32,

    /// Directory receiving the labelled graph; nothing is written when absent.
    #[arg(long = "output-dir")]
    pub output_dir: Option<PathBuf>,
}

/// Batch scheduling choices exposed on the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum StrategyArg {
    /// Parallel when available, otherwise sequential.
    Auto,
    /// One graph at a time on the calling thread.
    Sequential,
    /// Graphs distributed over the rayon pool.
    Parallel,
}

impl From<StrategyArg> for ExecutionStrategy {
    fn from(value: StrategyArg) -> Self {
        match value {
            StrategyArg::Auto => Self::Auto,
            StrategyArg::Sequential => Self::Sequential,
            StrategyArg::Parallel => Self::Parallel,
        }
    }
}

/// Errors surfaced while executing CLI commands.
#[derive(Debug, Error)]
pub enum CliError {
    /// The pipeline configuration could not be loaded.
    #[error(transparent)]
    Config(#[from] ConfigError),
    /// Reading or writing graph files failed.
    #[error(transparent)]
    Store(#[from] StoreError),
    /// Track building failed.
    #[error(transparent)]
    Core(#[from] TrackBuildError),
}

/// How per-graph failures affect the rest of a batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) enum BatchPolicy {
    /// Log the failure, record the graph as skipped, and continue.
    SkipFailed,
    /// Abort on the first failure.
    FailFast,
}

impl BatchPolicy {
    /// Applies the policy to a labelling failure. Batch-fatal errors always
    /// abort.
    fn absorb(
        self,
        failure: TrackBuildError,
        path: &Path,
        skipped: &mut Vec<SkippedGraph>,
    ) -> Result<(), CliError> {
        if self == Self::FailFast || failure.is_batch_fatal() {
            return Err(failure.into());
        }
        let identifier = match &failure {
            TrackBuildError::Graph { identifier, .. } => identifier.to_string(),
            _ => path.display().to_string(),
        };
        let code = failure
            .label_code()
            .map_or_else(|| failure.code().as_str(), LabelErrorCode::as_str);
        skipped.push(SkippedGraph::record(identifier, path, code, &failure));
        Ok(())
    }

    /// Applies the policy to a failure writing one graph. Filesystem errors
    /// always abort.
    fn absorb_store(
        self,
        failure: StoreError,
        identifier: String,
        path: &Path,
        skipped: &mut Vec<SkippedGraph>,
    ) -> Result<(), CliError> {
        if self == Self::FailFast || !failure.is_per_graph() {
            return Err(failure.into());
        }
        skipped.push(SkippedGraph::record(identifier, path, failure.code(), &failure));
        Ok(())
    }
}

/// Summarises the outcome of executing a CLI command.
#[derive(Debug, Clone, PartialEq)]
pub struct ExecutionSummary {
    /// Score cut applied to every graph.
    pub score_cut: f32,
    /// Labelled graphs, in input order.
    pub graphs: Vec<GraphSummary>,
    /// Graphs skipped after a per-graph failure, in input order.
    pub skipped: Vec<SkippedGraph>,
}

/// Outcome for one labelled graph.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GraphSummary {
    /// Graph identifier (its event file).
    pub identifier: String,
    /// Number of track candidates found.
    pub candidates: usize,
    /// Number of hits labelled.
    pub hits: usize,
    /// File the labelled graph was written to, if any.
    pub output: Option<PathBuf>,
}

/// A graph skipped after a per-graph failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedGraph {
    /// Graph identifier, or the file path when no identifier is known.
    pub identifier: String,
    /// File the graph was read from.
    pub path: PathBuf,
    /// Most specific stable code for the failure, such as
    /// `LABEL_INDEX_OUT_OF_RANGE` or `STORE_NAME_COLLISION`.
    pub code: &'static str,
}

impl SkippedGraph {
    fn record(
        identifier: String,
        path: &Path,
        code: &'static str,
        failure: &dyn std::error::Error,
    ) -> Self {
        warn!(
            graph = identifier.as_str(),
            path = %path.display(),
            error = %failure,
            code,
            "skipping graph"
        );
        Self {
            identifier,
            path: path.to_path_buf(),
            code,
        }
    }
}

/// Executes the CLI command represented by `cli`.
///
/// # Errors
/// Returns [`CliError`] when configuration, storage, or track building fails.
///
/// # Examples
/// ```
/// # use std::error::Error;
/// # use trackbuild_cli::cli::{Cli, Command, LabelCommand, run_cli};
/// # use tempfile::NamedTempFile;
/// #
/// # fn main() -> Result<(), Box<dyn Error>> {
/// let file = NamedTempFile::new()?;
/// std::fs::write(
///     file.path(),
///     r#"{"event_file": "event0001", "num_nodes": 4,
///         "edge_index": [[0, 1, 2], [1, 2, 3]], "scores": [0.9, 0.3, 0.9]}"#,
/// )?;
/// let cli = Cli {
///     command: Command::Label(LabelCommand {
///         path: file.path().to_path_buf(),
///         score_cut: 0.8,
///         output_dir: None,
///     }),
/// };
/// let summary = run_cli(cli)?;
/// assert_eq!(summary.graphs[0].candidates, 2);
/// # Ok(())
/// # }
/// ```
#[instrument(
    name = "cli.run",
    err,
    skip(cli),
    fields(command = field::Empty),
)]
pub fn run_cli(cli: Cli) -> Result<ExecutionSummary, CliError> {
    let span = Span::current();
    match cli.command {
        Command::Run(run) => {
            span.record("command", field::display("run"));
            run_pipeline(run)
        }
        Command::Label(label) => {
            span.record("command", field::display("label"));
            label_file(label)
        }
    }
}

#[instrument(
    name = "cli.run_pipeline",
    err,
    skip(command),
    fields(config = %command.config.display(), score_cut = field::Empty),
)]
pub(super) fn run_pipeline(command: RunCommand) -> Result<ExecutionSummary, CliError> {
    let RunCommand {
        config,
        score_cut,
        strategy,
        fail_fast,
    } = command;
    let config = PipelineConfig::load(&config)?;
    let builder = TrackBuilderConfig::new()
        .with_score_cut(score_cut.unwrap_or(config.track_building_configs.score_cut))
        .with_execution_strategy(strategy.into())
        .build()?;
    Span::current().record("score_cut", field::display(builder.score_cut()));

    let output_dir = config.track_building_configs.output_dir.as_path();
    if config.common_configs.clear_directories {
        clear_directory(output_dir)?;
    }
    let loaded = load_graphs(&config.gnn_configs.output_dir)?;
    let policy = if fail_fast {
        BatchPolicy::FailFast
    } else {
        BatchPolicy::SkipFailed
    };
    let summary = label_and_store(&builder, loaded, Some(output_dir), policy)?;

    info!(
        labelled = summary.graphs.len(),
        skipped = summary.skipped.len(),
        "pipeline completed"
    );
    Ok(summary)
}

#[instrument(
    name = "cli.label_file",
    err,
    skip(command),
    fields(path = %command.path.display(), score_cut = command.score_cut),
)]
pub(super) fn label_file(command: LabelCommand) -> Result<ExecutionSummary, CliError> {
    let LabelCommand {
        path,
        score_cut,
        output_dir,
    } = command;
    let builder = TrackBuilderConfig::new()
        .with_score_cut(score_cut)
        .with_execution_strategy(ExecutionStrategy::Sequential)
        .build()?;
    let record = read_graph(&path)?;
    label_and_store(
        &builder,
        vec![LoadedGraph { path, record }],
        output_dir.as_deref(),
        BatchPolicy::FailFast,
    )
}

/// Labels `loaded`, attaches labels to each record, and writes the records to
/// `output_dir` when one is given.
///
/// Per-graph failures, including records that cannot be written under a
/// unique name, go through `policy`.
pub(super) fn label_and_store(
    builder: &TrackBuilder,
    loaded: Vec<LoadedGraph>,
    output_dir: Option<&Path>,
    policy: BatchPolicy,
) -> Result<ExecutionSummary, CliError> {
    let mut summary = ExecutionSummary {
        score_cut: builder.score_cut().get(),
        graphs: Vec::with_capacity(loaded.len()),
        skipped: Vec::new(),
    };

    let mut sources = Vec::with_capacity(loaded.len());
    let mut graphs = Vec::with_capacity(loaded.len());
    for LoadedGraph { path, record } in loaded {
        match record.to_scored_graph() {
            Ok(graph) => {
                graphs.push(graph);
                sources.push(LoadedGraph { path, record });
            }
            Err(error) => {
                let failure = TrackBuildError::Graph {
                    identifier: Arc::from(record.event_file.as_str()),
                    error,
                };
                policy.absorb(failure, &path, &mut summary.skipped)?;
            }
        }
    }

    let mut writer = output_dir.map(GraphWriter::new);
    let outcomes = builder.label_batch(&mut graphs);
    for ((source, mut graph), outcome) in sources.into_iter().zip(graphs).zip(outcomes) {
        let LoadedGraph { path, mut record } = source;
        if let Err(failure) = outcome {
            policy.absorb(failure, &path, &mut summary.skipped)?;
            continue;
        }
        // A successful outcome always leaves labels attached.
        let Some(labels) = graph.take_labels() else {
            continue;
        };
        record.set_labels(&labels);
        let output = match writer.as_mut().map(|sink| sink.write(&record)).transpose() {
            Ok(output) => output,
            Err(failure) => {
                policy.absorb_store(failure, record.event_file, &path, &mut summary.skipped)?;
                continue;
            }
        };
        summary.graphs.push(GraphSummary {
            identifier: record.event_file,
            candidates: labels.candidate_count(),
            hits: labels.len(),
            output,
        });
    }
    Ok(summary)
}

/// Renders `summary` to `writer` in a tab-separated text format.
///
/// # Errors
/// Returns [`io::Error`] if writing to the supplied writer fails.
///
/// # Examples
/// ```
/// # use std::error::Error;
/// # use trackbuild_cli::cli::{ExecutionSummary, GraphSummary, render_summary};
/// #
/// # fn main() -> Result<(), Box<dyn Error>> {
/// let summary = ExecutionSummary {
///     score_cut: 0.8,
///     graphs: vec![GraphSummary {
///         identifier: "event0001".into(),
///         candidates: 2,
///         hits: 4,
///         output: None,
///     }],
///     skipped: Vec::new(),
/// };
/// let mut buffer = Vec::new();
/// render_summary(&summary, &mut buffer)?;
/// assert!(String::from_utf8(buffer)?.ends_with("event0001\t2\t4\n"));
/// # Ok(())
/// # }
/// ```
pub fn render_summary(summary: &ExecutionSummary, mut writer: impl Write) -> io::Result<()> {
    writeln!(writer, "score cut: {}", summary.score_cut)?;
    writeln!(writer, "graphs labelled: {}", summary.graphs.len())?;
    writeln!(writer, "graphs skipped: {}", summary.skipped.len())?;
    for graph in &summary.graphs {
        writeln!(
            writer,
            "{}\t{}\t{}",
            graph.identifier, graph.candidates, graph.hits
        )?;
    }
    for skipped in &summary.skipped {
        writeln!(writer, "skipped\t{}\t{}", skipped.identifier, skipped.code)?;
    }
    Ok(())
}
