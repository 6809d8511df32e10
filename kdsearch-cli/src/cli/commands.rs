//! Command definitions and execution for the kdsearch CLI.

use std::{
    fs::File,
    io::{self, BufReader, Write},
    num::NonZeroUsize,
    panic,
    path::{Path, PathBuf},
    thread,
};

use clap::{Args, Parser, Subcommand, ValueEnum};
use kdsearch_core::{
    AxisRuleViolation, COORDINATOR_RANK, Classification, Communicator, ExecutionStrategy,
    KdError, KdSearch, KdSearchBuilder, KdTree, Label, NodeView, Ordinal, Point, Shard,
    dataset_dimensions, run_local_cluster,
};
use thiserror::Error;
use tracing::{Span, field, info, instrument, warn};

use crate::records::{RecordError, Target, read_points};

const DEFAULT_NEIGHBOURS: usize = 5;

/// Top-level CLI options parsed by [`clap`].
#[derive(Debug, Parser, Clone)]
#[command(name = "kdsearch", about = "Exact k-nearest-neighbour search over KD-trees.")]
pub struct Cli {
    /// Command to execute.
    #[command(subcommand)]
    pub command: Command,
}

/// Supported CLI commands.
#[derive(Debug, Subcommand, Clone)]
pub enum Command {
    /// Build a tree over a point file and report its shape.
    Build(BuildCommand),
    /// Build a tree, then insert a second point file from several threads.
    Insert(InsertCommand),
    /// Find the nearest neighbours of a target and vote on their labels.
    Query(QueryCommand),
    /// Run a query across in-process workers, each owning one shard.
    Distributed(DistributedCommand),
}

/// Input and index options shared by every command.
#[derive(Debug, Args, Clone)]
pub struct IndexArgs {
    /// Point file: comma-separated features followed by an integer label.
    pub path: PathBuf,

    /// Number of leading features to index.
    #[arg(long)]
    pub dimensions: Option<usize>,

    /// How construction and queries use threads.
    #[arg(long, value_enum, default_value_t = StrategyArg::Auto)]
    pub strategy: StrategyArg,
}

/// Options accepted by the `build` command.
#[derive(Debug, Args, Clone)]
pub struct BuildCommand {
    /// Input and index options.
    #[command(flatten)]
    pub index: IndexArgs,

    /// Print every node with its depth.
    #[arg(long)]
    pub dump: bool,
}

/// Options accepted by the `insert` command.
///
/// Without `--dimensions` an empty initial file takes its dimensionality
/// from the inserted points.
#[derive(Debug, Args, Clone)]
pub struct InsertCommand {
    /// Input and index options for the initial tree.
    #[command(flatten)]
    pub index: IndexArgs,

    /// Point file inserted into the built tree.
    #[arg(long)]
    pub points: PathBuf,

    /// Number of writer threads sharing the inserted points.
    #[arg(long, default_value = "4")]
    pub threads: NonZeroUsize,

    /// Print every node with its depth after the inserts.
    #[arg(long)]
    pub dump: bool,
}

/// Options accepted by the `query` command.
///
/// Without `--dimensions` the target's length selects how many leading
/// features are indexed.
#[derive(Debug, Args, Clone)]
pub struct QueryCommand {
    /// Input and index options.
    #[command(flatten)]
    pub index: IndexArgs,

    /// Number of neighbours to return.
    #[arg(long, default_value_t = DEFAULT_NEIGHBOURS)]
    pub neighbours: usize,

    /// Comma-separated target coordinates.
    #[arg(long, allow_hyphen_values = true)]
    pub target: Target,
}

/// Options accepted by the `distributed` command.
#[derive(Debug, Args, Clone)]
pub struct DistributedCommand {
    /// Query options.
    #[command(flatten)]
    pub query: QueryCommand,

    /// Number of workers sharing the point set.
    #[arg(long, default_value = "4")]
    pub workers: NonZeroUsize,
}

/// Execution strategies selectable from the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum StrategyArg {
    /// Parallel build, iterative query.
    Auto,
    /// Sequential build, recursive query.
    Sequential,
    /// Sequential build, iterative query.
    Iterative,
    /// Parallel build, parallel query.
    Parallel,
}

impl From<StrategyArg> for ExecutionStrategy {
    fn from(value: StrategyArg) -> Self {
        match value {
            StrategyArg::Auto => Self::Auto,
            StrategyArg::Sequential => Self::Sequential,
            StrategyArg::Iterative => Self::Iterative,
            StrategyArg::Parallel => Self::Parallel,
        }
    }
}

/// Errors surfaced while executing CLI commands.
#[derive(Debug, Error)]
pub enum CliError {
    /// The point file could not be opened.
    #[error("failed to open `{path}`: {source}")]
    Io {
        /// Path that triggered the failure.
        path: PathBuf,
        /// Underlying operating system error.
        #[source]
        source: io::Error,
    },
    /// The point file held a malformed record.
    #[error("`{path}`: {source}")]
    Records {
        /// File being read.
        path: PathBuf,
        /// Record-level failure.
        #[source]
        source: RecordError,
    },
    /// Core indexing or search failed.
    #[error(transparent)]
    Core(#[from] KdError),
    /// The coordinator finished without producing an answer.
    #[error("the coordinator rank returned no outcome")]
    MissingOutcome,
}

/// Shape of a tree, optionally with every node.
#[derive(Debug, Clone, PartialEq)]
pub struct TreeSummary {
    /// Name derived from the input file.
    pub source: String,
    /// Number of indexed points.
    pub points: usize,
    /// Indexed dimensionality.
    pub dimensions: usize,
    /// Longest root-to-leaf path, counted in nodes.
    pub height: usize,
    /// Nodes in pre-order when a dump was requested, otherwise empty.
    pub nodes: Vec<NodeLine>,
}

/// One node of a tree dump.
#[derive(Debug, Clone, PartialEq)]
pub struct NodeLine {
    /// Distance from the root.
    pub depth: usize,
    /// Ingestion-order index of the point.
    pub ordinal: Ordinal,
    /// Indexed features.
    pub features: Vec<f64>,
    /// Class label.
    pub label: Label,
}

impl From<NodeView<'_>> for NodeLine {
    fn from(view: NodeView<'_>) -> Self {
        let (features, label) = view.point.clone().into_parts();
        Self {
            depth: view.depth,
            ordinal: view.ordinal,
            features,
            label,
        }
    }
}

/// Outcome of concurrent inserts into a built tree.
#[derive(Debug, Clone, PartialEq)]
pub struct InsertSummary {
    /// Shape of the tree after every insert.
    pub tree: TreeSummary,
    /// Number of points inserted after the build.
    pub inserted: usize,
    /// Writer threads used.
    pub threads: NonZeroUsize,
    /// Result of checking the axis rule over the final tree.
    pub axis_rule: Result<(), AxisRuleViolation>,
}

/// Answer to a local or distributed query.
#[derive(Debug, Clone, PartialEq)]
pub struct QuerySummary {
    /// Name derived from the input file.
    pub source: String,
    /// Worker count for distributed queries, `None` for local ones.
    pub workers: Option<NonZeroUsize>,
    /// Neighbours and predicted label.
    pub outcome: Classification,
}

/// Summarises the outcome of executing a CLI command.
#[derive(Debug, Clone, PartialEq)]
pub enum ExecutionSummary {
    /// Result of `build`.
    Tree(TreeSummary),
    /// Result of `insert`.
    Insert(InsertSummary),
    /// Result of `query` or `distributed`.
    Query(QuerySummary),
}

/// Execute the parsed CLI command.
///
/// # Errors
/// Returns [`CliError`] when the input cannot be read or parsed, or when the
/// core rejects the configuration, data, or target.
///
/// # Examples
/// ```
/// # use std::{error::Error, io::Write};
/// # use kdsearch_cli::cli::{BuildCommand, Cli, Command, ExecutionSummary, IndexArgs, StrategyArg, run_cli};
/// # use tempfile::NamedTempFile;
/// #
/// # fn main() -> Result<(), Box<dyn Error>> {
/// let mut file = NamedTempFile::new()?;
/// writeln!(file, "1,1,0\n2,2,1\n3,3,0")?;
/// let cli = Cli {
///     command: Command::Build(BuildCommand {
///         index: IndexArgs {
///             path: file.path().to_path_buf(),
///             dimensions: None,
///             strategy: StrategyArg::Sequential,
///         },
///         dump: false,
///     }),
/// };
/// let ExecutionSummary::Tree(tree) = run_cli(cli)? else {
///     panic!("build reports a tree summary");
/// };
/// assert_eq!((tree.points, tree.dimensions, tree.height), (3, 2, 2));
/// # Ok(())
/// # }
/// ```
#[instrument(name = "cli.run", err, skip(cli), fields(command = field::Empty))]
pub fn run_cli(cli: Cli) -> Result<ExecutionSummary, CliError> {
    let span = Span::current();
    match cli.command {
        Command::Build(build) => {
            span.record("command", field::display("build"));
            run_build(build).map(ExecutionSummary::Tree)
        }
        Command::Insert(insert) => {
            span.record("command", field::display("insert"));
            run_insert(insert).map(ExecutionSummary::Insert)
        }
        Command::Query(query) => {
            span.record("command", field::display("query"));
            run_query(query).map(ExecutionSummary::Query)
        }
        Command::Distributed(distributed) => {
            span.record("command", field::display("distributed"));
            run_distributed(distributed).map(ExecutionSummary::Query)
        }
    }
}

#[instrument(
    name = "cli.build",
    err,
    skip(command),
    fields(path = %command.index.path.display(), strategy = ?command.index.strategy),
)]
pub(super) fn run_build(command: BuildCommand) -> Result<TreeSummary, CliError> {
    let BuildCommand { index, dump } = command;
    let search = index_search(&index, index.dimensions)?;
    let points = load_points(&index.path)?;
    let tree = search.build_tree(points)?;

    let summary = summarise_tree(&index.path, &tree, dump);
    info!(
        points = summary.points,
        dimensions = summary.dimensions,
        height = summary.height,
        "tree built"
    );
    Ok(summary)
}

#[instrument(
    name = "cli.insert",
    err,
    skip(command),
    fields(
        path = %command.index.path.display(),
        additions = %command.points.display(),
        threads = command.threads.get()
    ),
)]
pub(super) fn run_insert(command: InsertCommand) -> Result<InsertSummary, CliError> {
    let InsertCommand {
        index,
        points: additions_path,
        threads,
        dump,
    } = command;
    let base = load_points(&index.path)?;
    let additions = load_points(&additions_path)?;
    let requested = index.dimensions.or_else(|| {
        if base.is_empty() {
            dataset_dimensions(&additions)
        } else {
            None
        }
    });
    let search = index_search(&index, requested)?;
    let tree = search.build_tree(base)?;

    let inserted = additions.len();
    insert_concurrently(&search, &tree, additions, threads)?;
    let axis_rule = tree.check_axis_rule();
    if let Err(violation) = &axis_rule {
        warn!(%violation, "axis rule broken after inserts");
    }
    info!(points = tree.len(), inserted, "inserts completed");

    Ok(InsertSummary {
        tree: summarise_tree(&index.path, &tree, dump),
        inserted,
        threads,
        axis_rule,
    })
}

fn index_search(index: &IndexArgs, dimensions: Option<usize>) -> Result<KdSearch, KdError> {
    let mut builder = KdSearchBuilder::new().with_execution_strategy(index.strategy.into());
    if let Some(dimensions) = dimensions {
        builder = builder.with_dimensions(dimensions);
    }
    builder.build()
}

fn summarise_tree(path: &Path, tree: &KdTree, dump: bool) -> TreeSummary {
    let nodes = if dump {
        tree.nodes().into_iter().map(NodeLine::from).collect()
    } else {
        Vec::new()
    };
    TreeSummary {
        source: derive_source_name(path),
        points: tree.len(),
        dimensions: tree.dimensions().get(),
        height: tree.height(),
        nodes,
    }
}

/// Splits `points` into at most `threads` runs and inserts each run from its
/// own thread. The first insert error, in run order, is returned.
fn insert_concurrently(
    search: &KdSearch,
    tree: &KdTree,
    points: Vec<Point>,
    threads: NonZeroUsize,
) -> Result<(), KdError> {
    let run_len = points.len().div_ceil(threads.get()).max(1);
    let mut runs: Vec<Vec<Point>> = Vec::with_capacity(threads.get());
    let mut remaining = points;
    while !remaining.is_empty() {
        let tail = remaining.split_off(remaining.len().min(run_len));
        runs.push(remaining);
        remaining = tail;
    }

    let outcomes: Vec<thread::Result<Result<(), KdError>>> = thread::scope(|scope| {
        let handles: Vec<_> = runs
            .into_iter()
            .map(|run| {
                scope.spawn(move || {
                    run.into_iter()
                        .try_for_each(|point| search.insert(tree, point).map(drop))
                })
            })
            .collect();
        handles.into_iter().map(|handle| handle.join()).collect()
    });
    outcomes
        .into_iter()
        .map(|outcome| outcome.unwrap_or_else(|payload| panic::resume_unwind(payload)))
        .collect()
}

#[instrument(
    name = "cli.query",
    err,
    skip(command),
    fields(path = %command.index.path.display(), neighbours = command.neighbours),
)]
pub(super) fn run_query(command: QueryCommand) -> Result<QuerySummary, CliError> {
    let search = configure(&command)?;
    let points = load_points(&command.index.path)?;
    let tree = search.build_tree(points)?;
    let outcome = search.classify(&tree, command.target.coordinates())?;
    info!(
        neighbours = outcome.neighbours().len(),
        predicted_label = ?outcome.predicted_label(),
        "query completed"
    );
    Ok(QuerySummary {
        source: derive_source_name(&command.index.path),
        workers: None,
        outcome,
    })
}

#[instrument(
    name = "cli.distributed",
    err,
    skip(command),
    fields(path = %command.query.index.path.display(), workers = command.workers.get()),
)]
pub(super) fn run_distributed(command: DistributedCommand) -> Result<QuerySummary, CliError> {
    let DistributedCommand { query, workers } = command;
    let search = configure(&query)?;
    let points = load_points(&query.index.path)?;
    let outcome = distribute(&search, &points, query.target.coordinates(), workers)?;
    info!(
        neighbours = outcome.neighbours().len(),
        predicted_label = ?outcome.predicted_label(),
        "distributed query completed"
    );
    Ok(QuerySummary {
        source: derive_source_name(&query.index.path),
        workers: Some(workers),
        outcome,
    })
}

fn configure(command: &QueryCommand) -> Result<KdSearch, KdError> {
    let dimensions = command
        .index
        .dimensions
        .unwrap_or(command.target.coordinates().len());
    KdSearchBuilder::new()
        .with_neighbours(command.neighbours)
        .with_dimensions(dimensions)
        .with_execution_strategy(command.index.strategy.into())
        .build()
}

/// Runs one worker per rank and returns the coordinator's answer.
///
/// A worker that fails on its own data makes the coordinator report a
/// missing participant; that worker's error is the one surfaced.
fn distribute(
    search: &KdSearch,
    points: &[Point],
    target: &[f64],
    workers: NonZeroUsize,
) -> Result<Classification, CliError> {
    let mut results = run_local_cluster(workers, |mut communicator| {
        let shard = Shard::carve(points, communicator.rank(), workers)?;
        search.distributed_query(&mut communicator, shard, target)
    });

    if let Some(cause) = results
        .iter()
        .filter_map(|result| result.as_ref().err())
        .find(|err| err.collective_code().is_none())
    {
        return Err(cause.clone().into());
    }
    match results.swap_remove(COORDINATOR_RANK) {
        Ok(Some(outcome)) => Ok(outcome),
        Ok(None) => Err(CliError::MissingOutcome),
        Err(err) => Err(err.into()),
    }
}

#[instrument(name = "cli.load_points", err, fields(path = %path.display(), points = field::Empty))]
pub(super) fn load_points(path: &Path) -> Result<Vec<Point>, CliError> {
    let file = File::open(path).map_err(|source| CliError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let points = read_points(BufReader::new(file)).map_err(|source| CliError::Records {
        path: path.to_path_buf(),
        source,
    })?;
    Span::current().record("points", points.len());
    Ok(points)
}

pub(super) fn derive_source_name(path: &Path) -> String {
    path.file_stem()
        .and_then(|value| value.to_str())
        .map_or_else(|| "points".to_owned(), ToOwned::to_owned)
}

/// Renders `summary` to `writer` in a tab-separated text format.
///
/// # Errors
/// Returns [`io::Error`] if writing to the supplied writer fails.
///
/// # Examples
/// ```
/// # use std::io::Cursor;
/// # use kdsearch_cli::cli::{ExecutionSummary, TreeSummary, render_summary};
/// let summary = ExecutionSummary::Tree(TreeSummary {
///     source: "demo".into(),
///     points: 4,
///     dimensions: 2,
///     height: 3,
///     nodes: Vec::new(),
/// });
/// let mut buffer = Cursor::new(Vec::new());
/// render_summary(&summary, &mut buffer)?;
/// let text = String::from_utf8(buffer.into_inner()).expect("utf-8 output");
/// assert_eq!(text, "source: demo\npoints: 4\ndimensions: 2\nheight: 3\n");
/// # Ok::<(), std::io::Error>(())
/// ```
pub fn render_summary(summary: &ExecutionSummary, mut writer: impl Write) -> io::Result<()> {
    match summary {
        ExecutionSummary::Tree(tree) => {
            render_tree_header(tree, &mut writer)?;
            render_nodes(&tree.nodes, &mut writer)?;
        }
        ExecutionSummary::Insert(insert) => {
            render_tree_header(&insert.tree, &mut writer)?;
            writeln!(writer, "inserted: {}", insert.inserted)?;
            writeln!(writer, "threads: {}", insert.threads)?;
            match &insert.axis_rule {
                Ok(()) => writeln!(writer, "axis rule: ok")?,
                Err(violation) => writeln!(writer, "axis rule: broken: {violation}")?,
            }
            render_nodes(&insert.tree.nodes, &mut writer)?;
        }
        ExecutionSummary::Query(query) => {
            writeln!(writer, "source: {}", query.source)?;
            if let Some(workers) = query.workers {
                writeln!(writer, "workers: {workers}")?;
            }
            match query.outcome.predicted_label() {
                Some(label) => writeln!(writer, "predicted label: {label}")?,
                None => writeln!(writer, "predicted label: none")?,
            }
            for neighbour in query.outcome.neighbours() {
                writeln!(
                    writer,
                    "{}\t{}\t{}",
                    neighbour.ordinal, neighbour.label, neighbour.distance
                )?;
            }
        }
    }
    Ok(())
}

fn render_tree_header(tree: &TreeSummary, mut writer: impl Write) -> io::Result<()> {
    writeln!(writer, "source: {}", tree.source)?;
    writeln!(writer, "points: {}", tree.points)?;
    writeln!(writer, "dimensions: {}", tree.dimensions)?;
    writeln!(writer, "height: {}", tree.height)
}

/// Writes one `depth<TAB>ordinal<TAB>features<TAB>label` row per node, with
/// features comma-separated as in the input format.
fn render_nodes(nodes: &[NodeLine], mut writer: impl Write) -> io::Result<()> {
    for node in nodes {
        let features = node
            .features
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(",");
        writeln!(
            writer,
            "{}\t{}\t{}\t{}",
            node.depth, node.ordinal, features, node.label
        )?;
    }
    Ok(())
}
