mod output;
mod repl;

use anyhow::{Context, Result, bail};
use clap::{Args, Parser, Subcommand};
use cypherlite_query::{ExecutionOptions, PreparedQuery, prepare};
use cypherlite_storage::MemGraph;
use output::OutputFormat;
use std::io::Write;
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "cypherlite", version, arg_required_else_help = true)]
struct Cli {
    /// Log filter used when RUST_LOG is unset (e.g. `debug`, `cypherlite_query=trace`)
    #[arg(long, global = true, default_value = "warn")]
    log_level: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run one query and print its rows
    Query(QueryArgs),
    /// Interactive shell over a single in-memory graph
    Repl(ReplArgs),
}

#[derive(Args, Clone, Copy, Debug, Default)]
struct LimitArgs {
    /// Refuse MATCH queries binding more than this many variables
    #[arg(long)]
    max_variables: Option<usize>,

    /// Refuse MATCH queries over graphs with more than this many nodes
    #[arg(long)]
    max_domain_size: Option<usize>,
}

impl LimitArgs {
    fn options(self) -> ExecutionOptions {
        ExecutionOptions {
            max_variables: self.max_variables,
            max_domain_size: self.max_domain_size,
        }
    }
}

#[derive(Args)]
struct QueryArgs {
    /// Query text
    #[arg(long, conflicts_with = "file")]
    cypher: Option<String>,

    /// Read the query from a file
    #[arg(long)]
    file: Option<PathBuf>,

    /// JSON graph fixture to load first; the graph starts empty otherwise
    #[arg(long)]
    graph: Option<PathBuf>,

    #[arg(long, value_enum, default_value = "ndjson")]
    format: OutputFormat,

    #[command(flatten)]
    limits: LimitArgs,
}

#[derive(Args)]
struct ReplArgs {
    /// JSON graph fixture to load first; the graph starts empty otherwise
    #[arg(long)]
    graph: Option<PathBuf>,

    #[arg(long, value_enum, default_value = "table")]
    format: OutputFormat,

    #[command(flatten)]
    limits: LimitArgs,
}

fn init_logging(level: &str) {
    use tracing_subscriber::{EnvFilter, fmt, prelude::*};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn load_graph(path: Option<&Path>) -> Result<MemGraph> {
    match path {
        Some(path) => {
            let graph = MemGraph::from_json_file(path)
                .with_context(|| format!("failed to load graph fixture {}", path.display()))?;
            tracing::info!(
                nodes = graph.node_count(),
                edges = graph.edge_count(),
                path = %path.display(),
                "loaded graph fixture"
            );
            Ok(graph)
        }
        None => Ok(MemGraph::new()),
    }
}

fn read_query(args: &QueryArgs) -> Result<String> {
    if let Some(query) = args.cypher.as_ref() {
        return Ok(query.clone());
    }
    let Some(path) = args.file.as_ref() else {
        bail!("either --cypher or --file is required");
    };
    std::fs::read_to_string(path)
        .with_context(|| format!("failed to read query file {}", path.display()))
}

/// Runs a prepared query and writes its rows. A CREATE writes its single row.
pub(crate) fn execute<W: Write>(
    query: &PreparedQuery,
    graph: &mut MemGraph,
    options: ExecutionOptions,
    format: OutputFormat,
    out: &mut W,
) -> Result<usize> {
    let columns = query.columns();
    if query.is_write() {
        let row = query.execute_write(graph).context("CREATE failed")?;
        return output::write_rows(out, format, &columns, [Ok(row)]);
    }
    let rows = query.execute_streaming_with(&*graph, options);
    output::write_rows(out, format, &columns, rows)
}

fn run_query(args: QueryArgs) -> Result<()> {
    let text = read_query(&args)?;
    let mut graph = load_graph(args.graph.as_deref())?;
    let query = prepare(&text).context("failed to parse query")?;

    let mut stdout = std::io::stdout().lock();
    execute(&query, &mut graph, args.limits.options(), args.format, &mut stdout)?;
    stdout.flush()?;
    Ok(())
}

fn main() {
    let cli = Cli::parse();
    init_logging(&cli.log_level);

    let result = match cli.command {
        Commands::Query(args) => run_query(args),
        Commands::Repl(args) => load_graph(args.graph.as_deref())
            .and_then(|graph| repl::run_repl(graph, args.limits.options(), args.format)),
    };

    if let Err(err) = result {
        eprintln!("{err:#}");
        std::process::exit(1);
    }
}
