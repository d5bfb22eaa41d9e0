use std::{path::PathBuf, process::ExitCode, sync::Arc, time::Duration, time::Instant};

use clap::{CommandFactory, Parser};
use densegraph::{
    DenseGraphError, EdgeDensity, EngineConfig, GraphEngine, GraphMode, RecordingSink,
    TelemetrySink, TracingSink,
};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(
    name = "densegraph",
    about = "Generate dense graphs, persist them as fixed-width matrices and compute parallel BFS parent arrays"
)]
struct Cli {
    /// Graph vertices
    #[arg(short = 'v', long, default_value_t = 0)]
    vertices: usize,

    /// Threads (0 to use all cpu cores)
    #[arg(short = 't', long, default_value_t = 0)]
    threads: usize,

    /// Graph density in percent (0-100)
    #[arg(short = 'd', long, default_value_t = 20)]
    density: u8,

    /// Run quietly
    #[arg(short = 'q', long)]
    quiet: bool,

    /// Log per-worker progress
    #[arg(long, conflicts_with = "quiet")]
    verbose: bool,

    /// Generate graph only
    #[arg(short = 'g', long)]
    generate: bool,

    /// Read graph from file
    #[arg(short = 'i', long = "input")]
    input: Option<PathBuf>,

    /// Output file base name
    #[arg(short = 'o', long = "output", default_value = "graph.out")]
    output: String,

    /// Generate a symmetric graph with a true diagonal
    #[arg(long)]
    undirected: bool,

    /// Base seed for the per-worker generators
    #[arg(long)]
    seed: Option<u64>,

    /// Abort a BFS level whose workers do not finish within this many milliseconds
    #[arg(long = "round-timeout-ms")]
    round_timeout_ms: Option<u64>,

    /// Print phase timings as JSON on stdout
    #[arg(long)]
    report: bool,
}

#[derive(Clone, Debug, PartialEq, Eq)]
enum Plan {
    GenerateOnly,
    GenerateAndTraverse,
    LoadAndTraverse(PathBuf),
    Help,
}

impl Cli {
    fn plan(&self) -> Result<Plan, DenseGraphError> {
        match (&self.input, self.generate, self.vertices) {
            (Some(_), true, _) => Err(DenseGraphError::config(
                "-g generates a new graph and cannot be combined with -i",
            )),
            (Some(_), false, v) if v > 0 => Err(DenseGraphError::config(
                "-v and -i are mutually exclusive",
            )),
            (Some(path), false, _) => Ok(Plan::LoadAndTraverse(path.clone())),
            (None, true, 0) => Err(DenseGraphError::config("-g requires -v N with N > 0")),
            (None, true, _) => Ok(Plan::GenerateOnly),
            (None, false, 0) => Ok(Plan::Help),
            (None, false, _) => Ok(Plan::GenerateAndTraverse),
        }
    }

    fn engine_config(&self) -> Result<EngineConfig, DenseGraphError> {
        let mode = if self.undirected {
            GraphMode::Undirected
        } else {
            GraphMode::Directed
        };
        let mut config = EngineConfig::new(self.vertices)
            .with_threads(self.threads)
            .with_density(EdgeDensity::from_percent(self.density)?)
            .with_mode(mode);
        if let Some(seed) = self.seed {
            config = config.with_seed(seed);
        }
        if let Some(ms) = self.round_timeout_ms {
            config = config.with_round_timeout(Duration::from_millis(ms));
        }
        config.validate()?;
        Ok(config)
    }

    fn graph_path(&self) -> PathBuf {
        PathBuf::from(format!("{}.graph", self.output))
    }

    fn parent_path(&self) -> PathBuf {
        PathBuf::from(format!("{}.parent", self.output))
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(&cli);
    let started = Instant::now();

    let (plan, config) = match cli.plan().and_then(|plan| Ok((plan, cli.engine_config()?))) {
        Ok(parsed) => parsed,
        Err(err) => {
            eprintln!("error: {err}");
            return ExitCode::from(2);
        }
    };
    if plan == Plan::Help {
        return match Cli::command().print_help() {
            Ok(()) => ExitCode::SUCCESS,
            Err(err) => {
                eprintln!("cannot print help: {err}");
                ExitCode::FAILURE
            }
        };
    }

    let recorder = Arc::new(RecordingSink::new());
    let telemetry: Arc<dyn TelemetrySink> = if cli.report {
        recorder.clone()
    } else {
        Arc::new(TracingSink)
    };
    let engine = match GraphEngine::new(config) {
        Ok(engine) => engine.with_telemetry(telemetry),
        Err(err) => {
            eprintln!("error: {err}");
            return ExitCode::from(2);
        }
    };
    if let Err(err) = run(&engine, &cli, &plan) {
        eprintln!("command failed: {err}");
        return ExitCode::FAILURE;
    }
    if cli.report {
        match recorder.to_json() {
            Ok(json) => println!("{json}"),
            Err(err) => {
                eprintln!("cannot render report: {err}");
                return ExitCode::FAILURE;
            }
        }
    }
    info!(elapsed = ?started.elapsed(), "program execution finished");
    ExitCode::SUCCESS
}

fn run(engine: &GraphEngine, cli: &Cli, plan: &Plan) -> Result<(), DenseGraphError> {
    info!(
        threads = engine.config().threads,
        vertices = engine.config().vertices,
        density = engine.config().density.percent(),
        "starting"
    );
    match plan {
        Plan::GenerateOnly => {
            let graph = engine.generate()?;
            engine.save_graph(&graph, cli.graph_path())
        }
        Plan::GenerateAndTraverse => {
            let graph = engine.generate()?;
            engine.save_graph(&graph, cli.graph_path())?;
            let parents = engine.traverse(&graph)?;
            engine.save_parents(&parents, cli.parent_path())
        }
        Plan::LoadAndTraverse(input) => {
            let graph = engine.load_graph(input)?;
            let parents = engine.traverse(&graph)?;
            engine.save_parents(&parents, cli.parent_path())
        }
        Plan::Help => Ok(()),
    }
}

fn init_tracing(cli: &Cli) {
    let default_level = if cli.quiet {
        "warn"
    } else if cli.verbose {
        "debug"
    } else {
        "info"
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    if let Err(err) = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init()
    {
        eprintln!("logging disabled: {err}");
    }
}
