use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use cljscope_analyzer::{Analyzer, AnalyzerConfig, DestructuringKind, Direction};
use cljscope_graph::GraphBuilder;
use std::path::PathBuf;

mod commands;
mod input;
mod response;

use response::CommandResponse;

#[derive(Parser)]
#[command(name = "cljscope")]
#[command(about = "Structural analysis of Clojure source", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Quiet mode: log only warnings/errors (stdout is reserved for JSON)
    #[arg(long, global = true)]
    quiet: bool,

    /// Pretty-print JSON response
    #[arg(long, global = true)]
    pretty: bool,

    /// TOML file with analyzer limits and thresholds
    #[arg(long, global = true, conflicts_with = "preset")]
    config: Option<PathBuf>,

    /// Built-in threshold preset
    #[arg(long, global = true, value_enum)]
    preset: Option<Preset>,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum Preset {
    Default,
    Strict,
    Lenient,
}

impl Preset {
    fn config(self) -> AnalyzerConfig {
        match self {
            Self::Default => AnalyzerConfig::default(),
            Self::Strict => AnalyzerConfig::strict(),
            Self::Lenient => AnalyzerConfig::lenient(),
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// List `defn`/`defn-` definitions
    Functions(FilteredArgs),

    /// List `defmacro` definitions and threading macro usages
    Macros(MacrosArgs),

    /// List `ns` declarations with their requires and imports
    Namespaces(SourceArgs),

    /// List every require/import entry with its namespace
    Deps(SourceArgs),

    /// List protocols, types, records and their implementations
    Protocols(ProtocolsArgs),

    /// List map and sequential destructuring patterns
    Destructuring(DestructuringArgs),

    /// List core.async usage
    Async(AsyncArgs),

    /// List reference-type and other state operations
    State(StateArgs),

    /// Inspect the form under a cursor position
    At(AtArgs),

    /// Trace the call graph between functions
    Calls(CallsArgs),

    /// Analyze dependencies between namespaces
    #[command(name = "ns-graph")]
    NsGraph(NsGraphArgs),

    /// Detect idioms and summarize every pattern classifier
    Idioms(IdiomsArgs),
}

#[derive(Args)]
struct SourceArgs {
    /// Clojure source file, or `-` to read stdin
    source: PathBuf,
}

#[derive(Args)]
struct FilteredArgs {
    #[command(flatten)]
    input: SourceArgs,

    /// Exact name to match
    #[arg(long, conflicts_with = "pattern")]
    name: Option<String>,

    /// Regular expression searched in names
    #[arg(long)]
    pattern: Option<String>,
}

#[derive(Args)]
struct MacrosArgs {
    #[command(flatten)]
    filter: FilteredArgs,

    /// Only report `->`, `->>`, `some->` and the other threading usages
    #[arg(long, conflicts_with_all = ["name", "pattern"])]
    threading_only: bool,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum TypeView {
    All,
    Protocols,
    Types,
}

#[derive(Args)]
struct ProtocolsArgs {
    #[command(flatten)]
    filter: FilteredArgs,

    #[arg(long, value_enum, default_value = "all")]
    only: TypeView,
}

#[derive(Args)]
struct DestructuringArgs {
    #[command(flatten)]
    input: SourceArgs,

    /// `map` or `vector`
    #[arg(long, value_parser = parse_destructuring_kind, conflicts_with = "summary")]
    kind: Option<DestructuringKind>,

    /// Print totals instead of the individual patterns
    #[arg(long)]
    summary: bool,
}

fn parse_destructuring_kind(value: &str) -> std::result::Result<DestructuringKind, String> {
    DestructuringKind::parse(value).ok_or_else(|| format!("unknown destructuring kind: {value}"))
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum AsyncView {
    All,
    GoBlocks,
    Channels,
    Summary,
}

#[derive(Args)]
struct AsyncArgs {
    #[command(flatten)]
    input: SourceArgs,

    /// Regular expression matched against the pattern type (`all` view only)
    #[arg(long)]
    pattern: Option<String>,

    #[arg(long, value_enum, default_value = "all")]
    view: AsyncView,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum StateView {
    All,
    Atoms,
    Mutations,
    Summary,
}

#[derive(Args)]
struct StateArgs {
    #[command(flatten)]
    input: SourceArgs,

    /// Regular expression matched against the pattern type (`all` view only)
    #[arg(long)]
    pattern: Option<String>,

    #[arg(long, value_enum, default_value = "all")]
    view: StateView,
}

#[derive(Args)]
struct AtArgs {
    #[command(flatten)]
    input: SourceArgs,

    /// 1-based line
    #[arg(long)]
    line: usize,

    /// 0-based column
    #[arg(long)]
    column: usize,

    /// Only locate the innermost form
    #[arg(long, conflicts_with_all = ["navigate", "matching"])]
    form: bool,

    /// Move from the innermost form: next, prev, up, down or top
    #[arg(long, conflicts_with = "matching")]
    navigate: Option<Direction>,

    /// Find the partner of the delimiter under the cursor
    #[arg(long)]
    matching: bool,
}

#[derive(Args)]
struct CallsArgs {
    #[command(flatten)]
    input: SourceArgs,

    /// Function to analyze in detail
    #[arg(long)]
    function: Option<String>,

    /// Print only the target analysis
    #[arg(long, requires = "function")]
    dependencies_only: bool,
}

#[derive(Args)]
struct NsGraphArgs {
    #[command(flatten)]
    input: SourceArgs,

    /// Namespace to analyze in detail
    #[arg(long)]
    namespace: Option<String>,

    /// Print the dependency tree rooted at the namespace
    #[arg(long, requires = "namespace")]
    tree: bool,
}

#[derive(Args)]
struct IdiomsArgs {
    #[command(flatten)]
    input: SourceArgs,

    /// Case-insensitive text matched against idiom types and descriptions
    #[arg(long)]
    filter: Option<String>,
}

impl Commands {
    fn source(&self) -> &PathBuf {
        let input = match self {
            Self::Functions(args) => &args.input,
            Self::Macros(args) => &args.filter.input,
            Self::Protocols(args) => &args.filter.input,
            Self::Namespaces(args) | Self::Deps(args) => args,
            Self::Destructuring(args) => &args.input,
            Self::Async(args) => &args.input,
            Self::State(args) => &args.input,
            Self::At(args) => &args.input,
            Self::Calls(args) => &args.input,
            Self::NsGraph(args) => &args.input,
            Self::Idioms(args) => &args.input,
        };
        &input.source
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut builder =
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"));
    if cli.quiet {
        builder.filter_level(log::LevelFilter::Warn);
    } else if cli.verbose {
        builder.filter_level(log::LevelFilter::Debug);
    }
    builder.target(env_logger::Target::Stderr).init();

    let config = match (&cli.config, cli.preset) {
        (Some(path), _) => input::load_config(path)?,
        (None, Some(preset)) => preset.config(),
        (None, None) => AnalyzerConfig::default(),
    };
    let analyzer = Analyzer::with_config(config).context("Failed to initialise the Clojure analyzer")?;
    let graphs = GraphBuilder::with_analyzer(analyzer);

    let code = input::read_source(cli.command.source())?;
    let response = match commands::execute(&cli.command, &code, &graphs) {
        Ok(resp) => resp,
        Err(err) => CommandResponse::error(format!("{err:#}")),
    };

    let output = if cli.pretty {
        serde_json::to_string_pretty(&response)?
    } else {
        serde_json::to_string(&response)?
    };
    println!("{output}");

    if !response.is_ok() {
        std::process::exit(1);
    }
    Ok(())
}
