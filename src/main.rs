use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand, ValueEnum};
use flatshape::model::AnnotationPriority;
use flatshape::reconcile::MergePolicy;
use flatshape::{Result, ToolError, TraversalConfig, sync};
use tracing_subscriber::EnvFilter;

fn main() {
    let cli = Cli::parse();
    if let Err(error) = init_tracing(cli.verbose).and_then(|()| run(cli)) {
        eprintln!("error: {error}");
        std::process::exit(1);
    }
}

fn init_tracing(verbose: bool) -> Result<()> {
    let default_level = if verbose { "debug" } else { "warn" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|error| ToolError::Logging(error.to_string()))
}

fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Command::Export(args) => {
            ensure_exists(&args.input)?;
            let config = args.traversal.to_config();
            sync::json_to_excel(
                &args.input,
                &args.output,
                args.baseline.as_deref(),
                args.write_headers.as_deref(),
                &config,
            )?;
            Ok(())
        }
        Command::Import(args) => {
            ensure_exists(&args.input)?;
            let config = TraversalConfig::default();
            sync::excel_to_json(&args.input, &args.output, args.sheet.as_deref(), &config)
        }
        Command::Merge(args) => {
            ensure_exists(&args.baseline)?;
            ensure_exists(&args.candidate)?;
            let policy = args.policy.into();
            sync::merge_header_files(&args.baseline, &args.candidate, &args.output, policy)?;
            Ok(())
        }
        Command::Shape(args) => {
            ensure_exists(&args.input)?;
            let fields = sync::describe_shape(&args.input, &args.traversal.to_config())?;
            println!("{}", serde_json::to_string_pretty(&fields)?);
            Ok(())
        }
    }
}

fn ensure_exists(path: &Path) -> Result<()> {
    if path.exists() {
        Ok(())
    } else {
        Err(ToolError::MissingInput(path.to_path_buf()))
    }
}

#[derive(Parser)]
#[command(
    author,
    version,
    about = "Flatten nested records into aligned spreadsheet tables and back."
)]
struct Cli {
    /// Log at debug level unless RUST_LOG is set.
    #[arg(long, short, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Flatten JSON records into an Excel table.
    Export(ExportArgs),
    /// Read an Excel table back into JSON objects of text values.
    Import(ImportArgs),
    /// Merge two header lists stored as JSON arrays.
    Merge(MergeArgs),
    /// Print the field list shared by the records in a JSON file.
    Shape(ShapeArgs),
}

#[derive(clap::Args)]
struct TraversalArgs {
    /// Annotation namespaces in priority order.
    #[arg(long, value_delimiter = ',', default_value = "json,url,xml")]
    annotations: Vec<String>,

    /// Skip absent optional branches instead of expanding their shape.
    #[arg(long)]
    exclude_absent: bool,

    /// Text written for values that were never populated.
    #[arg(long, default_value = flatshape::config::ABSENT_MARKER)]
    absent_marker: String,
}

impl TraversalArgs {
    fn to_config(&self) -> TraversalConfig {
        TraversalConfig::default()
            .priority(AnnotationPriority::new(self.annotations.iter().cloned()))
            .exclude_absent(self.exclude_absent)
            .absent_marker(self.absent_marker.clone())
    }
}

#[derive(clap::Args)]
struct ExportArgs {
    /// JSON, JSON array, or newline-delimited JSON input.
    #[arg(long)]
    input: PathBuf,

    /// Output workbook path.
    #[arg(long)]
    output: PathBuf,

    /// Previously published header list to keep column order stable.
    #[arg(long)]
    baseline: Option<PathBuf>,

    /// Where to write the header list that was used.
    #[arg(long)]
    write_headers: Option<PathBuf>,

    #[command(flatten)]
    traversal: TraversalArgs,
}

#[derive(clap::Args)]
struct ImportArgs {
    /// Input workbook path.
    #[arg(long)]
    input: PathBuf,

    /// Output JSON path.
    #[arg(long)]
    output: PathBuf,

    /// Worksheet to read; defaults to the first one.
    #[arg(long)]
    sheet: Option<String>,
}

#[derive(clap::Args)]
struct MergeArgs {
    #[arg(long)]
    baseline: PathBuf,

    #[arg(long)]
    candidate: PathBuf,

    #[arg(long)]
    output: PathBuf,

    #[arg(long, value_enum, default_value_t = PolicyKind::External)]
    policy: PolicyKind,
}

#[derive(clap::Args)]
struct ShapeArgs {
    #[arg(long)]
    input: PathBuf,

    #[command(flatten)]
    traversal: TraversalArgs,
}

#[derive(Copy, Clone, Debug, ValueEnum)]
enum PolicyKind {
    External,
    ShapeUnion,
}

impl From<PolicyKind> for MergePolicy {
    fn from(kind: PolicyKind) -> Self {
        match kind {
            PolicyKind::External => MergePolicy::External,
            PolicyKind::ShapeUnion => MergePolicy::ShapeUnion,
        }
    }
}
