//! sassdoc — extract documentation records from annotated SCSS sources.
//!
//! Two modes:
//!
//! - **file mode**: `sassdoc src/ "lib/**/*.scss" -o data.json`
//! - **stdin mode**: `sassdoc < _mixins.scss` parses a single stream
//!
//! Records are written as a pretty-printed JSON array, sorted by group,
//! kind and name. Warnings go to stderr.

use anyhow::{Context, Result};
use clap::Parser;
use sassdoc_core::{Config, Options, SourceUnit};
use std::fs;
use std::io::{self, Read};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(
    name = "sassdoc",
    about = "Extract documentation data from SCSS doc comments"
)]
struct Cli {
    /// Source files, directories or glob patterns. If omitted, reads stdin.
    sources: Vec<String>,

    /// Write JSON here instead of stdout
    #[arg(short = 'o', long)]
    output: Option<PathBuf>,

    /// JSON file with parser options (camelCase keys)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Keep comments that document no declaration
    #[arg(long)]
    include_unknown: bool,

    /// Group for items without `@group`
    #[arg(long)]
    default_group: Option<String>,

    /// Language of `@example` blocks that name none
    #[arg(long)]
    example_type: Option<String>,

    /// Regex marking names as private by default
    #[arg(long)]
    private_prefix: Option<String>,

    /// Log debug output to stderr
    #[arg(short = 'v', long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let options = load_options(&cli)?;
    let config = Config::with_options(options);

    let records = if cli.sources.is_empty() {
        stdin_mode(config).await?
    } else {
        sassdoc_core::parse(&cli.sources, config)
            .await
            .context("failed to parse sources")?
    };

    tracing::debug!(records = records.len(), "writing output");
    let json = serde_json::to_string_pretty(&records).context("failed to serialize records")?;
    match &cli.output {
        Some(path) => fs::write(path, format!("{json}\n"))
            .with_context(|| format!("failed to write {}", path.display()))?,
        None => println!("{json}"),
    }
    Ok(())
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default)),
        )
        .with_writer(io::stderr)
        .with_target(false)
        .init();
}

/// Options from `--config`, then overridden by any flag given.
fn load_options(cli: &Cli) -> Result<Options> {
    let mut options = match &cli.config {
        Some(path) => {
            let raw = fs::read_to_string(path)
                .with_context(|| format!("failed to read config: {}", path.display()))?;
            serde_json::from_str(&raw)
                .with_context(|| format!("invalid config: {}", path.display()))?
        }
        None => Options::default(),
    };

    if cli.include_unknown {
        options.include_unknown_contexts = true;
    }
    if let Some(group) = &cli.default_group {
        options.default_group = group.clone();
    }
    if let Some(kind) = &cli.example_type {
        options.example_type = kind.clone();
    }
    if let Some(prefix) = &cli.private_prefix {
        options.private_prefix = prefix.clone();
    }
    Ok(options)
}

/// stdin mode: one unit named `stdin`, fed through the stream directly.
async fn stdin_mode(config: Config) -> Result<Vec<sassdoc_core::DocumentationRecord>> {
    let mut input = String::new();
    io::stdin()
        .read_to_string(&mut input)
        .context("failed to read stdin")?;

    let parser = sassdoc_core::Parser::new(config)?;
    let mut stream = parser.stream();
    stream.feed(SourceUnit::new("stdin", input));
    let records = stream.finish().await.context("failed to parse stdin")?;
    Ok(sassdoc_core::sort(records))
}
