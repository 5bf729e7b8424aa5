//! `fn-history` command line: trace an entity through git history, list the
//! entities of a file, print the response schema.

use anyhow::{Context as AnyhowContext, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use fn_history_entity_locator::{EntityLocator, Language};
use fn_history_protocol::{
    response_schema, serialize_json, AnalyzeRequest, ErrorEnvelope, RequestedType,
};
use fn_history_timeline::{analyze_response, TimelineConfig};
use std::path::PathBuf;

mod render;

pub use render::{render_entities, render_history};

#[derive(Parser)]
#[command(name = "fn-history")]
#[command(about = "Show how a function, class, struct or other entity evolved across git history", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Quiet mode: log only warnings/errors (stdout is reserved for output)
    #[arg(short, long, global = true)]
    quiet: bool,

    /// TOML configuration file
    #[arg(long, global = true)]
    config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Trace an entity through the commits of one file
    ///
    ///   GitHub:    fn-history trace <github-file-url> <entity>
    ///   Local git: fn-history trace <repo> <file> <entity>
    Trace(TraceArgs),

    /// List the entities of a file in the working tree
    Entities(EntitiesArgs),

    /// Print the JSON schema of the trace response
    Schema,
}

#[derive(Args)]
struct TraceArgs {
    /// Local repository path or GitHub URL
    source: String,

    /// `[file] <entity>`; the file is optional when the URL points at one
    #[arg(num_args = 1..=2, required = true, value_name = "FILE ENTITY")]
    targets: Vec<String>,

    /// Entity type (auto-detected by default)
    #[arg(short = 't', long = "type", value_enum, default_value = "auto")]
    entity_type: TypeFlag,

    /// Emit the response as JSON
    #[arg(long)]
    json: bool,
}

#[derive(Args)]
struct EntitiesArgs {
    file: PathBuf,

    /// Emit JSON
    #[arg(long)]
    json: bool,
}

#[derive(Copy, Clone, ValueEnum)]
enum TypeFlag {
    Auto,
    Function,
    Class,
    Struct,
    Enum,
    Impl,
    Interface,
}

impl TypeFlag {
    const fn as_requested(self) -> RequestedType {
        match self {
            Self::Auto => RequestedType::Auto,
            Self::Function => RequestedType::Function,
            Self::Class => RequestedType::Class,
            Self::Struct => RequestedType::Struct,
            Self::Enum => RequestedType::Enum,
            Self::Impl => RequestedType::Impl,
            Self::Interface => RequestedType::Interface,
        }
    }
}

impl TraceArgs {
    fn to_request(&self) -> AnalyzeRequest {
        let (file_path, entity_name) = match self.targets.as_slice() {
            [file, entity] => (file.clone(), entity.clone()),
            [entity] => (String::new(), entity.clone()),
            _ => (String::new(), String::new()),
        };
        AnalyzeRequest {
            repository: self.source.clone(),
            file_path,
            entity_name,
            entity_type: self.entity_type.as_requested(),
        }
    }
}

fn load_config(path: Option<&PathBuf>) -> Result<TimelineConfig> {
    let config = match path {
        Some(path) => TimelineConfig::load(path)
            .with_context(|| format!("Failed to load config {}", path.display()))?,
        None => TimelineConfig::default(),
    }
    .with_env_overrides();
    config.validate().context("Invalid configuration")?;
    Ok(config)
}

fn fail(envelope: &ErrorEnvelope, json: bool) -> Result<()> {
    if json {
        println!("{}", serialize_json(envelope, true)?);
    } else {
        eprintln!("Error: {}", envelope.message);
        if let Some(hint) = &envelope.hint {
            eprintln!("Hint: {hint}");
        }
    }
    std::process::exit(1);
}

pub async fn main_entry() -> Result<()> {
    let mut cli = Cli::parse();

    let json_output = match &cli.command {
        Commands::Trace(args) => args.json,
        Commands::Entities(args) => args.json,
        Commands::Schema => true,
    };
    if json_output {
        cli.quiet = true;
    }

    let mut builder =
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"));
    if cli.quiet {
        builder.filter_level(log::LevelFilter::Warn);
    } else if cli.verbose {
        builder.filter_level(log::LevelFilter::Debug);
    }
    builder.target(env_logger::Target::Stderr).init();

    let config = load_config(cli.config.as_ref())?;

    match cli.command {
        Commands::Trace(args) => run_trace(args, &config).await?,
        Commands::Entities(args) => run_entities(args, &config)?,
        Commands::Schema => run_schema()?,
    }

    Ok(())
}

async fn run_trace(args: TraceArgs, config: &TimelineConfig) -> Result<()> {
    let request = args.to_request();
    log::debug!(
        "Tracing '{}' in {} ({})",
        request.entity_name,
        request.repository,
        if request.file_path.is_empty() {
            "path from URL"
        } else {
            request.file_path.as_str()
        }
    );

    match analyze_response(&request, config).await {
        Ok(response) if args.json => println!("{}", serialize_json(&response, true)?),
        Ok(response) => print!("{}", render_history(&response)),
        Err(err) => fail(&err.to_envelope(), args.json)?,
    }
    Ok(())
}

fn run_entities(args: EntitiesArgs, config: &TimelineConfig) -> Result<()> {
    let source = std::fs::read_to_string(&args.file)
        .with_context(|| format!("Failed to read {}", args.file.display()))?;
    let locator =
        EntityLocator::new(config.locator.clone()).context("Failed to build entity locator")?;
    let entities = locator.list_entities(&source, Language::from_path(&args.file));
    log::info!("{} entities in {}", entities.len(), args.file.display());

    if args.json {
        println!("{}", serialize_json(&entities, true)?);
    } else {
        print!("{}", render_entities(&entities));
    }
    Ok(())
}

fn run_schema() -> Result<()> {
    println!("{}", serialize_json(&response_schema(), true)?);
    Ok(())
}
