use std::path::{Path, PathBuf};
use std::sync::Arc;

use clap::{Args, Parser, Subcommand};
use fsnodes_adapters::builtin_registry;
use fsnodes_core::{Config, LogCrateSink, NodeContext, NodeError, NodeOutput, NodeRegistry};
use log::{debug, info, warn};
use serde_json::json;
use thiserror::Error;
use tracing_subscriber::EnvFilter;

fn main() {
    if let Err(err) = run() {
        eprintln!("Error: {err}");
        std::process::exit(1);
    }
}

fn run() -> Result<(), CliError> {
    let cli = Cli::parse();
    init_logging();

    let registry = builtin_registry();
    match cli.command {
        Command::List => handle_list(&registry),
        Command::Schema(args) => handle_schema(&registry, args),
        Command::Run(args) => handle_run(&registry, &cli.config, args),
    }
}

fn init_logging() {
    // Read before the filter so `.env` can set RUST_LOG.
    let dotenv = dotenvy::dotenv();
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    // Keeps an already-installed subscriber.
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();

    match dotenv {
        Ok(path) => debug!("loaded environment from {}", path.display()),
        Err(err) if err.not_found() => debug!("no .env file found"),
        Err(err) => warn!("failed to load .env: {err}"),
    }
}

fn handle_list(registry: &NodeRegistry) -> Result<(), CliError> {
    for metadata in registry.metadata() {
        println!(
            "{:<32} {:<40} {}",
            metadata.id, metadata.display_name, metadata.category
        );
    }
    Ok(())
}

fn handle_schema(registry: &NodeRegistry, args: SchemaArgs) -> Result<(), CliError> {
    let node = registry.create(&args.id)?;
    let document = json!({
        "node": node.metadata(),
        "inputs": node.input_schema(),
    });
    println!("{}", serde_json::to_string_pretty(&document)?);
    Ok(())
}

fn handle_run(registry: &NodeRegistry, config_path: &Path, args: RunArgs) -> Result<(), CliError> {
    let node = registry.create(&args.id)?;
    let schema = node.input_schema();

    let mut raw = schema.widget_defaults();
    for pair in &args.inputs {
        let (name, value) = split_input(pair)?;
        let spec = schema
            .find(name)
            .ok_or_else(|| CliError::UnknownInput {
                node: args.id.clone(),
                name: name.to_string(),
            })?;
        raw.insert(name.to_string(), spec.kind.parse_literal(name, value)?);
    }

    let config = load_config(config_path)?;
    let ctx = NodeContext::new(config, Arc::new(LogCrateSink::new("fsnodes")));

    info!("running node {}", args.id);
    let output = node.run(&ctx, &raw)?;
    print_output(&output);
    Ok(())
}

fn load_config(path: &Path) -> Result<Config, CliError> {
    load_config_with(path, |name| std::env::var(name).ok())
}

fn load_config_with<F>(path: &Path, lookup: F) -> Result<Config, CliError>
where
    F: Fn(&str) -> Option<String>,
{
    let mut config = if path.exists() {
        Config::from_path(path)?
    } else {
        debug!("config file {} not found, using defaults", path.display());
        Config::new()
    };
    config.apply_env(lookup);
    Ok(config)
}

fn split_input(pair: &str) -> Result<(&str, &str), CliError> {
    match pair.split_once('=') {
        Some((name, value)) if !name.trim().is_empty() => Ok((name.trim(), value)),
        _ => Err(CliError::MalformedInput(pair.to_string())),
    }
}

fn print_output(output: &NodeOutput) {
    match output {
        NodeOutput::Empty => info!("node produced no output"),
        other => println!("{other}"),
    }
}

#[derive(Debug, Error)]
enum CliError {
    #[error("config error: {0}")]
    Config(#[from] fsnodes_core::ConfigError),
    #[error("{0}")]
    Node(#[from] NodeError),
    #[error("input must look like key=value, got `{0}`")]
    MalformedInput(String),
    #[error("node `{node}` has no input named `{name}`")]
    UnknownInput { node: String, name: String },
    #[error("failed to encode schema: {0}")]
    Json(#[from] serde_json::Error),
}

#[derive(Parser)]
#[command(name = "fsnodes", version, about = "Run external-call nodes from the command line")]
struct Cli {
    /// Path to the JSON config file; missing files fall back to defaults
    #[arg(long, global = true, default_value = "fsnodes.json")]
    config: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// List every registered node
    List,
    /// Print a node's inputs and output as JSON
    Schema(SchemaArgs),
    /// Run one node
    Run(RunArgs),
}

#[derive(Args)]
struct SchemaArgs {
    /// Node id, as printed by `list`
    id: String,
}

#[derive(Args)]
struct RunArgs {
    /// Node id, as printed by `list`
    id: String,
    /// Input override, repeatable
    #[arg(long = "input", short = 'i', value_name = "KEY=VALUE")]
    inputs: Vec<String>,
}
