//! # projcraft CLI
//!
//! Generate a small project from a one-line request.
//!
//! Usage:
//!   projcraft run <request...>
//!   projcraft list
//!   projcraft delete <path>
//!
//! Examples:
//!   projcraft run "a todo app with a web page"
//!   projcraft run --provider anthropic --max-iterations 3 "simple calculator"
//!   projcraft run --provider local --base-url http://localhost:8000/v1 --model qwen2.5 "url shortener"
//!   projcraft list --workspace out

use anyhow::Context;
use clap::{Parser, Subcommand};
use projcraft_agent::{Pipeline, PipelineConfig, PipelineOutcome};
use projcraft_runtime::{AnyProvider, ProviderConfig, ProviderType, RateLimiter, Workspace};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "projcraft")]
#[command(author, version, about = "projcraft - turn a one-line request into a runnable project")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Verbose logging (debug)
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Quiet mode - warnings only, print just the result
    #[arg(short, long, global = true)]
    quiet: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate a project
    Run {
        /// The request, e.g. "a todo app with a web page"
        #[arg(trailing_var_arg = true, required = true)]
        request: Vec<String>,

        /// Upper bound on develop/review/test/score iterations
        #[arg(short, long)]
        max_iterations: Option<u32>,

        /// Directory generated files are written to
        #[arg(short, long, default_value = "workspace")]
        workspace: String,

        /// Model backend: openai, anthropic, gemini or local
        #[arg(short, long, default_value = "gemini")]
        provider: ProviderType,

        /// Model name, overriding the provider default
        #[arg(long)]
        model: Option<String>,

        /// Base URL, overriding the provider default
        #[arg(long)]
        base_url: Option<String>,

        /// Pipeline configuration (TOML)
        #[arg(short, long)]
        config: Option<String>,

        /// Print the outcome as JSON
        #[arg(long)]
        json: bool,
    },
    /// List workspace files
    List {
        #[arg(short, long, default_value = "workspace")]
        workspace: String,
    },
    /// Delete a workspace file
    Delete {
        /// Workspace-relative path
        path: String,

        #[arg(short, long, default_value = "workspace")]
        workspace: String,
    },
}

fn init_tracing(verbose: bool, quiet: bool) {
    let default = if verbose {
        "debug"
    } else if quiet {
        "warn"
    } else {
        "info"
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt().with_env_filter(filter).with_target(false).init();
}

struct RunArgs {
    request: String,
    max_iterations: Option<u32>,
    workspace: String,
    provider: ProviderType,
    model: Option<String>,
    base_url: Option<String>,
    config: Option<String>,
    json: bool,
}

async fn run_pipeline(args: RunArgs, quiet: bool) -> anyhow::Result<bool> {
    let mut config = match &args.config {
        Some(path) => PipelineConfig::load(path)?,
        None => PipelineConfig::default(),
    };
    if let Some(max) = args.max_iterations {
        config = config.with_max_iterations(max);
    }

    let mut provider_config = ProviderConfig::from_env(args.provider)?;
    if let Some(model) = args.model {
        provider_config = provider_config.with_model(model);
    }
    if let Some(url) = args.base_url {
        provider_config = provider_config.with_base_url(url);
    }
    let provider = AnyProvider::from_config(provider_config).map_err(|e| e.into_error())?;

    let limiter = RateLimiter::shared(config.min_call_interval());
    let workspace = Workspace::dir(&args.workspace)?;
    let mut pipeline = Pipeline::with_provider(provider, limiter, workspace, config)?;

    let cancel = CancellationToken::new();
    let on_interrupt = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("interrupt received, stopping after the current stage");
            on_interrupt.cancel();
        }
    });

    info!(request = %args.request, workspace = %args.workspace, "generating project");
    let outcome = pipeline.run_with_cancel(&args.request, cancel).await;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&outcome).context("serializing outcome")?);
    } else {
        print_outcome(&outcome, &args.workspace, quiet);
    }
    Ok(outcome.is_success())
}

fn print_outcome(outcome: &PipelineOutcome, workspace: &str, quiet: bool) {
    println!("{}", outcome.message);
    if !outcome.is_success() {
        for error in &outcome.errors {
            eprintln!("  error: {}", error);
        }
        return;
    }

    println!();
    println!("Files ({} in {}):", outcome.artifacts.len(), workspace);
    for artifact in &outcome.artifacts {
        println!("  {:<40} {:>10} {:>7} bytes", artifact.path, artifact.file_type.as_str(), artifact.size);
    }

    if quiet {
        return;
    }

    println!();
    println!("Project type: {}", outcome.project_type);
    println!(
        "Quality: {:.1} (roles {:.0}, domain {:.0}, volume {:.0}, docs {:.0})",
        outcome.quality_score,
        outcome.breakdown.roles,
        outcome.breakdown.domain,
        outcome.breakdown.volume,
        outcome.breakdown.documentation
    );
    let history: Vec<String> = outcome.score_history.iter().map(|s| format!("{:.0}", s)).collect();
    println!("Iterations: {} (scores {})", outcome.iterations_run, history.join(" -> "));
    if !outcome.dependencies.is_empty() {
        println!("Dependencies: {}", outcome.dependencies.join(", "));
    }
    if outcome.cancelled {
        println!("(cancelled; best result so far kept)");
    }

    println!();
    println!("{}", outcome.run_instructions);
}

fn list_files(workspace: &str) -> anyhow::Result<()> {
    let ws = Workspace::dir(workspace)?;
    let files = ws.list()?;
    if files.is_empty() {
        println!("(no files in {})", workspace);
    }
    for file in files {
        println!("{}", file);
    }
    Ok(())
}

fn delete_file(workspace: &str, path: &str) -> anyhow::Result<()> {
    let mut ws = Workspace::dir(workspace)?;
    ws.delete(path)?;
    println!("deleted {}", path);
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose, cli.quiet);

    match cli.command {
        Commands::Run {
            request,
            max_iterations,
            workspace,
            provider,
            model,
            base_url,
            config,
            json,
        } => {
            let args = RunArgs {
                request: request.join(" "),
                max_iterations,
                workspace,
                provider,
                model,
                base_url,
                config,
                json,
            };
            if !run_pipeline(args, cli.quiet).await? {
                std::process::exit(1);
            }
        }
        Commands::List { workspace } => list_files(&workspace)?,
        Commands::Delete { path, workspace } => delete_file(&workspace, &path)?,
    }
    Ok(())
}
