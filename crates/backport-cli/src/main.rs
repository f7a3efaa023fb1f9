//! Backport bot CLI
//!
//! The `backport` command inspects commit messages and drives backport pull
//! requests stored as JSON documents.
//!
//! ## Commands
//!
//! - `parse`: Parse a commit message into its structured form
//! - `normalize`: Print the canonical form of a commit message
//! - `resolve`: Find the commit a `Backport <hash>` title refers to
//! - `synthesize`: Preview the backport title and message
//! - `poll`: Run one reconciliation pass on a pull request
//! - `status`: Show where a pull request stands, without side effects

use anyhow::{bail, Context, Result};
use backport_core::{
    extract_reference, is_git_repo, parse, resolve, serialize, synthesize, BotConfig, Commit,
    Driver, GitHistory, GitPusher, JsonPullRequestStore, ReconciliationState, StoreReadiness,
    METRICS,
};
use clap::{Parser, Subcommand};
use std::io::Read;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{info, Level};

#[derive(Parser)]
#[command(name = "backport")]
#[command(author = "Stevedores Org")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Backport reconciliation bot", long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Emit JSON-formatted log lines
    #[arg(long, global = true)]
    json: bool,

    /// Configuration file (TOML)
    #[arg(short, long, global = true, env = "BACKPORT_CONFIG")]
    config: Option<PathBuf>,

    /// Repository mirror searched for original commits
    #[arg(long, global = true)]
    repo: Option<PathBuf>,

    /// Directory of pull request documents
    #[arg(long, global = true)]
    store: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Parse a commit message and print it as JSON
    Parse {
        /// Message file, or `-` for stdin
        #[arg(default_value = "-")]
        input: PathBuf,
    },

    /// Print the canonical serialization of a commit message
    Normalize {
        /// Message file, or `-` for stdin
        #[arg(default_value = "-")]
        input: PathBuf,
    },

    /// Resolve the commit referenced by a `Backport <hash>` title
    Resolve {
        /// Pull request title
        title: String,
    },

    /// Preview the title, status and message a backport would get
    Synthesize {
        /// Pull request title
        title: String,

        /// Approving reviewer (repeatable, in approval order)
        #[arg(short, long = "approver")]
        approvers: Vec<String>,
    },

    /// Run one reconciliation pass on a stored pull request
    Poll {
        /// Pull request id
        pr_id: String,
    },

    /// Show the state a pass would reach, without changing anything
    Status {
        /// Pull request id
        pr_id: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let level = if cli.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };
    backport_core::init_tracing(cli.json, level);

    let mut config =
        BotConfig::load(cli.config.as_deref()).context("Failed to load configuration")?;
    if let Some(repo) = cli.repo {
        config.repository = repo;
    }
    if let Some(store) = cli.store {
        config.store_dir = store;
    }

    match cli.command {
        Commands::Parse { input } => cmd_parse(&input),
        Commands::Normalize { input } => cmd_normalize(&input),
        Commands::Resolve { title } => cmd_resolve(&config, &title).await,
        Commands::Synthesize { title, approvers } => {
            cmd_synthesize(&config, &title, &approvers).await
        }
        Commands::Poll { pr_id } => cmd_poll(&config, &pr_id).await,
        Commands::Status { pr_id } => cmd_status(&config, &pr_id).await,
    }
}

/// Read a message from `path`, or from stdin when `path` is `-`.
fn read_input(path: &Path) -> Result<String> {
    if path == Path::new("-") {
        let mut text = String::new();
        std::io::stdin()
            .read_to_string(&mut text)
            .context("Failed to read message from stdin")?;
        return Ok(text);
    }
    std::fs::read_to_string(path).context(format!("Failed to read message from {:?}", path))
}

fn cmd_parse(input: &Path) -> Result<()> {
    let text = read_input(input)?;
    let message = parse(&text).context("Commit message does not follow the expected format")?;
    println!("{}", serde_json::to_string_pretty(&message)?);
    Ok(())
}

fn cmd_normalize(input: &Path) -> Result<()> {
    let text = read_input(input)?;
    let message = parse(&text).context("Commit message does not follow the expected format")?;
    println!("{}", serialize(&message));
    Ok(())
}

/// Fail early when the configured mirror is not a git repository.
async fn check_repository(config: &BotConfig) -> Result<()> {
    if !is_git_repo(&config.repository).await {
        bail!("{:?} is not a git repository", config.repository);
    }
    Ok(())
}

async fn resolve_title(config: &BotConfig, title: &str) -> Result<Commit> {
    let reference = extract_reference(title)
        .context(format!("Not a backport title: {:?}", title))?;
    check_repository(config).await?;
    let history = GitHistory::new(&config.repository);
    let commit = resolve(&reference, &history)
        .await
        .context(format!("Failed to resolve {} in {:?}", reference, config.repository))?;
    Ok(commit)
}

async fn cmd_resolve(config: &BotConfig, title: &str) -> Result<()> {
    let commit = resolve_title(config, title).await?;
    println!("commit {}", commit.hash);
    println!();
    for line in commit.message().lines() {
        println!("    {}", line);
    }
    Ok(())
}

async fn cmd_synthesize(config: &BotConfig, title: &str, approvers: &[String]) -> Result<()> {
    let commit = resolve_title(config, title).await?;
    let original = parse(commit.message()).context(format!(
        "Commit message of {} does not follow the expected format",
        commit.hash
    ))?;
    let synthesis = synthesize(&original, &commit.hash, approvers);

    match &synthesis.title {
        Some(new_title) => println!("Title:  {}", new_title),
        None => println!("Title:  {} (unchanged)", title.trim()),
    }
    println!("Status: {}", synthesis.status);
    println!();
    for line in serialize(&synthesis.message).lines() {
        println!("    {}", line);
    }
    Ok(())
}

async fn build_driver(config: &BotConfig) -> Result<(JsonPullRequestStore, Driver)> {
    check_repository(config).await?;
    let store = JsonPullRequestStore::new(&config.store_dir)
        .context(format!("Failed to open pull request store {:?}", config.store_dir))?;
    let driver = Driver::new(
        config,
        Arc::new(GitHistory::new(&config.repository)),
        Arc::new(GitPusher::new(&config.repository)),
        Arc::new(StoreReadiness::new(store.clone())),
    );
    Ok((store, driver))
}

async fn cmd_poll(config: &BotConfig, pr_id: &str) -> Result<()> {
    let (store, driver) = build_driver(config).await?;
    let pr = store
        .open(pr_id, &config.bot_login)
        .context(format!("Failed to open pull request {}", pr_id))?;

    let state = driver
        .poll(&pr)
        .await
        .context(format!("Reconciliation of pull request {} failed", pr_id))?;
    info!(pr_id = %pr_id, state = %state.label(), "poll complete");
    print_state(&state);
    METRICS.flush();
    Ok(())
}

async fn cmd_status(config: &BotConfig, pr_id: &str) -> Result<()> {
    let (store, driver) = build_driver(config).await?;
    let pr = store
        .open(pr_id, &config.bot_login)
        .context(format!("Failed to open pull request {}", pr_id))?;

    let state = driver
        .observe(&pr)
        .await
        .context(format!("Failed to inspect pull request {}", pr_id))?;
    print_state(&state);
    Ok(())
}

fn print_state(state: &ReconciliationState) {
    println!("State: {}", state.label());
    match state {
        ReconciliationState::NotABackport => {}
        ReconciliationState::Pending { reference } => println!("Reference: {}", reference),
        ReconciliationState::Error { cause } => println!("Cause: {}", cause),
        ReconciliationState::Resolved { original, message } => {
            println!("Original: {}", original);
            println!();
            for line in serialize(message).lines() {
                println!("    {}", line);
            }
        }
        ReconciliationState::Integrated { pushed } => println!("Pushed: {}", pushed),
    }
}
