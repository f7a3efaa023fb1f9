//! Backport bot daemon
//!
//! Polls every pull request in the store on a fixed interval and runs one
//! reconciliation pass per PR, concurrently, until interrupted.

use anyhow::{bail, Context, Result};
use backport_core::{
    is_git_repo, BotConfig, Driver, GitHistory, GitPusher, JsonPullRequestStore, StoreReadiness,
    METRICS,
};
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinSet;
use tokio::time::MissedTickBehavior;
use tracing::{error, info, warn, Level};

#[derive(Parser)]
#[command(name = "backportd")]
#[command(author = "Stevedores Org")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Backport reconciliation daemon", long_about = None)]
struct Args {
    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,

    /// Emit JSON-formatted log lines
    #[arg(long)]
    json: bool,

    /// Configuration file (TOML)
    #[arg(short, long, env = "BACKPORT_CONFIG")]
    config: Option<PathBuf>,

    /// Repository mirror searched for original commits
    #[arg(long)]
    repo: Option<PathBuf>,

    /// Directory of pull request documents
    #[arg(long)]
    store: Option<PathBuf>,

    /// Run a single pass over the store and exit
    #[arg(long)]
    once: bool,
}

/// Outcome counts of one pass over the store.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
struct TickSummary {
    polled: usize,
    failed: usize,
}

struct Daemon {
    store: JsonPullRequestStore,
    driver: Arc<Driver>,
    bot_login: String,
}

impl Daemon {
    async fn new(config: &BotConfig) -> Result<Self> {
        if !is_git_repo(&config.repository).await {
            bail!("{:?} is not a git repository", config.repository);
        }
        let store = JsonPullRequestStore::new(&config.store_dir)
            .context(format!("Failed to open pull request store {:?}", config.store_dir))?;
        let driver = Driver::new(
            config,
            Arc::new(GitHistory::new(&config.repository)),
            Arc::new(GitPusher::new(&config.repository)),
            Arc::new(StoreReadiness::new(store.clone())),
        );
        Ok(Self {
            store,
            driver: Arc::new(driver),
            bot_login: config.bot_login.clone(),
        })
    }

    /// Poll every stored PR once. A failing PR never stops the others.
    async fn tick(&self) -> Result<TickSummary> {
        let ids = self
            .store
            .list()
            .context("Failed to list pull requests")?;

        let mut passes = JoinSet::new();
        for id in ids {
            let store = self.store.clone();
            let driver = self.driver.clone();
            let bot_login = self.bot_login.clone();
            passes.spawn(async move {
                let outcome = async {
                    let pr = store.open(&id, &bot_login)?;
                    let state = driver.poll(&pr).await?;
                    Ok::<_, anyhow::Error>(state.label())
                }
                .await;
                (id, outcome)
            });
        }

        let mut summary = TickSummary::default();
        while let Some(joined) = passes.join_next().await {
            match joined {
                Ok((id, Ok(state))) => {
                    info!(pr_id = %id, state = %state, "pull request polled");
                    summary.polled += 1;
                }
                Ok((id, Err(err))) => {
                    warn!(pr_id = %id, error = %err, "poll failed, retrying next tick");
                    summary.failed += 1;
                }
                Err(err) => {
                    error!(error = %err, "poll task panicked");
                    summary.failed += 1;
                }
            }
        }

        METRICS.flush();
        Ok(summary)
    }

    async fn run(&self, interval: Duration) {
        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    match self.tick().await {
                        Ok(summary) => info!(
                            polled = summary.polled,
                            failed = summary.failed,
                            "tick complete"
                        ),
                        Err(err) => warn!(error = %err, "tick failed"),
                    }
                }
                _ = tokio::signal::ctrl_c() => {
                    info!("interrupt received, shutting down");
                    break;
                }
            }
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let level = if args.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };
    backport_core::init_tracing(args.json, level);

    let mut config =
        BotConfig::load(args.config.as_deref()).context("Failed to load configuration")?;
    if let Some(repo) = args.repo {
        config.repository = repo;
    }
    if let Some(store) = args.store {
        config.store_dir = store;
    }

    let daemon = Daemon::new(&config).await?;
    info!(
        version = backport_core::VERSION,
        store = ?config.store_dir,
        repository = ?config.repository,
        interval_secs = config.poll_interval_secs,
        "backportd started"
    );

    if args.once {
        let summary = daemon.tick().await?;
        info!(polled = summary.polled, failed = summary.failed, "single pass complete");
        return Ok(());
    }

    daemon.run(config.poll_interval()).await;
    Ok(())
}
