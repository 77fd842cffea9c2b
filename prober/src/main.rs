//! `check-node`: probe marketplace providers with a benchmark command.
//!
//! Runs rounds of concurrent tasks until every whitelisted provider has been
//! checked, or until a fixed number of providers outside the blacklist has
//! been probed, then prints a summary and the result log.

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Result, bail};
use clap::Parser;
use tracing::{debug, info, warn};

use prober::core::types::ProbeMode;
use prober::exit_codes;
use prober::io::config::{CliOverrides, apply_overrides, load_config};
use prober::io::local_market::LocalMarketplace;
use prober::io::names_file::read_names;
use prober::io::results::{render_results, write_results};
use prober::io::signals::{listen_for_signals, shutdown_channel};
use prober::logging;
use prober::looping::{LoopStop, run_loop};
use prober::report::build_report;
use prober::state::ProbeState;

#[derive(Parser, Debug)]
#[command(
    name = "check-node",
    version,
    about = "Probe marketplace providers with a benchmark command"
)]
struct Cli {
    /// Provider name, or with `--file` a file of provider names.
    #[arg(required = true, num_args = 1.., value_name = "TARGET")]
    targets: Vec<String>,
    /// Treat TARGET as a newline-delimited list of provider names.
    #[arg(short, long)]
    file: bool,
    /// Tasks per loop.
    #[arg(short, long, value_name = "N")]
    tasks: Option<u32>,
    /// Write the result log as JSON to this path.
    #[arg(short, long, value_name = "PATH")]
    output: Option<PathBuf>,
    /// Treat the names as a blacklist and probe N other providers.
    #[arg(short, long, value_name = "N")]
    blacklist: Option<u32>,
    /// Ceiling for the estimated task cost.
    #[arg(short, long, value_name = "COST")]
    limit: Option<f64>,
    /// Benchmark duration in seconds, used by the cost estimate.
    #[arg(short, long, value_name = "SECS")]
    duration: Option<f64>,
    /// TOML config file. Defaults apply if it does not exist.
    #[arg(short, long, value_name = "PATH", default_value = "check-node.toml")]
    config: PathBuf,
    /// JSON offers file for the local marketplace backend.
    #[arg(long, value_name = "PATH")]
    offers: Option<PathBuf>,
}

impl Cli {
    fn overrides(&self) -> CliOverrides {
        CliOverrides {
            tasks_per_loop: self.tasks,
            estimate_limit: self.limit,
            duration: self.duration,
            offers_path: self.offers.clone(),
        }
    }

    fn mode(&self) -> ProbeMode {
        match self.blacklist {
            Some(tasks) => ProbeMode::BlacklistCount { tasks },
            None => ProbeMode::Whitelist,
        }
    }
}

#[tokio::main]
async fn main() {
    logging::init();
    let cli = Cli::parse();
    if let Err(err) = run(cli).await {
        eprintln!("{err:#}");
        std::process::exit(exit_codes::INVALID);
    }
}

async fn run(cli: Cli) -> Result<()> {
    let Some(target) = cli.targets.first() else {
        bail!("missing provider name");
    };
    if cli.targets.len() > 1 {
        warn!("found more than one argument, using the first one only");
    }

    let config = apply_overrides(load_config(&cli.config)?, &cli.overrides())?;
    info!(tasks_per_loop = config.tasks_per_loop, "running tasks per loop");
    info!(estimate_limit = config.limits.estimate, "limiting estimated cost");

    let names = if cli.file {
        let names = read_names(Path::new(target))?;
        info!(count = names.len(), "found file with provider names");
        names
    } else {
        info!(name = %target, "found provider name");
        vec![target.clone()]
    };
    if let Some(output) = &cli.output {
        info!(path = %output.display(), "writing output to file");
    }

    let mode = cli.mode();
    let state = ProbeState::new();
    match mode {
        ProbeMode::Whitelist => state.add_whitelist(&names),
        ProbeMode::BlacklistCount { tasks } => {
            info!(tasks, "providers are blacklisted, running tasks");
            state.add_blacklist(&names);
        }
    }

    let Some(offers_path) = config.market.offers_path.as_deref() else {
        bail!("no offers file: pass --offers or set market.offers_path");
    };
    let market = LocalMarketplace::load(offers_path)?;
    info!(offers = market.offers().len(), "loaded offers");

    let (trigger, shutdown) = shutdown_channel();
    let listener = listen_for_signals(
        trigger,
        Duration::from_secs(config.pacing.shutdown_grace_secs),
    );
    let outcome = run_loop(&market, &state, &config, mode, &shutdown, |round, result| {
        debug!(round, ?result, "round finished");
    })
    .await;
    listener.abort();

    match outcome.stop {
        LoopStop::Complete => info!(rounds = outcome.rounds, "all tasks done"),
        LoopStop::Interrupted { remaining } => {
            warn!(rounds = outcome.rounds, remaining, "stopped on shutdown signal");
        }
        LoopStop::MaxRoundsExceeded {
            remaining,
            max_rounds,
        } => warn!(remaining, max_rounds, "round limit reached with work remaining"),
    }

    let snapshot = state.snapshot();
    for line in build_report(mode, names.len(), &snapshot).lines() {
        println!("{line}");
    }
    match &cli.output {
        Some(path) => write_results(path, &snapshot.results)?,
        None => print!("{}", render_results(&snapshot.results)?),
    }
    Ok(())
}
