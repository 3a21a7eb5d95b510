#![forbid(unsafe_code)]

use std::env;
use std::path::PathBuf;

use anyhow::{Context, Result, bail};
use clap::Parser;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};
use tutorbook_core::config::resolve_config;
use tutorbook_sim::campaign::{CampaignConfig, replay_seed, run_campaign};

#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "tutorbook-sim: seeded workload campaigns against the address book",
    long_about = None
)]
struct Cli {
    /// First seed of the campaign.
    #[arg(long, default_value_t = 0)]
    start_seed: u64,

    /// Number of seeds to run.
    #[arg(long, default_value_t = 100)]
    seeds: u64,

    /// Operations applied per seed.
    #[arg(long, default_value_t = 200)]
    steps: usize,

    /// Replay a single seed and print its full trace.
    #[arg(long)]
    replay: Option<u64>,

    /// Project root holding `.tutorbook/config.toml`.
    #[arg(long, default_value = ".")]
    root: PathBuf,

    /// Emit JSON output instead of human-readable text.
    #[arg(long)]
    json: bool,
}

fn init_tracing() {
    let filter = EnvFilter::try_from_env("TUTORBOOK_LOG").unwrap_or_else(|_| {
        EnvFilter::new(if env::var("DEBUG").is_ok() {
            "tutorbook=debug,info"
        } else {
            "tutorbook=info,warn"
        })
    });

    let format = env::var("TUTORBOOK_LOG_FORMAT").unwrap_or_else(|_| "compact".to_string());

    let registry = tracing_subscriber::registry().with(filter);

    match format.as_str() {
        "json" => {
            registry
                .with(fmt::layer().json().with_ansi(false).with_writer(std::io::stderr))
                .init();
        }
        _ => {
            registry
                .with(fmt::layer().compact().with_writer(std::io::stderr))
                .init();
        }
    }
}

fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();

    let book = resolve_config(&cli.root)
        .with_context(|| format!("loading configuration under {}", cli.root.display()))?;
    let end = cli
        .start_seed
        .checked_add(cli.seeds)
        .context("seed range overflows u64")?;
    let config = CampaignConfig {
        seed_range: cli.start_seed..end,
        steps: cli.steps,
        book,
    };

    if let Some(seed) = cli.replay {
        let result = replay_seed(seed, &config)?;
        if cli.json {
            println!("{}", serde_json::to_string_pretty(&result)?);
        } else {
            for entry in &result.trace {
                let outcome = entry.error.as_deref().unwrap_or("ok");
                println!("{:>5}  {:<6} {}", entry.step, outcome, entry.op);
            }
            for violation in &result.oracle.violations {
                println!("VIOLATION {violation}");
            }
        }
        if !result.oracle.passed {
            bail!("seed {seed} violated {} invariant(s)", result.oracle.violations.len());
        }
        return Ok(());
    }

    let report = run_campaign(&config)?;
    if cli.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!(
            "campaign complete: seeds={} passed={} ops_applied={} ops_rejected={}",
            report.seeds_run,
            report.seeds_passed,
            report.ops_applied,
            report.ops_rejected.values().sum::<usize>()
        );
        for failure in &report.failures {
            println!("seed {} failed:", failure.seed);
            for violation in &failure.violations {
                println!("  - {violation}");
            }
        }
    }

    if let Some(seed) = report.first_failure {
        bail!("campaign failed; replay with --replay {seed}");
    }
    Ok(())
}
