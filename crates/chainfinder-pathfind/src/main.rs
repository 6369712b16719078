//! CLI entry point for the chainfinder intrusion chain enumerator.
//!
//! Reads a JSON scenario from a file (or stdin with `-`), writes results to
//! stdout, and logs to stderr.

use clap::{Parser, Subcommand};
use tracing_subscriber::{fmt, EnvFilter};

use chainfinder_core::config::{OutputFormat, Settings};
use chainfinder_core::{Scenario, ScenarioDocument};
use chainfinder_pathfind::types::SearchRequest;
use chainfinder_pathfind::{report, ChainFinder};

#[derive(Parser)]
#[command(name = "chainfinder")]
#[command(about = "Enumerate intrusion chains through a modeled network")]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Config file prefix (default: chainfinder).
    #[arg(short, long, default_value = "chainfinder", global = true)]
    config: String,

    /// Emit logs as JSON.
    #[arg(long, global = true)]
    log_json: bool,
}

#[derive(Subcommand)]
enum Command {
    /// Enumerate every chain from a start system to a target system.
    Find {
        /// Scenario JSON file, or `-` for stdin.
        #[arg(short, long)]
        scenario: String,
        /// Start system name.
        #[arg(long)]
        start: String,
        /// Target system name.
        #[arg(long)]
        target: String,
        /// Maximum hops per chain (default from config).
        #[arg(long, allow_negative_numbers = true)]
        max_hops: Option<i64>,
        /// Output format: text, json.
        #[arg(short, long)]
        format: Option<String>,
        /// Fork the search across threads.
        #[arg(long)]
        parallel: bool,
    },
    /// Load and validate a scenario without searching.
    Validate {
        /// Scenario JSON file, or `-` for stdin.
        #[arg(short, long)]
        scenario: String,
    },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    if cli.log_json {
        fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .json()
            .init();
    } else {
        fmt().with_env_filter(filter).with_writer(std::io::stderr).init();
    }

    let settings = Settings::load(&cli.config).unwrap_or_else(|e| {
        tracing::warn!(error = %e, "Falling back to default settings");
        Settings::default()
    });

    match cli.command {
        Command::Find {
            ref scenario,
            ref start,
            ref target,
            max_hops,
            ref format,
            parallel,
        } => {
            let scenario = load_scenario(scenario)?;
            let format = match format {
                Some(f) => f.parse::<OutputFormat>()?,
                None => settings.format,
            };

            let finder = ChainFinder::new(&scenario).with_parallel(parallel || settings.parallel);

            let request = SearchRequest {
                start: start.clone(),
                target: target.clone(),
                max_hops: max_hops.unwrap_or(settings.max_hops),
            };
            let result = finder.run(&request)?;

            match format {
                OutputFormat::Text => print!("{}", report::render_text(&result)),
                OutputFormat::Json => println!("{}", report::render_json(&result)?),
            }
        }
        Command::Validate { ref scenario } => {
            let scenario = load_scenario(scenario)?;
            println!(
                "ok: {} systems, {} routes, {} exploits",
                scenario.system_count(),
                scenario.route_count(),
                scenario.exploit_count()
            );
        }
    }

    Ok(())
}

fn load_scenario(source: &str) -> anyhow::Result<Scenario> {
    let document = if source == "-" {
        ScenarioDocument::from_reader(std::io::stdin().lock())?
    } else {
        ScenarioDocument::load(source)?
    };
    let scenario = document.into_scenario()?;
    tracing::info!(
        systems = scenario.system_count(),
        exploits = scenario.exploit_count(),
        "Scenario loaded"
    );
    Ok(scenario)
}
