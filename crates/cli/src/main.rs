//! tqec-pack command line.

use anyhow::Context;
use clap::{Parser, Subcommand};
use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tqec_pack_cli::logging::setup_logging;
use tqec_pack_cli::{report, DocumentParser};
use tqec_pack_core::Config;
use tqec_pack_layout::{Compaction, ModuleFactory};

#[derive(Parser)]
#[command(name = "tqec-pack")]
#[command(about = "Builds TQEC loop modules and compacts them in 3D")]
#[command(version)]
struct Cli {
    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Silence all log output
    #[arg(short, long, global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Build modules from a loop document and compact them
    Run {
        /// Path to the JSON loop document
        input: PathBuf,

        /// Random seed
        #[arg(long)]
        seed: Option<u64>,

        /// Initial annealing temperature
        #[arg(long)]
        initial_temp: Option<f64>,

        /// Temperature at which the search stops
        #[arg(long)]
        final_temp: Option<f64>,

        /// Geometric cooling factor
        #[arg(long)]
        cooling_rate: Option<f64>,

        /// Trials per temperature level
        #[arg(long)]
        trials: Option<usize>,

        /// Maximum total trials
        #[arg(long)]
        max_iterations: Option<u64>,

        /// Time limit in seconds
        #[arg(long)]
        time_limit: Option<u64>,

        /// JSON configuration file, applied before the flags above
        #[arg(long)]
        config: Option<PathBuf>,

        /// Output file for the result (JSON)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Print loops and the modules built from them
    Inspect {
        /// Path to the JSON loop document
        input: PathBuf,
    },
}

struct Overrides {
    seed: Option<u64>,
    initial_temp: Option<f64>,
    final_temp: Option<f64>,
    cooling_rate: Option<f64>,
    trials: Option<usize>,
    max_iterations: Option<u64>,
    time_limit: Option<u64>,
}

fn load_config(path: Option<&Path>, overrides: Overrides) -> anyhow::Result<Config> {
    let mut config = match path {
        Some(path) => DocumentParser::new()
            .parse_config(path)
            .with_context(|| format!("loading config {}", path.display()))?,
        None => Config::default(),
    };

    let mut sa = config.sa.clone();
    if let Some(seed) = overrides.seed {
        sa = sa.with_seed(seed);
    }
    if let Some(t) = overrides.initial_temp {
        sa = sa.with_initial_temp(t);
    }
    if let Some(t) = overrides.final_temp {
        sa = sa.with_final_temp(t);
    }
    if let Some(r) = overrides.cooling_rate {
        sa = sa.with_cooling_rate(r);
    }
    if let Some(n) = overrides.trials {
        sa = sa.with_iterations_per_temp(n);
    }
    if let Some(n) = overrides.max_iterations {
        sa = sa.with_max_iterations(n);
    }
    if let Some(secs) = overrides.time_limit {
        sa = sa.with_time_limit(Duration::from_secs(secs));
    }
    config = config.with_sa(sa);
    config.validate()?;
    Ok(config)
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    setup_logging(cli.verbose, cli.quiet).context("installing logger")?;

    let parser = DocumentParser::new();

    match cli.command {
        Commands::Run {
            input,
            seed,
            initial_temp,
            final_temp,
            cooling_rate,
            trials,
            max_iterations,
            time_limit,
            config,
            output,
        } => {
            let config = load_config(
                config.as_deref(),
                Overrides {
                    seed,
                    initial_temp,
                    final_temp,
                    cooling_rate,
                    trials,
                    max_iterations,
                    time_limit,
                },
            )?;

            let loops = parser
                .parse_file(&input)
                .with_context(|| format!("reading {}", input.display()))?;
            log::info!("Read {} loops from {}", loops.len(), input.display());

            let mut modules = ModuleFactory::new().create_all(&loops);
            let mut compaction = Compaction::new(config);
            let result = compaction.execute(&mut modules)?;

            report::write_summary(&mut io::stdout().lock(), &result)?;

            if let Some(path) = output {
                report::save_json(&result, &path)
                    .with_context(|| format!("writing {}", path.display()))?;
                println!("Results saved to: {}", path.display());
            }
        }

        Commands::Inspect { input } => {
            let loops = parser
                .parse_file(&input)
                .with_context(|| format!("reading {}", input.display()))?;
            let modules = ModuleFactory::new().create_all(&loops);
            report::write_inspection(&mut io::stdout().lock(), &loops, &modules)?;
        }
    }

    Ok(())
}
