//! probsim CLI - Monte-Carlo probability exercises.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use probsim::confidence::Method;
use probsim::scenarios::{clt, combinatorics, curves, dice, intervals};
use probsim::{render_json, render_text, Config, Estimator, Overrides, ToReport};
use serde::Serialize;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

#[derive(Parser)]
#[command(name = "probsim")]
#[command(version)]
#[command(about = "Monte-Carlo estimation of classic probability exercises")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Path to a TOML configuration file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Base random seed
    #[arg(long, global = true)]
    seed: Option<u64>,

    /// Number of parallel partitions
    #[arg(short, long, global = true)]
    workers: Option<usize>,

    /// Number of trials, overriding the scenario default
    #[arg(short = 'n', long, global = true, allow_negative_numbers = true)]
    trials: Option<i64>,

    /// Decimal places in text output (0-10)
    #[arg(short, long, global = true)]
    precision: Option<usize>,

    /// Print the result as JSON instead of text tables
    #[arg(long, global = true)]
    json: bool,

    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Probability that a random group all supports the same party
    Party,

    /// Probability that a random group splits evenly between two camps
    EqualSplit,

    /// Probability that a ticket matches the winning draw
    Lottery,

    /// Probability of four of a kind in a hand of cards
    FourKind,

    /// Distribution of heads in repeated coin flips
    Coins,

    /// Face frequencies of a weighted die
    UnfairDie,

    /// Rolls needed for the dice to sum to a target
    Rolls,

    /// Empirical PMF and CDF of a discrete uniform generator
    DiscreteUniform,

    /// PDF and CDF table of a continuous uniform distribution
    UniformCurve,

    /// PDF and CDF tables of several normal distributions
    Gaussian,

    /// Central limit theorem: thickness of stacks of books
    BookStack,

    /// Central limit theorem: total lifetime of a carton of batteries
    Battery,

    /// Sample means against confidence bands for growing sample sizes
    Confidence,

    /// Fraction of confidence intervals that contain the true mean
    Coverage {
        /// Interval method, overriding the configuration
        #[arg(short, long, value_enum)]
        method: Option<MethodArg>,
    },

    /// Show the default configuration
    Example,
}

#[derive(Clone, Copy, clap::ValueEnum)]
enum MethodArg {
    Z,
    T,
}

impl From<MethodArg> for Method {
    fn from(arg: MethodArg) -> Self {
        match arg {
            MethodArg::Z => Method::Z,
            MethodArg::T => Method::T,
        }
    }
}

fn setup_logging(verbose: bool) -> Result<()> {
    let level = if verbose { Level::DEBUG } else { Level::INFO };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .with_thread_ids(false)
        .with_writer(std::io::stderr)
        .compact()
        .finish();
    tracing::subscriber::set_global_default(subscriber).context("Failed to set subscriber")
}

fn load_config(path: Option<&PathBuf>) -> Result<Config> {
    let mut config = match path {
        Some(path) => Config::from_file(path)
            .with_context(|| format!("Failed to load config from {path:?}"))?,
        None => Config::default(),
    };
    config
        .apply_env()
        .context("Failed to apply environment overrides")?;
    Ok(config)
}

/// Prints a result as JSON or as text tables.
fn emit<T: Serialize + ToReport>(result: &T, json: bool, precision: usize) -> Result<()> {
    if json {
        println!("{}", render_json(result).context("Failed to serialize result")?);
    } else {
        print!("{}", render_text(&result.to_report(), precision));
    }
    Ok(())
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    setup_logging(cli.verbose)?;

    if matches!(cli.command, Commands::Example) {
        println!("{}", Config::example()?);
        return Ok(());
    }

    let config = load_config(cli.config.as_ref())?;
    let overrides = Overrides {
        seed: cli.seed,
        workers: cli.workers,
        trials: cli.trials,
        precision: cli.precision,
    };
    let precision = config.precision(&overrides)?;
    let estimator = |scenario_trials: i64| -> Result<Estimator> {
        let est_config = config
            .estimator_config(scenario_trials, &overrides)
            .context("Invalid run configuration")?;
        info!(
            trials = est_config.trials,
            seed = est_config.seed,
            workers = est_config.workers,
            "starting run"
        );
        Ok(Estimator::new(est_config)?)
    };

    match cli.command {
        Commands::Party => {
            let est = estimator(config.party.trials)?;
            let result = combinatorics::party_support(&est, &config.party)?;
            emit(&result, cli.json, precision)?;
        }
        Commands::EqualSplit => {
            let est = estimator(config.equal_split.trials)?;
            let result = combinatorics::equal_split(&est, &config.equal_split)?;
            emit(&result, cli.json, precision)?;
        }
        Commands::Lottery => {
            let est = estimator(config.lottery.trials)?;
            let result = combinatorics::lottery(&est, &config.lottery)?;
            emit(&result, cli.json, precision)?;
        }
        Commands::FourKind => {
            let est = estimator(config.four_kind.trials)?;
            let result = combinatorics::four_kind(&est, &config.four_kind)?;
            emit(&result, cli.json, precision)?;
        }
        Commands::Coins => {
            let est = estimator(config.coins.trials)?;
            let result = dice::coin_tosses(&est, &config.coins)?;
            emit(&result, cli.json, precision)?;
        }
        Commands::UnfairDie => {
            let est = estimator(config.unfair_die.trials)?;
            let result = dice::unfair_die(&est, &config.unfair_die)?;
            emit(&result, cli.json, precision)?;
        }
        Commands::Rolls => {
            let est = estimator(config.rolls.trials)?;
            let result = dice::rolls_to_target(&est, &config.rolls)?;
            emit(&result, cli.json, precision)?;
        }
        Commands::DiscreteUniform => {
            let est = estimator(config.discrete_uniform.trials)?;
            let result = curves::discrete_uniform(&est, &config.discrete_uniform)?;
            emit(&result, cli.json, precision)?;
        }
        Commands::UniformCurve => {
            let result = curves::uniform_curve(&config.uniform_curve)?;
            emit(&result, cli.json, precision)?;
        }
        Commands::Gaussian => {
            let result = curves::gaussian_curves(&config.gaussian)?;
            emit(&result, cli.json, precision)?;
        }
        Commands::BookStack => {
            let est = estimator(config.book_stack.trials)?;
            let result = clt::book_stack(&est, &config.book_stack)?;
            emit(&result, cli.json, precision)?;
        }
        Commands::Battery => {
            let est = estimator(config.battery.trials)?;
            let result = clt::battery_carton(&est, &config.battery)?;
            emit(&result, cli.json, precision)?;
        }
        Commands::Confidence => {
            let est = estimator(0)?;
            let result = intervals::sample_size_confidence(&est, &config.confidence)?;
            emit(&result, cli.json, precision)?;
        }
        Commands::Coverage { method } => {
            let mut params = config.coverage;
            if let Some(method) = method {
                params.method = method.into();
            }
            let est = estimator(params.trials)?;
            let result = intervals::interval_coverage(&est, &params)?;
            emit(&result, cli.json, precision)?;
        }
        Commands::Example => {}
    }
    Ok(())
}
