//! Run and scenario configuration.
//!
//! A TOML file with a `[run]` table and one table per scenario. Every
//! field is optional; missing fields take the classic textbook defaults.
//!
//! ```toml
//! [run]
//! seed = 7
//! workers = 4
//!
//! [party]
//! group = 5
//! trials = 50000
//!
//! [[party.parties]]
//! name = "A"
//! supporters = 500
//! ```
//!
//! Precedence for the estimator settings, highest first: command-line
//! [`Overrides`], the `PROBSIM_SEED` / `PROBSIM_WORKERS` environment
//! variables, the `[run]` table, then the scenario's own `trials`.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::EstimatorError;
use crate::estimator::EstimatorConfig;
use crate::report::{DEFAULT_PRECISION, MAX_PRECISION};
use crate::scenarios::clt::{BatteryParams, BookStackParams};
use crate::scenarios::combinatorics::{EqualSplitParams, FourKindParams, LotteryParams, PartyParams};
use crate::scenarios::curves::{DiscreteUniformParams, GaussianParams, UniformCurveParams};
use crate::scenarios::dice::{CoinParams, RollsParams, UnfairDieParams};
use crate::scenarios::intervals::{CoverageParams, SweepParams};

pub const SEED_ENV: &str = "PROBSIM_SEED";
pub const WORKERS_ENV: &str = "PROBSIM_WORKERS";

/// Settings shared by every scenario.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RunConfig {
    pub seed: u64,
    pub workers: usize,
    /// Overrides every scenario's own trial count when set.
    pub trials: Option<i64>,
    /// Decimal places in text output.
    pub precision: usize,
}

impl Default for RunConfig {
    fn default() -> Self {
        let estimator = EstimatorConfig::default();
        Self {
            seed: estimator.seed,
            workers: estimator.workers,
            trials: None,
            precision: DEFAULT_PRECISION,
        }
    }
}

/// Top-level configuration file.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    pub run: RunConfig,
    pub party: PartyParams,
    pub equal_split: EqualSplitParams,
    pub lottery: LotteryParams,
    pub four_kind: FourKindParams,
    pub coins: CoinParams,
    pub unfair_die: UnfairDieParams,
    pub rolls: RollsParams,
    pub discrete_uniform: DiscreteUniformParams,
    pub uniform_curve: UniformCurveParams,
    pub gaussian: GaussianParams,
    pub book_stack: BookStackParams,
    pub battery: BatteryParams,
    pub confidence: SweepParams,
    pub coverage: CoverageParams,
}

/// Values given on the command line. `None` leaves the file value alone.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Overrides {
    pub seed: Option<u64>,
    pub workers: Option<usize>,
    pub trials: Option<i64>,
    pub precision: Option<usize>,
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse config file: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid configuration: {0}")]
    Invalid(String),
}

impl Config {
    /// Loads a TOML file. Environment overrides are not applied.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::Io {
            path: path.to_owned(),
            source: e,
        })?;
        Self::from_toml(&content)
    }

    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// The default configuration rendered as TOML.
    pub fn example() -> Result<String, ConfigError> {
        toml::to_string_pretty(&Self::default()).map_err(|e| ConfigError::Invalid(e.to_string()))
    }

    /// Checks the run-level settings that are not tied to one scenario.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.run.workers == 0 {
            return Err(ConfigError::Invalid("run.workers must be at least 1".into()));
        }
        if self.run.precision > MAX_PRECISION {
            return Err(ConfigError::Invalid(format!(
                "run.precision must be at most {MAX_PRECISION}, got {}",
                self.run.precision
            )));
        }
        Ok(())
    }

    /// Applies `PROBSIM_SEED` and `PROBSIM_WORKERS` from the process
    /// environment.
    pub fn apply_env(&mut self) -> Result<(), ConfigError> {
        self.apply_env_with(|key| std::env::var(key).ok())
    }

    /// Same as [`apply_env`](Self::apply_env) with an explicit lookup.
    pub fn apply_env_with<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(seed) = parse_env(&lookup, SEED_ENV)? {
            self.run.seed = seed;
        }
        if let Some(workers) = parse_env(&lookup, WORKERS_ENV)? {
            self.run.workers = workers;
        }
        self.validate()
    }

    /// Decimal places for text output after command-line overrides.
    pub fn precision(&self, overrides: &Overrides) -> Result<usize, ConfigError> {
        let precision = overrides.precision.unwrap_or(self.run.precision);
        if precision > MAX_PRECISION {
            return Err(ConfigError::Invalid(format!(
                "precision must be at most {MAX_PRECISION}, got {precision}"
            )));
        }
        Ok(precision)
    }

    /// Builds the estimator settings for a scenario whose own trial count
    /// is `scenario_trials`.
    ///
    /// # Errors
    /// `InvalidConfiguration` if the effective trial count is negative or
    /// the worker count is zero.
    pub fn estimator_config(
        &self,
        scenario_trials: i64,
        overrides: &Overrides,
    ) -> crate::error::Result<EstimatorConfig> {
        let trials = overrides
            .trials
            .or(self.run.trials)
            .unwrap_or(scenario_trials);
        let trials = u64::try_from(trials).map_err(|_| {
            EstimatorError::invalid(format!("trial count must be non-negative, got {trials}"))
        })?;
        let workers = overrides.workers.unwrap_or(self.run.workers);
        if workers == 0 {
            return Err(EstimatorError::invalid("worker count must be at least 1"));
        }
        Ok(EstimatorConfig {
            trials,
            seed: overrides.seed.unwrap_or(self.run.seed),
            workers,
        })
    }
}

fn parse_env<T, F>(lookup: &F, key: &str) -> Result<Option<T>, ConfigError>
where
    T: std::str::FromStr,
    F: Fn(&str) -> Option<String>,
{
    match lookup(key) {
        None => Ok(None),
        Some(raw) => raw
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| ConfigError::Invalid(format!("{key}={raw:?} is not a valid number"))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::confidence::Method;
    use std::io::Write;

    #[test]
    fn test_empty_document_is_default() {
        let config = Config::from_toml("").unwrap();
        assert_eq!(config, Config::default());
        assert_eq!(config.run.seed, 42);
        assert_eq!(config.run.workers, 1);
        assert_eq!(config.run.precision, 4);
        assert_eq!(config.party.group, 4);
        assert_eq!(config.lottery.pool, 20);
    }

    #[test]
    fn test_partial_tables() {
        let config = Config::from_toml(
            r#"
            [run]
            seed = 9

            [rolls]
            max_attempts = 2

            [coverage]
            method = "z"
            n = 30

            [unfair_die]
            weights = [1.0, 1.0]
            "#,
        )
        .unwrap();
        assert_eq!(config.run.seed, 9);
        assert_eq!(config.run.workers, 1);
        assert_eq!(config.rolls.max_attempts, 2);
        assert_eq!(config.rolls.target, 7);
        assert_eq!(config.coverage.method, Method::Z);
        assert_eq!(config.coverage.n, 30);
        assert_eq!(config.unfair_die.weights, vec![1.0, 1.0]);
    }

    #[test]
    fn test_party_list() {
        let config = Config::from_toml(
            r#"
            [[party.parties]]
            name = "Left"
            supporters = 10

            [[party.parties]]
            name = "Right"
            supporters = 20
            "#,
        )
        .unwrap();
        assert_eq!(config.party.parties.len(), 2);
        assert_eq!(config.party.parties[1].name, "Right");
        assert_eq!(config.party.group, 4);
    }

    #[test]
    fn test_unknown_field_rejected() {
        let err = Config::from_toml("[lottery]\npoool = 3\n").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn test_invalid_run_settings() {
        assert!(matches!(
            Config::from_toml("[run]\nworkers = 0\n"),
            Err(ConfigError::Invalid(_))
        ));
        assert!(matches!(
            Config::from_toml("[run]\nprecision = 11\n"),
            Err(ConfigError::Invalid(_))
        ));
    }

    #[test]
    fn test_negative_trials_is_invalid_configuration() {
        let config = Config::from_toml("[run]\ntrials = -5\n").unwrap();
        let err = config
            .estimator_config(100, &Overrides::default())
            .unwrap_err();
        assert!(matches!(err, EstimatorError::InvalidConfiguration(_)));
    }

    #[test]
    fn test_trials_precedence() {
        let mut config = Config::default();
        let none = Overrides::default();
        assert_eq!(config.estimator_config(123, &none).unwrap().trials, 123);

        config.run.trials = Some(50);
        assert_eq!(config.estimator_config(123, &none).unwrap().trials, 50);

        let cli = Overrides {
            trials: Some(7),
            seed: Some(1),
            workers: Some(3),
            precision: None,
        };
        let est = config.estimator_config(123, &cli).unwrap();
        assert_eq!(est.trials, 7);
        assert_eq!(est.seed, 1);
        assert_eq!(est.workers, 3);
    }

    #[test]
    fn test_zero_workers_override() {
        let cli = Overrides {
            workers: Some(0),
            ..Overrides::default()
        };
        assert!(Config::default().estimator_config(10, &cli).is_err());
    }

    #[test]
    fn test_env_overrides() {
        let mut config = Config::default();
        config
            .apply_env_with(|key| match key {
                SEED_ENV => Some("1234".into()),
                WORKERS_ENV => Some(" 8 ".into()),
                _ => None,
            })
            .unwrap();
        assert_eq!(config.run.seed, 1234);
        assert_eq!(config.run.workers, 8);

        let err = config
            .apply_env_with(|key| (key == SEED_ENV).then(|| "abc".to_string()))
            .unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));

        let err = config
            .apply_env_with(|key| (key == WORKERS_ENV).then(|| "0".to_string()))
            .unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn test_precision_override() {
        let config = Config::default();
        assert_eq!(config.precision(&Overrides::default()).unwrap(), 4);
        let cli = Overrides {
            precision: Some(2),
            ..Overrides::default()
        };
        assert_eq!(config.precision(&cli).unwrap(), 2);
        let cli = Overrides {
            precision: Some(12),
            ..Overrides::default()
        };
        assert!(config.precision(&cli).is_err());
    }

    #[test]
    fn test_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[four_kind]\nhand = 7").unwrap();
        let config = Config::from_file(file.path()).unwrap();
        assert_eq!(config.four_kind.hand, 7);
    }

    #[test]
    fn test_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = Config::from_file(&dir.path().join("absent.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
    }

    #[test]
    fn test_example_parses_back() {
        let text = Config::example().unwrap();
        let parsed = Config::from_toml(&text).unwrap();
        assert_eq!(parsed, Config::default());
    }
}
