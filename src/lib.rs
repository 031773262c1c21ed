//! # probsim
//!
//! Monte-Carlo estimation of probabilities, with the classic classroom
//! exercises built on top of it.
//!
//! The core is the [`estimator`]: it runs many independent trials, each
//! drawing a sample from a [`population`] or a parametric
//! [`distributions`] generator, classifies the trial and aggregates the
//! categories into an empirical distribution. Everything else is either
//! a building block for it or a concrete exercise.
//!
//! ## Modules
//!
//! - [`estimator`]: trial runner, parallel partitioning, aggregation
//! - [`population`]: finite labeled multisets
//! - [`random`]: seeded generators, k-subset and weighted sampling
//! - [`distributions`]: uniform, normal and exponential distributions
//! - [`special`]: normal, Student's t and binomial special functions
//! - [`stats`]: descriptive statistics with numerical stability guarantees
//! - [`confidence`]: z and t intervals, coverage simulation
//! - [`scenarios`]: the exercises, as pure functions returning data
//! - [`report`]: text tables and JSON
//! - [`config`]: TOML configuration
//!
//! ## Design Philosophy
//!
//! - **Reproducible**: a run is a pure function of `(seed, workers, trials)`
//! - **Numerical stability first**: Welford's algorithm for variance,
//!   Kahan summation for accumulation
//! - **Undefined is not zero**: probabilities over zero included trials
//!   are `None`
//! - **Property-based testing**: sampling invariants verified via proptest
//!
//! ## Example
//! ```
//! use probsim::{Estimator, EstimatorConfig, Population};
//!
//! let population = Population::from_counts([("A", 500), ("B", 300), ("C", 200)]).unwrap();
//! let est = Estimator::new(EstimatorConfig { trials: 20_000, seed: 1, workers: 2 }).unwrap();
//! let unanimous = est
//!     .sample_population(&population, 4, |group| {
//!         group.iter().all(|&l| l == group[0]).then(|| *group[0])
//!     })
//!     .unwrap();
//! let p = unanimous.probability(&"A").unwrap();
//! assert!((p - 0.0621).abs() < 0.01);
//! ```

pub mod confidence;
pub mod config;
pub mod distributions;
pub mod error;
pub mod estimator;
pub mod population;
pub mod random;
pub mod report;
pub mod scenarios;
pub mod special;
pub mod stats;

pub use config::{Config, ConfigError, Overrides};
pub use distributions::Parametric;
pub use error::{EstimatorError, Result};
pub use estimator::{Estimate, Estimator, EstimatorConfig, TrialOutcome};
pub use population::Population;
pub use report::{render_json, render_text, Report, ToReport};
