//! Tuning run configuration.
//!
//! A [`TuningConfig`] is built once at startup and handed to the matrix
//! builder by reference. Defaults can be overridden in code through the
//! builder methods or from `BENCHMARK_TUNING_*` environment variables.

use std::collections::BTreeSet;
use std::str::FromStr;

use crate::capability::ExclusionTable;
use crate::combinations::generate_config_candidates;
use crate::error::ConfigError;
use crate::params::{ConfigCandidate, OutputType};

pub const ENV_THREAD_OPTIONS: &str = "BENCHMARK_TUNING_THREAD_OPTIONS";
pub const ENV_BLOCK_OPTIONS: &str = "BENCHMARK_TUNING_BLOCK_OPTIONS";
pub const ENV_MIN_GRID_SIZE: &str = "BENCHMARK_TUNING_MIN_GRID_SIZE";
pub const ENV_SIZE: &str = "BENCHMARK_TUNING_SIZE";
pub const ENV_LAMBDA: &str = "BENCHMARK_TUNING_LAMBDA";
pub const ENV_EXCLUDE: &str = "BENCHMARK_TUNING_EXCLUDE";

/// Per-trial parameters shared by every variant of a run.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrialConfig {
  /// Number of elements produced by each generate call.
  pub size: usize,
  /// Mean of the Poisson distribution.
  pub lambda: f64,
}

impl Default for TrialConfig {
  fn default() -> Self {
    Self {
      size: 1 << 24,
      lambda: 10.0,
    }
  }
}

#[derive(Debug, Clone, PartialEq)]
pub struct TuningConfig {
  pub thread_options: Vec<u32>,
  pub block_options: Vec<u32>,
  /// Launch configurations with a smaller grid are not benchmarked.
  pub min_grid_size: u64,
  pub output_types: Vec<OutputType>,
  pub exclusions: ExclusionTable,
  pub trial: TrialConfig,
}

impl Default for TuningConfig {
  fn default() -> Self {
    Self {
      thread_options: vec![64, 128, 256, 512, 1024],
      block_options: vec![64, 128, 256, 512, 1024, 2048],
      min_grid_size: 16384,
      output_types: OutputType::ALL.to_vec(),
      exclusions: ExclusionTable::known(),
      trial: TrialConfig::default(),
    }
  }
}

impl TuningConfig {
  pub fn thread_options(mut self, options: Vec<u32>) -> Self {
    self.thread_options = options;
    self
  }

  pub fn block_options(mut self, options: Vec<u32>) -> Self {
    self.block_options = options;
    self
  }

  pub fn min_grid_size(mut self, min_grid_size: u64) -> Self {
    self.min_grid_size = min_grid_size;
    self
  }

  pub fn output_types(mut self, output_types: Vec<OutputType>) -> Self {
    self.output_types = output_types;
    self
  }

  pub fn exclusions(mut self, exclusions: ExclusionTable) -> Self {
    self.exclusions = exclusions;
    self
  }

  pub fn trial_size(mut self, size: usize) -> Self {
    self.trial.size = size;
    self
  }

  pub fn lambda(mut self, lambda: f64) -> Self {
    self.trial.lambda = lambda;
    self
  }

  /// Launch configurations that pass the grid-size threshold, in
  /// enumeration order.
  pub fn config_candidates(&self) -> Vec<ConfigCandidate> {
    generate_config_candidates(&self.thread_options, &self.block_options, self.min_grid_size)
  }

  /// Checks that every candidate is positive and listed once, and that the
  /// trial is non-empty and addressable for every output type.
  pub fn validate(&self) -> Result<(), ConfigError> {
    if self.thread_options.is_empty() {
      return Err(ConfigError::EmptyCandidates("thread"));
    }
    if self.block_options.is_empty() {
      return Err(ConfigError::EmptyCandidates("block"));
    }
    if self.thread_options.contains(&0) {
      return Err(ConfigError::NotPositive("thread option"));
    }
    if self.block_options.contains(&0) {
      return Err(ConfigError::NotPositive("block option"));
    }
    if let Some(threads) = first_repeat(&self.thread_options) {
      return Err(ConfigError::Duplicate {
        list: "thread option",
        value: threads.to_string(),
      });
    }
    if let Some(blocks) = first_repeat(&self.block_options) {
      return Err(ConfigError::Duplicate {
        list: "block option",
        value: blocks.to_string(),
      });
    }
    if let Some(output) = first_repeat(&self.output_types) {
      return Err(ConfigError::Duplicate {
        list: "output type",
        value: output.to_string(),
      });
    }
    if self.min_grid_size == 0 {
      return Err(ConfigError::NotPositive("minimum grid size"));
    }
    if self.trial.size == 0 {
      return Err(ConfigError::NotPositive("trial size"));
    }
    let widest = self.output_types.iter().map(|t| t.size_of()).max().unwrap_or(1);
    if self.trial.size.checked_mul(widest).is_none() {
      return Err(ConfigError::TooLarge("trial size"));
    }
    if self.trial.lambda.is_nan() || self.trial.lambda <= 0.0 {
      return Err(ConfigError::NotPositive("lambda"));
    }
    Ok(())
  }

  /// Defaults overlaid with the `BENCHMARK_TUNING_*` environment variables.
  pub fn from_env() -> Result<Self, ConfigError> {
    Self::default().overlay_env()
  }

  /// Defaults overlaid with whatever `lookup` returns for each
  /// `BENCHMARK_TUNING_*` key. The result is validated.
  pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
    Self::default().overlay_lookup(lookup)
  }

  /// `self` overlaid with the `BENCHMARK_TUNING_*` environment variables.
  pub fn overlay_env(self) -> Result<Self, ConfigError> {
    self.overlay_lookup(|key| std::env::var(key).ok())
  }

  /// Replaces every setting `lookup` has a value for and keeps the rest of
  /// `self`. The result is validated.
  pub fn overlay_lookup(self, lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
    let mut config = self;
    if let Some(value) = lookup(ENV_THREAD_OPTIONS) {
      config.thread_options = parse_list(ENV_THREAD_OPTIONS, &value)?;
    }
    if let Some(value) = lookup(ENV_BLOCK_OPTIONS) {
      config.block_options = parse_list(ENV_BLOCK_OPTIONS, &value)?;
    }
    if let Some(value) = lookup(ENV_MIN_GRID_SIZE) {
      config.min_grid_size = parse_value(ENV_MIN_GRID_SIZE, &value)?;
    }
    if let Some(value) = lookup(ENV_SIZE) {
      config.trial.size = parse_value(ENV_SIZE, &value)?;
    }
    if let Some(value) = lookup(ENV_LAMBDA) {
      config.trial.lambda = parse_value(ENV_LAMBDA, &value)?;
    }
    if let Some(value) = lookup(ENV_EXCLUDE) {
      config.exclusions = ExclusionTable::parse(&value)?;
    }
    config.validate()?;
    Ok(config)
  }
}

fn first_repeat<T: Ord>(items: &[T]) -> Option<&T> {
  let mut seen = BTreeSet::new();
  items.iter().find(|item| !seen.insert(*item))
}

fn parse_value<T: FromStr>(key: &'static str, value: &str) -> Result<T, ConfigError> {
  value.trim().parse().map_err(|_| ConfigError::InvalidValue {
    key,
    value: value.to_string(),
  })
}

fn parse_list(key: &'static str, value: &str) -> Result<Vec<u32>, ConfigError> {
  value
    .split(',')
    .map(str::trim)
    .filter(|item| !item.is_empty())
    .map(|item| parse_value(key, item))
    .collect()
}
