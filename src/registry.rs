//! Builds the benchmark matrix for one generator family.
//!
//! For every requested output type the builder checks that the family can
//! produce it, works out which distributions apply, and registers one variant
//! per (distribution, launch configuration) pair. Variants are inert until
//! [`BenchmarkVariant::run`] is called; building the matrix never touches the
//! device.

use std::fmt;
use std::sync::Arc;

use itertools::Itertools;
use tracing::{debug, info};

use crate::capability::SupportPredicate;
use crate::config::{TrialConfig, TuningConfig};
use crate::device::{DeviceRuntime, GeneratorFamily};
use crate::distribution::{applicable_distributions, DistributionDescriptor};
use crate::error::TrialError;
use crate::naming::variant_name;
use crate::params::{ConfigCandidate, GeneratorKind, OutputType};
use crate::runner::{run_benchmark, IterationTimer};

/// Everything that identifies one variant. Plain data, so a registered task
/// does not depend on the builder that created it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct VariantSpec {
  pub generator: GeneratorKind,
  pub distribution: DistributionDescriptor,
  pub config: ConfigCandidate,
}

impl VariantSpec {
  pub fn output(&self) -> OutputType {
    self.distribution.output
  }

  pub fn name(&self) -> String {
    variant_name(self.generator.name(), &self.distribution.id(), self.config)
  }
}

/// Deferred trial, invoked by the harness with its iteration timer.
pub type TrialFn = Box<dyn Fn(&mut dyn IterationTimer) -> Result<(), TrialError>>;

/// One named, runnable benchmark trial.
pub struct BenchmarkVariant {
  name: String,
  spec: VariantSpec,
  trial: TrialConfig,
  task: TrialFn,
}

impl BenchmarkVariant {
  pub fn name(&self) -> &str {
    &self.name
  }

  pub fn spec(&self) -> &VariantSpec {
    &self.spec
  }

  pub fn trial(&self) -> &TrialConfig {
    &self.trial
  }

  /// Bytes written by one generate call.
  pub fn bytes_per_iteration(&self) -> u64 {
    (self.trial.size as u64).saturating_mul(self.spec.output().size_of() as u64)
  }

  /// Elements written by one generate call.
  pub fn items_per_iteration(&self) -> u64 {
    self.trial.size as u64
  }

  /// Executes the trial against `timer`.
  pub fn run(&self, timer: &mut dyn IterationTimer) -> Result<(), TrialError> {
    (self.task)(timer)
  }
}

impl fmt::Debug for BenchmarkVariant {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("BenchmarkVariant")
      .field("name", &self.name)
      .field("spec", &self.spec)
      .field("trial", &self.trial)
      .finish_non_exhaustive()
  }
}

/// Registers the benchmark variants of one generator family.
pub struct MatrixBuilder<'c, D, F> {
  runtime: Arc<D>,
  family: Arc<F>,
  config: &'c TuningConfig,
  support: &'c dyn SupportPredicate,
  candidates: Vec<ConfigCandidate>,
}

impl<'c, D, F> MatrixBuilder<'c, D, F>
where
  D: DeviceRuntime + 'static,
  F: GeneratorFamily<D> + 'static,
{
  /// Support is decided by `config.exclusions` unless replaced with
  /// [`MatrixBuilder::with_support`].
  pub fn new(runtime: Arc<D>, family: Arc<F>, config: &'c TuningConfig) -> Self {
    Self {
      runtime,
      family,
      config,
      support: &config.exclusions,
      candidates: config.config_candidates(),
    }
  }

  pub fn with_support(mut self, support: &'c dyn SupportPredicate) -> Self {
    self.support = support;
    self
  }

  /// Launch configurations every distribution is registered for.
  pub fn candidates(&self) -> &[ConfigCandidate] {
    &self.candidates
  }

  /// Appends the variants for `output` to `variants` and returns how many
  /// were added. Adds nothing when the family cannot produce `output`.
  pub fn add_benchmarks(&self, output: OutputType, variants: &mut Vec<BenchmarkVariant>) -> usize {
    let generator = self.family.kind();
    if !self.support.supports(output, generator) {
      debug!(generator = %generator, output = %output, "output type not supported, skipping");
      return 0;
    }

    let before = variants.len();
    for distribution in applicable_distributions(output) {
      for &config in &self.candidates {
        let spec = VariantSpec {
          generator,
          distribution,
          config,
        };
        let variant = self.make_variant(spec);
        debug!(variant = %variant.name, "registered benchmark variant");
        variants.push(variant);
      }
    }
    variants.len() - before
  }

  /// Appends the variants for every output type in the configuration, in
  /// configuration order. A repeated output type is only registered once.
  pub fn add_all_benchmarks(&self, variants: &mut Vec<BenchmarkVariant>) -> usize {
    let added: usize = self
      .config
      .output_types
      .iter()
      .unique()
      .map(|&output| self.add_benchmarks(output, variants))
      .sum();
    info!(
      generator = %self.family.kind(),
      variants = added,
      configurations = self.candidates.len(),
      "benchmark matrix built"
    );
    added
  }

  fn make_variant(&self, spec: VariantSpec) -> BenchmarkVariant {
    let runtime = Arc::clone(&self.runtime);
    let family = Arc::clone(&self.family);
    let trial = self.config.trial;
    BenchmarkVariant {
      name: spec.name(),
      spec,
      trial,
      task: Box::new(move |timer: &mut dyn IterationTimer| {
        run_benchmark(runtime.as_ref(), family.as_ref(), &spec, &trial, timer)
      }),
    }
  }
}

/// Builds the whole matrix for `family` and appends it to `variants`.
/// Returns the number of variants added.
pub fn add_all_benchmarks_for_generator<D, F>(
  variants: &mut Vec<BenchmarkVariant>,
  runtime: Arc<D>,
  family: Arc<F>,
  config: &TuningConfig,
) -> usize
where
  D: DeviceRuntime + 'static,
  F: GeneratorFamily<D> + 'static,
{
  MatrixBuilder::new(runtime, family, config).add_all_benchmarks(variants)
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::capability::ExclusionTable;
  use crate::device::mock::{pair, MockRuntime};
  use crate::distribution::DistributionKind;
  use crate::runner::BenchmarkResult;
  use proptest::prelude::*;
  use std::collections::HashSet;

  fn build(kind: GeneratorKind, config: &TuningConfig) -> (MockRuntime, Vec<BenchmarkVariant>) {
    let (runtime, family) = pair(kind);
    let mut variants = Vec::new();
    add_all_benchmarks_for_generator(&mut variants, Arc::new(runtime.clone()), Arc::new(family), config);
    (runtime, variants)
  }

  fn small_config() -> TuningConfig {
    TuningConfig::default()
      .thread_options(vec![64, 128])
      .block_options(vec![8])
      .min_grid_size(600)
  }

  #[test]
  fn test_small_grids_are_excluded_everywhere() {
    for kind in [GeneratorKind::Xorwow, GeneratorKind::Philox, GeneratorKind::Sobol64] {
      let (_, variants) = build(kind, &small_config());
      assert!(!variants.is_empty());
      for v in &variants {
        assert_eq!(v.spec().config, ConfigCandidate::new(128, 8));
        assert!(v.name().ends_with("_t128_b8"));
      }
    }
  }

  #[test]
  fn test_variant_count_and_order() {
    let (_, variants) = build(GeneratorKind::Philox, &small_config());
    let names: Vec<_> = variants.iter().map(|v| v.name()).collect();
    assert_eq!(
      names,
      vec![
        "philox_uniform_unsigned_int_t128_b8",
        "philox_poisson_unsigned_int_t128_b8",
        "philox_uniform_unsigned_char_t128_b8",
        "philox_uniform_unsigned_short_t128_b8",
        "philox_uniform_unsigned_long_long_t128_b8",
        "philox_uniform_float_t128_b8",
        "philox_normal_float_t128_b8",
        "philox_log_normal_float_t128_b8",
        "philox_uniform_half_t128_b8",
        "philox_normal_half_t128_b8",
        "philox_log_normal_half_t128_b8",
        "philox_uniform_double_t128_b8",
        "philox_normal_double_t128_b8",
        "philox_log_normal_double_t128_b8",
      ]
    );
  }

  #[test]
  fn test_distribution_major_configuration_minor() {
    let config = TuningConfig::default()
      .thread_options(vec![128, 256])
      .block_options(vec![8])
      .min_grid_size(1)
      .output_types(vec![OutputType::UnsignedInt]);
    let (_, variants) = build(GeneratorKind::Mrg32k3a, &config);
    let names: Vec<_> = variants.iter().map(|v| v.name()).collect();
    assert_eq!(
      names,
      vec![
        "mrg32k3a_uniform_unsigned_int_t128_b8",
        "mrg32k3a_uniform_unsigned_int_t256_b8",
        "mrg32k3a_poisson_unsigned_int_t128_b8",
        "mrg32k3a_poisson_unsigned_int_t256_b8",
      ]
    );
  }

  #[test]
  fn test_excluded_type_yields_nothing() {
    let config = TuningConfig::default().exclusions(ExclusionTable::known());
    let (runtime, family) = pair(GeneratorKind::Xorwow);
    let builder = MatrixBuilder::new(Arc::new(runtime), Arc::new(family), &config);
    assert!(!builder.candidates().is_empty());

    let mut variants = Vec::new();
    assert_eq!(builder.add_benchmarks(OutputType::UnsignedLongLong, &mut variants), 0);
    assert!(variants.is_empty());

    builder.add_all_benchmarks(&mut variants);
    assert!(variants.iter().all(|v| v.spec().output() != OutputType::UnsignedLongLong));
  }

  #[test]
  fn test_custom_support_predicate() {
    let config = small_config();
    let (runtime, family) = pair(GeneratorKind::Philox);
    let floats_only = |t: OutputType, _g: GeneratorKind| t == OutputType::Float;
    let builder = MatrixBuilder::new(Arc::new(runtime), Arc::new(family), &config).with_support(&floats_only);
    let mut variants = Vec::new();
    assert_eq!(builder.add_all_benchmarks(&mut variants), 3);
  }

  #[test]
  fn test_construction_does_no_device_work() {
    let (runtime, variants) = build(GeneratorKind::Philox, &TuningConfig::default());
    assert!(!variants.is_empty());
    assert_eq!(runtime.log.total_calls(), 0);
  }

  #[test]
  fn test_variant_runs_with_bound_parameters() {
    let config = small_config().trial_size(1000);
    let (runtime, variants) = build(GeneratorKind::Philox, &config);
    let poisson = variants
      .iter()
      .find(|v| v.spec().distribution.kind == DistributionKind::Poisson)
      .unwrap();

    let mut result = BenchmarkResult::new(3);
    poisson.run(&mut result).unwrap();
    assert_eq!(result.samples().len(), 3);
    assert_eq!(result.bytes_processed(), 3 * 1000 * 4);
    assert_eq!(poisson.bytes_per_iteration(), 4000);
    assert_eq!(poisson.items_per_iteration(), 1000);

    let generated = runtime.log.generated.borrow();
    assert!(generated.iter().all(|(t, n, _)| *t == OutputType::UnsignedInt && *n == 1000));
  }

  #[test]
  fn test_failed_variant_does_not_affect_others() {
    let (runtime, variants) = build(GeneratorKind::Philox, &small_config());
    runtime.log.fail_on("generate", 1);
    let mut result = BenchmarkResult::new(2);
    assert!(variants[0].run(&mut result).is_err());

    runtime.log.fail_on("none", 0);
    let mut result = BenchmarkResult::new(2);
    variants[1].run(&mut result).unwrap();
    assert_eq!(result.samples().len(), 2);
    assert_eq!(runtime.log.live_buffers.get(), 0);
  }

  #[test]
  fn test_repeated_options_keep_names_unique() {
    let config = TuningConfig::default()
      .thread_options(vec![128, 128])
      .block_options(vec![8])
      .min_grid_size(1)
      .output_types(vec![OutputType::Float, OutputType::Float]);
    let (_, variants) = build(GeneratorKind::Philox, &config);
    let names: HashSet<_> = variants.iter().map(|v| v.name().to_string()).collect();
    assert_eq!(variants.len(), 3);
    assert_eq!(names.len(), variants.len());
  }

  #[test]
  fn test_construction_is_repeatable() {
    let config = TuningConfig::default();
    let (_, first) = build(GeneratorKind::Threefry4x64, &config);
    let (_, second) = build(GeneratorKind::Threefry4x64, &config);
    assert_eq!(first.len(), second.len());
    for (a, b) in first.iter().zip(&second) {
      assert_eq!(a.name(), b.name());
      assert_eq!(a.spec(), b.spec());
      assert_eq!(a.trial(), b.trial());
    }
  }

  proptest! {
    #[test]
    fn prop_matrix_properties(
      threads in proptest::collection::btree_set(1u32..1025, 1..5),
      blocks in proptest::collection::btree_set(1u32..2049, 1..5),
      min_grid_size in 1u64..200_000,
      generator in proptest::sample::select(GeneratorKind::ALL.to_vec()),
      exclude_wide in any::<bool>(),
    ) {
      let exclusions = if exclude_wide {
        ExclusionTable::empty().exclude(OutputType::UnsignedLongLong, generator)
      } else {
        ExclusionTable::empty()
      };
      let config = TuningConfig::default()
        .thread_options(threads.into_iter().collect())
        .block_options(blocks.into_iter().collect())
        .min_grid_size(min_grid_size)
        .exclusions(exclusions.clone());
      let (_, variants) = build(generator, &config);

      // Unique names.
      let names: HashSet<_> = variants.iter().map(|v| v.name().to_string()).collect();
      prop_assert_eq!(names.len(), variants.len());

      let candidates = config.config_candidates();
      for v in &variants {
        prop_assert!(v.spec().config.grid_size() >= min_grid_size);
        prop_assert!(exclusions.supports(v.spec().output(), generator));
        if v.spec().distribution.kind == DistributionKind::Poisson {
          prop_assert_eq!(v.spec().output(), OutputType::UnsignedInt);
        }
      }

      // Exactly one variant per (type, applicable distribution, surviving configuration).
      for output in OutputType::ALL {
        let expected = if exclusions.supports(output, generator) {
          applicable_distributions(output).len() * candidates.len()
        } else {
          0
        };
        let actual = variants.iter().filter(|v| v.spec().output() == output).count();
        prop_assert_eq!(actual, expected);
      }
    }
  }
}
