#![cfg(feature = "criterion_integration")]

use super::{GroupConfiguratorFn, ThroughputUnit};
use crate::registry::BenchmarkVariant;
use crate::runner::BenchmarkResult;

use criterion::{
  measurement::WallTime, AxisScale, Bencher, BenchmarkGroup, BenchmarkId, Criterion, PlotConfiguration, Throughput,
};
use tracing::{error, info, warn};

/// What a [`TuningSuite::run`] did with its variants.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SuiteSummary {
  pub attempted: usize,
  pub run: usize,
  pub skipped: usize,
}

/// Runs a collection of benchmark variants as one Criterion benchmark group.
///
/// Each variant becomes one benchmark, identified by its variant name. Its
/// timed iterations are driven through `Bencher::iter_custom`, so Criterion
/// only sees the time between the trial's timing markers.
pub struct TuningSuite<'s> {
  criterion: &'s mut Criterion<WallTime>,
  suite_base_name: String,
  variants: Vec<BenchmarkVariant>,
  criterion_group_configurator: Option<GroupConfiguratorFn>,
  throughput_unit: ThroughputUnit,
  preflight: bool,
}

impl<'s> TuningSuite<'s> {
  pub fn new(criterion: &'s mut Criterion<WallTime>, suite_base_name: String, variants: Vec<BenchmarkVariant>) -> Self {
    Self {
      criterion,
      suite_base_name,
      variants,
      criterion_group_configurator: None,
      throughput_unit: ThroughputUnit::default(),
      preflight: false,
    }
  }

  pub fn configure_criterion_group(mut self, f: impl for<'g> Fn(&mut BenchmarkGroup<'g, WallTime>) + 'static) -> Self {
    self.criterion_group_configurator = Some(Box::new(f));
    self
  }

  pub fn throughput_unit(mut self, unit: ThroughputUnit) -> Self {
    self.throughput_unit = unit;
    self
  }

  /// Run every variant once with a single iteration before handing it to
  /// Criterion, and leave out the ones that fail instead of aborting the
  /// whole run on their first sample.
  pub fn preflight(mut self, enabled: bool) -> Self {
    self.preflight = enabled;
    self
  }

  pub fn run(self) -> SuiteSummary {
    if self.variants.is_empty() {
      info!(suite = %self.suite_base_name, "no variants registered, nothing to run");
      return SuiteSummary::default();
    }

    let total_variants = self.variants.len();
    let mut variants_run_count = 0;
    let mut variants_skipped_preflight = 0;

    let mut group = self.criterion.benchmark_group(&self.suite_base_name);

    if let Some(ref configurator) = self.criterion_group_configurator {
      configurator(&mut group);
    } else {
      group
        .plot_config(PlotConfiguration::default().summary_scale(AxisScale::Logarithmic))
        .sample_size(10);
    }

    for variant in self.variants {
      if self.preflight {
        if let Err(e) = variant.run(&mut BenchmarkResult::new(1)) {
          warn!(
            suite = %self.suite_base_name,
            variant = %variant.name(),
            error = %e,
            "preflight failed, skipping variant"
          );
          variants_skipped_preflight += 1;
          continue;
        }
      }

      group.throughput(match self.throughput_unit {
        ThroughputUnit::Bytes => Throughput::Bytes(variant.bytes_per_iteration()),
        ThroughputUnit::Elements => Throughput::Elements(variant.items_per_iteration()),
      });

      let bench_id = BenchmarkId::from_parameter(variant.name());
      group.bench_function(bench_id, move |b: &mut Bencher<'_, WallTime>| {
        b.iter_custom(|iters_count_hint| {
          let mut result = BenchmarkResult::new(iters_count_hint);
          if let Err(e) = variant.run(&mut result) {
            error!(variant = %variant.name(), error = %e, "trial failed");
            panic!("[RngBenchMatrix] trial '{}' failed: {}", variant.name(), e);
          }
          result.total_elapsed()
        });
      });

      variants_run_count += 1;
    }

    group.finish();

    if variants_skipped_preflight > 0 {
      warn!(
        suite = %self.suite_base_name,
        attempted = total_variants,
        run = variants_run_count,
        skipped = variants_skipped_preflight,
        "suite finished with skipped variants"
      );
    } else {
      info!(
        suite = %self.suite_base_name,
        variants = variants_run_count,
        "all variants set up for Criterion runs"
      );
    }

    SuiteSummary {
      attempted: total_variants,
      run: variants_run_count,
      skipped: variants_skipped_preflight,
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::config::TuningConfig;
  use crate::host::{HostFamily, HostRuntime};
  use crate::params::{GeneratorKind, OutputType};
  use crate::registry::add_all_benchmarks_for_generator;
  use std::sync::Arc;
  use std::time::Duration;

  fn quick_criterion() -> Criterion<WallTime> {
    Criterion::default()
      .warm_up_time(Duration::from_millis(1))
      .measurement_time(Duration::from_millis(5))
      .without_plots()
  }

  fn host_variants(runtime: HostRuntime) -> Vec<BenchmarkVariant> {
    let config = TuningConfig::default()
      .thread_options(vec![128])
      .block_options(vec![8])
      .min_grid_size(1)
      .trial_size(1024)
      .output_types(vec![OutputType::Float, OutputType::Double]);
    let mut variants = Vec::new();
    add_all_benchmarks_for_generator(
      &mut variants,
      Arc::new(runtime),
      Arc::new(HostFamily::new(GeneratorKind::Philox)),
      &config,
    );
    variants
  }

  #[test]
  fn test_suite_runs_host_variants() {
    let mut criterion = quick_criterion();
    let summary = TuningSuite::new(&mut criterion, "host_suite".to_string(), host_variants(HostRuntime::new()))
      .configure_criterion_group(|group| {
        group.sample_size(10);
      })
      .throughput_unit(ThroughputUnit::Elements)
      .run();
    assert_eq!(
      summary,
      SuiteSummary {
        attempted: 6,
        run: 6,
        skipped: 0
      }
    );
  }

  #[test]
  fn test_preflight_skips_failing_variants() {
    // Doubles need 8 KiB and fail; floats need 4 KiB and run.
    let mut criterion = quick_criterion();
    let summary = TuningSuite::new(
      &mut criterion,
      "host_suite_preflight".to_string(),
      host_variants(HostRuntime::new().with_max_allocation(4096)),
    )
    .preflight(true)
    .run();
    assert_eq!(
      summary,
      SuiteSummary {
        attempted: 6,
        run: 3,
        skipped: 3
      }
    );
  }

  #[test]
  fn test_empty_suite_is_a_no_op() {
    let mut criterion = quick_criterion();
    let summary = TuningSuite::new(&mut criterion, "empty".to_string(), Vec::new()).run();
    assert_eq!(summary, SuiteSummary::default());
  }
}
