use std::time::Duration;

use tracing::debug;

use crate::config::TrialConfig;
use crate::device::{DeviceAllocation, DeviceRuntime, GeneratorFamily, RandomEngine, TimingEvent};
use crate::error::{TrialError, STATUS_SIZE_OVERFLOW};
use crate::registry::VariantSpec;

/// The measurement harness's side of a trial. The harness decides how many
/// iterations to run; the runner reports one elapsed time per iteration and
/// the totals processed once the loop is done.
pub trait IterationTimer {
  fn iterations(&self) -> u64;
  fn record_iteration(&mut self, elapsed: Duration);
  fn set_bytes_processed(&mut self, bytes: u64);
  fn set_items_processed(&mut self, items: u64);
}

/// Raw output of one executed trial.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BenchmarkResult {
  iterations: u64,
  samples: Vec<Duration>,
  bytes_processed: u64,
  items_processed: u64,
}

impl BenchmarkResult {
  /// An empty result that asks for `iterations` timed iterations.
  pub fn new(iterations: u64) -> Self {
    Self {
      iterations,
      ..Self::default()
    }
  }

  pub fn samples(&self) -> &[Duration] {
    &self.samples
  }

  pub fn total_elapsed(&self) -> Duration {
    self.samples.iter().sum()
  }

  pub fn bytes_processed(&self) -> u64 {
    self.bytes_processed
  }

  pub fn items_processed(&self) -> u64 {
    self.items_processed
  }
}

impl IterationTimer for BenchmarkResult {
  fn iterations(&self) -> u64 {
    self.iterations
  }

  fn record_iteration(&mut self, elapsed: Duration) {
    self.samples.push(elapsed);
  }

  fn set_bytes_processed(&mut self, bytes: u64) {
    self.bytes_processed = bytes;
  }

  fn set_items_processed(&mut self, items: u64) {
    self.items_processed = items;
  }
}

/// Executes one timed trial of `spec`.
///
/// Allocates a buffer for `trial.size` elements, runs one untimed warm-up
/// generation followed by a device-wide barrier, then for each iteration the
/// harness asks for: record start, generate, record stop, wait for stop and
/// report the elapsed time between the markers. The buffer and both markers
/// are released on every exit path.
///
/// The first failing operation aborts the trial; nothing is reported to
/// `timer` past that point and the totals are never set.
pub fn run_benchmark<D, F, T>(
  runtime: &D,
  family: &F,
  spec: &VariantSpec,
  trial: &TrialConfig,
  timer: &mut T,
) -> Result<(), TrialError>
where
  D: DeviceRuntime,
  F: GeneratorFamily<D>,
  T: IterationTimer + ?Sized,
{
  let output = spec.output();
  let bytes = trial
    .size
    .checked_mul(output.size_of())
    .ok_or(TrialError::allocation("allocate", STATUS_SIZE_OVERFLOW))?;
  let mut allocation = DeviceAllocation::new(runtime, bytes)?;

  let stream = runtime.default_stream();
  let mut engine = family
    .create(spec.config)
    .map_err(|status| TrialError::generation("create_generator", status))?;
  engine
    .set_stream(stream)
    .map_err(|status| TrialError::generation("set_stream", status))?;

  let params = spec.distribution.params(trial);
  let mut generate = |buffer: &mut D::Buffer| {
    engine
      .generate(buffer, output, trial.size, &params)
      .map_err(|status| TrialError::generation("generate", status))
  };

  // Warm-up
  generate(allocation.buffer_mut())?;
  runtime
    .synchronize()
    .map_err(|status| TrialError::synchronization("device_synchronize", status))?;
  debug!(variant = %spec.name(), "warm-up complete");

  let start = TimingEvent::new(runtime)?;
  let stop = TimingEvent::new(runtime)?;
  let iterations = timer.iterations();
  for _ in 0..iterations {
    start.record(stream)?;
    generate(allocation.buffer_mut())?;
    stop.record(stream)?;
    stop.synchronize()?;
    timer.record_iteration(stop.elapsed_since(&start)?);
  }

  let items = iterations.saturating_mul(trial.size as u64);
  timer.set_bytes_processed(items.saturating_mul(output.size_of() as u64));
  timer.set_items_processed(items);
  Ok(())
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::device::mock::{pair, ELAPSED_PER_ITERATION};
  use crate::distribution::{DistributionDescriptor, DistributionKind, DistributionParams};
  use crate::params::{ConfigCandidate, GeneratorKind, OutputType};

  fn spec(kind: DistributionKind, output: OutputType) -> VariantSpec {
    VariantSpec {
      generator: GeneratorKind::Philox,
      distribution: DistributionDescriptor::new(kind, output),
      config: ConfigCandidate::new(256, 512),
    }
  }

  #[test]
  fn test_throughput_totals() {
    let (runtime, family) = pair(GeneratorKind::Philox);
    let trial = TrialConfig {
      size: 1_000_000,
      lambda: 10.0,
    };
    let mut result = BenchmarkResult::new(10);
    run_benchmark(
      &runtime,
      &family,
      &spec(DistributionKind::Uniform, OutputType::Float),
      &trial,
      &mut result,
    )
    .unwrap();

    assert_eq!(result.bytes_processed(), 40_000_000);
    assert_eq!(result.items_processed(), 10_000_000);
    assert_eq!(result.samples().len(), 10);
    assert_eq!(result.total_elapsed(), ELAPSED_PER_ITERATION * 10);
  }

  #[test]
  fn test_protocol_order() {
    let (runtime, family) = pair(GeneratorKind::Philox);
    let mut result = BenchmarkResult::new(2);
    run_benchmark(
      &runtime,
      &family,
      &spec(DistributionKind::Normal, OutputType::Double),
      &TrialConfig::default(),
      &mut result,
    )
    .unwrap();

    let iteration = [
      "event_record",
      "generate",
      "event_record",
      "event_synchronize",
      "event_elapsed_time",
    ];
    let mut expected = vec![
      "allocate",
      "create_generator",
      "set_stream",
      "generate",
      "device_synchronize",
      "event_create",
      "event_create",
    ];
    expected.extend(iteration);
    expected.extend(iteration);
    expected.extend(["event_destroy", "event_destroy", "free"]);
    assert_eq!(*runtime.log.calls.borrow(), expected);
  }

  #[test]
  fn test_generate_receives_distribution_params() {
    let (runtime, family) = pair(GeneratorKind::Xorwow);
    let trial = TrialConfig { size: 128, lambda: 4.0 };
    let mut result = BenchmarkResult::new(1);
    run_benchmark(
      &runtime,
      &family,
      &spec(DistributionKind::Poisson, OutputType::UnsignedInt),
      &trial,
      &mut result,
    )
    .unwrap();

    let generated = runtime.log.generated.borrow();
    assert_eq!(generated.len(), 2);
    for (output, count, params) in generated.iter() {
      assert_eq!(*output, OutputType::UnsignedInt);
      assert_eq!(*count, 128);
      assert!(matches!(params, DistributionParams::Poisson { lambda, .. } if *lambda == 4.0));
    }
  }

  #[test]
  fn test_zero_iterations_still_warms_up() {
    let (runtime, family) = pair(GeneratorKind::Philox);
    let mut result = BenchmarkResult::new(0);
    run_benchmark(
      &runtime,
      &family,
      &spec(DistributionKind::Uniform, OutputType::UnsignedChar),
      &TrialConfig::default(),
      &mut result,
    )
    .unwrap();
    assert_eq!(runtime.log.count("generate"), 1);
    assert_eq!(result.bytes_processed(), 0);
    assert!(result.samples().is_empty());
  }

  #[test]
  fn test_oversized_trial_fails_allocation() {
    let (runtime, family) = pair(GeneratorKind::Philox);
    let trial = TrialConfig {
      size: usize::MAX,
      lambda: 10.0,
    };
    let mut result = BenchmarkResult::new(1);
    let err = run_benchmark(
      &runtime,
      &family,
      &spec(DistributionKind::Uniform, OutputType::Double),
      &trial,
      &mut result,
    )
    .unwrap_err();
    assert_eq!(err, TrialError::allocation("allocate", STATUS_SIZE_OVERFLOW));
    assert_eq!(runtime.log.total_calls(), 0);
    assert!(result.samples().is_empty());
  }

  #[test]
  fn test_failures_abort_and_release_everything() {
    let cases = [
      ("allocate", TrialError::allocation("allocate", 2)),
      ("create_generator", TrialError::generation("create_generator", 3)),
      ("set_stream", TrialError::generation("set_stream", 3)),
      ("generate", TrialError::generation("generate", 3)),
      ("device_synchronize", TrialError::synchronization("device_synchronize", 3)),
      ("event_create", TrialError::timing_resource("event_create", 3)),
      ("event_record", TrialError::timing_resource("event_record", 3)),
      ("event_synchronize", TrialError::synchronization("event_synchronize", 3)),
      ("event_elapsed_time", TrialError::timing_resource("event_elapsed_time", 3)),
    ];
    for (operation, expected) in cases {
      let (runtime, family) = pair(GeneratorKind::Philox);
      let status = expected.status();
      runtime.log.fail_on(operation, status);

      let mut result = BenchmarkResult::new(5);
      let err = run_benchmark(
        &runtime,
        &family,
        &spec(DistributionKind::Uniform, OutputType::Float),
        &TrialConfig::default(),
        &mut result,
      )
      .unwrap_err();

      assert_eq!(err, expected, "failing {}", operation);
      assert!(result.samples().is_empty(), "failing {}", operation);
      assert_eq!(result.bytes_processed(), 0);
      assert_eq!(result.items_processed(), 0);
      assert_eq!(runtime.log.live_buffers.get(), 0, "buffer leaked when failing {}", operation);
      assert_eq!(runtime.log.live_events.get(), 0, "marker leaked when failing {}", operation);
    }
  }
}
