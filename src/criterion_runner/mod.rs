#![cfg(feature = "criterion_integration")]

use criterion::measurement::WallTime;
use criterion::BenchmarkGroup;

/// Function applied to the Criterion benchmark group before any variant is
/// registered, e.g. to change the sample size or measurement time.
pub type GroupConfiguratorFn = Box<dyn for<'g> Fn(&mut BenchmarkGroup<'g, WallTime>)>;

/// Which per-iteration quantity Criterion reports as throughput.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ThroughputUnit {
  #[default]
  Bytes,
  Elements,
}

pub mod tuning_suite;
