//! `rng_bench_matrix` builds the tuning matrix for GPU random number
//! generators: every (generator, distribution, output type, launch
//! configuration) combination worth measuring, each as a named, lazily
//! executed benchmark trial. It offers optional integration with the
//! Criterion benchmarking harness.

// Define modules
pub mod capability;
pub mod combinations; // For generate_config_candidates
pub mod config;
#[cfg(feature = "criterion_integration")]
pub mod criterion_runner;
pub mod device; // Runtime and engine capabilities
pub mod distribution;
pub mod error;
pub mod host;
pub mod naming;
pub mod params; // For OutputType, GeneratorKind, ConfigCandidate
pub mod registry;
pub mod runner;

// Re-export key types for easier public use
pub use capability::{ExclusionTable, SupportPredicate};
pub use combinations::generate_config_candidates;
pub use config::{TrialConfig, TuningConfig};
pub use device::{DeviceRuntime, GeneratorFamily, RandomEngine};
pub use distribution::{applicable_distributions, DistributionDescriptor, DistributionKind, DistributionParams};
pub use error::{ConfigError, TrialError};
pub use naming::{parse_variant_name, variant_name};
pub use params::{ConfigCandidate, GeneratorKind, OutputType, TypeCategory};
pub use registry::{add_all_benchmarks_for_generator, BenchmarkVariant, MatrixBuilder, VariantSpec};
pub use runner::{run_benchmark, BenchmarkResult, IterationTimer};

// --- Re-exports for Criterion Integration ---
#[cfg(feature = "criterion_integration")]
pub use criterion_runner::tuning_suite::{SuiteSummary, TuningSuite};
#[cfg(feature = "criterion_integration")]
pub use criterion_runner::{GroupConfiguratorFn, ThroughputUnit};
