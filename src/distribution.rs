use std::fmt;

use crate::config::TrialConfig;
use crate::params::{OutputType, TypeCategory};

/// Statistical transform applied to the raw generator output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DistributionKind {
  Uniform,
  Normal,
  LogNormal,
  Poisson,
}

impl DistributionKind {
  pub const fn name(self) -> &'static str {
    match self {
      DistributionKind::Uniform => "uniform",
      DistributionKind::Normal => "normal",
      DistributionKind::LogNormal => "log_normal",
      DistributionKind::Poisson => "poisson",
    }
  }
}

impl fmt::Display for DistributionKind {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.name())
  }
}

/// Shape of the uniform distribution's type parameters.
///
/// Every integral type uses the single-type form except the widest one, whose
/// uniform distribution is declared with separate lower and upper bound types.
/// Both forms produce the same values; the split only matters to engines that
/// dispatch on it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UniformSignature {
  Single(OutputType),
  Bounds { lower: OutputType, upper: OutputType },
}

/// Sampling method used for discrete distributions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DiscreteMethod {
  Alias,
}

/// Construction parameters handed to the engine for one generate call.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DistributionParams {
  Uniform { signature: UniformSignature },
  Normal { mean: f64, stddev: f64 },
  LogNormal { mean: f64, stddev: f64 },
  Poisson { lambda: f64, method: DiscreteMethod },
}

/// One distribution as applied to one output type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DistributionDescriptor {
  pub kind: DistributionKind,
  pub output: OutputType,
}

impl DistributionDescriptor {
  pub const fn new(kind: DistributionKind, output: OutputType) -> Self {
    Self { kind, output }
  }

  /// Identity string used inside variant names, e.g. `log_normal_half`.
  /// The output type is part of it so names stay distinct across the types
  /// registered for one generator.
  pub fn id(&self) -> String {
    format!("{}_{}", self.kind.name(), self.output.name())
  }

  /// Builds the parameters for a trial of the given configuration.
  pub fn params(&self, trial: &TrialConfig) -> DistributionParams {
    match self.kind {
      DistributionKind::Uniform => DistributionParams::Uniform {
        signature: uniform_signature(self.output),
      },
      DistributionKind::Normal => DistributionParams::Normal { mean: 0.0, stddev: 1.0 },
      DistributionKind::LogNormal => DistributionParams::LogNormal { mean: 0.0, stddev: 1.0 },
      DistributionKind::Poisson => DistributionParams::Poisson {
        lambda: trial.lambda,
        method: DiscreteMethod::Alias,
      },
    }
  }
}

fn uniform_signature(output: OutputType) -> UniformSignature {
  match output {
    OutputType::UnsignedLongLong => UniformSignature::Bounds {
      lower: OutputType::UnsignedLongLong,
      upper: OutputType::UnsignedLongLong,
    },
    other => UniformSignature::Single(other),
  }
}

/// Distributions worth benchmarking for `output`, in registration order.
///
/// Integral types get uniform, and the 32-bit unsigned type additionally gets
/// Poisson. Floating-point types (half included) get uniform, normal and
/// log-normal.
pub fn applicable_distributions(output: OutputType) -> Vec<DistributionDescriptor> {
  let kinds: &[DistributionKind] = match (output.category(), output) {
    (TypeCategory::Integral, OutputType::UnsignedInt) => &[DistributionKind::Uniform, DistributionKind::Poisson],
    (TypeCategory::Integral, _) => &[DistributionKind::Uniform],
    (TypeCategory::FloatingPoint, _) => &[
      DistributionKind::Uniform,
      DistributionKind::Normal,
      DistributionKind::LogNormal,
    ],
  };
  kinds
    .iter()
    .map(|&kind| DistributionDescriptor::new(kind, output))
    .collect()
}
