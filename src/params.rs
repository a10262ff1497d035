use std::fmt;
use std::str::FromStr;

use crate::error::ConfigError;

/// The value types a generator can be asked to produce.
///
/// The set is fixed. Variant ordering inside a generator's matrix follows
/// [`OutputType::ALL`], which is the canonical order used by the tuning runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum OutputType {
  /// 32-bit unsigned integer, the "standard unsigned" width.
  UnsignedInt,
  UnsignedChar,
  UnsignedShort,
  /// 64-bit unsigned integer, the widest integral width.
  UnsignedLongLong,
  Float,
  /// IEEE binary16.
  Half,
  Double,
}

/// Category an [`OutputType`] belongs to. Distribution applicability is
/// decided purely by category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TypeCategory {
  Integral,
  FloatingPoint,
}

impl OutputType {
  /// All output types in canonical order.
  pub const ALL: [OutputType; 7] = [
    OutputType::UnsignedInt,
    OutputType::UnsignedChar,
    OutputType::UnsignedShort,
    OutputType::UnsignedLongLong,
    OutputType::Float,
    OutputType::Half,
    OutputType::Double,
  ];

  /// Size of one element in bytes.
  pub const fn size_of(self) -> usize {
    match self {
      OutputType::UnsignedChar => 1,
      OutputType::UnsignedShort | OutputType::Half => 2,
      OutputType::UnsignedInt | OutputType::Float => 4,
      OutputType::UnsignedLongLong | OutputType::Double => 8,
    }
  }

  pub const fn category(self) -> TypeCategory {
    match self {
      OutputType::UnsignedInt
      | OutputType::UnsignedChar
      | OutputType::UnsignedShort
      | OutputType::UnsignedLongLong => TypeCategory::Integral,
      OutputType::Float | OutputType::Half | OutputType::Double => TypeCategory::FloatingPoint,
    }
  }

  /// Stable identifier used in variant names, e.g. `unsigned_long_long`.
  pub const fn name(self) -> &'static str {
    match self {
      OutputType::UnsignedInt => "unsigned_int",
      OutputType::UnsignedChar => "unsigned_char",
      OutputType::UnsignedShort => "unsigned_short",
      OutputType::UnsignedLongLong => "unsigned_long_long",
      OutputType::Float => "float",
      OutputType::Half => "half",
      OutputType::Double => "double",
    }
  }
}

impl fmt::Display for OutputType {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.name())
  }
}

impl FromStr for OutputType {
  type Err = ConfigError;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    OutputType::ALL
      .into_iter()
      .find(|t| t.name() == s)
      .ok_or_else(|| ConfigError::UnknownOutputType(s.to_string()))
  }
}

/// Identity of one random number engine family under benchmark.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum GeneratorKind {
  Mtgp32,
  Mt19937,
  Xorwow,
  Mrg31k3p,
  Mrg32k3a,
  Philox,
  Lfsr113,
  Threefry2x32,
  Threefry2x64,
  Threefry4x32,
  Threefry4x64,
  Sobol32,
  ScrambledSobol32,
  Sobol64,
  ScrambledSobol64,
}

impl GeneratorKind {
  pub const ALL: [GeneratorKind; 15] = [
    GeneratorKind::Mtgp32,
    GeneratorKind::Mt19937,
    GeneratorKind::Xorwow,
    GeneratorKind::Mrg31k3p,
    GeneratorKind::Mrg32k3a,
    GeneratorKind::Philox,
    GeneratorKind::Lfsr113,
    GeneratorKind::Threefry2x32,
    GeneratorKind::Threefry2x64,
    GeneratorKind::Threefry4x32,
    GeneratorKind::Threefry4x64,
    GeneratorKind::Sobol32,
    GeneratorKind::ScrambledSobol32,
    GeneratorKind::Sobol64,
    GeneratorKind::ScrambledSobol64,
  ];

  /// Stable engine name, used as the first component of variant names.
  pub const fn name(self) -> &'static str {
    match self {
      GeneratorKind::Mtgp32 => "mtgp32",
      GeneratorKind::Mt19937 => "mt19937",
      GeneratorKind::Xorwow => "xorwow",
      GeneratorKind::Mrg31k3p => "mrg31k3p",
      GeneratorKind::Mrg32k3a => "mrg32k3a",
      GeneratorKind::Philox => "philox",
      GeneratorKind::Lfsr113 => "lfsr113",
      GeneratorKind::Threefry2x32 => "threefry2x32",
      GeneratorKind::Threefry2x64 => "threefry2x64",
      GeneratorKind::Threefry4x32 => "threefry4x32",
      GeneratorKind::Threefry4x64 => "threefry4x64",
      GeneratorKind::Sobol32 => "sobol32",
      GeneratorKind::ScrambledSobol32 => "scrambled_sobol32",
      GeneratorKind::Sobol64 => "sobol64",
      GeneratorKind::ScrambledSobol64 => "scrambled_sobol64",
    }
  }
}

impl fmt::Display for GeneratorKind {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.name())
  }
}

impl FromStr for GeneratorKind {
  type Err = ConfigError;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    GeneratorKind::ALL
      .into_iter()
      .find(|g| g.name() == s)
      .ok_or_else(|| ConfigError::UnknownGenerator(s.to_string()))
  }
}

/// One launch configuration: threads per block and blocks per grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ConfigCandidate {
  pub threads: u32,
  pub blocks: u32,
}

impl ConfigCandidate {
  /// The launch configuration tuned defaults start out from.
  pub const PRODUCTION_DEFAULT: ConfigCandidate = ConfigCandidate::new(256, 512);

  pub const fn new(threads: u32, blocks: u32) -> Self {
    Self { threads, blocks }
  }

  /// Total number of threads launched, `threads * blocks`.
  pub const fn grid_size(&self) -> u64 {
    self.threads as u64 * self.blocks as u64
  }
}

impl fmt::Display for ConfigCandidate {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "t{}_b{}", self.threads, self.blocks)
  }
}
