use std::collections::BTreeSet;

use crate::error::ConfigError;
use crate::params::{GeneratorKind, OutputType};

/// Decides whether a generator family can produce an output type at all.
pub trait SupportPredicate {
  fn supports(&self, output: OutputType, generator: GeneratorKind) -> bool;
}

/// Support table driven by explicit exclusions: every (type, generator) pair
/// is supported unless it has been excluded.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExclusionTable {
  excluded: BTreeSet<(OutputType, GeneratorKind)>,
}

impl ExclusionTable {
  /// A table with no exclusions.
  pub fn empty() -> Self {
    Self::default()
  }

  /// The exclusions known for the shipped generators: xorwow cannot produce
  /// 64-bit unsigned integers.
  pub fn known() -> Self {
    Self::empty().exclude(OutputType::UnsignedLongLong, GeneratorKind::Xorwow)
  }

  pub fn exclude(mut self, output: OutputType, generator: GeneratorKind) -> Self {
    self.excluded.insert((output, generator));
    self
  }

  pub fn is_excluded(&self, output: OutputType, generator: GeneratorKind) -> bool {
    self.excluded.contains(&(output, generator))
  }

  pub fn len(&self) -> usize {
    self.excluded.len()
  }

  pub fn is_empty(&self) -> bool {
    self.excluded.is_empty()
  }

  /// Parses a comma separated list of `<generator>:<type>` pairs, e.g.
  /// `xorwow:unsigned_long_long,sobol32:double`. Blank input yields an empty table.
  pub fn parse(list: &str) -> Result<Self, ConfigError> {
    let mut table = Self::empty();
    for entry in list.split(',').map(str::trim).filter(|e| !e.is_empty()) {
      let (generator, output) = entry
        .split_once(':')
        .ok_or_else(|| ConfigError::MalformedExclusion(entry.to_string()))?;
      table = table.exclude(output.trim().parse()?, generator.trim().parse()?);
    }
    Ok(table)
  }
}

impl SupportPredicate for ExclusionTable {
  fn supports(&self, output: OutputType, generator: GeneratorKind) -> bool {
    !self.is_excluded(output, generator)
  }
}

impl<F> SupportPredicate for F
where
  F: Fn(OutputType, GeneratorKind) -> bool,
{
  fn supports(&self, output: OutputType, generator: GeneratorKind) -> bool {
    self(output, generator)
  }
}
