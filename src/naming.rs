use crate::distribution::{DistributionDescriptor, DistributionKind};
use crate::params::{ConfigCandidate, GeneratorKind, OutputType};

/// Builds the identifier reported to the measurement harness:
/// `<generator>_<distribution>_t<threads>_b<blocks>`.
pub fn variant_name(generator: &str, distribution: &str, config: ConfigCandidate) -> String {
  format!(
    "{}_{}_t{}_b{}",
    generator, distribution, config.threads, config.blocks
  )
}

/// The components recovered from a variant name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParsedVariantName {
  pub generator: GeneratorKind,
  pub distribution: DistributionDescriptor,
  pub config: ConfigCandidate,
}

/// Inverse of [`variant_name`] for names built from known generators and
/// distribution descriptors. Returns `None` for anything else.
pub fn parse_variant_name(name: &str) -> Option<ParsedVariantName> {
  let (rest, blocks) = name.rsplit_once("_b")?;
  let (rest, threads) = rest.rsplit_once("_t")?;
  let config = ConfigCandidate::new(threads.parse().ok()?, blocks.parse().ok()?);

  // Generator names may contain underscores (scrambled_sobol32), so match
  // against the known prefixes rather than splitting.
  let generator = GeneratorKind::ALL
    .into_iter()
    .filter(|g| rest.starts_with(g.name()) && rest[g.name().len()..].starts_with('_'))
    .max_by_key(|g| g.name().len())?;
  let distribution = &rest[generator.name().len() + 1..];

  let kinds = [
    DistributionKind::Uniform,
    DistributionKind::Normal,
    DistributionKind::LogNormal,
    DistributionKind::Poisson,
  ];
  kinds
    .into_iter()
    .flat_map(|kind| OutputType::ALL.into_iter().map(move |t| DistributionDescriptor::new(kind, t)))
    .find(|d| d.id() == distribution)
    .map(|distribution| ParsedVariantName {
      generator,
      distribution,
      config,
    })
}
