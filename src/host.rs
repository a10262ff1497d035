//! Host reference backend.
//!
//! Implements the device runtime with heap buffers and wall-clock timing
//! markers, and the engine capability with `rand`'s `StdRng` feeding
//! `rand_distr` samplers. Work runs synchronously on the calling thread, so
//! markers bracket the actual generation time. Useful for exercising a matrix
//! end to end on machines without a GPU.

use std::cell::Cell;
use std::time::{Duration, Instant};

use half::f16;
use rand::distr::OpenClosed01;
use rand::rngs::StdRng;
use rand::{RngCore, SeedableRng};
use rand_distr::{Distribution, LogNormal, Normal, Poisson};

use crate::device::{DeviceRuntime, GeneratorFamily, RandomEngine};
use crate::distribution::DistributionParams;
use crate::error::StatusCode;
use crate::params::{ConfigCandidate, GeneratorKind, OutputType, TypeCategory};

pub const STATUS_INVALID_VALUE: StatusCode = 1;
pub const STATUS_OUT_OF_MEMORY: StatusCode = 2;
pub const STATUS_NOT_READY: StatusCode = 600;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct HostStream;

/// Timing marker holding the instant it was last recorded at.
#[derive(Debug, Default)]
pub struct HostEvent {
  recorded: Cell<Option<Instant>>,
}

#[derive(Debug, Clone, Default)]
pub struct HostRuntime {
  max_allocation: Option<usize>,
}

impl HostRuntime {
  pub fn new() -> Self {
    Self::default()
  }

  /// Allocations above `bytes` fail with [`STATUS_OUT_OF_MEMORY`].
  pub fn with_max_allocation(mut self, bytes: usize) -> Self {
    self.max_allocation = Some(bytes);
    self
  }
}

impl DeviceRuntime for HostRuntime {
  type Stream = HostStream;
  type Buffer = Vec<u8>;
  type Event = HostEvent;

  fn default_stream(&self) -> HostStream {
    HostStream
  }

  fn allocate(&self, bytes: usize) -> Result<Vec<u8>, StatusCode> {
    match self.max_allocation {
      Some(max) if bytes > max => Err(STATUS_OUT_OF_MEMORY),
      _ => Ok(vec![0; bytes]),
    }
  }

  fn free(&self, buffer: &mut Vec<u8>) -> Result<(), StatusCode> {
    *buffer = Vec::new();
    Ok(())
  }

  fn create_event(&self) -> Result<HostEvent, StatusCode> {
    Ok(HostEvent::default())
  }

  fn destroy_event(&self, event: &mut HostEvent) -> Result<(), StatusCode> {
    event.recorded.set(None);
    Ok(())
  }

  fn record_event(&self, event: &HostEvent, _stream: HostStream) -> Result<(), StatusCode> {
    event.recorded.set(Some(Instant::now()));
    Ok(())
  }

  fn synchronize_event(&self, event: &HostEvent) -> Result<(), StatusCode> {
    match event.recorded.get() {
      Some(_) => Ok(()),
      None => Err(STATUS_NOT_READY),
    }
  }

  fn elapsed_time(&self, start: &HostEvent, stop: &HostEvent) -> Result<Duration, StatusCode> {
    match (start.recorded.get(), stop.recorded.get()) {
      (Some(start), Some(stop)) => Ok(stop.saturating_duration_since(start)),
      _ => Err(STATUS_NOT_READY),
    }
  }

  fn synchronize(&self) -> Result<(), StatusCode> {
    Ok(())
  }
}

/// Host stand-in for a generator family. Every family shares the same
/// engine; only the identity differs.
#[derive(Debug, Clone, Copy)]
pub struct HostFamily {
  kind: GeneratorKind,
  seed: u64,
}

impl HostFamily {
  pub fn new(kind: GeneratorKind) -> Self {
    Self {
      kind,
      seed: 0x5eed_f00d,
    }
  }

  pub fn seed(mut self, seed: u64) -> Self {
    self.seed = seed;
    self
  }
}

impl GeneratorFamily<HostRuntime> for HostFamily {
  type Engine = HostEngine;

  fn kind(&self) -> GeneratorKind {
    self.kind
  }

  fn create(&self, launch: ConfigCandidate) -> Result<HostEngine, StatusCode> {
    if launch.threads == 0 || launch.blocks == 0 {
      return Err(STATUS_INVALID_VALUE);
    }
    Ok(HostEngine {
      kind: self.kind,
      launch,
      rng: StdRng::seed_from_u64(self.seed),
      stream: None,
    })
  }
}

#[derive(Debug)]
pub struct HostEngine {
  kind: GeneratorKind,
  launch: ConfigCandidate,
  rng: StdRng,
  stream: Option<HostStream>,
}

impl HostEngine {
  pub fn launch(&self) -> ConfigCandidate {
    self.launch
  }

  pub fn stream(&self) -> Option<HostStream> {
    self.stream
  }

  fn fill<S: Distribution<f64>>(&mut self, target: &mut [u8], output: OutputType, sampler: S) {
    for element in target.chunks_exact_mut(output.size_of()) {
      write_element(element, output, sampler.sample(&mut self.rng));
    }
  }
}

impl RandomEngine<HostRuntime> for HostEngine {
  fn identity(&self) -> GeneratorKind {
    self.kind
  }

  fn set_stream(&mut self, stream: HostStream) -> Result<(), StatusCode> {
    self.stream = Some(stream);
    Ok(())
  }

  fn generate(
    &mut self,
    buffer: &mut Vec<u8>,
    output: OutputType,
    count: usize,
    params: &DistributionParams,
  ) -> Result<(), StatusCode> {
    let bytes = count.checked_mul(output.size_of()).ok_or(STATUS_INVALID_VALUE)?;
    let target = buffer.get_mut(..bytes).ok_or(STATUS_INVALID_VALUE)?;

    match *params {
      // Uniform integers are raw engine bits.
      DistributionParams::Uniform { .. } if output.category() == TypeCategory::Integral => {
        self.rng.fill_bytes(target);
      }
      DistributionParams::Uniform { .. } => self.fill(target, output, OpenClosed01),
      DistributionParams::Normal { mean, stddev } => {
        let normal = Normal::new(mean, stddev).map_err(|_| STATUS_INVALID_VALUE)?;
        self.fill(target, output, normal);
      }
      DistributionParams::LogNormal { mean, stddev } => {
        let log_normal = LogNormal::new(mean, stddev).map_err(|_| STATUS_INVALID_VALUE)?;
        self.fill(target, output, log_normal);
      }
      DistributionParams::Poisson { lambda, .. } => {
        let poisson = Poisson::new(lambda).map_err(|_| STATUS_INVALID_VALUE)?;
        self.fill(target, output, poisson);
      }
    }
    Ok(())
  }
}

fn write_element(element: &mut [u8], output: OutputType, value: f64) {
  match output {
    OutputType::UnsignedChar => element.copy_from_slice(&(value as u8).to_le_bytes()),
    OutputType::UnsignedShort => element.copy_from_slice(&(value as u16).to_le_bytes()),
    OutputType::UnsignedInt => element.copy_from_slice(&(value as u32).to_le_bytes()),
    OutputType::UnsignedLongLong => element.copy_from_slice(&(value as u64).to_le_bytes()),
    OutputType::Float => element.copy_from_slice(&(value as f32).to_le_bytes()),
    OutputType::Half => element.copy_from_slice(&f16::from_f64(value).to_le_bytes()),
    OutputType::Double => element.copy_from_slice(&value.to_le_bytes()),
  }
}
