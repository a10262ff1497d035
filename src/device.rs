//! Capabilities this crate needs from the device runtime and the engines
//! under test, plus scoped guards that release device resources on every
//! exit path.

use std::fmt::Debug;
use std::time::Duration;

use tracing::{debug, warn};

use crate::distribution::DistributionParams;
use crate::error::{StatusCode, TrialError};
use crate::params::{ConfigCandidate, GeneratorKind, OutputType};

/// Device runtime operations used by a trial: buffers, a stream, timing
/// markers and synchronization.
///
/// Failures are reported as the runtime's raw status code; callers attach the
/// operation name.
pub trait DeviceRuntime {
  type Stream: Copy + Debug;
  type Buffer;
  type Event;

  /// Stream trials are launched on.
  fn default_stream(&self) -> Self::Stream;

  fn allocate(&self, bytes: usize) -> Result<Self::Buffer, StatusCode>;
  fn free(&self, buffer: &mut Self::Buffer) -> Result<(), StatusCode>;

  fn create_event(&self) -> Result<Self::Event, StatusCode>;
  fn destroy_event(&self, event: &mut Self::Event) -> Result<(), StatusCode>;
  fn record_event(&self, event: &Self::Event, stream: Self::Stream) -> Result<(), StatusCode>;
  /// Blocks until all work recorded before `event` has completed.
  fn synchronize_event(&self, event: &Self::Event) -> Result<(), StatusCode>;
  fn elapsed_time(&self, start: &Self::Event, stop: &Self::Event) -> Result<Duration, StatusCode>;

  /// Device-wide barrier.
  fn synchronize(&self) -> Result<(), StatusCode>;
}

/// One engine instance bound to a fixed launch configuration.
pub trait RandomEngine<D: DeviceRuntime> {
  fn identity(&self) -> GeneratorKind;
  fn set_stream(&mut self, stream: D::Stream) -> Result<(), StatusCode>;
  /// Enqueues generation of `count` values of `output` into `buffer`.
  fn generate(
    &mut self,
    buffer: &mut D::Buffer,
    output: OutputType,
    count: usize,
    params: &DistributionParams,
  ) -> Result<(), StatusCode>;
}

/// A generator family: knows its identity and builds engines pinned to a
/// launch configuration.
///
/// [`GeneratorFamily::kind`] must not touch the device; it is called while the
/// benchmark matrix is being built.
pub trait GeneratorFamily<D: DeviceRuntime> {
  type Engine: RandomEngine<D>;

  fn kind(&self) -> GeneratorKind;
  fn create(&self, launch: ConfigCandidate) -> Result<Self::Engine, StatusCode>;
}

/// Device buffer freed when dropped.
pub struct DeviceAllocation<'r, D: DeviceRuntime> {
  runtime: &'r D,
  buffer: D::Buffer,
  bytes: usize,
}

impl<'r, D: DeviceRuntime> DeviceAllocation<'r, D> {
  pub fn new(runtime: &'r D, bytes: usize) -> Result<Self, TrialError> {
    let buffer = runtime
      .allocate(bytes)
      .map_err(|status| TrialError::allocation("allocate", status))?;
    Ok(Self { runtime, buffer, bytes })
  }

  pub fn buffer_mut(&mut self) -> &mut D::Buffer {
    &mut self.buffer
  }

  pub fn bytes(&self) -> usize {
    self.bytes
  }
}

impl<D: DeviceRuntime> Drop for DeviceAllocation<'_, D> {
  fn drop(&mut self) {
    match self.runtime.free(&mut self.buffer) {
      Ok(()) => debug!(bytes = self.bytes, "released device buffer"),
      Err(status) => warn!(bytes = self.bytes, status, "failed to release device buffer"),
    }
  }
}

/// Timing marker destroyed when dropped.
pub struct TimingEvent<'r, D: DeviceRuntime> {
  runtime: &'r D,
  event: D::Event,
}

impl<'r, D: DeviceRuntime> TimingEvent<'r, D> {
  pub fn new(runtime: &'r D) -> Result<Self, TrialError> {
    let event = runtime
      .create_event()
      .map_err(|status| TrialError::timing_resource("event_create", status))?;
    Ok(Self { runtime, event })
  }

  pub fn record(&self, stream: D::Stream) -> Result<(), TrialError> {
    self
      .runtime
      .record_event(&self.event, stream)
      .map_err(|status| TrialError::timing_resource("event_record", status))
  }

  pub fn synchronize(&self) -> Result<(), TrialError> {
    self
      .runtime
      .synchronize_event(&self.event)
      .map_err(|status| TrialError::synchronization("event_synchronize", status))
  }

  /// Time between `start` and this marker.
  pub fn elapsed_since(&self, start: &TimingEvent<'_, D>) -> Result<Duration, TrialError> {
    self
      .runtime
      .elapsed_time(&start.event, &self.event)
      .map_err(|status| TrialError::timing_resource("event_elapsed_time", status))
  }
}

impl<D: DeviceRuntime> Drop for TimingEvent<'_, D> {
  fn drop(&mut self) {
    if let Err(status) = self.runtime.destroy_event(&mut self.event) {
      warn!(status, "failed to destroy timing marker");
    }
  }
}
