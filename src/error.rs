//! Error types for trial execution and configuration loading.

use thiserror::Error;

/// Raw status code reported by a collaborator (device runtime or engine).
/// Zero is success on every backend this crate talks to, so it never appears
/// inside an error.
pub type StatusCode = i32;

/// Reported with an allocation failure when the requested byte count does
/// not fit in `usize`. No backend returns it.
pub const STATUS_SIZE_OVERFLOW: StatusCode = -1;

/// A fatal failure while executing one benchmark trial.
///
/// Every variant names the collaborator operation that failed and the status
/// it returned. A trial that hits one of these produces no result.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TrialError {
  /// Device buffer acquisition failed.
  #[error("{operation} failed with status {status}")]
  Allocation { operation: &'static str, status: StatusCode },

  /// The engine could not be created, bound to a stream, or failed to generate.
  #[error("{operation} failed with status {status}")]
  Generation { operation: &'static str, status: StatusCode },

  /// A device-wide or marker synchronization failed.
  #[error("{operation} failed with status {status}")]
  Synchronization { operation: &'static str, status: StatusCode },

  /// Creating, recording or querying a timing marker failed.
  #[error("{operation} failed with status {status}")]
  TimingResource { operation: &'static str, status: StatusCode },
}

impl TrialError {
  pub fn allocation(operation: &'static str, status: StatusCode) -> Self {
    Self::Allocation { operation, status }
  }

  pub fn generation(operation: &'static str, status: StatusCode) -> Self {
    Self::Generation { operation, status }
  }

  pub fn synchronization(operation: &'static str, status: StatusCode) -> Self {
    Self::Synchronization { operation, status }
  }

  pub fn timing_resource(operation: &'static str, status: StatusCode) -> Self {
    Self::TimingResource { operation, status }
  }

  /// Name of the collaborator operation that failed.
  pub fn operation(&self) -> &'static str {
    match self {
      Self::Allocation { operation, .. }
      | Self::Generation { operation, .. }
      | Self::Synchronization { operation, .. }
      | Self::TimingResource { operation, .. } => operation,
    }
  }

  pub fn status(&self) -> StatusCode {
    match self {
      Self::Allocation { status, .. }
      | Self::Generation { status, .. }
      | Self::Synchronization { status, .. }
      | Self::TimingResource { status, .. } => *status,
    }
  }
}

/// Errors raised while building or validating a [`crate::config::TuningConfig`].
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigError {
  #[error("{0} candidate list is empty")]
  EmptyCandidates(&'static str),

  #[error("{0} must be positive")]
  NotPositive(&'static str),

  #[error("{list} list repeats {value}")]
  Duplicate { list: &'static str, value: String },

  #[error("{0} is too large")]
  TooLarge(&'static str),

  #[error("invalid value {value:?} for {key}")]
  InvalidValue { key: &'static str, value: String },

  #[error("unknown output type: {0}")]
  UnknownOutputType(String),

  #[error("unknown generator: {0}")]
  UnknownGenerator(String),

  #[error("malformed exclusion entry {0:?}, expected <generator>:<type>")]
  MalformedExclusion(String),
}
