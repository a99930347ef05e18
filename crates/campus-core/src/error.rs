//! The error taxonomy shared by every engine operation.

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  /// A referenced community, unit or user is absent or inactive.
  #[error("not found: {0}")]
  NotFound(String),

  /// Duplicate membership, or a creation race that could not be resolved.
  #[error("conflict: {0}")]
  Conflict(String),

  /// A structural rule would be broken (last admin, academic community
  /// removal, mismatched hierarchy).
  #[error("invariant violation: {0}")]
  InvariantViolation(String),

  /// The backing store failed. The original error is kept as the source.
  #[error("infrastructure error: {0}")]
  Infrastructure(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl Error {
  /// Wrap a collaborator error without altering it.
  pub fn infrastructure<E>(err: E) -> Self
  where
    E: std::error::Error + Send + Sync + 'static,
  {
    Self::Infrastructure(Box::new(err))
  }

  pub fn kind(&self) -> ErrorKind {
    match self {
      Self::NotFound(_) => ErrorKind::NotFound,
      Self::Conflict(_) => ErrorKind::Conflict,
      Self::InvariantViolation(_) => ErrorKind::InvariantViolation,
      Self::Infrastructure(_) => ErrorKind::Infrastructure,
    }
  }
}

/// Payload-free discriminant of [`Error`], for branching and reporting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
  NotFound,
  Conflict,
  InvariantViolation,
  Infrastructure,
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
