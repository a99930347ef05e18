//! Error type for `campus-store-sqlite`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("database error: {0}")]
  Database(#[from] tokio_rusqlite::Error),

  #[error("uuid parse error: {0}")]
  Uuid(#[from] uuid::Error),

  #[error("date/time parse error: {0}")]
  DateParse(String),

  /// A stored enum discriminant that this build does not recognise.
  #[error("unknown {column} value: {value:?}")]
  UnknownValue { column: &'static str, value: String },

  /// A parent reference passed to a seeding helper does not exist.
  #[error("unit not found: {0}")]
  UnitNotFound(uuid::Uuid),

  #[error("a {0} needs a parent unit")]
  MissingParent(campus_core::academic::UnitKind),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
