//! Error kinds shared by the domain, the session service and the HTTP boundary.
//!
//! Every failure carries a kind so the boundary can map it to a status code
//! deterministically. Context can be prefixed on the way up without losing it.

use thiserror::Error;

/// Classification of an [`Error`], used for matching and status mapping.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ErrorKind {
  InvalidParam,
  NotFound,
  Forbidden,
  UnprocessableEntity,
  Conflict,
  Internal,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
  /// Malformed or missing input (HTTP 400)
  #[error("invalid parameter: {0}")]
  InvalidParam(String),

  /// Unknown topic, question or session (HTTP 404)
  #[error("not found: {0}")]
  NotFound(String),

  /// Authorization failure (HTTP 403)
  #[error("forbidden: {0}")]
  Forbidden(String),

  /// Semantically invalid domain value, e.g. a zero question id (HTTP 500)
  #[error("unprocessable entity: {0}")]
  UnprocessableEntity(String),

  /// Duplicate write of an existing record (HTTP 500)
  #[error("conflict: {0}")]
  Conflict(String),

  /// Unexpected failures: encoding, downstream faults (HTTP 500)
  #[error("internal error: {0}")]
  Internal(String),
}

pub type Result<T> = std::result::Result<T, Error>;

impl Error {
  pub fn kind(&self) -> ErrorKind {
    match self {
      Error::InvalidParam(_) => ErrorKind::InvalidParam,
      Error::NotFound(_) => ErrorKind::NotFound,
      Error::Forbidden(_) => ErrorKind::Forbidden,
      Error::UnprocessableEntity(_) => ErrorKind::UnprocessableEntity,
      Error::Conflict(_) => ErrorKind::Conflict,
      Error::Internal(_) => ErrorKind::Internal,
    }
  }

  /// Prefix call-site context onto the message, keeping the kind.
  pub fn context(self, ctx: impl std::fmt::Display) -> Self {
    match self {
      Error::InvalidParam(m) => Error::InvalidParam(format!("{ctx}: {m}")),
      Error::NotFound(m) => Error::NotFound(format!("{ctx}: {m}")),
      Error::Forbidden(m) => Error::Forbidden(format!("{ctx}: {m}")),
      Error::UnprocessableEntity(m) => Error::UnprocessableEntity(format!("{ctx}: {m}")),
      Error::Conflict(m) => Error::Conflict(format!("{ctx}: {m}")),
      Error::Internal(m) => Error::Internal(format!("{ctx}: {m}")),
    }
  }

  /// HTTP status code for this error.
  pub fn status_code(&self) -> u16 {
    match self.kind() {
      ErrorKind::InvalidParam => 400,
      ErrorKind::Forbidden => 403,
      ErrorKind::NotFound => 404,
      // domain-rule and duplicate-write failures are server faults at this boundary
      ErrorKind::Conflict | ErrorKind::UnprocessableEntity | ErrorKind::Internal => 500,
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn context_keeps_kind() {
    let err = Error::NotFound("session abc".into()).context("complete session");
    assert_eq!(err.kind(), ErrorKind::NotFound);
    assert_eq!(err.to_string(), "not found: complete session: session abc");
  }

  #[test]
  fn status_codes() {
    assert_eq!(Error::InvalidParam("x".into()).status_code(), 400);
    assert_eq!(Error::Forbidden("x".into()).status_code(), 403);
    assert_eq!(Error::NotFound("x".into()).status_code(), 404);
    assert_eq!(Error::Conflict("x".into()).status_code(), 500);
    assert_eq!(Error::UnprocessableEntity("x".into()).status_code(), 500);
    assert_eq!(Error::Internal("x".into()).status_code(), 500);
  }
}
