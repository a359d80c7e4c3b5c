//! Success/failure wrapper handed to callers at the edge of a fallible
//! operation.
//!
//! [`Outcome`] is deliberately thin: it never retries, never interprets the
//! cause of a failure, and its hooks ([`Outcome::on_success`],
//! [`Outcome::on_failure`]) only observe.

use std::fmt;
use std::sync::Arc;

use crate::app::LisuError;

/// Opaque, cheaply cloneable handle to the error that ended an operation.
///
/// Two failures compare equal only when they share the same underlying
/// cause, so an error carried through [`Outcome::map`] or a `?` boundary
/// stays equal to the one it came from.
#[derive(Debug, Clone)]
pub struct Failure(Arc<LisuError>);

impl Failure {
    pub fn new(error: LisuError) -> Self {
        Self(Arc::new(error))
    }

    pub fn cause(&self) -> &LisuError {
        &self.0
    }
}

impl PartialEq for Failure {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl fmt::Display for Failure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

impl std::error::Error for Failure {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(self.0.as_ref())
    }
}

impl From<LisuError> for Failure {
    fn from(error: LisuError) -> Self {
        Self::new(error)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Outcome<T> {
    Success(T),
    Error(Failure),
}

impl<T> Outcome<T> {
    pub fn failed(error: LisuError) -> Self {
        Outcome::Error(Failure::new(error))
    }

    /// Transforms the success payload. `transform` is never called on an
    /// error; the same failure is carried over.
    pub fn map<U, F>(self, transform: F) -> Outcome<U>
    where
        F: FnOnce(T) -> U,
    {
        match self {
            Outcome::Success(data) => Outcome::Success(transform(data)),
            Outcome::Error(failure) => Outcome::Error(failure),
        }
    }

    pub fn on_success<F>(self, action: F) -> Self
    where
        F: FnOnce(&T),
    {
        if let Outcome::Success(ref data) = self {
            action(data);
        }
        self
    }

    pub fn on_failure<F>(self, action: F) -> Self
    where
        F: FnOnce(&Failure),
    {
        if let Outcome::Error(ref failure) = self {
            action(failure);
        }
        self
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Outcome::Success(_))
    }

    pub fn is_error(&self) -> bool {
        matches!(self, Outcome::Error(_))
    }

    pub fn success(&self) -> Option<&T> {
        match self {
            Outcome::Success(data) => Some(data),
            Outcome::Error(_) => None,
        }
    }

    pub fn failure(&self) -> Option<&Failure> {
        match self {
            Outcome::Success(_) => None,
            Outcome::Error(failure) => Some(failure),
        }
    }

    pub fn into_result(self) -> Result<T, Failure> {
        match self {
            Outcome::Success(data) => Ok(data),
            Outcome::Error(failure) => Err(failure),
        }
    }
}

impl<T> From<crate::app::Result<T>> for Outcome<T> {
    fn from(result: crate::app::Result<T>) -> Self {
        match result {
            Ok(data) => Outcome::Success(data),
            // Already wrapped: hand the same failure back.
            Err(LisuError::Failed(failure)) => Outcome::Error(failure),
            Err(e) => Outcome::failed(e),
        }
    }
}

impl<T: fmt::Display> fmt::Display for Outcome<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Outcome::Success(data) => fmt::Display::fmt(data, f),
            Outcome::Error(failure) => fmt::Display::fmt(failure, f),
        }
    }
}
