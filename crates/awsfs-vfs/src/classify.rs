//! Provider failure classification.
//!
//! Maps a [`ProviderError`] onto the errno the host sees and the severity it
//! is logged at. Anything the table does not cover is
//! [`Classification::Unclassified`], which the dispatcher treats as a bug.
//!
//! | Failure | Errno | Severity |
//! |---|---|---|
//! | transport I/O | `EIO` | Warning |
//! | missing or partial credentials | `ENOLINK` | Warning |
//! | code `ResourceNotFoundException` | `ENOENT` | Info |
//! | code `AuthFailure`, `UnauthorizedOperation`, `Blocked` | `EPERM` | Warning |
//! | status 401, 402, 403 | `EPERM` | Warning |
//! | status 404, 410 | `ENOENT` | Info |
//! | status 409 | `ESTALE` | Warning |
//! | status ≥ 500 | `EIO` | Warning |
//! | any other service error | `EIO` | Error |
//!
//! Codes are checked before statuses: a missing table can come back as
//! `ResourceNotFoundException` with a 400. A status that is not an integer
//! at all is a [`ClassifyError`].

use serde_json::Value;
use strum::Display;
use thiserror::Error;

use crate::errno::Errno;
use crate::provider::{ProviderError, ServiceError};

/// Log severity attached to a classified failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Display)]
#[strum(serialize_all = "UPPERCASE")]
pub enum Severity {
    Debug,
    Info,
    Warning,
    Error,
    Fatal,
}

/// Outcome of classifying a provider failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Classification {
    Classified { errno: Errno, severity: Severity },
    Unclassified,
}

/// The failure could not be inspected.
#[derive(Debug, Error)]
pub enum ClassifyError {
    #[error("{operation} response has a malformed HTTPStatusCode: {value}")]
    MalformedStatus { operation: String, value: Value },

    #[error("classifier failed: {0}")]
    Other(String),
}

/// Strategy seam for the dispatcher.
pub trait Classifier: Send + Sync {
    fn classify(&self, failure: &ProviderError) -> Result<Classification, ClassifyError>;
}

/// The fixed classification table.
#[derive(Debug, Clone, Copy, Default)]
pub struct ErrorTable;

impl Classifier for ErrorTable {
    fn classify(&self, failure: &ProviderError) -> Result<Classification, ClassifyError> {
        classify(failure)
    }
}

fn classified(errno: Errno, severity: Severity) -> Classification {
    Classification::Classified { errno, severity }
}

/// Classify a provider failure.
pub fn classify(failure: &ProviderError) -> Result<Classification, ClassifyError> {
    match failure {
        ProviderError::Io(_) => Ok(classified(Errno::Io, Severity::Warning)),
        ProviderError::NoCredentials | ProviderError::PartialCredentials { .. } => {
            Ok(classified(Errno::NoLink, Severity::Warning))
        }
        ProviderError::Service(err) => classify_service(err),
        ProviderError::Other(_) => Ok(Classification::Unclassified),
    }
}

fn classify_service(err: &ServiceError) -> Result<Classification, ClassifyError> {
    match err.code() {
        Some("ResourceNotFoundException") => {
            return Ok(classified(Errno::NoEntry, Severity::Info));
        }
        Some("AuthFailure" | "UnauthorizedOperation" | "Blocked") => {
            return Ok(classified(Errno::PermissionDenied, Severity::Warning));
        }
        _ => {}
    }

    let status = match err.raw_http_status() {
        None => None,
        Some(value) => Some(integer_status(value).ok_or_else(|| ClassifyError::MalformedStatus {
            operation: err.operation().to_string(),
            value: value.clone(),
        })?),
    };

    let classification = match status {
        Some(401..=403) => classified(Errno::PermissionDenied, Severity::Warning),
        Some(404 | 410) => classified(Errno::NoEntry, Severity::Info),
        Some(409) => classified(Errno::Stale, Severity::Warning),
        Some(s) if s >= 500 => classified(Errno::Io, Severity::Warning),
        _ => classified(Errno::Io, Severity::Error),
    };
    Ok(classification)
}

/// The status as an integer. Integral floats such as `503.0` count, and
/// values beyond `i64` saturate.
fn integer_status(value: &Value) -> Option<i64> {
    if let Some(status) = value.as_i64() {
        return Some(status);
    }
    if let Some(status) = value.as_u64() {
        return Some(i64::try_from(status).unwrap_or(i64::MAX));
    }
    let status = value.as_f64()?;
    (status.is_finite() && status.fract() == 0.0).then_some(status as i64)
}
