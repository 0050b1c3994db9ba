//! Failures raised by resource providers.
//!
//! Providers make the remote calls behind lazy nodes. Whatever goes wrong
//! there is reported as a [`ProviderError`] and reaches the host only after
//! the dispatcher has classified it.

use std::fmt;
use std::io;

use serde_json::Value;
use thiserror::Error;

/// A failed remote call.
#[derive(Debug, Error)]
pub enum ProviderError {
    /// The request never completed: connection refused, reset, timed out.
    #[error("transport error: {0}")]
    Io(#[from] io::Error),

    /// No credentials could be found.
    #[error("unable to locate credentials")]
    NoCredentials,

    /// Some credential material was found but not all of it.
    #[error("partial credentials found in {provider}, missing: {cred_var}")]
    PartialCredentials { provider: String, cred_var: String },

    /// The service answered with an error response.
    #[error(transparent)]
    Service(#[from] ServiceError),

    /// Anything else. These are treated as bugs.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl ProviderError {
    /// Shorthand for a service error response.
    pub fn service(operation: impl Into<String>, response: Value) -> Self {
        ProviderError::Service(ServiceError::new(operation, response))
    }
}

/// An error response from a remote service.
///
/// `response` is the parsed response document. The fields the classifier
/// reads live under `Error`:
///
/// ```json
/// {"Error": {"Code": "AuthFailure", "Message": "...", "HTTPStatusCode": 403}}
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct ServiceError {
    operation: String,
    response: Value,
}

impl ServiceError {
    pub fn new(operation: impl Into<String>, response: Value) -> Self {
        Self {
            operation: operation.into(),
            response,
        }
    }

    /// Name of the remote operation that failed, e.g. `ListUsers`.
    pub fn operation(&self) -> &str {
        &self.operation
    }

    /// The full response document.
    pub fn response(&self) -> &Value {
        &self.response
    }

    /// The `Error` object, if the response has one.
    pub fn error_object(&self) -> Option<&serde_json::Map<String, Value>> {
        self.response.get("Error")?.as_object()
    }

    /// `Error.Code`, when it is a string.
    pub fn code(&self) -> Option<&str> {
        self.error_object()?.get("Code")?.as_str()
    }

    /// `Error.HTTPStatusCode`, untyped.
    pub fn raw_http_status(&self) -> Option<&Value> {
        self.error_object()?
            .get("HTTPStatusCode")
            .filter(|v| !v.is_null())
    }

    fn message(&self) -> Option<&str> {
        self.error_object()?.get("Message")?.as_str()
    }
}

impl fmt::Display for ServiceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "an error occurred ({}) when calling the {} operation",
            self.code().unwrap_or("Unknown"),
            self.operation
        )?;
        if let Some(message) = self.message() {
            write!(f, ": {message}")?;
        }
        Ok(())
    }
}

impl std::error::Error for ServiceError {}
