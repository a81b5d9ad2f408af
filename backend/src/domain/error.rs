//! Domain-level error types.
//!
//! These errors are transport agnostic. The edge-function adapter maps them to
//! HTTP responses; the client-side services mostly absorb them behind
//! [`crate::domain::safe_call`].

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use utoipa::ToSchema;

/// Stable machine-readable error code describing the failure category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[non_exhaustive]
#[serde(rename_all = "snake_case")]
pub enum ErrorCode {
    /// The request is malformed or fails validation.
    InvalidRequest,
    /// Authentication failed or is missing.
    Unauthorized,
    /// Authenticated but not permitted to perform this action.
    Forbidden,
    /// The requested resource does not exist.
    NotFound,
    /// The request collides with existing state.
    Conflict,
    /// The remote platform answered with a payload that failed schema checks.
    MalformedResponse,
    /// The remote platform could not be reached or is failing.
    ServiceUnavailable,
    /// An unexpected error occurred inside the domain.
    InternalError,
}

/// A failed domain operation: a category plus a non-blank message.
///
/// # Examples
/// ```
/// use questline::domain::{Error, ErrorCode};
///
/// let err = Error::new(ErrorCode::NotFound, "missing");
/// assert_eq!(err.code(), ErrorCode::NotFound);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase", try_from = "UncheckedError")]
pub struct Error {
    #[schema(example = "invalid_request")]
    code: ErrorCode,
    #[schema(example = "Something went wrong")]
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<Value>,
}

/// Validation errors emitted by the constructors.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ErrorValidationError {
    /// The message was empty or whitespace.
    #[error("error message must not be empty")]
    EmptyMessage,
}

impl Error {
    /// Build an error from a code and message.
    ///
    /// # Panics
    ///
    /// Panics when `message` is blank. Call sites pass literals or formatted
    /// descriptions; use [`Error::try_new`] for untrusted text.
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self::try_new(code, message).unwrap_or_else(|err| panic!("{code:?} error: {err}"))
    }

    /// Fallible constructor that validates the message content.
    pub fn try_new(code: ErrorCode, message: impl Into<String>) -> Result<Self, ErrorValidationError> {
        let message = message.into();
        if message.trim().is_empty() {
            return Err(ErrorValidationError::EmptyMessage);
        }
        Ok(Self {
            code,
            message,
            details: None,
        })
    }

    /// Stable machine-readable error code.
    pub fn code(&self) -> ErrorCode {
        self.code
    }

    /// Human-readable message returned to adapters.
    pub fn message(&self) -> &str {
        self.message.as_str()
    }

    /// Supplementary error details for adapters.
    pub fn details(&self) -> Option<&Value> {
        self.details.as_ref()
    }

    /// Attach structured details to the error.
    ///
    /// # Examples
    /// ```
    /// use questline::domain::Error;
    /// use serde_json::json;
    ///
    /// let err = Error::invalid_request("bad").with_details(json!({ "field": "userId" }));
    /// assert!(err.details().is_some());
    /// ```
    #[must_use]
    pub fn with_details(mut self, details: Value) -> Self {
        self.details = Some(details);
        self
    }
}

macro_rules! code_constructors {
    ($($name:ident => $code:ident),+ $(,)?) => {
        impl Error {
            $(
                #[doc = concat!("Shorthand for `Error::new(ErrorCode::", stringify!($code), ", message)`.")]
                pub fn $name(message: impl Into<String>) -> Self {
                    Self::new(ErrorCode::$code, message)
                }
            )+
        }
    };
}

code_constructors! {
    invalid_request => InvalidRequest,
    unauthorized => Unauthorized,
    forbidden => Forbidden,
    not_found => NotFound,
    conflict => Conflict,
    malformed_response => MalformedResponse,
    service_unavailable => ServiceUnavailable,
    internal => InternalError,
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

impl std::error::Error for Error {}

/// Wire form accepted on deserialisation before the message is validated.
#[derive(Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
struct UncheckedError {
    code: ErrorCode,
    message: String,
    #[serde(default)]
    details: Option<Value>,
}

impl TryFrom<UncheckedError> for Error {
    type Error = ErrorValidationError;

    fn try_from(raw: UncheckedError) -> Result<Self, Self::Error> {
        let mut error = Self::try_new(raw.code, raw.message)?;
        error.details = raw.details;
        Ok(error)
    }
}
