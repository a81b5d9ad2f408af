//! HTTP adapter mapping for domain errors.
//!
//! Edge functions answer failures as `{"success": false, "error", "code"}`
//! so clients can branch on `success` without inspecting the status line.

use actix_web::{HttpResponse, ResponseError, http::StatusCode};
use serde::Serialize;
use tracing::error;
use utoipa::ToSchema;

use crate::domain::{Error, ErrorCode};

/// Convenient result alias for HTTP handlers.
pub type ApiResult<T> = Result<T, Error>;

/// Body of every failed edge function response.
#[derive(Debug, Serialize, ToSchema)]
pub struct FailureBody {
    /// Always `false`.
    pub success: bool,
    /// Human-readable reason; redacted for internal errors.
    pub error: String,
    /// Stable machine-readable failure code.
    pub code: ErrorCode,
}

fn status_for(code: ErrorCode) -> StatusCode {
    match code {
        ErrorCode::InvalidRequest => StatusCode::BAD_REQUEST,
        ErrorCode::Unauthorized => StatusCode::UNAUTHORIZED,
        ErrorCode::Forbidden => StatusCode::FORBIDDEN,
        ErrorCode::NotFound => StatusCode::NOT_FOUND,
        ErrorCode::Conflict => StatusCode::CONFLICT,
        ErrorCode::MalformedResponse => StatusCode::BAD_GATEWAY,
        ErrorCode::ServiceUnavailable => StatusCode::SERVICE_UNAVAILABLE,
        ErrorCode::InternalError => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

fn failure_body(error: &Error) -> FailureBody {
    let message = match error.code() {
        ErrorCode::InternalError => "Internal server error".to_owned(),
        _ => error.message().to_owned(),
    };
    FailureBody {
        success: false,
        error: message,
        code: error.code(),
    }
}

impl ResponseError for Error {
    fn status_code(&self) -> StatusCode {
        status_for(self.code())
    }

    fn error_response(&self) -> HttpResponse {
        if matches!(self.code(), ErrorCode::InternalError) {
            error!(error = %self.message(), "edge function failed");
        }
        HttpResponse::build(self.status_code()).json(failure_body(self))
    }
}

impl From<actix_web::Error> for Error {
    fn from(err: actix_web::Error) -> Self {
        error!(error = %err, "actix error promoted to domain error");
        Error::internal("Internal server error")
    }
}
