//! Error responses
//!
//! Every failure leaves the server as `{"error": {"code", "message"}}`.
//! The status follows the error class: validation 400, unauthenticated 401,
//! everything else 500.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use precast_core::errors::{ErrorClass, ExError, ExErrorKind};
use serde_json::json;

#[derive(Debug)]
pub struct ApiError(pub ExError);

impl ApiError {
    pub fn unauthorised(message: &str) -> Self {
        Self(ExError::new(ExErrorKind::Unauthorised).with_message(message))
    }

    pub fn status(&self) -> StatusCode {
        status_for(self.0.class())
    }
}

impl From<ExError> for ApiError {
    fn from(err: ExError) -> Self {
        Self(err)
    }
}

#[must_use]
pub fn status_for(class: ErrorClass) -> StatusCode {
    match class {
        ErrorClass::Validation => StatusCode::BAD_REQUEST,
        ErrorClass::Unauthenticated => StatusCode::UNAUTHORIZED,
        ErrorClass::Consistency | ErrorClass::Infrastructure => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(err_code = self.0.code(), err = %self.0, "request failed");
        }

        let mut error = json!({
            "code": self.0.code(),
            "message": self.0.message(),
        });
        if let Some(index) = self.0.line_index() {
            error["line_index"] = json!(index);
        }
        if let Some(request_id) = self.0.request_id() {
            error["request_id"] = json!(request_id.as_str());
        }

        (status, Json(json!({ "error": error }))).into_response()
    }
}
