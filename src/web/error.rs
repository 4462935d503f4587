//! Request error handling for the drive UI.

use axum::{
    http::{header, StatusCode},
    response::{Html, IntoResponse, Response},
};
use std::collections::HashMap;

use crate::template::{self, TemplateContext, TemplateError, TemplateLoader};
use crate::DriveError;

/// Where unauthenticated requests are sent.
pub const LANDING_PAGE: &str = "/blank";

/// Error categories of the request layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    /// Bad request (400).
    BadRequest,
    /// No valid session, answered with a redirect to the landing page.
    Unauthenticated,
    /// Not found (404), answered with the blank page.
    NotFound,
    /// Request body over the configured ceiling (413).
    PayloadTooLarge,
    /// Field-level validation failure (400).
    ValidationError,
    /// Internal server error (500).
    InternalError,
}

impl ErrorCode {
    /// Get the HTTP status code for this error.
    pub fn status_code(&self) -> StatusCode {
        match self {
            ErrorCode::BadRequest => StatusCode::BAD_REQUEST,
            ErrorCode::Unauthenticated => StatusCode::FOUND,
            ErrorCode::NotFound => StatusCode::NOT_FOUND,
            ErrorCode::PayloadTooLarge => StatusCode::PAYLOAD_TOO_LARGE,
            ErrorCode::ValidationError => StatusCode::BAD_REQUEST,
            ErrorCode::InternalError => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// Request error type.
#[derive(Debug)]
pub struct ApiError {
    code: ErrorCode,
    message: String,
    details: Option<HashMap<String, Vec<String>>>,
}

impl ApiError {
    /// Create a new error.
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            details: None,
        }
    }

    /// Create a new error with field-level details.
    pub fn with_details(
        code: ErrorCode,
        message: impl Into<String>,
        details: HashMap<String, Vec<String>>,
    ) -> Self {
        Self {
            code,
            message: message.into(),
            details: Some(details),
        }
    }

    /// Error code.
    pub fn code(&self) -> ErrorCode {
        self.code
    }

    /// Human-readable message.
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Create a bad request error.
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::BadRequest, message)
    }

    /// Missing, invalid or expired session.
    pub fn unauthenticated() -> Self {
        Self::new(ErrorCode::Unauthenticated, "Not logged in")
    }

    /// Create a not found error.
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::NotFound, message)
    }

    /// Request body over the ceiling.
    pub fn payload_too_large() -> Self {
        Self::new(ErrorCode::PayloadTooLarge, "Request too large")
    }

    /// Create an internal server error.
    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::InternalError, message)
    }

    /// Create a validation error from validator::ValidationErrors.
    pub fn from_validation_errors(errors: validator::ValidationErrors) -> Self {
        let mut details: HashMap<String, Vec<String>> = HashMap::new();

        for (field, field_errors) in errors.field_errors() {
            let messages: Vec<String> = field_errors
                .iter()
                .map(|e| {
                    e.message
                        .as_ref()
                        .map(|m| m.to_string())
                        .unwrap_or_else(|| format!("Invalid value for {}", field))
                })
                .collect();
            details.insert(field.to_string(), messages);
        }

        Self::with_details(ErrorCode::ValidationError, "Validation failed", details)
    }

    fn detail_text(&self) -> String {
        let Some(details) = &self.details else {
            return self.message.clone();
        };
        let mut fields: Vec<_> = details.iter().collect();
        fields.sort_by(|a, b| a.0.cmp(b.0));
        let lines: Vec<String> = fields
            .into_iter()
            .map(|(field, messages)| format!("{}: {}", field, messages.join(", ")))
            .collect();
        format!("{}\n{}", self.message, lines.join("\n"))
    }
}

/// The blank page with an error code, rendered from the built-in copy.
fn error_page(code: u16, text: &str) -> String {
    let context = TemplateContext::new()
        .with("error_code", i64::from(code))
        .with("error_text", text);
    TemplateLoader::builtin("blank")
        .and_then(|page| template::render(page, &context).ok())
        .unwrap_or_else(|| format!("{code} {text}"))
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.code.status_code();
        match self.code {
            ErrorCode::Unauthenticated => {
                (status, [(header::LOCATION, LANDING_PAGE)]).into_response()
            }
            ErrorCode::NotFound => (status, Html(error_page(404, "Page Not Found"))).into_response(),
            _ => (status, self.detail_text()).into_response(),
        }
    }
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}: {}", self.code, self.message)
    }
}

impl std::error::Error for ApiError {}

impl From<DriveError> for ApiError {
    fn from(err: DriveError) -> Self {
        match &err {
            DriveError::Auth(_) => ApiError::unauthenticated(),
            DriveError::NotFound(msg) => ApiError::not_found(format!("{msg} not found")),
            DriveError::InvalidPath(_) => ApiError::bad_request("Invalid path"),
            DriveError::Validation(msg) => ApiError::bad_request(msg.clone()),
            DriveError::Conversion(msg) => ApiError::internal(format!("Failed to convert to PDF: {msg}")),
            _ => {
                tracing::error!("Internal error: {}", err);
                ApiError::internal("An internal error occurred")
            }
        }
    }
}

impl From<TemplateError> for ApiError {
    fn from(err: TemplateError) -> Self {
        ApiError::from(DriveError::Template(err))
    }
}
