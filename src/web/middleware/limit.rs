//! Request body ceiling.

use axum::{
    extract::{Request, State},
    http::header::CONTENT_LENGTH,
    middleware::Next,
    response::{IntoResponse, Response},
};

use crate::web::error::ApiError;

/// Reject requests whose declared `Content-Length` is over `limit` bytes.
///
/// Runs before routing, so no handler sees an oversized body. Bodies
/// without a length (chunked) are bounded by `DefaultBodyLimit` instead.
/// An unparsable header is let through.
pub async fn content_length_limit(
    State(limit): State<u64>,
    request: Request,
    next: Next,
) -> Response {
    let declared = request
        .headers()
        .get(CONTENT_LENGTH)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.trim().parse::<u64>().ok());

    if let Some(length) = declared {
        if length > limit {
            tracing::warn!(length, limit, uri = %request.uri(), "Rejected oversized request");
            return ApiError::payload_too_large().into_response();
        }
    }

    next.run(request).await
}
