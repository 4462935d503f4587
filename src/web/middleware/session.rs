//! Session extractor.

use axum::{extract::FromRequestParts, http::request::Parts};
use axum_extra::extract::cookie::CookieJar;
use std::sync::Arc;

use crate::auth::Session;
use crate::web::error::ApiError;
use crate::web::handlers::AppState;

/// The session of the current request.
///
/// Rejects with a redirect to the landing page when the cookie is
/// missing, tampered with or expired.
#[derive(Debug, Clone)]
pub struct CurrentSession(pub Session);

#[axum::async_trait]
impl FromRequestParts<Arc<AppState>> for CurrentSession {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        let jar = CookieJar::from_headers(&parts.headers);
        let session = state
            .codec
            .from_jar(&jar)
            .filter(|session| !session.login.is_empty())
            .ok_or_else(ApiError::unauthenticated)?;
        Ok(CurrentSession(session))
    }
}
