//! Session handlers: landing page, token login, logout, sort preference.

use axum::{
    extract::{Path, Query, State},
    response::{IntoResponse, Response},
};
use axum_extra::extract::cookie::{Cookie, CookieJar};
use std::sync::Arc;

use super::{found, AppState};
use crate::drive::{Drive, TenantRoot};
use crate::template::TemplateContext;
use crate::web::dto::SortQuery;
use crate::web::error::ApiError;
use crate::web::middleware::{no_cache, CurrentSession};

fn blank_page(state: &AppState) -> Result<Response, ApiError> {
    let page = state.render("blank", &TemplateContext::new())?;
    Ok((no_cache(), page).into_response())
}

/// GET /blank - Landing page for visitors without a session.
pub async fn blank(State(state): State<Arc<AppState>>) -> Result<Response, ApiError> {
    blank_page(&state)
}

/// GET /login/{token} - Start a session from a login token.
///
/// Any failure (bad token, storage down) clears the session and shows
/// the landing page.
pub async fn login(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    Path(token): Path<String>,
) -> Result<Response, ApiError> {
    match start_session(&state, &token).await {
        Ok(cookie) => Ok((jar.add(cookie), found("/files/")).into_response()),
        Err(e) => {
            tracing::debug!("Login rejected: {}", e);
            let page = blank_page(&state)?;
            Ok((jar.remove(state.codec.removal()), page).into_response())
        }
    }
}

async fn start_session(state: &AppState, token: &str) -> crate::Result<Cookie<'static>> {
    let grant = state.cipher.verify(token)?;
    let session = state.codec.start(grant);
    let root = TenantRoot::new(&session.login)?;
    Drive::new(state.store.clone(), root, state.client_area.clone())
        .initialize()
        .await?;
    tracing::info!(tenant = %session.login, user = %session.user, "Session started");
    state.codec.cookie(&session)
}

/// GET /login/ - No token, same as a bad one.
pub async fn login_without_token(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
) -> Result<Response, ApiError> {
    let page = blank_page(&state)?;
    Ok((jar.remove(state.codec.removal()), page).into_response())
}

/// POST /login/... - Logins are links, never form posts.
pub async fn login_post() -> Response {
    found("/blank")
}

/// GET /logout/ - Clear the session.
pub async fn logout(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
) -> Result<Response, ApiError> {
    let page = blank_page(&state)?;
    Ok((jar.remove(state.codec.removal()), page).into_response())
}

/// GET /external_use/ - Page with a login link to the client area.
pub async fn external_use(
    State(state): State<Arc<AppState>>,
    CurrentSession(session): CurrentSession,
) -> Result<Response, ApiError> {
    let allowed = session.internal && session.external_link;

    let mut context = TemplateContext::new()
        .with("header", session.title.as_str())
        .with("external_link_allowed", allowed);

    if allowed {
        let grant = session.grant().client_area(&state.client_area);
        let token = state.cipher.issue(&grant)?;
        let link = format!("{}/login/{}", state.public_url.trim_end_matches('/'), token);
        context.set("external_link", link);
    }

    let page = state.render("external_link", &context)?;
    Ok((no_cache(), page).into_response())
}

/// GET /changeSort?col= - Sort by a column and flip the direction.
pub async fn change_sort(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    CurrentSession(mut session): CurrentSession,
    Query(query): Query<SortQuery>,
) -> Result<Response, ApiError> {
    session.toggle_sort(&query.col);
    let cookie = state.codec.cookie(&session)?;
    Ok((jar.add(cookie), "OK").into_response())
}

/// GET / - Home folder.
pub async fn index(CurrentSession(_): CurrentSession) -> Response {
    found("/files/")
}
