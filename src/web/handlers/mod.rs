//! Request handlers for the drive UI.

pub mod auth;
pub mod files;
pub mod transfer;

pub use auth::*;
pub use files::*;
pub use transfer::*;

use axum::{
    http::{header, StatusCode},
    response::{Html, IntoResponse, Response},
};

use crate::auth::{Session, SessionCodec, TokenCipher};
use crate::config::Config;
use crate::drive::{encode_path, Drive, ListingFormatter, RelativePath, TenantRoot};
use crate::preview::DocumentConverter;
use crate::storage::SharedStore;
use crate::template::{TemplateContext, TemplateLoader};
use crate::web::error::ApiError;

/// Application state shared across handlers.
pub struct AppState {
    /// Object store shared by every tenant.
    pub store: SharedStore,
    /// Session cookie codec.
    pub codec: SessionCodec,
    /// Login token cipher.
    pub cipher: TokenCipher,
    /// Page templates.
    pub templates: TemplateLoader,
    /// Presentation preview converter.
    pub converter: DocumentConverter,
    /// Listing formatter.
    pub formatter: ListingFormatter,
    /// Name of the client-area folder.
    pub client_area: String,
    /// Base URL of generated external links.
    pub public_url: String,
}

impl AppState {
    /// Create the application state.
    pub fn new(store: SharedStore, config: &Config) -> Self {
        Self {
            store,
            codec: SessionCodec::new(&config.session),
            cipher: TokenCipher::new(&config.session.app_key),
            templates: TemplateLoader::new(&config.web.templates_path),
            converter: DocumentConverter::new(&config.preview),
            formatter: ListingFormatter::new(config.drive.max_name_length),
            client_area: config.drive.client_area_folder.clone(),
            public_url: config.server.public_url.clone(),
        }
    }

    /// Drive scoped to the session's tenant root.
    pub fn drive_for(&self, session: &Session) -> Result<Drive, ApiError> {
        let root = TenantRoot::new(&session.login)?;
        Ok(Drive::new(self.store.clone(), root, self.client_area.clone()))
    }

    /// Render a page.
    pub fn render(&self, name: &str, context: &TemplateContext) -> Result<Html<String>, ApiError> {
        Ok(Html(self.templates.render(name, context)?))
    }
}

/// `302 Found` to `location`.
pub(crate) fn found(location: impl AsRef<str>) -> Response {
    match header::HeaderValue::from_str(location.as_ref()) {
        Ok(value) => (StatusCode::FOUND, [(header::LOCATION, value)]).into_response(),
        Err(_) => (StatusCode::FOUND, [(header::LOCATION, "/files/")]).into_response(),
    }
}

/// Listing page URL of a folder.
pub(crate) fn folder_location(dir: &RelativePath) -> String {
    format!("/files/{}", encode_path(&dir.to_string()))
}

/// Logical path captured by a `/*path` route, empty for the bare route.
pub(crate) fn captured(path: Option<axum::extract::Path<String>>) -> String {
    path.map(|axum::extract::Path(raw)| raw).unwrap_or_default()
}
