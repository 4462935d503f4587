//! Folder handlers: listing, search, move, rename, create, delete.

use axum::{
    extract::{Path, Query, State},
    response::{IntoResponse, Response},
};
use std::sync::Arc;

use super::{captured, folder_location, found, AppState};
use crate::auth::Session;
use crate::drive::{breadcrumbs, encode_path, DirEntry, Drive, RelativePath};
use crate::template::{escape_html, TemplateContext, Value};
use crate::web::dto::{CreateFolderForm, FindForm, MoveQuery, RenameQuery, ValidatedForm};
use crate::web::error::ApiError;
use crate::web::middleware::{no_cache, CurrentSession};

/// A listing page to render.
struct ListingPage<'a> {
    dir: &'a RelativePath,
    entries: Vec<DirEntry>,
    /// Links of each entry are relative to this folder.
    current_dir: String,
    /// Show the toolbar (create, upload, search).
    homepage: bool,
    /// Raw HTML shown above the table.
    message: Option<String>,
}

fn render_listing(
    state: &AppState,
    session: &Session,
    drive: &Drive,
    page: ListingPage<'_>,
) -> Result<Response, ApiError> {
    let entries = state.formatter.format(
        &page.current_dir,
        page.entries,
        session.sort_key,
        session.sort_order,
    );
    let trail = breadcrumbs(&page.dir.to_string(), &drive.home_label());

    let mut context = TemplateContext::new()
        .with("header", session.title.as_str())
        .with("external_link_allowed", session.internal && session.external_link)
        .with("homepage", page.homepage)
        .with("current_dir_href", encode_path(&page.current_dir))
        .with("breadcrumbs", Value::from_serialize(&trail)?)
        .with("entries", Value::from_serialize(&entries)?);
    if let Some(message) = page.message {
        context.set("message", message);
    }

    let html = state.render("home", &context)?;
    Ok((no_cache(), html).into_response())
}

/// GET /files/{path} - Folder listing.
pub async fn list_files(
    State(state): State<Arc<AppState>>,
    CurrentSession(session): CurrentSession,
    path: Option<Path<String>>,
) -> Result<Response, ApiError> {
    let dir = RelativePath::parse_folder(&captured(path))?;
    let drive = state.drive_for(&session)?;
    let entries = drive.list_folder(&dir).await?;

    render_listing(
        &state,
        &session,
        &drive,
        ListingPage {
            dir: &dir,
            entries,
            current_dir: dir.to_string(),
            homepage: true,
            message: None,
        },
    )
}

/// POST /find/{path} - Search below a folder.
pub async fn find(
    State(state): State<Arc<AppState>>,
    CurrentSession(session): CurrentSession,
    path: Option<Path<String>>,
    ValidatedForm(form): ValidatedForm<FindForm>,
) -> Result<Response, ApiError> {
    let dir = RelativePath::parse_folder(&captured(path))?;
    let drive = state.drive_for(&session)?;
    let entries = drive.find(&dir, &form.search_name).await?;

    let shown = if dir.is_root() {
        drive.home_label()
    } else {
        dir.to_string()
    };
    let message = format!(
        "Resultado da busca por <u><i>{}</i></u> em <u><strong>{}</strong></u>",
        escape_html(form.search_name.trim()),
        escape_html(&shown)
    );

    render_listing(
        &state,
        &session,
        &drive,
        ListingPage {
            dir: &dir,
            entries,
            current_dir: String::new(),
            homepage: false,
            message: Some(message),
        },
    )
}

/// GET /move?from_=&to_= - Drag-and-drop move.
///
/// Folders answer with the destination listing URL, files with `OK` or
/// `NOK` (destination taken). Nonsensical requests are ignored with `OK`.
pub async fn move_entry(
    State(state): State<Arc<AppState>>,
    CurrentSession(session): CurrentSession,
    Query(query): Query<MoveQuery>,
) -> Result<String, ApiError> {
    let MoveQuery { from_, to_ } = query;
    if from_.is_empty() || to_.is_empty() || to_ == "null" {
        return Ok("OK".to_string());
    }

    let from = RelativePath::parse(&from_)?;
    let to = RelativePath::parse_folder(&to_)?;
    let drive = state.drive_for(&session)?;

    let Some(name) = from.name().map(str::to_string) else {
        return Ok("OK".to_string());
    };

    if from.is_folder() {
        if from.contains(&to) {
            return Ok("OK".to_string());
        }
        if drive.is_system_folder(&from) {
            return Ok("NOK".to_string());
        }
        let dest = to.join(&name)?.into_folder();
        drive.move_folder(&from, &dest).await?;
        Ok(folder_location(&to))
    } else {
        let moved = drive.move_file(&from.parent(), &to, &name, false).await?;
        Ok(if moved { "OK" } else { "NOK" }.to_string())
    }
}

/// Keep the old extension when the new file name has none.
fn with_extension(new_name: &str, extension: Option<&str>) -> String {
    let has_extension = std::path::Path::new(new_name).extension().is_some();
    match extension {
        Some(ext) if !has_extension && !ext.is_empty() => format!("{new_name}.{ext}"),
        _ => new_name.to_string(),
    }
}

/// GET /rename/{path}?name=&obj= - Rename a folder or a file in place.
pub async fn rename(
    State(state): State<Arc<AppState>>,
    CurrentSession(session): CurrentSession,
    Path(raw): Path<String>,
    Query(query): Query<RenameQuery>,
) -> Result<String, ApiError> {
    let new_name = query.name.trim().replace('/', "-");
    if new_name.is_empty() || query.obj.is_empty() {
        return Ok("OK".to_string());
    }

    let path = RelativePath::parse(&raw)?;
    let drive = state.drive_for(&session)?;
    if path.is_root() || drive.is_system_folder(&path) {
        return Ok("OK".to_string());
    }

    let renamed = match query.obj.as_str() {
        "folder" => {
            let from = path.into_folder();
            let dest = from.parent().join(&new_name)?.into_folder();
            drive.move_folder(&from, &dest).await?
        }
        "file" => {
            let name = path.name().unwrap_or_default();
            let new_name = with_extension(&new_name, path.extension());
            drive.rename_file(&path.parent(), name, &new_name, false).await?
        }
        _ => true,
    };

    Ok(if renamed { "OK" } else { "NOK" }.to_string())
}

/// GET /create/{path} - Nothing to create, back to the folder.
pub async fn create_folder_redirect(
    CurrentSession(_): CurrentSession,
    path: Option<Path<String>>,
) -> Result<Response, ApiError> {
    let dir = RelativePath::parse_folder(&captured(path))?;
    Ok(found(folder_location(&dir)))
}

/// POST /create/{path} - Create a subfolder.
pub async fn create_folder(
    State(state): State<Arc<AppState>>,
    CurrentSession(session): CurrentSession,
    path: Option<Path<String>>,
    ValidatedForm(form): ValidatedForm<CreateFolderForm>,
) -> Result<Response, ApiError> {
    let dir = RelativePath::parse_folder(&captured(path))?;
    let name = form.dir_name.trim_end().replace('/', "-");
    let drive = state.drive_for(&session)?;

    drive.create_folder(&dir.join(&name)?).await?;
    Ok(found(folder_location(&dir)))
}

/// GET /delete/{path} - Delete a file.
pub async fn delete_file(
    State(state): State<Arc<AppState>>,
    CurrentSession(session): CurrentSession,
    Path(raw): Path<String>,
) -> Result<Response, ApiError> {
    let path = RelativePath::parse(&raw)?;
    if path.is_folder() {
        return Err(ApiError::bad_request("Not a file"));
    }
    state.drive_for(&session)?.delete_file(&path).await?;
    Ok(found(folder_location(&path.parent())))
}

/// GET /deleteFolder/{path} - Delete a folder and everything below it.
pub async fn delete_folder(
    State(state): State<Arc<AppState>>,
    CurrentSession(session): CurrentSession,
    path: Option<Path<String>>,
) -> Result<Response, ApiError> {
    let path = RelativePath::parse_folder(&captured(path))?;
    state.drive_for(&session)?.delete_folder(&path).await?;
    Ok(found(folder_location(&path.parent())))
}
