//! Transfer handlers: download, preview and upload.

use axum::{
    body::Body,
    extract::{multipart::Field, Multipart, Path, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use std::sync::Arc;
use tempfile::NamedTempFile;
use tokio::io::AsyncWriteExt;

use super::{captured, folder_location, found, AppState};
use crate::drive::{sanitize_file_name, Drive, RelativePath};
use crate::preview::{is_presentation, pdf_name};
use crate::storage::PutBody;
use crate::web::dto::UploadResponse;
use crate::web::error::ApiError;
use crate::web::middleware::{no_cache, CurrentSession};

/// Form field of the single-file upload.
const UPLOAD_FIELD: &str = "file";

/// Form field of the legacy multi-file upload.
const LEGACY_UPLOAD_FIELD: &str = "files";

/// How the browser should present a file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Disposition {
    /// Shown in the browser.
    Inline,
    /// Saved to disk.
    Attachment,
}

impl Disposition {
    fn as_str(self) -> &'static str {
        match self {
            Disposition::Inline => "inline",
            Disposition::Attachment => "attachment",
        }
    }
}

/// Generate a safe Content-Disposition header value.
///
/// Control characters (CR, LF) are removed and quotes and backslashes
/// replaced in the plain `filename`; names that needed changes or are not
/// ASCII also get an RFC 5987 `filename*`.
pub fn content_disposition_header(disposition: Disposition, filename: &str) -> String {
    let sanitized: String = filename
        .chars()
        .filter(|c| !c.is_control())
        .map(|c| match c {
            '"' | '\\' => '_',
            _ => c,
        })
        .collect();

    if filename.is_ascii() && sanitized == filename {
        return format!("{}; filename=\"{}\"", disposition.as_str(), filename);
    }

    format!(
        "{}; filename=\"{}\"; filename*=UTF-8''{}",
        disposition.as_str(),
        sanitized,
        urlencoding::encode(filename)
    )
}

async fn serve_object(
    drive: &Drive,
    raw: &str,
    disposition: Disposition,
) -> Result<Response, ApiError> {
    let path = RelativePath::parse(raw)?;
    let name = path
        .name()
        .ok_or_else(|| ApiError::not_found("Object not found"))?
        .to_string();
    let body = drive
        .get(&path)
        .await?
        .ok_or_else(|| ApiError::not_found("Object not found"))?;

    let content_type = mime_guess::from_path(&name)
        .first_or_octet_stream()
        .to_string();
    tracing::debug!(tenant = %drive.root(), path = %path, size = body.size, "Streaming object");

    Response::builder()
        .header(header::CONTENT_TYPE, content_type)
        .header(
            header::CONTENT_DISPOSITION,
            content_disposition_header(disposition, &name),
        )
        .header(header::CONTENT_LENGTH, body.size)
        .body(Body::from_stream(body.stream))
        .map(|response| (no_cache(), response).into_response())
        .map_err(|e| {
            tracing::error!("Failed to build response: {}", e);
            ApiError::internal("Failed to build response")
        })
}

/// GET /browse/{path} - Open a file in the browser.
pub async fn browse(
    State(state): State<Arc<AppState>>,
    CurrentSession(session): CurrentSession,
    Path(raw): Path<String>,
) -> Result<Response, ApiError> {
    let drive = state.drive_for(&session)?;
    serve_object(&drive, &raw, Disposition::Inline).await
}

/// GET /download/{path} - Download a file.
pub async fn download(
    State(state): State<Arc<AppState>>,
    CurrentSession(session): CurrentSession,
    Path(raw): Path<String>,
) -> Result<Response, ApiError> {
    let drive = state.drive_for(&session)?;
    serve_object(&drive, &raw, Disposition::Attachment).await
}

/// GET /pptpdf/{path} - Presentation converted to PDF, shown inline.
pub async fn ppt_to_pdf(
    State(state): State<Arc<AppState>>,
    CurrentSession(session): CurrentSession,
    Path(raw): Path<String>,
) -> Result<Response, ApiError> {
    let path = RelativePath::parse(&raw)?;
    let name = path.name().unwrap_or_default().to_string();
    if !is_presentation(&name) {
        return Err(ApiError::bad_request("File is not a PPT/PPTX/ODP presentation"));
    }

    let drive = state.drive_for(&session)?;
    let body = drive
        .get(&path)
        .await?
        .ok_or_else(|| ApiError::not_found("File not found"))?;
    let data = body.into_bytes().await?;
    let pdf = state.converter.convert_to_pdf(&name, &data).await?;

    Ok((
        no_cache(),
        [
            (header::CONTENT_TYPE, "application/pdf".to_string()),
            (
                header::CONTENT_DISPOSITION,
                content_disposition_header(Disposition::Inline, &pdf_name(&name)),
            ),
        ],
        pdf,
    )
        .into_response())
}

/// Copy a multipart field to a temp file, chunk by chunk.
async fn spool_field(field: &mut Field<'_>) -> Result<NamedTempFile, ApiError> {
    let spool = NamedTempFile::new().map_err(crate::DriveError::from)?;
    let mut file = tokio::fs::File::create(spool.path())
        .await
        .map_err(crate::DriveError::from)?;

    while let Some(chunk) = field.chunk().await.map_err(|e| {
        tracing::warn!("Failed to read multipart field: {}", e);
        ApiError::bad_request("Invalid multipart data")
    })? {
        file.write_all(&chunk).await.map_err(crate::DriveError::from)?;
    }
    file.flush().await.map_err(crate::DriveError::from)?;

    Ok(spool)
}

/// Store one uploaded field under `dir`.
async fn store_field(
    drive: &Drive,
    dir: &RelativePath,
    name: &str,
    field: &mut Field<'_>,
    user: &str,
) -> Result<RelativePath, ApiError> {
    let spool = spool_field(field).await?;
    let path = drive
        .put(dir, name, PutBody::File(spool.path().to_path_buf()), Some(user))
        .await?;
    // The spool file is removed here, after the put has read it.
    drop(spool);
    Ok(path)
}

fn upload_failure(status: StatusCode, name: Option<String>, error: impl Into<String>) -> Response {
    (status, Json(UploadResponse::failed(name, error))).into_response()
}

/// POST /api/upload/{path} - Single-file upload for the progress UI.
///
/// Always answers JSON: `{ok, name, path}` or `{ok: false, error}`.
pub async fn api_upload(
    State(state): State<Arc<AppState>>,
    CurrentSession(session): CurrentSession,
    path: Option<Path<String>>,
    mut multipart: Multipart,
) -> Response {
    let dir = match RelativePath::parse_folder(&captured(path)) {
        Ok(dir) => dir,
        Err(e) => return upload_failure(StatusCode::BAD_REQUEST, None, e.to_string()),
    };
    let drive = match state.drive_for(&session) {
        Ok(drive) => drive,
        Err(e) => return e.into_response(),
    };

    loop {
        let mut field = match multipart.next_field().await {
            Ok(Some(field)) => field,
            Ok(None) => break,
            Err(e) => {
                tracing::warn!("Failed to read multipart data: {}", e);
                return upload_failure(StatusCode::BAD_REQUEST, None, "Invalid multipart data");
            }
        };
        if field.name() != Some(UPLOAD_FIELD) {
            continue;
        }

        let Some(name) = field.file_name().and_then(sanitize_file_name) else {
            return upload_failure(StatusCode::BAD_REQUEST, None, "Nome de arquivo inválido");
        };

        return match store_field(&drive, &dir, &name, &mut field, &session.user).await {
            Ok(stored) => Json(UploadResponse::stored(name, stored.to_string())).into_response(),
            Err(e) => {
                let status = e.code().status_code();
                upload_failure(status, Some(name), e.message())
            }
        };
    }

    upload_failure(StatusCode::BAD_REQUEST, None, "Nenhum arquivo enviado")
}

/// POST /upload/{path} - Legacy multi-file form upload.
pub async fn upload_files(
    State(state): State<Arc<AppState>>,
    CurrentSession(session): CurrentSession,
    path: Option<Path<String>>,
    mut multipart: Multipart,
) -> Result<Response, ApiError> {
    let dir = RelativePath::parse_folder(&captured(path))?;
    let drive = state.drive_for(&session)?;

    while let Some(mut field) = multipart.next_field().await.map_err(|e| {
        tracing::warn!("Failed to read multipart data: {}", e);
        ApiError::bad_request("Invalid multipart data")
    })? {
        if field.name() != Some(LEGACY_UPLOAD_FIELD) {
            continue;
        }
        let Some(name) = field.file_name().and_then(sanitize_file_name) else {
            tracing::debug!("Skipping upload without a usable file name");
            continue;
        };
        store_field(&drive, &dir, &name, &mut field, &session.user).await?;
    }

    Ok(found(folder_location(&dir)))
}
