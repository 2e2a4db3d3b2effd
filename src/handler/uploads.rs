use axum::Router;
use axum::extract::{Path, State};
use axum::http::header;
use axum::response::{AppendHeaders, IntoResponse};
use axum::routing::get;

use crate::AppState;
use crate::error::HttpError;
use crate::storage::{self, FileKind};

pub fn uploads_handler() -> Router<AppState> {
    Router::new().route("/{file_type}/{filename}", get(serve_upload))
}

/// Serve a stored upload from its type-specific directory.
///
/// PDFs are special-cased as downloads: resume files occasionally end up in
/// the images store, so a PDF asked for under `images` falls back to the
/// resumes directory before giving up.
pub async fn serve_upload(
    Path((file_type, filename)): Path<(String, String)>,
    State(app_state): State<AppState>,
) -> Result<impl IntoResponse, HttpError> {
    let kind = FileKind::from_route(&file_type)
        .ok_or_else(|| HttpError::not_found("Invalid file type"))?;

    let mut path = storage::resolve_upload(&app_state.env, kind, &filename)
        .ok_or_else(|| HttpError::not_found("File not found"))?;

    let pdf = storage::is_pdf(&filename);
    if pdf && kind == FileKind::Image && !storage::upload_exists(&path).await {
        if let Some(fallback) =
            storage::resolve_upload(&app_state.env, FileKind::Resume, &filename)
        {
            path = fallback;
        }
    }

    let bytes = tokio::fs::read(&path)
        .await
        .map_err(|_| HttpError::not_found("File not found"))?;

    let mut headers = vec![(
        header::CONTENT_TYPE,
        storage::content_type_for(&filename).to_string(),
    )];
    if pdf {
        headers.push((
            header::CONTENT_DISPOSITION,
            format!("attachment; filename=\"{}\"", filename),
        ));
    }

    Ok((AppendHeaders(headers), bytes))
}
