//! GET /api/source-code/download
//!
//! Serves the newest `soltree-complete-*.zip` from the archive directory.
//! Archive names embed a sortable timestamp, so the lexicographically
//! greatest name is the newest.

use axum::{
    body::{Body, Bytes},
    extract::State,
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Router,
};
use std::path::Path;
use tokio::io::AsyncReadExt;

use crate::api::middleware::ApiError;
use crate::api::server::SharedAppState;

/// Archive file name prefix
pub const ARCHIVE_PREFIX: &str = "soltree-complete-";

/// Bytes read per body chunk
const CHUNK_SIZE: usize = 64 * 1024;

pub fn router() -> Router<SharedAppState> {
    Router::new().route("/api/source-code/download", get(handle_download))
}

/// Name of the newest archive in `dir`, if any
///
/// A missing directory counts as having no archives.
pub async fn latest_archive(dir: &Path) -> std::io::Result<Option<String>> {
    let mut entries = match tokio::fs::read_dir(dir).await {
        Ok(entries) => entries,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(e),
    };

    let mut latest: Option<String> = None;
    while let Some(entry) = entries.next_entry().await? {
        let Some(name) = entry.file_name().to_str().map(str::to_string) else {
            continue;
        };
        if !name.starts_with(ARCHIVE_PREFIX) || !name.ends_with(".zip") {
            continue;
        }
        if latest.as_deref().map_or(true, |current| name.as_str() > current) {
            latest = Some(name);
        }
    }

    Ok(latest)
}

async fn handle_download(State(state): State<SharedAppState>) -> Result<Response, ApiError> {
    let name = latest_archive(&state.archive_dir)
        .await
        .map_err(|e| {
            tracing::error!(target: "soltree::api", "archive lookup failed: {}", e);
            ApiError::internal("Failed to access source code archive")
        })?
        .ok_or_else(|| {
            ApiError::not_found("No source code archive found. Please create one first.")
        })?;

    let file = tokio::fs::File::open(state.archive_dir.join(&name))
        .await
        .map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => ApiError::not_found("Archive file not found"),
            _ => {
                tracing::error!(target: "soltree::api", "archive open failed: {}", e);
                ApiError::internal("Failed to download archive")
            }
        })?;
    let metadata = file.metadata().await.map_err(|e| {
        tracing::error!(target: "soltree::api", "archive metadata failed: {}", e);
        ApiError::internal("Failed to download archive")
    })?;

    let disposition = format!("attachment; filename=\"{}\"", name);
    Ok((
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, "application/zip".to_string()),
            (header::CONTENT_LENGTH, metadata.len().to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        Body::from_stream(file_chunks(file)),
    )
        .into_response())
}

/// The file as a stream of chunks, read lazily as the client drains the body
fn file_chunks(
    file: tokio::fs::File,
) -> impl futures_util::Stream<Item = std::io::Result<Bytes>> + Send + 'static {
    futures_util::stream::try_unfold(file, |mut file| async move {
        let mut buf = vec![0u8; CHUNK_SIZE];
        let n = file.read(&mut buf).await?;
        if n == 0 {
            return Ok(None);
        }
        buf.truncate(n);
        Ok::<_, std::io::Error>(Some((Bytes::from(buf), file)))
    })
}
