use axum::{
    Json,
    body::Body,
    extract::{Query, State},
    http::{HeaderMap, StatusCode, Uri, header},
    response::{IntoResponse, Response},
};
use bytes::Bytes;
use serde::{Deserialize, Serialize};
use tokio_util::io::ReaderStream;
use tracing::{debug, info};

use crate::AppState;
use crate::error::FileServerError;
use crate::path::RelativePath;
use crate::store::{DirListing, EntryKind};

/// Contents of a folder
#[derive(Debug, Serialize, Deserialize)]
pub struct FolderListingResponse {
    /// Always 0 on success
    pub status: i32,
    /// Base names of the files in the folder
    pub files: Vec<String>,
    /// Base names of the subfolders
    pub directories: Vec<String>,
}

impl From<DirListing> for FolderListingResponse {
    fn from(listing: DirListing) -> Self {
        Self {
            status: 0,
            files: listing.files,
            directories: listing.directories,
        }
    }
}

/// Result of a successful upload
#[derive(Debug, Serialize, Deserialize)]
pub struct UploadResponse {
    /// Always 0 on success
    pub status: i32,
    /// ETag of the entry right after the write
    pub etag: String,
}

/// Upload query parameters
#[derive(Debug, Deserialize)]
pub struct UploadQuery {
    /// Present (with any value) to create a folder instead of writing a file
    #[serde(rename = "isDirectory")]
    pub is_directory: Option<String>,
}

/// Header-safe download name.
fn attachment_name(rel: &RelativePath) -> String {
    rel.file_name()
        .unwrap_or("download")
        .chars()
        .filter(|c| !c.is_control())
        .map(|c| if c == '"' { '\'' } else { c })
        .collect()
}

/// `Content-Disposition` value with an ASCII `filename` and an RFC 5987
/// `filename*` carrying the exact UTF-8 name.
fn content_disposition(rel: &RelativePath) -> String {
    let name = attachment_name(rel);
    let ascii: String = name
        .chars()
        .map(|c| if c.is_ascii() { c } else { '_' })
        .collect();
    format!(
        "attachment; filename=\"{}\"; filename*=UTF-8''{}",
        ascii,
        urlencoding::encode(&name)
    )
}

// ============================================================================
// Handlers
// ============================================================================

/// GET /{*path} - List a folder or download a file
pub async fn download(
    State(state): State<AppState>,
    uri: Uri,
    headers: HeaderMap,
) -> Result<Response, FileServerError> {
    let rel = RelativePath::parse(uri.path())?;
    download_at(&state, rel, &headers).await
}

/// GET / - List the root folder
pub async fn download_root(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Response, FileServerError> {
    download_at(&state, RelativePath::root(), &headers).await
}

/// Files honour `If-None-Match`: a matching tag short-circuits to 304
/// without opening the file.
async fn download_at(
    state: &AppState,
    rel: RelativePath,
    headers: &HeaderMap,
) -> Result<Response, FileServerError> {
    let store = &state.store;

    // Held until the file is opened, not while the body streams.
    let guard = store.lock(&rel).await;

    let kind = store
        .kind(&rel)
        .await?
        .ok_or_else(|| FileServerError::NotFound(rel.to_string()))?;

    if kind == EntryKind::Directory {
        drop(guard);
        debug!("Listing folder: {}", rel);
        let listing = store.list(&rel).await?;
        return Ok(Json(FolderListingResponse::from(listing)).into_response());
    }

    let etag = store.etag(&rel).await;

    let not_modified = headers
        .get(header::IF_NONE_MATCH)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|client_etag| etag.matches(client_etag));
    if not_modified {
        debug!("Not modified: {} ({})", rel, etag);
        return Ok((
            StatusCode::NOT_MODIFIED,
            [(header::ETAG, etag.into_string())],
        )
            .into_response());
    }

    let (file, file_size) = store.open(&rel).await?;
    drop(guard);

    debug!("Streaming file: {} ({} bytes)", rel, file_size);

    let body = Body::from_stream(ReaderStream::new(file));

    let mime = mime_guess::from_path(store.resolve(&rel))
        .first_or_octet_stream()
        .to_string();

    Ok((
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, mime),
            (header::CONTENT_LENGTH, file_size.to_string()),
            (header::ETAG, etag.into_string()),
            (header::CONTENT_DISPOSITION, content_disposition(&rel)),
        ],
        body,
    )
        .into_response())
}

/// POST /{*path} - Write a file, or create a folder with `?isDirectory`
pub async fn upload(
    State(state): State<AppState>,
    uri: Uri,
    Query(query): Query<UploadQuery>,
    body: Bytes,
) -> Result<Json<UploadResponse>, FileServerError> {
    let rel = RelativePath::parse(uri.path())?;
    upload_at(&state, rel, query, body).await
}

/// POST / - Only `?isDirectory` succeeds here; a file cannot replace the root
pub async fn upload_root(
    State(state): State<AppState>,
    Query(query): Query<UploadQuery>,
    body: Bytes,
) -> Result<Json<UploadResponse>, FileServerError> {
    upload_at(&state, RelativePath::root(), query, body).await
}

async fn upload_at(
    state: &AppState,
    rel: RelativePath,
    query: UploadQuery,
    body: Bytes,
) -> Result<Json<UploadResponse>, FileServerError> {
    let store = &state.store;

    let _guard = store.lock(&rel).await;

    if query.is_directory.is_some() {
        info!("Creating directory: {}", rel);
        store.create_dir_all(&rel).await?;
    } else {
        info!("Writing file to: {} ({} bytes)", rel, body.len());
        store.replace_file(&rel, body).await?;
    }

    let etag = store.etag(&rel).await;

    Ok(Json(UploadResponse {
        status: 0,
        etag: etag.into_string(),
    }))
}

/// DELETE /{*path} - Delete a file, or a folder and everything beneath it
pub async fn delete(
    State(state): State<AppState>,
    uri: Uri,
) -> Result<StatusCode, FileServerError> {
    let rel = RelativePath::parse(uri.path())?;
    delete_at(&state, rel).await
}

/// DELETE / - Always refused
pub async fn delete_root(State(state): State<AppState>) -> Result<StatusCode, FileServerError> {
    delete_at(&state, RelativePath::root()).await
}

async fn delete_at(state: &AppState, rel: RelativePath) -> Result<StatusCode, FileServerError> {
    if rel.is_root() {
        return Err(FileServerError::InvalidPath(
            "Cannot delete root directory".to_string(),
        ));
    }

    let _guard = state.store.lock(&rel).await;

    match state.store.remove(&rel).await? {
        EntryKind::Directory => info!("Deleted folder: {}", rel),
        EntryKind::File => info!("Deleted file: {}", rel),
    }

    Ok(StatusCode::OK)
}
