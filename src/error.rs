use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum FileServerError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Malformed path segment: {0}")]
    MalformedPath(String),

    #[error("Path is outside root directory")]
    PathTraversal,

    #[error("Invalid path: {0}")]
    InvalidPath(String),

    #[error("File operation not allowed on directory")]
    NotAFile,

    #[error("Root path is not a directory: {0}")]
    RootNotDirectory(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Serialize)]
struct ErrorResponse {
    error: String,
    code: &'static str,
}

impl FileServerError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            FileServerError::NotFound(_) => StatusCode::NOT_FOUND,
            FileServerError::MalformedPath(_) => StatusCode::BAD_REQUEST,
            FileServerError::PathTraversal => StatusCode::FORBIDDEN,
            FileServerError::InvalidPath(_) => StatusCode::BAD_REQUEST,
            FileServerError::NotAFile => StatusCode::BAD_REQUEST,
            FileServerError::RootNotDirectory(_) | FileServerError::Io(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    fn code(&self) -> &'static str {
        match self {
            FileServerError::NotFound(_) => "NOT_FOUND",
            FileServerError::MalformedPath(_) => "MALFORMED_PATH",
            FileServerError::PathTraversal => "PATH_TRAVERSAL",
            FileServerError::InvalidPath(_) => "INVALID_PATH",
            FileServerError::NotAFile => "NOT_A_FILE",
            FileServerError::RootNotDirectory(_) => "ROOT_NOT_DIRECTORY",
            FileServerError::Io(_) => "IO_ERROR",
        }
    }
}

impl IntoResponse for FileServerError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!("Request failed: {}", self);
        }

        let body = ErrorResponse {
            error: self.to_string(),
            code: self.code(),
        };

        (status, Json(body)).into_response()
    }
}
