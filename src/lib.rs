//! HTTP resource API over a directory tree.
//!
//! Clients list folders, upload or overwrite files, create folders, delete
//! entries and download files with ETag-based conditional GET. The crate can
//! be used as a standalone binary or its router embedded in another server.

pub mod config;
pub mod error;
pub mod etag;
pub mod handlers;
pub mod locks;
pub mod path;
pub mod routes;
pub mod store;

use std::path::PathBuf;
use std::sync::Arc;

pub use config::Config;
pub use error::FileServerError;
pub use etag::ETag;
pub use path::RelativePath;
pub use routes::build_router;
pub use store::FileStore;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    /// Filesystem access below the served root
    pub store: FileStore,
    /// Configuration
    pub config: Arc<Config>,
}

impl AppState {
    /// Create a new AppState with the given root directory and default config.
    pub fn new(root_dir: PathBuf) -> Self {
        Self::with_config(root_dir, Config::default())
    }

    /// Create a new AppState with the given root directory and config.
    pub fn with_config(root_dir: PathBuf, config: Config) -> Self {
        Self {
            store: FileStore::new(root_dir),
            config: Arc::new(config),
        }
    }
}
