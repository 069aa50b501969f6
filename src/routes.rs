use axum::{
    Router,
    extract::DefaultBodyLimit,
    routing::{MethodRouter, get},
};
use tower_http::cors::{Any, CorsLayer};
use tower_http::services::{ServeDir, ServeFile};
use tower_http::trace::TraceLayer;

use crate::AppState;
use crate::handlers;

/// Create file API routes, relative to their mount point
pub fn file_routes() -> Router<AppState> {
    Router::new()
        // Root folder
        .route("/", root_methods())
        // Files and folders below the root
        .route(
            "/{*path}",
            get(handlers::download)
                .post(handlers::upload)
                .delete(handlers::delete),
        )
}

fn root_methods() -> MethodRouter<AppState> {
    get(handlers::download_root)
        .post(handlers::upload_root)
        .delete(handlers::delete_root)
}

/// Assemble the full application: the file API under `config.base_path`,
/// plus the static client bundle for every other path when configured.
pub fn build_router(state: AppState) -> Router {
    let config = state.config.clone();
    let mount = config.mount_path();

    let mut app = if mount == "/" {
        Router::new().merge(file_routes())
    } else {
        // Nesting only matches the bare mount; the catch-all needs a non-empty tail.
        Router::new()
            .nest(&mount, file_routes())
            .route(&format!("{}/", mount), root_methods())
    };

    if let Some(public_dir) = &config.public_dir {
        let index = ServeFile::new(public_dir.join(&config.index_file));
        app = app.fallback_service(ServeDir::new(public_dir).fallback(index));
    }

    let mut app = app
        .layer(DefaultBodyLimit::max(config.max_upload_size as usize))
        .layer(TraceLayer::new_for_http());

    if config.allow_cors {
        let cors = CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any)
            .expose_headers(Any);
        app = app.layer(cors);
    }

    app.with_state(state)
}
