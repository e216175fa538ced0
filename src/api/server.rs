//! HTTP server implementation for the Docvault API

use axum::{
    extract::DefaultBodyLimit,
    http::{
        header::{AUTHORIZATION, CONTENT_TYPE},
        Method,
    },
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::{
    cors::{Any, CorsLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use super::handlers::{acls, document_files, document_types, documents, system};
use super::API_BASE;
use crate::core::error::Result;
use crate::core::AppState;

/// Routes below [`API_BASE`]
fn api_routes() -> Router<Arc<AppState>> {
    Router::new()
        // Document types
        .route(
            "/document_types/",
            get(document_types::list_document_types).post(document_types::create_document_type),
        )
        .route(
            "/document_types/:id/",
            get(document_types::get_document_type)
                .put(document_types::update_document_type)
                .patch(document_types::patch_document_type)
                .delete(document_types::delete_document_type),
        )
        .route(
            "/document_types/:id/acls/",
            get(acls::list_document_type_acls).post(acls::grant_document_type_access),
        )
        .route(
            "/document_types/:id/acls/revoke/",
            post(acls::revoke_document_type_access),
        )

        // Documents
        .route(
            "/documents/",
            get(documents::list_documents).post(documents::create_document),
        )
        .route("/documents/upload/", post(documents::upload_document))
        .route(
            "/documents/:id/",
            get(documents::get_document)
                .put(documents::update_document)
                .patch(documents::patch_document)
                .delete(documents::trash_document),
        )
        .route(
            "/documents/:id/acls/",
            get(acls::list_document_acls).post(acls::grant_document_access),
        )
        .route("/documents/:id/acls/revoke/", post(acls::revoke_document_access))

        // Document files
        .route(
            "/documents/:id/files/",
            get(document_files::list_files).post(document_files::upload_file),
        )
        .route(
            "/documents/:id/files/:file_id/",
            get(document_files::get_file).delete(document_files::delete_file),
        )
        .route(
            "/documents/:id/files/:file_id/download/",
            get(document_files::download_file),
        )
        .route(
            "/documents/:id/files/:file_id/pages/",
            get(document_files::list_pages),
        )
        .route(
            "/documents/:id/files/:file_id/pages/:page_id/",
            get(document_files::get_page),
        )

        // Trash
        .route("/trashed_documents/", get(documents::list_trashed_documents))
        .route(
            "/trashed_documents/:id/",
            get(documents::get_trashed_document).delete(documents::delete_trashed_document),
        )
        .route(
            "/trashed_documents/:id/restore/",
            post(documents::restore_document),
        )

        // Permissions
        .route("/permissions/", get(acls::list_permissions))

        // System routes
        .route("/health/", get(system::health_check))
        .route("/info/", get(system::system_info))
}

/// Creates the main application router with all routes and middleware
pub fn create_app(state: Arc<AppState>) -> Router {
    // CORS configuration
    let cors = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::PATCH, Method::DELETE])
        .allow_headers([CONTENT_TYPE, AUTHORIZATION])
        .allow_origin(Any);

    let server = &state.config.server;
    let body_limit = DefaultBodyLimit::max(server.max_upload_size);
    let timeout = TimeoutLayer::new(server.request_timeout);

    Router::new()
        .nest(API_BASE, api_routes())
        .route("/metrics", get(system::metrics))
        // Apply middleware
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(cors)
                .layer(timeout),
        )
        .layer(body_limit)
        // Add application state
        .with_state(state)
}

/// Start the HTTP server and serve until `shutdown` resolves
pub async fn start_server(
    state: Arc<AppState>,
    shutdown: impl std::future::Future<Output = ()> + Send + 'static,
) -> Result<()> {
    let addr = state.config.server.http_addr;
    tracing::info!("Starting Docvault API server on {}", addr);

    let app = create_app(state);
    let listener = tokio::net::TcpListener::bind(addr).await?;

    tracing::info!("Server listening on http://{}", addr);
    tracing::info!("Health check available at http://{}{}/health/", addr, API_BASE);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown)
        .await?;

    tracing::info!("Server stopped");
    Ok(())
}
