use crate::routes;
use axum::Router;
use axum::routing::get;
use mission_core::config::Settings;
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

/// Shared application state passed to Axum handlers.
#[derive(Clone)]
pub struct AppState {
    pub settings: Arc<Settings>,
}

impl AppState {
    pub fn new(settings: Settings) -> Self {
        Self {
            settings: Arc::new(settings),
        }
    }
}

/// Build the Axum router with all routes.
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route(
            "/api/activities",
            get(routes::list_activities).post(routes::record_activity),
        )
        .route(
            "/api/tasks",
            get(routes::list_tasks)
                .post(routes::upsert_task)
                .delete(routes::remove_task),
        )
        .route("/api/search", get(routes::search))
        .route("/api/dashboard", get(routes::dashboard))
        .route("/health", get(routes::health))
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}

/// Binds the listener and serves in the background.
pub async fn start(settings: Settings) -> Result<ServerHandle, std::io::Error> {
    let listener = tokio::net::TcpListener::bind(settings.bind_address()).await?;
    let addr = listener.local_addr()?;

    tracing::info!(
        %addr,
        data_dir = %settings.data_dir.display(),
        workspace_dir = %settings.workspace_dir.display(),
        "mission control listening"
    );

    let router = build_router(AppState::new(settings));
    let server = tokio::spawn(async move {
        if let Err(err) = axum::serve(listener, router).await {
            tracing::error!(error = %err, "server stopped");
        }
    });

    Ok(ServerHandle {
        addr,
        _server: server,
    })
}

/// Handle returned by `start()`; dropping it does not stop the server.
pub struct ServerHandle {
    pub addr: SocketAddr,
    _server: tokio::task::JoinHandle<()>,
}

impl ServerHandle {
    pub fn port(&self) -> u16 {
        self.addr.port()
    }
}
