use axum::{
    Router,
    extract::DefaultBodyLimit,
    routing::{get, post},
};
use configuration::ServerSettings;
use database::DbRepository;
use identity::IdentityProvider;
use std::future::Future;
use std::path::Path;
use std::sync::Arc;
use tower_http::{
    cors::{AllowHeaders, AllowOrigin, Any, CorsLayer},
    services::ServeDir,
    trace::TraceLayer,
};

pub mod error;
pub mod handlers;

/// The shared application state that all handlers can access.
#[derive(Clone)]
pub struct AppState {
    pub repo: DbRepository,
    pub identity: Arc<dyn IdentityProvider>,
}

/// Builds the full API router. With `static_dir`, unmatched paths serve the
/// built browser client from that directory.
pub fn router(state: Arc<AppState>, static_dir: Option<&Path>) -> Router {
    use handlers::{animals, auth, farms, fincas, usuarios};

    let cors = CorsLayer::new()
        .allow_origin(AllowOrigin::any())
        .allow_methods(Any)
        .allow_headers(AllowHeaders::any());

    let api = Router::new()
        .route("/api/health", get(|| async { "OK" }))
        // --- English surface ---
        .route("/api/farms", get(farms::list_farms).post(farms::create_farm))
        .route(
            "/api/farms/:id",
            get(farms::get_farm)
                .put(farms::update_farm)
                .delete(farms::delete_farm),
        )
        .route("/api/farms/:id/animals", get(farms::farm_animals))
        .route("/api/farms/:id/users", get(farms::farm_users))
        .route(
            "/api/animals",
            get(animals::list_animals).post(animals::create_animal),
        )
        .route(
            "/api/animals/:id",
            get(animals::get_animal)
                .put(animals::update_animal)
                .delete(animals::delete_animal),
        )
        .route("/api/animals/:id/summary", get(animals::animal_summary))
        .route(
            "/api/animals/:id/weights",
            get(animals::list_weights).post(animals::add_weight),
        )
        .route(
            "/api/animals/:id/visits",
            get(animals::list_visits).post(animals::add_visit),
        )
        .route("/api/auth/register", post(auth::register))
        .route("/api/auth/login", post(auth::login))
        .route("/api/auth/logout", post(auth::logout))
        // --- Spanish surface ---
        .route(
            "/api/fincas",
            get(fincas::list_fincas).post(fincas::create_finca),
        )
        .route(
            "/api/fincas/:id",
            get(fincas::get_finca)
                .put(fincas::update_finca)
                .delete(fincas::delete_finca),
        )
        .route(
            "/api/usuarios",
            get(usuarios::list_usuarios).post(usuarios::create_usuario),
        )
        .route("/api/usuarios/login", post(usuarios::login_usuario))
        .route(
            "/api/usuarios/:id",
            get(usuarios::get_usuario)
                .put(usuarios::update_usuario)
                .delete(usuarios::delete_usuario),
        )
        .with_state(state);

    let app = match static_dir {
        Some(dir) => api.fallback_service(ServeDir::new(dir)),
        None => api,
    };

    app.layer(cors)
        .layer(TraceLayer::new_for_http())
        .layer(DefaultBodyLimit::max(1024 * 1024))
}

/// Serves the API on the configured address until `shutdown` resolves.
pub async fn run_server(
    settings: &ServerSettings,
    state: AppState,
    shutdown: impl Future<Output = ()> + Send + 'static,
) -> anyhow::Result<()> {
    let addr = settings.socket_addr();
    if let Some(dir) = &settings.static_dir {
        tracing::info!(dir = %dir.display(), "Serving static client");
    }
    let app = router(Arc::new(state), settings.static_dir.as_deref());

    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!("Web server started and listening on {}", addr);
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown)
        .await?;

    tracing::info!("Web server stopped");
    Ok(())
}
