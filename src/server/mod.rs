pub mod handlers;
pub mod state;

use crate::config::Config;
use crate::metrics;
use axum::{
    Router,
    extract::Request,
    http::HeaderValue,
    middleware::{self, Next},
    response::Response,
    routing::{get, post},
};
use state::AppState;
use tower_http::cors::CorsLayer;
use tracing::{error, info};

/// Response header carrying the service version.
const VERSION_HEADER: &str = "x-thumbrate-version";

/// Build the application router with all routes and middleware.
///
/// CORS is permissive: page-side callers live on whatever origin the
/// video site uses.
pub async fn build_router(config: Config) -> Router {
    let state = AppState::new(config);
    let prometheus = metrics::prometheus_handle();

    Router::new()
        .route("/health", get(handlers::health::health_check))
        .route("/message", post(handlers::message::handle_message))
        .route("/metrics", get(move || async move { prometheus.render() }))
        .layer(middleware::from_fn(version_header))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Stamp every response with the service version.
async fn version_header(request: Request, next: Next) -> Response {
    let mut response = next.run(request).await;
    response.headers_mut().insert(
        VERSION_HEADER,
        HeaderValue::from_static(env!("CARGO_PKG_VERSION")),
    );
    response
}

/// Start the Axum HTTP server
pub async fn start(config: Config) -> Result<(), Box<dyn std::error::Error>> {
    let addr = format!("0.0.0.0:{}", config.port);
    let app = build_router(config).await;

    // Bind TCP listener
    let listener = match tokio::net::TcpListener::bind(addr.as_str()).await {
        Ok(listener) => listener,
        Err(e) => {
            error!("Failed to bind to address {}: {}", addr, e);
            return Err(e.into());
        }
    };

    info!("🚀 Server listening on http://{}", addr);

    // Start serving
    if let Err(e) = axum::serve(listener, app).await {
        error!("Server error: {}", e);
        return Err(e.into());
    }

    Ok(())
}
