pub mod handler;

use crate::config::ServerConfig;
use axum::http::{HeaderValue, Method};
use axum::routing::{delete, get, post};
use axum::Router;
use handler::DashState;
use std::sync::Arc;
use tower_http::cors::{AllowOrigin, CorsLayer};

/// All dashboard routes, without middleware.
pub fn routes(state: Arc<DashState>) -> Router {
    Router::new()
        .route("/health", get(handler::health))
        .route("/api/overview", get(handler::overview))
        .route("/api/apps", get(handler::list_apps))
        .route("/api/apps/{id}", get(handler::app_detail))
        .route("/api/apps/{id}/trend", get(handler::app_trend))
        .route("/api/packages/{pkg}", get(handler::package_detail))
        .route("/api/sessions/{sid}", delete(handler::end_session))
        .route("/api/sessions/{sid}/detail", delete(handler::close_detail))
        .route("/api/sessions/{sid}/detail/{pkg}", post(handler::open_detail))
        .route(
            "/api/sessions/{sid}/charts/{canvas}",
            get(handler::get_session_chart),
        )
        .route(
            "/api/rankings/top-downloads",
            get(handler::top_downloads),
        )
        .route(
            "/api/charts/star-distribution",
            get(handler::star_distribution),
        )
        .route("/api/charts/{canvas}", get(handler::get_chart))
        .route("/api/submit", post(handler::submit))
        .with_state(state)
}

/// CORS for the dashboard frontend: a single configured origin, or any.
pub fn cors_layer(config: &ServerConfig) -> Result<CorsLayer, String> {
    let origin = match config.cors_origin.as_deref() {
        Some(origin) => AllowOrigin::exact(
            HeaderValue::from_str(origin)
                .map_err(|e| format!("server.cors_origin is not a valid header value: {e}"))?,
        ),
        None => AllowOrigin::any(),
    };
    Ok(CorsLayer::new()
        .allow_origin(origin)
        .allow_methods([Method::GET, Method::POST, Method::DELETE, Method::OPTIONS])
        .allow_headers([axum::http::header::CONTENT_TYPE]))
}

pub fn build_router(state: Arc<DashState>, config: &ServerConfig) -> Result<Router, String> {
    Ok(routes(state).layer(cors_layer(config)?))
}
