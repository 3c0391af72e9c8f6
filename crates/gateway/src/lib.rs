//! Academic Portal HTTP Gateway
//!
//! Routes requests onto the shared [`DataStore`]:
//! - Login, password change and access logging
//! - Profiles, decisions, top projects and the collaborator network
//! - Announcements, messages and the admin dashboard
//! - Case-insensitive image serving

pub mod handlers;
pub mod middleware;

use axum::{
    middleware::{from_fn, from_fn_with_state},
    routing::{delete, get, post},
    Router,
};
use portal_common::{config::AppConfig, store::DataStore};
use std::sync::Arc;
use tower_http::{
    cors::{Any, CorsLayer},
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub store: Arc<DataStore>,
}

impl AppState {
    /// Load the dataset described by `config.data`.
    pub async fn load(config: AppConfig) -> Self {
        let store = DataStore::open(config.data.clone()).await;
        Self {
            config: Arc::new(config),
            store: Arc::new(store),
        }
    }
}

/// Create the main application router
pub fn create_router(state: AppState) -> Router {
    // CORS configuration
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    // Request ID propagation
    let request_id = SetRequestIdLayer::x_request_id(MakeRequestUuid);
    let propagate_id = PropagateRequestIdLayer::x_request_id();

    let routes = Router::new()
        // Health endpoints
        .route("/", get(handlers::health::index))
        .route("/health", get(handlers::health::health))
        .route("/ready", get(handlers::health::ready))

        // Login
        .route("/api/login/", post(handlers::auth::login))
        .route("/api/change-password/", post(handlers::auth::change_password))

        // Matching
        .route("/api/profile/", post(handlers::profile::profile))
        .route("/api/decision/", post(handlers::decisions::record_decision))
        .route("/api/top-projects/", get(handlers::projects::top))
        .route("/api/network/", post(handlers::network::network))

        // Admin
        .route("/api/admin/dashboard/", get(handlers::admin::dashboard))
        .route("/api/admin/reload/", post(handlers::admin::reload))

        // Announcements
        .route(
            "/api/announcements/",
            get(handlers::announcements::list).post(handlers::announcements::create),
        )
        .route("/api/announcements/{index}", delete(handlers::announcements::delete))

        // Messages
        .route(
            "/api/messages/",
            get(handlers::messages::list).post(handlers::messages::send),
        )
        .route("/api/messages/{index}", delete(handlers::messages::delete));

    let mut app = handlers::files::mount(routes, &state.config.data.image_folders)
        .route_layer(from_fn(middleware::metrics::track_metrics));

    if state.config.rate_limit.enabled {
        let limiter = middleware::rate_limit::create_rate_limiter(
            state.config.rate_limit.requests_per_second,
            state.config.rate_limit.burst,
        );
        app = app.layer(from_fn_with_state(
            limiter,
            middleware::rate_limit::rate_limit_middleware,
        ));
    }

    let permits =
        middleware::rate_limit::create_concurrency_limit(state.config.server.max_concurrent_requests);

    app.layer(from_fn_with_state(
        permits,
        middleware::rate_limit::concurrency_limit_middleware,
    ))
    .layer(TimeoutLayer::new(state.config.request_timeout()))
    .layer(TraceLayer::new_for_http())
    .layer(cors)
    .layer(propagate_id)
    .layer(request_id)
    .with_state(state)
}
