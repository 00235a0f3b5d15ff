pub mod fleetlock;
pub mod health;
mod openapi;

use std::sync::Arc;

use axum::Router;
use axum::routing::{any, get};
use tower_http::trace::TraceLayer;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use fleetlock_coordinator::RebootCoordinator;

use self::openapi::ApiDoc;

/// Shared application state passed to every handler.
#[derive(Clone)]
pub struct AppState {
    pub coordinator: Arc<RebootCoordinator>,
}

/// Build the Axum router: the FleetLock wire endpoints under `/v1/`, the
/// health check, and Swagger UI.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/v1/pre-reboot", any(fleetlock::pre_reboot))
        .route("/v1/steady-state", any(fleetlock::steady_state))
        .route("/healthz", get(health::healthz))
        .route("/healthz/metrics", get(health::metrics))
        .merge(SwaggerUi::new("/swagger-ui").url("/api-doc/openapi.json", ApiDoc::openapi()))
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .fallback(fleetlock::not_found)
}
