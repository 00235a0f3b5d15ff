use super::health::{HealthResponse, MetricsResponse};

#[derive(utoipa::OpenApi)]
#[openapi(
    info(
        title = "FleetLock API",
        version = "0.1.0",
        description = "Rolling-reboot coordination for Fedora CoreOS-style fleets.",
        license(name = "Apache-2.0")
    ),
    tags(
        (name = "Health", description = "Service health"),
    ),
    paths(super::health::healthz, super::health::metrics),
    components(schemas(HealthResponse, MetricsResponse))
)]
pub struct ApiDoc;
