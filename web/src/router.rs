use crate::{
    controller::{bankid_controller, health_check_controller},
    middleware::csrf::require_csrf_header,
    sse::handler,
    AppState,
};
use axum::{
    middleware::from_fn,
    routing::{get, post},
    Router,
};

use utoipa::{
    openapi::security::{ApiKey, ApiKeyValue, SecurityScheme},
    Modify, OpenApi,
};
use utoipa_rapidoc::RapiDoc;

// This is the global definition of our OpenAPI spec. To be a part
// of the rendered spec, a path must be listed here.
#[derive(OpenApi)]
#[openapi(
        info(
            title = "Identity API"
        ),
        paths(
            bankid_controller::start,
            bankid_controller::status,
            bankid_controller::cancel,
            handler::events_handler,
            health_check_controller::health_check,
        ),
        modifiers(&SecurityAddon),
        tags(
            (name = "identity_rs", description = "BankID relying party authentication API")
        )
    )]
struct ApiDoc;

struct SecurityAddon;

// State changing endpoints require the CSRF header; the transaction itself is named by
// a cookie set on start.
impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "csrf_header",
                SecurityScheme::ApiKey(ApiKey::Header(ApiKeyValue::with_description(
                    "X-BankID-CSRF",
                    "Any value; must be present on every POST",
                ))),
            )
        }
    }
}

pub fn define_routes(app_state: AppState) -> Router {
    Router::new()
        .merge(health_routes())
        .merge(bankid_routes(app_state))
        .merge(RapiDoc::with_openapi("/api-docs/openapi2.json", ApiDoc::openapi()).path("/rapidoc"))
}

fn bankid_routes(app_state: AppState) -> Router {
    Router::new()
        .route("/bankid/start", post(bankid_controller::start))
        .route("/bankid/status", get(bankid_controller::status))
        .route("/bankid/cancel", post(bankid_controller::cancel))
        .route("/bankid/events", get(handler::events_handler))
        .route_layer(from_fn(require_csrf_header))
        .with_state(app_state)
}

fn health_routes() -> Router {
    Router::new().route("/health", get(health_check_controller::health_check))
}
