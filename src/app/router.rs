use crate::app::state::AppState;
use crate::handler::audit::audit_handler;
use crate::handler::health::health_handler;
use axum::Router;
use axum::routing::get;

/// Build the HTTP router (health + audit).
///
/// The audit route answers both GET and POST: existing clients send the
/// domain in a GET body.
pub fn main_router(state: AppState) -> Router {
    let v1_health_router = Router::new().route("/v1/health", get(health_handler));

    let audit_router = Router::new()
        .route("/", get(audit_handler).post(audit_handler))
        .with_state(state);

    Router::new().merge(v1_health_router).merge(audit_router)
}
