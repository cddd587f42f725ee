use axum::http::header::{
    ACCESS_CONTROL_ALLOW_HEADERS, ACCESS_CONTROL_ALLOW_METHODS, ACCESS_CONTROL_ALLOW_ORIGIN,
};
use axum::http::HeaderValue;
use axum::routing::{any, get};
use axum::Router;
use tower_http::set_header::SetResponseHeaderLayer;
use tower_http::trace::TraceLayer;

use crate::handler::{self, AppState};

/// HTTP endpoint paths.
pub mod endpoints {
    pub const CREATE: &str = "/create";
    pub const GET: &str = "/get";
    pub const UPDATE: &str = "/update";
    pub const DELETE: &str = "/delete";
    pub const GET_ALL: &str = "/get-all";
    pub const HEALTH: &str = "/health";
}

/// Build the axum router with all note endpoints.
///
/// Note endpoints accept any method so that a wrong one is answered with an
/// error envelope rather than a bare 405.
pub fn build_router(state: AppState) -> Router {
    let wildcard = HeaderValue::from_static("*");
    Router::new()
        .route(endpoints::CREATE, any(handler::create_note))
        .route(endpoints::GET, any(handler::get_note))
        .route(endpoints::UPDATE, any(handler::update_note))
        .route(endpoints::DELETE, any(handler::delete_note))
        .route(endpoints::GET_ALL, any(handler::get_all_notes))
        .route(endpoints::HEALTH, get(handler::health_handler))
        .layer(SetResponseHeaderLayer::overriding(
            ACCESS_CONTROL_ALLOW_ORIGIN,
            wildcard.clone(),
        ))
        .layer(SetResponseHeaderLayer::overriding(
            ACCESS_CONTROL_ALLOW_METHODS,
            wildcard.clone(),
        ))
        .layer(SetResponseHeaderLayer::overriding(
            ACCESS_CONTROL_ALLOW_HEADERS,
            wildcard,
        ))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
