use axum::routing::{get, put};
use axum::Router;
use tower_http::trace::TraceLayer;

use metahub_broadcast::endpoint::{EVENT_ROUTE, HEALTH_ROUTE, STATS_ROUTE};

use crate::handler::{self, ReceiverState};

/// Build the axum router with the receiver endpoints.
pub fn build_router(state: ReceiverState) -> Router {
    Router::new()
        .route(HEALTH_ROUTE, get(handler::health_handler))
        .route(STATS_ROUTE, get(handler::stats_handler))
        .route(EVENT_ROUTE, put(handler::event_handler).post(handler::event_handler))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
