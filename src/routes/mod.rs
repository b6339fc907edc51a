//! Route tables. `app` assembles the full service with its middleware.

mod api;
mod common;

pub use api::{campaign_routes, resource_routes, user_routes};
pub use common::common_routes;

use crate::state::AppState;
use axum::Router;
use tower::ServiceBuilder;
use tower_http::{limit::RequestBodyLimitLayer, trace::TraceLayer};

/// Every route under its prefix, wrapped in request tracing and a body size limit.
pub fn app(state: AppState, body_limit_bytes: usize) -> Router {
    Router::new()
        .merge(common_routes(state.clone()))
        .nest("/api/user", user_routes(state.clone()))
        .nest("/api/campaign", campaign_routes(state.clone()))
        .nest("/api/resource", resource_routes(state))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(RequestBodyLimitLayer::new(body_limit_bytes)),
        )
}
