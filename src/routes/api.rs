//! Resource routes: users, campaigns and vehicles.

use crate::handlers::{campaign, resource, user};
use crate::state::AppState;
use axum::{
    routing::{get, post},
    Router,
};

pub fn user_routes(state: AppState) -> Router {
    Router::new()
        .route("/signup", post(user::signup))
        .route("/login", post(user::login))
        .route("/:username", get(user::get_user))
        .with_state(state)
}

pub fn campaign_routes(state: AppState) -> Router {
    Router::new()
        .route("/create", post(campaign::create))
        .route("/:id", get(campaign::get))
        .with_state(state)
}

pub fn resource_routes(state: AppState) -> Router {
    Router::new()
        .route("/create", post(resource::create))
        .route("/:id", get(resource::get))
        .route("/:id/history", post(resource::append_history))
        .with_state(state)
}
