//! User handlers: signup, login (existence check only, no credentials) and lookup.

use crate::error::AppError;
use crate::model::User;
use crate::response::{created, ok};
use crate::state::AppState;
use axum::{
    extract::{Path, State},
    response::IntoResponse,
    Form, Json,
};
use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct UsernameForm {
    pub username: String,
}

/// POST /api/user/signup
pub async fn signup(
    State(state): State<AppState>,
    Form(form): Form<UsernameForm>,
) -> Result<impl IntoResponse, AppError> {
    state.store.create_user(&form.username).await?;
    tracing::info!(username = %form.username, "user created");
    Ok(created())
}

/// POST /api/user/login
pub async fn login(
    State(state): State<AppState>,
    Form(form): Form<UsernameForm>,
) -> Result<impl IntoResponse, AppError> {
    if !state.store.user_exists(&form.username).await? {
        return Err(AppError::NotFound(format!("user '{}'", form.username)));
    }
    Ok(ok())
}

/// GET /api/user/:username
pub async fn get_user(
    State(state): State<AppState>,
    Path(username): Path<String>,
) -> Result<Json<User>, AppError> {
    let user = state
        .store
        .find_user(&username)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("user '{}'", username)))?;
    Ok(Json(user))
}
