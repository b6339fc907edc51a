//! Campaign handlers.

use super::parse_id;
use crate::error::AppError;
use crate::model::Campaign;
use crate::response::created;
use crate::state::AppState;
use axum::{
    extract::{Path, State},
    response::IntoResponse,
    Form, Json,
};
use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct CreateCampaignForm {
    pub username: String,
    pub name: String,
}

/// POST /api/campaign/create. The requesting user becomes the first member.
pub async fn create(
    State(state): State<AppState>,
    Form(form): Form<CreateCampaignForm>,
) -> Result<impl IntoResponse, AppError> {
    let id = state.store.create_campaign(&form.username, &form.name).await?;
    tracing::info!(id, name = %form.name, username = %form.username, "campaign created");
    Ok(created())
}

/// GET /api/campaign/:id
pub async fn get(
    State(state): State<AppState>,
    Path(id_str): Path<String>,
) -> Result<Json<Campaign>, AppError> {
    let id = parse_id(&id_str, "campaign")?;
    let campaign = state
        .store
        .find_campaign(id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("campaign {}", id)))?;
    Ok(Json(campaign))
}
