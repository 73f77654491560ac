use axum::{
    extract::{rejection::JsonRejection, Path, State},
    Json,
};
use serde::{Deserialize, Serialize};

use crate::error::{AppError, AppResult};
use crate::handlers::MessageResponse;
use crate::settings::{SettingView, SettingsStore};
use crate::AppState;

#[derive(Debug, Serialize)]
pub struct SettingsResponse {
    pub success: bool,
    pub settings: Vec<SettingView>,
}

pub async fn list_settings(State(state): State<AppState>) -> AppResult<Json<SettingsResponse>> {
    let settings = SettingsStore::list(&state.db).await?;
    Ok(Json(SettingsResponse {
        success: true,
        settings,
    }))
}

#[derive(Debug, Deserialize)]
pub struct UpdateSettingRequest {
    pub value: String,
}

/// Store a new value and swap in a fresh snapshot so the change applies
/// to the next request
pub async fn update_setting(
    State(state): State<AppState>,
    Path(key): Path<String>,
    payload: Result<Json<UpdateSettingRequest>, JsonRejection>,
) -> AppResult<Json<MessageResponse>> {
    let Json(request) =
        payload.map_err(|e| AppError::BadRequest(format!("Invalid request body: {}", e.body_text())))?;

    SettingsStore::set(&state.db, &key, &request.value).await?;
    SettingsStore::refresh(&state.db, &state.settings).await;

    Ok(Json(MessageResponse::ok(format!("Setting '{}' updated", key))))
}

pub async fn refresh_settings(State(state): State<AppState>) -> Json<MessageResponse> {
    SettingsStore::refresh(&state.db, &state.settings).await;
    Json(MessageResponse::ok("Settings reloaded"))
}
