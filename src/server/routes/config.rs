//! Persisted configuration handlers.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};

use super::super::error::ApiError;
use super::super::state::AppState;

/// A configuration entry as returned by GET. Unset keys carry a null value.
#[derive(Debug, Serialize)]
pub struct ConfigEntry {
    pub key: String,
    pub value: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ConfigUpdate {
    pub value: String,
}

/// GET /api/config/{key}
pub async fn get_entry(
    State(state): State<AppState>,
    Path(key): Path<String>,
) -> Result<Json<ConfigEntry>, ApiError> {
    let value = state.store.get_config(&key)?;
    Ok(Json(ConfigEntry { key, value }))
}

/// PUT /api/config/{key}: set or overwrite one entry.
pub async fn put_entry(
    State(state): State<AppState>,
    Path(key): Path<String>,
    Json(update): Json<ConfigUpdate>,
) -> Result<StatusCode, ApiError> {
    state.store.put_config(&key, &update.value)?;
    Ok(StatusCode::NO_CONTENT)
}
