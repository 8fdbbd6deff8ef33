use attain_core::storage::{ResultStore, SubjectListing};
use attain_core::{AttainError, AttainResult};
use axum::extract::{Path, State};
use axum::Json;
use serde_json::{Map, Value};
use std::sync::Arc;

use crate::error::ApiError;
use crate::subjects::responses::ClearResponse;
use crate::AppState;

/// Runs a store call on the blocking pool; table reads and writes are file IO.
async fn with_store<T, F>(store: Arc<dyn ResultStore>, f: F) -> AttainResult<T>
where
    T: Send + 'static,
    F: FnOnce(&dyn ResultStore) -> AttainResult<T> + Send + 'static,
{
    tokio::task::spawn_blocking(move || f(store.as_ref()))
        .await
        .map_err(|e| AttainError::Storage(format!("store task failed: {e}")))?
}

pub async fn get_results(
    State(state): State<AppState>,
    Path(subject): Path<String>,
) -> Result<Json<Vec<Map<String, Value>>>, ApiError> {
    let table = with_store(state.store.clone(), move |s| s.fetch(&subject)).await?;
    Ok(Json(table.to_rows()))
}

pub async fn list_subjects(
    State(state): State<AppState>,
) -> Result<Json<Vec<SubjectListing>>, ApiError> {
    let listings = with_store(state.store.clone(), |s| s.list()).await?;
    Ok(Json(listings))
}

pub async fn clear_results(State(state): State<AppState>) -> Result<Json<ClearResponse>, ApiError> {
    let deleted = with_store(state.store.clone(), |s| s.clear()).await?;
    Ok(Json(ClearResponse {
        status: "success",
        deleted,
    }))
}
