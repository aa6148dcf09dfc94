//! Configuration Preset Endpoints
//!
//! - GET /api/configurations - List presets
//! - POST /api/configurations - Create a preset
//! - GET /api/configurations/default - Current default preset
//! - GET /api/configurations/:id - Get a preset
//! - PATCH /api/configurations/:id - Partially update a preset
//! - DELETE /api/configurations/:id - Delete a preset
//! - POST /api/configurations/:id/default - Make a preset the default

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};

use crate::api::middleware::ApiError;
use crate::api::server::SharedAppState;
use crate::types::{NewTreeConfiguration, TreeConfiguration, TreeConfigurationPatch};

pub fn router() -> Router<SharedAppState> {
    Router::new()
        .route(
            "/api/configurations",
            get(handle_list_configurations).post(handle_create_configuration),
        )
        .route("/api/configurations/default", get(handle_get_default))
        .route(
            "/api/configurations/:id",
            get(handle_get_configuration)
                .patch(handle_update_configuration)
                .delete(handle_delete_configuration),
        )
        .route("/api/configurations/:id/default", post(handle_set_default))
}

async fn handle_list_configurations(
    State(state): State<SharedAppState>,
) -> Result<Json<Vec<TreeConfiguration>>, ApiError> {
    Ok(Json(state.configurations.list().await?))
}

async fn handle_create_configuration(
    State(state): State<SharedAppState>,
    body: Result<Json<NewTreeConfiguration>, JsonRejection>,
) -> Result<(StatusCode, Json<TreeConfiguration>), ApiError> {
    let Json(new) = body?;
    let created = state.configurations.create(new).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

async fn handle_get_default(
    State(state): State<SharedAppState>,
) -> Result<Json<TreeConfiguration>, ApiError> {
    state
        .configurations
        .get_default()
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::not_found("no default configuration"))
}

async fn handle_get_configuration(
    State(state): State<SharedAppState>,
    Path(id): Path<String>,
) -> Result<Json<TreeConfiguration>, ApiError> {
    Ok(Json(state.configurations.get(&id).await?))
}

async fn handle_update_configuration(
    State(state): State<SharedAppState>,
    Path(id): Path<String>,
    body: Result<Json<TreeConfigurationPatch>, JsonRejection>,
) -> Result<Json<TreeConfiguration>, ApiError> {
    let Json(patch) = body?;
    Ok(Json(state.configurations.update(&id, patch).await?))
}

async fn handle_delete_configuration(
    State(state): State<SharedAppState>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    state.configurations.delete(&id).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn handle_set_default(
    State(state): State<SharedAppState>,
    Path(id): Path<String>,
) -> Result<Json<TreeConfiguration>, ApiError> {
    Ok(Json(state.configurations.set_default(&id).await?))
}
