//! Tree Record Endpoints
//!
//! - GET /api/trees - List tree records
//! - GET /api/trees/:id - Get a tree record

use axum::{
    extract::{Path, State},
    routing::get,
    Json, Router,
};

use crate::api::middleware::ApiError;
use crate::api::server::SharedAppState;
use crate::services::ServiceError;
use crate::types::TreeRecord;

pub fn router() -> Router<SharedAppState> {
    Router::new()
        .route("/api/trees", get(handle_list_trees))
        .route("/api/trees/:id", get(handle_get_tree))
}

async fn handle_list_trees(
    State(state): State<SharedAppState>,
) -> Result<Json<Vec<TreeRecord>>, ApiError> {
    let records = state.trees.list().await.map_err(ServiceError::from)?;
    Ok(Json(records))
}

async fn handle_get_tree(
    State(state): State<SharedAppState>,
    Path(id): Path<String>,
) -> Result<Json<TreeRecord>, ApiError> {
    state
        .trees
        .get(&id)
        .await
        .map_err(ServiceError::from)?
        .map(Json)
        .ok_or_else(|| ApiError::not_found(format!("tree not found: {}", id)))
}

#[cfg(test)]
mod tests {
    use super::super::test_support::{json_body, send};
    use axum::http::StatusCode;
    use std::path::Path;
    use std::sync::Arc;

    use crate::api::server::{create_router, AppState};
    use crate::services::ConfigurationService;
    use crate::storage::{MemoryConfigurationStore, MemoryTreeRecordStore, TreeRecordStore};
    use crate::types::{Network, TreeParameters, TreeRecord};
    use crate::validation::validate;

    #[tokio::test]
    async fn test_list_and_get_trees() {
        let trees = Arc::new(MemoryTreeRecordStore::new());
        let params = validate(&TreeParameters::new(5, 14, 64, Network::Devnet)).unwrap();
        let record = TreeRecord::new("9WzDXwBbmkg8ZTbNMqUxvQRAyrZzDsGYdLVL9zYtAWWM".into(), &params);
        trees.insert(&record).await.unwrap();

        let configurations = ConfigurationService::new(Arc::new(MemoryConfigurationStore::new()));
        let app = create_router(AppState::new(configurations, trees, Path::new("shared")));

        let list = json_body(send(&app, "GET", "/api/trees", None).await).await;
        assert_eq!(list.as_array().unwrap().len(), 1);
        assert_eq!(list[0]["status"], "pending");
        assert_eq!(list[0]["treeAddress"], record.tree_address);

        let response = send(&app, "GET", &format!("/api/trees/{}", record.id), None).await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(json_body(response).await["maxDepth"], 14);

        let response = send(&app, "GET", "/api/trees/unknown", None).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
