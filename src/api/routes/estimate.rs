//! POST /api/estimate
//!
//! Validates raw parameters and returns the account size and cost estimate.

use axum::{extract::rejection::JsonRejection, routing::post, Json, Router};

use crate::api::middleware::ApiError;
use crate::api::server::SharedAppState;
use crate::common::logging::log_validation_failure;
use crate::sizing::{estimate, TreeEstimate};
use crate::types::TreeParameters;
use crate::validation::validate;

pub fn router() -> Router<SharedAppState> {
    Router::new().route("/api/estimate", post(handle_estimate))
}

async fn handle_estimate(
    body: Result<Json<TreeParameters>, JsonRejection>,
) -> Result<Json<TreeEstimate>, ApiError> {
    let Json(params) = body?;

    let validated = validate(&params).map_err(|e| {
        log_validation_failure("estimate rejected", &e);
        ApiError::from(e)
    })?;

    Ok(Json(estimate(&validated)))
}
