use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};

use super::{ApiFailure, AppState};

#[derive(Debug, Deserialize)]
pub(super) struct GenerateBody {
    pub prompt: String,
}

#[derive(Debug, Serialize)]
pub(super) struct GenerateResponse {
    pub success: bool,
    pub response: String,
}

/// Thin proxy onto the model: one prompt in, raw text out.
pub(super) async fn generate(
    State(state): State<AppState>,
    Json(body): Json<GenerateBody>,
) -> Result<Json<GenerateResponse>, ApiFailure> {
    if body.prompt.trim().is_empty() {
        return Err(ApiFailure::bad_request(
            "invalid prompt",
            "prompt must be a non-empty string",
        ));
    }

    let response = state.llm.generate(&body.prompt).await.map_err(|e| {
        tracing::error!(error = %e, "model proxy call failed");
        ApiFailure::internal("model call failed")
    })?;

    Ok(Json(GenerateResponse {
        success: true,
        response,
    }))
}
