use std::sync::Arc;

use axum::Json;
use axum::Router;
use axum::extract::{Path, State};
use axum::routing::post;

use crate::api::rest::{SuccessResponse, success};
use crate::auth::AuthUser;
use crate::engine::transitions;
use crate::error::AppResult;
use crate::state::AppState;

// Assignments are addressed by their freight id: a freight has at most one
// active assignment.
pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/freight-assignments/:id/confirm", post(confirm_assignment))
        .route("/api/freight-assignments/:id/reject", post(reject_assignment))
}

async fn confirm_assignment(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Path(freight_id): Path<i64>,
) -> AppResult<Json<SuccessResponse>> {
    transitions::confirm_assignment(&state, &user, freight_id).await?;
    Ok(success())
}

async fn reject_assignment(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Path(freight_id): Path<i64>,
) -> AppResult<Json<SuccessResponse>> {
    transitions::reject_assignment(&state, &user, freight_id).await?;
    Ok(success())
}
