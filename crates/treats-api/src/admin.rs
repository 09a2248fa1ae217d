use axum::{
    Extension, Json,
    extract::{Query, State},
    response::IntoResponse,
};
use serde_json::json;

use treats_types::api::{Claims, PermissionChangeRequest, UserQuery};

use crate::error::ApiResult;
use crate::state::AppState;

pub async fn permission_change(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(req): Json<PermissionChangeRequest>,
) -> ApiResult<impl IntoResponse> {
    state
        .mutate(|ws| ws.admin_permission_change(claims.sub, req.u_id, req.permission_id))
        .await?;
    Ok(Json(json!({})))
}

pub async fn user_remove(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Query(query): Query<UserQuery>,
) -> ApiResult<impl IntoResponse> {
    state
        .mutate(|ws| ws.admin_user_remove(claims.sub, query.u_id))
        .await?;
    Ok(Json(json!({})))
}

/// Reset the whole workspace. Unauthenticated, like `/health`.
pub async fn clear(State(state): State<AppState>) -> ApiResult<impl IntoResponse> {
    state.reset().await?;
    Ok(Json(json!({})))
}

pub async fn health() -> impl IntoResponse {
    Json(json!({ "status": "ok" }))
}
