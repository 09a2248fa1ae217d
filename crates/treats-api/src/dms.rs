use axum::{
    Extension, Json,
    extract::{Query, State},
    response::IntoResponse,
};
use serde_json::json;

use treats_types::api::{
    Claims, DmCreateRequest, DmIdResponse, DmLeaveRequest, DmListResponse, DmMessagesQuery, DmQuery,
};

use crate::error::ApiResult;
use crate::state::AppState;

pub async fn create(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(req): Json<DmCreateRequest>,
) -> ApiResult<impl IntoResponse> {
    let dm_id = state.mutate(|ws| ws.dm_create(claims.sub, &req.u_ids)).await?;
    Ok(Json(DmIdResponse { dm_id }))
}

pub async fn list(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> ApiResult<impl IntoResponse> {
    let dms = state.read(|ws| Ok(ws.dm_list(claims.sub)))?;
    Ok(Json(DmListResponse { dms }))
}

pub async fn details(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Query(query): Query<DmQuery>,
) -> ApiResult<impl IntoResponse> {
    let details = state.read(|ws| ws.dm_details(claims.sub, query.dm_id))?;
    Ok(Json(details))
}

pub async fn remove(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Query(query): Query<DmQuery>,
) -> ApiResult<impl IntoResponse> {
    state.mutate(|ws| ws.dm_remove(claims.sub, query.dm_id)).await?;
    Ok(Json(json!({})))
}

pub async fn leave(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(req): Json<DmLeaveRequest>,
) -> ApiResult<impl IntoResponse> {
    state.mutate(|ws| ws.dm_leave(claims.sub, req.dm_id)).await?;
    Ok(Json(json!({})))
}

pub async fn messages(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Query(query): Query<DmMessagesQuery>,
) -> ApiResult<impl IntoResponse> {
    let page = state.read(|ws| ws.dm_messages(claims.sub, query.dm_id, query.start))?;
    Ok(Json(page))
}
