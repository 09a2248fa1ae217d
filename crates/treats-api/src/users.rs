use axum::{
    Extension, Json,
    extract::{Query, State},
    response::IntoResponse,
};
use serde_json::json;

use treats_types::api::{
    Claims, NotificationsResponse, SearchQuery, SearchResponse, SetEmailRequest, SetHandleRequest,
    SetNameRequest, UserProfileResponse, UserQuery, UserStatsResponse, UsersAllResponse,
    WorkspaceStatsResponse,
};

use crate::error::ApiResult;
use crate::state::AppState;

pub async fn profile(
    State(state): State<AppState>,
    Extension(_claims): Extension<Claims>,
    Query(query): Query<UserQuery>,
) -> ApiResult<impl IntoResponse> {
    let user = state.read(|ws| ws.user_profile(query.u_id))?;
    Ok(Json(UserProfileResponse { user }))
}

pub async fn set_handle(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(req): Json<SetHandleRequest>,
) -> ApiResult<impl IntoResponse> {
    state.mutate(|ws| ws.user_set_handle(claims.sub, &req.handle_str)).await?;
    Ok(Json(json!({})))
}

pub async fn set_name(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(req): Json<SetNameRequest>,
) -> ApiResult<impl IntoResponse> {
    state
        .mutate(|ws| ws.user_set_name(claims.sub, &req.name_first, &req.name_last))
        .await?;
    Ok(Json(json!({})))
}

pub async fn set_email(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(req): Json<SetEmailRequest>,
) -> ApiResult<impl IntoResponse> {
    state.mutate(|ws| ws.user_set_email(claims.sub, &req.email)).await?;
    Ok(Json(json!({})))
}

pub async fn all(
    State(state): State<AppState>,
    Extension(_claims): Extension<Claims>,
) -> ApiResult<impl IntoResponse> {
    let users = state.read(|ws| Ok(ws.users_all()))?;
    Ok(Json(UsersAllResponse { users }))
}

pub async fn user_stats(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> ApiResult<impl IntoResponse> {
    let user_stats = state.read(|ws| ws.user_stats(claims.sub))?;
    Ok(Json(UserStatsResponse { user_stats }))
}

pub async fn workspace_stats(
    State(state): State<AppState>,
    Extension(_claims): Extension<Claims>,
) -> ApiResult<impl IntoResponse> {
    let workspace_stats = state.read(|ws| Ok(ws.workspace_stats()))?;
    Ok(Json(WorkspaceStatsResponse { workspace_stats }))
}

pub async fn notifications(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> ApiResult<impl IntoResponse> {
    let notifications = state.read(|ws| ws.notifications(claims.sub))?;
    Ok(Json(NotificationsResponse { notifications }))
}

pub async fn search(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Query(query): Query<SearchQuery>,
) -> ApiResult<impl IntoResponse> {
    let messages = state.read(|ws| ws.search(claims.sub, &query.query_str))?;
    Ok(Json(SearchResponse { messages }))
}
