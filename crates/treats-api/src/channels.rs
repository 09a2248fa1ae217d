use axum::{
    Extension, Json,
    extract::{Query, State},
    response::IntoResponse,
};
use serde_json::json;

use treats_types::api::{
    ChannelIdResponse, ChannelJoinRequest, ChannelMemberRequest, ChannelMessagesQuery, ChannelQuery,
    ChannelsCreateRequest, ChannelsListResponse, Claims,
};

use crate::error::ApiResult;
use crate::state::AppState;

pub async fn create(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(req): Json<ChannelsCreateRequest>,
) -> ApiResult<impl IntoResponse> {
    let channel_id = state
        .mutate(|ws| ws.channels_create(claims.sub, &req.name, req.is_public))
        .await?;
    Ok(Json(ChannelIdResponse { channel_id }))
}

pub async fn list(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> ApiResult<impl IntoResponse> {
    let channels = state.read(|ws| Ok(ws.channels_list(claims.sub)))?;
    Ok(Json(ChannelsListResponse { channels }))
}

pub async fn listall(
    State(state): State<AppState>,
    Extension(_claims): Extension<Claims>,
) -> ApiResult<impl IntoResponse> {
    let channels = state.read(|ws| Ok(ws.channels_listall()))?;
    Ok(Json(ChannelsListResponse { channels }))
}

pub async fn details(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Query(query): Query<ChannelQuery>,
) -> ApiResult<impl IntoResponse> {
    let details = state.read(|ws| ws.channel_details(claims.sub, query.channel_id))?;
    Ok(Json(details))
}

pub async fn join(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(req): Json<ChannelJoinRequest>,
) -> ApiResult<impl IntoResponse> {
    state.mutate(|ws| ws.channel_join(claims.sub, req.channel_id)).await?;
    Ok(Json(json!({})))
}

pub async fn invite(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(req): Json<ChannelMemberRequest>,
) -> ApiResult<impl IntoResponse> {
    state
        .mutate(|ws| ws.channel_invite(claims.sub, req.channel_id, req.u_id))
        .await?;
    Ok(Json(json!({})))
}

pub async fn leave(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(req): Json<ChannelJoinRequest>,
) -> ApiResult<impl IntoResponse> {
    state.mutate(|ws| ws.channel_leave(claims.sub, req.channel_id)).await?;
    Ok(Json(json!({})))
}

pub async fn messages(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Query(query): Query<ChannelMessagesQuery>,
) -> ApiResult<impl IntoResponse> {
    let page = state.read(|ws| ws.channel_messages(claims.sub, query.channel_id, query.start))?;
    Ok(Json(page))
}

pub async fn add_owner(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(req): Json<ChannelMemberRequest>,
) -> ApiResult<impl IntoResponse> {
    state
        .mutate(|ws| ws.channel_add_owner(claims.sub, req.channel_id, req.u_id))
        .await?;
    Ok(Json(json!({})))
}

pub async fn remove_owner(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(req): Json<ChannelMemberRequest>,
) -> ApiResult<impl IntoResponse> {
    state
        .mutate(|ws| ws.channel_remove_owner(claims.sub, req.channel_id, req.u_id))
        .await?;
    Ok(Json(json!({})))
}
