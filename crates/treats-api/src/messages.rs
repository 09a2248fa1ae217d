use axum::{
    Extension, Json,
    extract::{Query, State},
    response::IntoResponse,
};
use serde_json::json;
use tracing::{info, warn};

use treats_core::ConversationRef;
use treats_types::api::{
    Claims, EditMessageRequest, MessageIdRequest, MessageIdResponse, ReactRequest, SendDmRequest,
    SendLaterDmRequest, SendLaterRequest, SendMessageRequest, ShareRequest, ShareResponse,
};
use treats_types::models::{MessageId, UserId};

use crate::error::ApiResult;
use crate::scheduler::delay_until;
use crate::state::AppState;

pub async fn send(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(req): Json<SendMessageRequest>,
) -> ApiResult<impl IntoResponse> {
    let message_id = state
        .mutate(|ws| ws.message_send(claims.sub, req.channel_id, &req.message))
        .await?;
    Ok(Json(MessageIdResponse { message_id }))
}

pub async fn send_dm(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(req): Json<SendDmRequest>,
) -> ApiResult<impl IntoResponse> {
    let message_id = state
        .mutate(|ws| ws.message_send_dm(claims.sub, req.dm_id, &req.message))
        .await?;
    Ok(Json(MessageIdResponse { message_id }))
}

pub async fn edit(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(req): Json<EditMessageRequest>,
) -> ApiResult<impl IntoResponse> {
    state
        .mutate(|ws| ws.message_edit(claims.sub, req.message_id, &req.message))
        .await?;
    Ok(Json(json!({})))
}

pub async fn remove(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Query(query): Query<MessageIdRequest>,
) -> ApiResult<impl IntoResponse> {
    state.mutate(|ws| ws.message_remove(claims.sub, query.message_id)).await?;
    Ok(Json(json!({})))
}

pub async fn react(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(req): Json<ReactRequest>,
) -> ApiResult<impl IntoResponse> {
    state
        .mutate(|ws| ws.message_react(claims.sub, req.message_id, req.react_id))
        .await?;
    Ok(Json(json!({})))
}

pub async fn unreact(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(req): Json<ReactRequest>,
) -> ApiResult<impl IntoResponse> {
    state
        .mutate(|ws| ws.message_unreact(claims.sub, req.message_id, req.react_id))
        .await?;
    Ok(Json(json!({})))
}

pub async fn pin(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(req): Json<MessageIdRequest>,
) -> ApiResult<impl IntoResponse> {
    state.mutate(|ws| ws.message_pin(claims.sub, req.message_id)).await?;
    Ok(Json(json!({})))
}

pub async fn unpin(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(req): Json<MessageIdRequest>,
) -> ApiResult<impl IntoResponse> {
    state.mutate(|ws| ws.message_unpin(claims.sub, req.message_id)).await?;
    Ok(Json(json!({})))
}

pub async fn share(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(req): Json<ShareRequest>,
) -> ApiResult<impl IntoResponse> {
    let shared_message_id = state
        .mutate(|ws| {
            let target = ws.share_target(req.channel_id, req.dm_id)?;
            ws.message_share(claims.sub, req.og_message_id, &req.message, target)
        })
        .await?;
    Ok(Json(ShareResponse { shared_message_id }))
}

pub async fn send_later(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(req): Json<SendLaterRequest>,
) -> ApiResult<impl IntoResponse> {
    let conversation = ConversationRef::Channel(req.channel_id);
    let message_id = schedule_send(&state, claims.sub, conversation, req.message, req.time_sent).await?;
    Ok(Json(MessageIdResponse { message_id }))
}

pub async fn send_later_dm(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(req): Json<SendLaterDmRequest>,
) -> ApiResult<impl IntoResponse> {
    let conversation = ConversationRef::Dm(req.dm_id);
    let message_id = schedule_send(&state, claims.sub, conversation, req.message, req.time_sent).await?;
    Ok(Json(MessageIdResponse { message_id }))
}

/// Validate now, reserve the id, and deliver at `time_sent` (unix seconds).
async fn schedule_send(
    state: &AppState,
    u_id: UserId,
    conversation: ConversationRef,
    body: String,
    time_sent: i64,
) -> ApiResult<MessageId> {
    let message_id = state
        .mutate(|ws| ws.message_send_later(u_id, conversation, &body, time_sent))
        .await?;

    let job_state = state.clone();
    state.scheduler.schedule(delay_until(time_sent), async move {
        match job_state
            .mutate(|ws| ws.deliver_scheduled(message_id, u_id, conversation, &body))
            .await
        {
            Ok(_) => info!(message_id, u_id, "scheduled message delivered"),
            Err(e) => warn!(message_id, u_id, "scheduled message dropped: {}", e),
        }
    });

    Ok(message_id)
}
