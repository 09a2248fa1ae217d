use axum::{
    Extension, Json,
    extract::{Query, State},
    response::IntoResponse,
};
use serde_json::json;
use tracing::{info, warn};

use treats_types::api::{ChannelQuery, Claims, StandupSendRequest, StandupStartRequest, StandupStartResponse};
use treats_types::models::ChannelId;

use crate::error::ApiResult;
use crate::scheduler::delay_until;
use crate::state::AppState;

pub async fn start(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(req): Json<StandupStartRequest>,
) -> ApiResult<impl IntoResponse> {
    let time_finish = state
        .mutate(|ws| ws.standup_start(claims.sub, req.channel_id, req.length))
        .await?;
    schedule_finish(&state, req.channel_id, time_finish);
    Ok(Json(StandupStartResponse { time_finish }))
}

pub async fn active(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Query(query): Query<ChannelQuery>,
) -> ApiResult<impl IntoResponse> {
    let status = state.read(|ws| ws.standup_active(claims.sub, query.channel_id))?;
    Ok(Json(status))
}

pub async fn send(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(req): Json<StandupSendRequest>,
) -> ApiResult<impl IntoResponse> {
    state
        .mutate(|ws| ws.standup_send(claims.sub, req.channel_id, &req.message))
        .await?;
    Ok(Json(json!({})))
}

/// Arrange for the standup in `channel_id` to end at `time_finish` (unix
/// seconds). A finish time already in the past fires immediately.
pub fn schedule_finish(state: &AppState, channel_id: ChannelId, time_finish: i64) {
    let job_state = state.clone();
    state.scheduler.schedule(delay_until(time_finish), async move {
        match job_state.mutate(|ws| ws.standup_finish(channel_id)).await {
            Ok(Some(message_id)) => info!(channel_id, message_id, "standup summary posted"),
            Ok(None) => {}
            Err(e) => warn!(channel_id, "standup finish failed: {}", e),
        }
    });
}

/// Re-arm standups that were running when the workspace was last saved.
pub fn resume_standups(state: &AppState) -> ApiResult<usize> {
    let standups = state.read(|ws| Ok(ws.active_standups()))?;
    for (channel_id, time_finish) in &standups {
        schedule_finish(state, *channel_id, *time_finish);
    }
    Ok(standups.len())
}
