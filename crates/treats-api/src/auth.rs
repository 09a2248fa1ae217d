use argon2::{
    Argon2, PasswordHash, PasswordHasher, PasswordVerifier,
    password_hash::{SaltString, rand_core::OsRng},
};
use axum::{Extension, Json, extract::State, response::IntoResponse};
use jsonwebtoken::{EncodingKey, Header, encode};
use serde_json::json;
use tracing::info;
use uuid::Uuid;

use treats_core::auth::validate_password;
use treats_types::api::{
    AuthResponse, Claims, LoginRequest, PasswordResetConfirm, PasswordResetRequest, RegisterRequest,
};
use treats_types::models::UserId;

use crate::error::{ApiError, ApiResult};
use crate::state::AppState;

fn hash_password(password: &str) -> ApiResult<String> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(ApiError::internal)
}

pub async fn register(
    State(state): State<AppState>,
    Json(req): Json<RegisterRequest>,
) -> ApiResult<impl IntoResponse> {
    validate_password(&req.password)?;
    let password_hash = hash_password(&req.password)?;

    let (u_id, sid) = state
        .mutate(|ws| ws.register(&req.email, password_hash, &req.name_first, &req.name_last))
        .await?;

    let token = create_token(&state.jwt_secret, state.session_days, u_id, sid).map_err(ApiError::internal)?;
    Ok(Json(AuthResponse {
        token,
        auth_user_id: u_id,
    }))
}

pub async fn login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> ApiResult<impl IntoResponse> {
    let (u_id, stored_hash) = state.read(|ws| {
        let user = ws.user_by_email(&req.email)?;
        Ok((user.u_id, user.password_hash.clone()))
    })?;

    let parsed_hash = PasswordHash::new(&stored_hash).map_err(ApiError::internal)?;
    Argon2::default()
        .verify_password(req.password.as_bytes(), &parsed_hash)
        .map_err(|_| ApiError::Input("password is incorrect".into()))?;

    let sid = state.mutate(|ws| ws.open_session(u_id)).await?;
    let token = create_token(&state.jwt_secret, state.session_days, u_id, sid).map_err(ApiError::internal)?;
    Ok(Json(AuthResponse {
        token,
        auth_user_id: u_id,
    }))
}

pub async fn logout(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> ApiResult<impl IntoResponse> {
    state.mutate(|ws| ws.close_session(claims.sub, claims.sid)).await?;
    Ok(Json(json!({})))
}

/// Always succeeds so the endpoint cannot be used to probe for accounts.
pub async fn password_reset_request(
    State(state): State<AppState>,
    Json(req): Json<PasswordResetRequest>,
) -> ApiResult<impl IntoResponse> {
    let code = state.mutate(|ws| Ok(ws.issue_reset_code(&req.email))).await?;
    if let Some(code) = code {
        // No mail transport; the code is only written to the log.
        info!(email = %req.email, reset_code = %code, "password reset code issued");
    }
    Ok(Json(json!({})))
}

pub async fn password_reset(
    State(state): State<AppState>,
    Json(req): Json<PasswordResetConfirm>,
) -> ApiResult<impl IntoResponse> {
    validate_password(&req.new_password)?;
    let password_hash = hash_password(&req.new_password)?;
    state
        .mutate(|ws| ws.reset_password(&req.reset_code, password_hash))
        .await?;
    Ok(Json(json!({})))
}

pub fn create_token(secret: &str, session_days: i64, u_id: UserId, sid: Uuid) -> anyhow::Result<String> {
    let claims = Claims {
        sub: u_id,
        sid,
        exp: (chrono::Utc::now() + chrono::Duration::days(session_days)).timestamp() as usize,
    };

    let token = encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )?;

    Ok(token)
}
