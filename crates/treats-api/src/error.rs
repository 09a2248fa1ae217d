use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;
use tracing::error;

use treats_core::TreatsError;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    Input(String),

    #[error("{0}")]
    Auth(String),

    #[error("token is missing or invalid")]
    Unauthorized,

    #[error("internal error: {0}")]
    Internal(String),
}

impl ApiError {
    pub fn internal(err: impl std::fmt::Display) -> Self {
        Self::Internal(err.to_string())
    }

    pub fn status(&self) -> StatusCode {
        match self {
            Self::Input(_) => StatusCode::BAD_REQUEST,
            Self::Auth(_) | Self::Unauthorized => StatusCode::FORBIDDEN,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<TreatsError> for ApiError {
    fn from(err: TreatsError) -> Self {
        match err {
            TreatsError::Input(msg) => Self::Input(msg),
            TreatsError::Auth(msg) => Self::Auth(msg),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if let Self::Internal(msg) = &self {
            error!("request failed: {}", msg);
        }
        (status, Json(json!({ "error": self.to_string() }))).into_response()
    }
}

pub type ApiResult<T> = Result<T, ApiError>;
