use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use minichain_core::ChainError;
use serde_json::json;
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Bad request")]
    BadRequest,

    #[error(transparent)]
    Chain(#[from] ChainError),

    #[error("mining did not finish within {0:?}")]
    MiningTimedOut(Duration),

    #[error("mining task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::BadRequest => StatusCode::BAD_REQUEST,
            Self::Chain(ChainError::InvalidTransaction(_))
            | Self::Chain(ChainError::DifficultyOutOfRange { .. }) => StatusCode::BAD_REQUEST,
            Self::Chain(ChainError::EmptyChainMineRequest) => StatusCode::CONFLICT,
            Self::Chain(ChainError::Cancelled { .. }) | Self::MiningTimedOut(_) => {
                StatusCode::SERVICE_UNAVAILABLE
            }
            Self::Chain(ChainError::NonceOverflow { .. }) | Self::Task(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status(), Json(json!({ "message": self.to_string() }))).into_response()
    }
}
