//! Mapping of engine errors onto HTTP responses.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};
use teen_patti::room::{ErrorKind, RoomError};

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}

/// An error ready to be sent to a client
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub message: String,
}

impl ApiError {
    pub fn unauthorized() -> Self {
        Self {
            status: StatusCode::UNAUTHORIZED,
            message: "Invalid or missing token".to_string(),
        }
    }
}

/// Label used for logs and metrics
pub fn outcome_label(kind: ErrorKind) -> &'static str {
    match kind {
        ErrorKind::NotFound => "not_found",
        ErrorKind::Conflict => "conflict",
        ErrorKind::InsufficientFunds => "insufficient_funds",
        ErrorKind::InsufficientParticipants => "insufficient_participants",
        ErrorKind::DeckExhausted => "deck_exhausted",
        ErrorKind::Invalid => "invalid",
        ErrorKind::Internal => "internal",
    }
}

impl From<RoomError> for ApiError {
    fn from(err: RoomError) -> Self {
        let status = match err.kind() {
            ErrorKind::NotFound => StatusCode::NOT_FOUND,
            ErrorKind::Conflict | ErrorKind::InsufficientParticipants => StatusCode::CONFLICT,
            ErrorKind::InsufficientFunds | ErrorKind::Invalid => StatusCode::BAD_REQUEST,
            ErrorKind::DeckExhausted | ErrorKind::Internal => {
                log::error!("Room operation failed: {}", err);
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };
        Self {
            status,
            message: err.client_message(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (
            self.status,
            Json(ErrorResponse {
                error: self.message,
            }),
        )
            .into_response()
    }
}
