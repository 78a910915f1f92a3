use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use db::StoreError;
use serde::Serialize;
use services::{InviteError, JoinError};
use thiserror::Error;

/// Request-level error. Protocol branches of the join flow
/// (already-member, requires-confirmation, owner-cannot-switch) are not
/// errors; they are serialized as outcomes by the join handler.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("authentication required")]
    Unauthorized,
    #[error(transparent)]
    Invite(#[from] InviteError),
    #[error(transparent)]
    Join(#[from] JoinError),
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    error: &'static str,
    message: String,
}

fn store_response(err: &StoreError) -> (StatusCode, &'static str, String) {
    match err {
        StoreError::NotFound => (StatusCode::NOT_FOUND, "not_found", err.to_string()),
        StoreError::Conflict => (StatusCode::CONFLICT, "conflict", err.to_string()),
        StoreError::Forbidden => (StatusCode::FORBIDDEN, "forbidden", err.to_string()),
        StoreError::Backend(detail) => {
            tracing::error!(%detail, "store backend error");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "internal",
                "internal error".to_string(),
            )
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, kind, message) = match &self {
            ApiError::Unauthorized => {
                (StatusCode::UNAUTHORIZED, "unauthorized", self.to_string())
            }
            ApiError::Invite(err) => match err {
                InviteError::Validation(_) => {
                    (StatusCode::BAD_REQUEST, "validation", err.to_string())
                }
                InviteError::NotAMember => (StatusCode::FORBIDDEN, "not_a_member", err.to_string()),
                InviteError::ActiveInviteExists => {
                    (StatusCode::CONFLICT, "invite_already_exists", err.to_string())
                }
                InviteError::NotFound => {
                    (StatusCode::NOT_FOUND, "invite_not_found", err.to_string())
                }
                InviteError::Forbidden => {
                    (StatusCode::FORBIDDEN, "not_invite_creator", err.to_string())
                }
                InviteError::Store(store) => store_response(store),
            },
            ApiError::Join(err) => match err {
                JoinError::InviteNotFound => {
                    (StatusCode::NOT_FOUND, "invite_not_found", err.to_string())
                }
                JoinError::InviteExpired => (StatusCode::GONE, "invite_expired", err.to_string()),
                JoinError::InviteExhausted => {
                    (StatusCode::GONE, "invite_exhausted", err.to_string())
                }
                JoinError::TeamNotFound => {
                    (StatusCode::NOT_FOUND, "team_not_found", err.to_string())
                }
                JoinError::Store(store) => store_response(store),
            },
        };

        (status, Json(ErrorBody { error: kind, message })).into_response()
    }
}
