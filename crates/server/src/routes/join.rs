use api_types::{InvitePreview, JoinOutcome, JoinRequest};
use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};

use crate::{auth::AuthUser, error::ApiError, state::AppState};

/// The join protocol. Rejection branches are first-class outcomes with
/// their own status codes so the client can render the right screen:
/// 409 for already-member and requires-confirmation (the body's
/// `outcome` tag distinguishes them), 403 for owner-cannot-switch.
pub async fn join(
    State(state): State<AppState>,
    user: AuthUser,
    Json(req): Json<JoinRequest>,
) -> Result<Response, ApiError> {
    let outcome = state
        .join
        .join(user.id, &req.invite_code, req.confirm_switch, req.is_new_signup)
        .await?;

    let status = match &outcome {
        JoinOutcome::Joined { .. } => StatusCode::OK,
        JoinOutcome::AlreadyMember { .. } | JoinOutcome::RequiresConfirmation { .. } => {
            StatusCode::CONFLICT
        }
        JoinOutcome::OwnerCannotSwitch { .. } => StatusCode::FORBIDDEN,
    };
    Ok((status, Json(outcome)).into_response())
}

/// Public invite details for the join page; no authentication, so the
/// page renders before sign-in and can redirect unauthenticated
/// visitors to sign-up with the code attached.
pub async fn invite_preview(
    State(state): State<AppState>,
    Path(code): Path<String>,
) -> Result<Json<InvitePreview>, ApiError> {
    Ok(Json(state.join.preview(&code).await?))
}
