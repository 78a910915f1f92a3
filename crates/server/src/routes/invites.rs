use api_types::{CreateInviteRequest, CreateInviteResponse, InviteWithStats};
use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::{auth::AuthUser, error::ApiError, state::AppState};

pub async fn create_invite(
    State(state): State<AppState>,
    user: AuthUser,
    Json(req): Json<CreateInviteRequest>,
) -> Result<(StatusCode, Json<CreateInviteResponse>), ApiError> {
    let invite = state.invites.create(user.id, &req).await?;
    let share_url = state.config.share_url(&invite.code);
    Ok((
        StatusCode::CREATED,
        Json(CreateInviteResponse { invite, share_url }),
    ))
}

#[derive(Debug, Deserialize)]
pub struct ListInvitesQuery {
    pub team_id: Uuid,
}

pub async fn list_invites(
    State(state): State<AppState>,
    user: AuthUser,
    Query(query): Query<ListInvitesQuery>,
) -> Result<Json<Vec<InviteWithStats>>, ApiError> {
    let listings = state.invites.list(user.id, query.team_id).await?;
    let body = listings
        .into_iter()
        .map(|listing| InviteWithStats {
            share_url: state.config.share_url(&listing.invite.code),
            invite: listing.invite,
            stats: listing.stats,
        })
        .collect();
    Ok(Json(body))
}

pub async fn delete_invite(
    State(state): State<AppState>,
    user: AuthUser,
    Path(invite_id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    state.invites.revoke(user.id, invite_id).await?;
    Ok(StatusCode::NO_CONTENT)
}
