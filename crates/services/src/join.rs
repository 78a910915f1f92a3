use std::sync::Arc;

use api_types::{Invite, InvitePreview, JoinOutcome};
use chrono::Utc;
use db::{InviteStore, MembershipStore, StoreError, TeamStore, UserStore};
use thiserror::Error;
use uuid::Uuid;

use crate::UsageLogger;

#[derive(Debug, Error)]
pub enum JoinError {
    #[error("invite code not found")]
    InviteNotFound,
    #[error("invite has expired")]
    InviteExpired,
    #[error("invite has no uses remaining")]
    InviteExhausted,
    #[error("the invite's team no longer exists")]
    TeamNotFound,
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Orchestrates invite redemption: resolves the invite, enforces the
/// one-team-per-user invariant, and migrates membership on a confirmed
/// switch. Requests are stateless; the database settles concurrent
/// joins via its unique membership index.
pub struct JoinService {
    invites: Arc<dyn InviteStore>,
    memberships: Arc<dyn MembershipStore>,
    teams: Arc<dyn TeamStore>,
    users: Arc<dyn UserStore>,
    usage: UsageLogger,
}

impl JoinService {
    pub fn new(
        invites: Arc<dyn InviteStore>,
        memberships: Arc<dyn MembershipStore>,
        teams: Arc<dyn TeamStore>,
        users: Arc<dyn UserStore>,
        usage: UsageLogger,
    ) -> Self {
        Self {
            invites,
            memberships,
            teams,
            users,
            usage,
        }
    }

    pub async fn join(
        &self,
        user_id: Uuid,
        code: &str,
        confirm_switch: bool,
        is_new_signup: bool,
    ) -> Result<JoinOutcome, JoinError> {
        let invite = self.resolve_invite(code).await?;
        let team = self
            .teams
            .get_team(invite.team_id)
            .await?
            .ok_or(JoinError::TeamNotFound)?;

        if let Some(current) = self.memberships.find_for_user(user_id).await? {
            if current.team_id == invite.team_id {
                return Ok(JoinOutcome::AlreadyMember {
                    team_id: current.team_id,
                });
            }
            // An owner can never switch, confirmed or not; the team
            // must be deleted first.
            if self.teams.is_owner(current.team_id, user_id).await? {
                return Ok(JoinOutcome::OwnerCannotSwitch {
                    owned_team_id: current.team_id,
                });
            }
            if !confirm_switch {
                let current_team_name = self
                    .teams
                    .get_team(current.team_id)
                    .await?
                    .map(|t| t.name);
                return Ok(JoinOutcome::RequiresConfirmation {
                    current_team_id: current.team_id,
                    current_team_name,
                });
            }
            // Leave must complete before the new row goes in.
            self.memberships.delete_membership(current.id).await?;
        }

        self.memberships
            .insert_membership(invite.team_id, user_id)
            .await?;

        if invite.uses_remaining.is_some()
            && !self.invites.decrement_uses(invite.id).await?
        {
            // Lost a redemption race after the membership insert; the
            // join stands and the counter stays clamped at zero.
            tracing::warn!(invite_id = %invite.id, "invite raced to zero during redemption");
        }

        self.usage
            .record(invite.id, user_id, invite.team_id, is_new_signup);

        Ok(JoinOutcome::Joined {
            team_id: team.id,
            team_name: team.name,
        })
    }

    /// Public invite details for the join page. Shares the join flow's
    /// resolution so the page can show the precise invalid state.
    pub async fn preview(&self, code: &str) -> Result<InvitePreview, JoinError> {
        let invite = self.resolve_invite(code).await?;
        let team = self
            .teams
            .get_team(invite.team_id)
            .await?
            .ok_or(JoinError::TeamNotFound)?;
        let member_count = self.memberships.count_for_team(team.id).await?;
        let inviter_name = self.users.display_name(invite.created_by).await?;

        Ok(InvitePreview {
            code: invite.code,
            team_id: team.id,
            team_name: team.name,
            member_count,
            inviter_name,
        })
    }

    async fn resolve_invite(&self, code: &str) -> Result<Invite, JoinError> {
        let invite = self
            .invites
            .find_by_code(code)
            .await?
            .ok_or(JoinError::InviteNotFound)?;
        // Expiry wins over quota so the client message is specific.
        if invite.is_expired(Utc::now()) {
            return Err(JoinError::InviteExpired);
        }
        if invite.is_exhausted() {
            return Err(JoinError::InviteExhausted);
        }
        Ok(invite)
    }
}
