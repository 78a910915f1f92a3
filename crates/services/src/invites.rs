use std::{collections::HashMap, sync::Arc};

use api_types::{CreateInviteRequest, Invite, InviteUseStats};
use chrono::{Duration, Utc};
use db::{CreateInviteParams, InviteStore, MembershipStore, StoreError, UsageStore};
use thiserror::Error;
use uuid::Uuid;

use crate::generate_invite_code;

#[derive(Debug, Error)]
pub enum InviteError {
    #[error("{0}")]
    Validation(String),
    #[error("caller is not a member of this team")]
    NotAMember,
    #[error("an active invite for this team already exists")]
    ActiveInviteExists,
    #[error("invite not found")]
    NotFound,
    #[error("only the invite's creator may delete it")]
    Forbidden,
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// An invite plus its best-effort redemption stats. `stats` is `None`
/// when the analytics read failed.
#[derive(Debug, Clone)]
pub struct InviteListing {
    pub invite: Invite,
    pub stats: Option<InviteUseStats>,
}

pub struct InviteService {
    invites: Arc<dyn InviteStore>,
    memberships: Arc<dyn MembershipStore>,
    usage: Arc<dyn UsageStore>,
}

impl InviteService {
    pub fn new(
        invites: Arc<dyn InviteStore>,
        memberships: Arc<dyn MembershipStore>,
        usage: Arc<dyn UsageStore>,
    ) -> Self {
        Self {
            invites,
            memberships,
            usage,
        }
    }

    pub async fn create(
        &self,
        creator_id: Uuid,
        req: &CreateInviteRequest,
    ) -> Result<Invite, InviteError> {
        if let Some(uses) = req.uses_remaining {
            if uses <= 0 {
                return Err(InviteError::Validation(
                    "uses_remaining must be positive".to_string(),
                ));
            }
        }
        if let Some(days) = req.expires_in_days {
            if days <= 0 {
                return Err(InviteError::Validation(
                    "expires_in_days must be positive".to_string(),
                ));
            }
        }

        self.ensure_member(creator_id, req.team_id).await?;

        // One active invite per (team, creator). Checked by a prior
        // read; a concurrent duplicate is an accepted soft race.
        let now = Utc::now();
        let existing = self
            .invites
            .list_for_team_by_creator(req.team_id, creator_id)
            .await?;
        if existing.iter().any(|i| !i.is_expired(now)) {
            return Err(InviteError::ActiveInviteExists);
        }

        let params = CreateInviteParams {
            team_id: req.team_id,
            created_by: creator_id,
            code: generate_invite_code(),
            uses_remaining: req.uses_remaining,
            expires_at: req.expires_in_days.map(|days| now + Duration::days(days)),
        };
        Ok(self.invites.create_invite(&params).await?)
    }

    /// The caller's own non-expired invites for a team, enriched with
    /// redemption counts when the analytics read succeeds.
    pub async fn list(
        &self,
        caller_id: Uuid,
        team_id: Uuid,
    ) -> Result<Vec<InviteListing>, InviteError> {
        self.ensure_member(caller_id, team_id).await?;

        let now = Utc::now();
        let active: Vec<Invite> = self
            .invites
            .list_for_team_by_creator(team_id, caller_id)
            .await?
            .into_iter()
            .filter(|i| !i.is_expired(now))
            .collect();

        let ids: Vec<Uuid> = active.iter().map(|i| i.id).collect();
        let counts = match self.usage.redemption_counts(&ids).await {
            Ok(counts) => Some(
                counts
                    .into_iter()
                    .map(|c| {
                        (
                            c.invite_id,
                            InviteUseStats {
                                redemptions: c.redemptions,
                                new_signups: c.new_signups,
                            },
                        )
                    })
                    .collect::<HashMap<Uuid, InviteUseStats>>(),
            ),
            Err(error) => {
                tracing::warn!(%team_id, %error, "invite stats enrichment failed");
                None
            }
        };

        Ok(active
            .into_iter()
            .map(|invite| {
                let stats = counts.as_ref().map(|m| {
                    m.get(&invite.id).copied().unwrap_or(InviteUseStats {
                        redemptions: 0,
                        new_signups: 0,
                    })
                });
                InviteListing { invite, stats }
            })
            .collect())
    }

    pub async fn revoke(&self, caller_id: Uuid, invite_id: Uuid) -> Result<(), InviteError> {
        self.invites
            .delete_invite(invite_id, caller_id)
            .await
            .map_err(|e| match e {
                StoreError::NotFound => InviteError::NotFound,
                StoreError::Forbidden => InviteError::Forbidden,
                other => InviteError::Store(other),
            })
    }

    async fn ensure_member(&self, user_id: Uuid, team_id: Uuid) -> Result<(), InviteError> {
        match self.memberships.find_for_user(user_id).await? {
            Some(m) if m.team_id == team_id => Ok(()),
            _ => Err(InviteError::NotAMember),
        }
    }
}
