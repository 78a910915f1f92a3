//! The store traits that backends implement.

use api_types::{Invite, Team, TeamMember};
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::StoreError;

/// Parameters for inserting an invite row.
#[derive(Clone, Debug)]
pub struct CreateInviteParams {
    pub team_id: Uuid,
    pub created_by: Uuid,
    pub code: String,
    pub uses_remaining: Option<i32>,
    pub expires_at: Option<DateTime<Utc>>,
}

/// Parameters for one analytics record of an invite redemption.
#[derive(Clone, Debug)]
pub struct RecordUseParams {
    pub invite_id: Uuid,
    pub user_id: Uuid,
    pub team_id: Uuid,
    pub is_new_signup: bool,
}

/// Redemption counters for one invite.
#[derive(Clone, Copy, Debug, sqlx::FromRow)]
pub struct InviteUseCounts {
    pub invite_id: Uuid,
    pub redemptions: i64,
    pub new_signups: i64,
}

/// CRUD over invite rows.
#[async_trait::async_trait]
pub trait InviteStore: Send + Sync {
    /// Insert a new invite. A duplicate code maps to `Conflict`.
    async fn create_invite(&self, params: &CreateInviteParams) -> Result<Invite, StoreError>;

    /// Exact-match lookup on the unique code.
    async fn find_by_code(&self, code: &str) -> Result<Option<Invite>, StoreError>;

    /// All invites for a (team, creator) pair, newest first. Expired
    /// rows are included; expiration is the caller's read-time filter.
    async fn list_for_team_by_creator(
        &self,
        team_id: Uuid,
        creator_id: Uuid,
    ) -> Result<Vec<Invite>, StoreError>;

    /// Conditionally decrement a finite counter. Returns false when the
    /// counter was already at zero, so it can never go negative.
    async fn decrement_uses(&self, invite_id: Uuid) -> Result<bool, StoreError>;

    /// Delete an invite. `Forbidden` when the requester is not the
    /// creator, `NotFound` when the row is absent.
    async fn delete_invite(&self, invite_id: Uuid, requester_id: Uuid) -> Result<(), StoreError>;
}

/// CRUD over team membership rows.
#[async_trait::async_trait]
pub trait MembershipStore: Send + Sync {
    /// A user has zero or one rows by invariant.
    async fn find_for_user(&self, user_id: Uuid) -> Result<Option<TeamMember>, StoreError>;

    /// Insert a membership with zero contribution points. A second row
    /// for the same user maps to `Conflict`.
    async fn insert_membership(
        &self,
        team_id: Uuid,
        user_id: Uuid,
    ) -> Result<TeamMember, StoreError>;

    async fn delete_membership(&self, membership_id: Uuid) -> Result<(), StoreError>;

    async fn count_for_team(&self, team_id: Uuid) -> Result<i64, StoreError>;
}

/// Read-only access to the platform's team rows.
#[async_trait::async_trait]
pub trait TeamStore: Send + Sync {
    async fn get_team(&self, team_id: Uuid) -> Result<Option<Team>, StoreError>;

    /// Compares the team's `created_by` to the user.
    async fn is_owner(&self, team_id: Uuid, user_id: Uuid) -> Result<bool, StoreError>;
}

/// Read-only access to the platform's user rows.
#[async_trait::async_trait]
pub trait UserStore: Send + Sync {
    async fn display_name(&self, user_id: Uuid) -> Result<Option<String>, StoreError>;
}

/// Append-only analytics table, accessed with the elevated service
/// credential.
#[async_trait::async_trait]
pub trait UsageStore: Send + Sync {
    async fn record_use(&self, params: &RecordUseParams) -> Result<(), StoreError>;

    /// Redemption counters for the given invites. Invites with no
    /// redemptions are simply absent from the result.
    async fn redemption_counts(
        &self,
        invite_ids: &[Uuid],
    ) -> Result<Vec<InviteUseCounts>, StoreError>;
}
