//! Postgres implementation of the store traits.
//!
//! Queries are runtime-checked `query_as` against the platform's
//! database; only the tables in `./migrations` are owned (and migrated)
//! by this service.

use api_types::{Invite, Team, TeamMember};
use sqlx::{PgPool, postgres::PgPoolOptions};
use uuid::Uuid;

use crate::{
    CreateInviteParams, InviteStore, InviteUseCounts, MembershipStore, RecordUseParams, StoreError,
    TeamStore, UsageStore, UserStore,
};

static MIGRATOR: sqlx::migrate::Migrator = sqlx::migrate!("./migrations");

const INVITE_COLUMNS: &str = "id, team_id, created_by, code, uses_remaining, expires_at, created_at";
const MEMBER_COLUMNS: &str = "id, team_id, user_id, contribution_points, created_at";

pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    /// Open a connection pool. Migrations are a separate step so the
    /// elevated analytics credential can attach without running them.
    pub async fn connect(url: &str) -> Result<Self, StoreError> {
        let pool = PgPoolOptions::new()
            .max_connections(10)
            .connect(url)
            .await
            .map_err(|e| StoreError::Backend(e.to_string()))?;
        Ok(Self { pool })
    }

    pub async fn migrate(&self) -> Result<(), StoreError> {
        MIGRATOR
            .run(&self.pool)
            .await
            .map_err(|e| StoreError::Backend(e.to_string()))
    }
}

fn map_sqlx(e: sqlx::Error) -> StoreError {
    match &e {
        sqlx::Error::Database(db) if db.is_unique_violation() => StoreError::Conflict,
        _ => StoreError::Backend(e.to_string()),
    }
}

#[async_trait::async_trait]
impl InviteStore for PgStore {
    async fn create_invite(&self, params: &CreateInviteParams) -> Result<Invite, StoreError> {
        let sql = format!(
            "INSERT INTO invites (id, team_id, created_by, code, uses_remaining, expires_at) \
             VALUES ($1, $2, $3, $4, $5, $6) RETURNING {INVITE_COLUMNS}"
        );
        sqlx::query_as::<_, Invite>(&sql)
            .bind(Uuid::new_v4())
            .bind(params.team_id)
            .bind(params.created_by)
            .bind(&params.code)
            .bind(params.uses_remaining)
            .bind(params.expires_at)
            .fetch_one(&self.pool)
            .await
            .map_err(map_sqlx)
    }

    async fn find_by_code(&self, code: &str) -> Result<Option<Invite>, StoreError> {
        let sql = format!("SELECT {INVITE_COLUMNS} FROM invites WHERE code = $1");
        sqlx::query_as::<_, Invite>(&sql)
            .bind(code)
            .fetch_optional(&self.pool)
            .await
            .map_err(map_sqlx)
    }

    async fn list_for_team_by_creator(
        &self,
        team_id: Uuid,
        creator_id: Uuid,
    ) -> Result<Vec<Invite>, StoreError> {
        let sql = format!(
            "SELECT {INVITE_COLUMNS} FROM invites \
             WHERE team_id = $1 AND created_by = $2 ORDER BY created_at DESC"
        );
        sqlx::query_as::<_, Invite>(&sql)
            .bind(team_id)
            .bind(creator_id)
            .fetch_all(&self.pool)
            .await
            .map_err(map_sqlx)
    }

    async fn decrement_uses(&self, invite_id: Uuid) -> Result<bool, StoreError> {
        // Conditional update so racing redemptions can never drive the
        // counter below zero.
        let result = sqlx::query(
            "UPDATE invites SET uses_remaining = uses_remaining - 1 \
             WHERE id = $1 AND uses_remaining > 0",
        )
        .bind(invite_id)
        .execute(&self.pool)
        .await
        .map_err(map_sqlx)?;
        Ok(result.rows_affected() > 0)
    }

    async fn delete_invite(&self, invite_id: Uuid, requester_id: Uuid) -> Result<(), StoreError> {
        let sql = format!("SELECT {INVITE_COLUMNS} FROM invites WHERE id = $1");
        let invite = sqlx::query_as::<_, Invite>(&sql)
            .bind(invite_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(map_sqlx)?
            .ok_or(StoreError::NotFound)?;

        if invite.created_by != requester_id {
            return Err(StoreError::Forbidden);
        }

        sqlx::query("DELETE FROM invites WHERE id = $1")
            .bind(invite_id)
            .execute(&self.pool)
            .await
            .map_err(map_sqlx)?;
        Ok(())
    }
}

#[async_trait::async_trait]
impl MembershipStore for PgStore {
    async fn find_for_user(&self, user_id: Uuid) -> Result<Option<TeamMember>, StoreError> {
        let sql = format!("SELECT {MEMBER_COLUMNS} FROM team_members WHERE user_id = $1");
        sqlx::query_as::<_, TeamMember>(&sql)
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(map_sqlx)
    }

    async fn insert_membership(
        &self,
        team_id: Uuid,
        user_id: Uuid,
    ) -> Result<TeamMember, StoreError> {
        let sql = format!(
            "INSERT INTO team_members (id, team_id, user_id, contribution_points) \
             VALUES ($1, $2, $3, 0) RETURNING {MEMBER_COLUMNS}"
        );
        sqlx::query_as::<_, TeamMember>(&sql)
            .bind(Uuid::new_v4())
            .bind(team_id)
            .bind(user_id)
            .fetch_one(&self.pool)
            .await
            .map_err(map_sqlx)
    }

    async fn delete_membership(&self, membership_id: Uuid) -> Result<(), StoreError> {
        let result = sqlx::query("DELETE FROM team_members WHERE id = $1")
            .bind(membership_id)
            .execute(&self.pool)
            .await
            .map_err(map_sqlx)?;
        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound);
        }
        Ok(())
    }

    async fn count_for_team(&self, team_id: Uuid) -> Result<i64, StoreError> {
        sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM team_members WHERE team_id = $1")
            .bind(team_id)
            .fetch_one(&self.pool)
            .await
            .map_err(map_sqlx)
    }
}

#[async_trait::async_trait]
impl TeamStore for PgStore {
    async fn get_team(&self, team_id: Uuid) -> Result<Option<Team>, StoreError> {
        sqlx::query_as::<_, Team>("SELECT id, name, created_by, created_at FROM teams WHERE id = $1")
            .bind(team_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(map_sqlx)
    }

    async fn is_owner(&self, team_id: Uuid, user_id: Uuid) -> Result<bool, StoreError> {
        sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS(SELECT 1 FROM teams WHERE id = $1 AND created_by = $2)",
        )
        .bind(team_id)
        .bind(user_id)
        .fetch_one(&self.pool)
        .await
        .map_err(map_sqlx)
    }
}

#[async_trait::async_trait]
impl UserStore for PgStore {
    async fn display_name(&self, user_id: Uuid) -> Result<Option<String>, StoreError> {
        let name = sqlx::query_scalar::<_, Option<String>>(
            "SELECT display_name FROM users WHERE id = $1",
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(map_sqlx)?;
        Ok(name.flatten())
    }
}

#[async_trait::async_trait]
impl UsageStore for PgStore {
    async fn record_use(&self, params: &RecordUseParams) -> Result<(), StoreError> {
        sqlx::query(
            "INSERT INTO invite_uses (id, invite_id, user_id, team_id, is_new_signup) \
             VALUES ($1, $2, $3, $4, $5)",
        )
        .bind(Uuid::new_v4())
        .bind(params.invite_id)
        .bind(params.user_id)
        .bind(params.team_id)
        .bind(params.is_new_signup)
        .execute(&self.pool)
        .await
        .map_err(map_sqlx)?;
        Ok(())
    }

    async fn redemption_counts(
        &self,
        invite_ids: &[Uuid],
    ) -> Result<Vec<InviteUseCounts>, StoreError> {
        if invite_ids.is_empty() {
            return Ok(Vec::new());
        }
        sqlx::query_as::<_, InviteUseCounts>(
            "SELECT invite_id, COUNT(*) AS redemptions, \
             COUNT(*) FILTER (WHERE is_new_signup) AS new_signups \
             FROM invite_uses WHERE invite_id = ANY($1) GROUP BY invite_id",
        )
        .bind(invite_ids)
        .fetch_all(&self.pool)
        .await
        .map_err(map_sqlx)
    }
}
