use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;
use uuid::Uuid;

/// Append-only analytics record of one invite redemption. Written with
/// the elevated service credential; never updated or deleted here.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow, TS)]
#[ts(export)]
pub struct InviteUse {
    pub id: Uuid,
    pub invite_id: Uuid,
    pub user_id: Uuid,
    pub team_id: Uuid,
    pub is_new_signup: bool,
    pub created_at: DateTime<Utc>,
}
